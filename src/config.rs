// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for portal storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `MAIL_API_URL` | Mail provider endpoint | Log-only delivery if unset |
//! | `MAIL_API_TOKEN` | Mail provider bearer token | Log-only delivery if unset |
//! | `MAIL_FROM` | Sender address for outbound mail | `no-reply@dealer-portal.invalid` |
//! | `OPERATOR_EMAIL` | Inbox for operator notifications | Operator mail skipped if unset |
//! | `PORTAL_BASE_URL` | Public portal URL used in emails | `http://localhost:8080` |
//! | `AGREEMENT_TEXT_PATH` | File holding the agreement text | Built-in placeholder text |
//! | `SEED_ELEVATED_EMAIL` | Bootstrap operator account email | No operator seeded if unset |
//! | `SEED_ELEVATED_CREDENTIAL` | Bootstrap operator credential | Required with the seed email |

/// Environment variable name for the data directory path.
///
/// All portal records (registrations, accounts, profiles, acceptance records,
/// rendered documents, audit logs) are stored here.
///
/// # Default
/// `/data`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the logging format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the agreement text file.
///
/// When unset, a short placeholder agreement is served; production deploys
/// mount the legal text and point this at it.
pub const AGREEMENT_TEXT_PATH_ENV: &str = "AGREEMENT_TEXT_PATH";

/// Environment variable name for the bootstrap operator email.
///
/// When set together with [`SEED_ELEVATED_CREDENTIAL_ENV`], an elevated
/// account is created at startup if it does not exist yet. This is how the
/// first operator gets in; further operators are managed through the API.
pub const SEED_ELEVATED_EMAIL_ENV: &str = "SEED_ELEVATED_EMAIL";

/// Environment variable name for the bootstrap operator credential.
pub const SEED_ELEVATED_CREDENTIAL_ENV: &str = "SEED_ELEVATED_CREDENTIAL";
