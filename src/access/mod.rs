// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Module
//!
//! Sessions, roles and the onboarding access gate. Login mints an opaque
//! server-side session; every request resolves it back to the persisted
//! account, so gate decisions track the account's current flags. The gate
//! middleware covers `/portal/*` and redirects dealers with outstanding
//! onboarding requirements; elevated operators bypass it unconditionally.

pub mod error;
pub mod extractor;
pub mod gate;
pub mod roles;
pub mod session;

pub use error::AuthError;
pub use extractor::{resolve_session_account, Auth, AuthenticatedDealer, ElevatedOnly};
pub use gate::{
    access_gate, evaluate_access_state, is_gate_exempt, AccessState, AGREEMENT_PATH, ROTATION_PATH,
};
pub use roles::Role;
pub use session::{Session, SessionManager};
