// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! File-backed persistence for the dealer portal. Every entity is a JSON
//! record under the data root; uniqueness rules (one active submission per
//! email, one account per submission, one acceptance per account) are
//! enforced by atomic create-if-absent link files rather than in-memory
//! state, so they hold across processes.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   registrations/{id}.json              # submissions, never deleted
//!   registrations/by-email/{key}.json    # active-submission index
//!   accounts/{id}.json
//!   accounts/by-email/{key}.json         # email -> account link
//!   accounts/by-submission/{id}.json     # provisioning idempotency link
//!   profiles/{id}.json                   # draft/published dealer profiles
//!   agreements/{account_id}.json         # single-use acceptance records
//!   documents/{id}.json + {id}.html      # generated agreement artifacts
//!   audit/{date}/events.jsonl            # daily audit logs
//! ```

pub mod audit;
pub mod fs;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use fs::{FileStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    AccountRepository, AgreementRepository, CredentialHash, ProfileRepository, PublicationState,
    RegistrationRepository, ServiceFlags, StoredAcceptance, StoredAccount, StoredProfile,
    StoredRegistration, SubLocation, SubmissionStatus,
};
