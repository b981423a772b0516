// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Onboarding Module
//!
//! The dealer onboarding state machine: submission, admin decision, account
//! provisioning, forced credential rotation and agreement acceptance. Each
//! transition persists its record before any side effect runs; side effects
//! (document render, publication, notifications) are logged on failure but
//! never roll a completed transition back.

pub mod agreement;
pub mod credentials;
pub mod provisioner;
pub mod registration;

pub use agreement::{accept_agreement, AcceptanceOutcome, AcceptanceRequest};
pub use credentials::{
    generate_initial_credential, hash_credential, rotate_credential, validate_policy,
    verify_credential,
};
pub use provisioner::{provision, ProvisionedAccount};
pub use registration::{
    canonical_email, decide, email_key, submit, Decision, DecisionOutcome, NewRegistration,
};

use crate::storage::StorageError;

/// Domain error for onboarding transitions.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("An active registration already exists for this email")]
    DuplicateSubmission,

    #[error("An account has already been provisioned for this submission")]
    AccountExists,

    #[error("The agreement has already been accepted")]
    AlreadyAccepted,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Credential is incorrect")]
    InvalidCredential,

    #[error("Credential policy violation: {0}")]
    PolicyViolation(String),

    #[error("Cryptographic operation failed")]
    Crypto,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
