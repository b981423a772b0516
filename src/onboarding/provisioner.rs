// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account provisioning for approved submissions.
//!
//! Provisioning mints an account with a generated initial credential, the
//! rotation flag set and the agreement flag cleared, plus a draft profile
//! seeded from the submission. The submission link file makes the whole step
//! idempotent: a second attempt for the same submission fails before any
//! record is written.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access::Role;
use crate::audit_log;
use crate::storage::{
    AccountRepository, AuditEvent, AuditEventType, FileStorage, ProfileRepository,
    PublicationState, StorageError, StoredAccount, StoredProfile, StoredRegistration,
    SubmissionStatus,
};

use super::registration::{canonical_email, email_key};
use super::{credentials, OnboardingError};

/// The result of provisioning one submission.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub account: StoredAccount,
    pub profile: StoredProfile,
    /// Generated initial credential, returned once for delivery to the
    /// applicant; only the hash is persisted.
    pub initial_credential: String,
}

/// Provision an account and draft profile from an approved submission.
pub fn provision(
    storage: &FileStorage,
    registration: &StoredRegistration,
) -> Result<ProvisionedAccount, OnboardingError> {
    if registration.status != SubmissionStatus::Approved {
        return Err(OnboardingError::InvalidStateTransition(format!(
            "submission {} is not approved",
            registration.id
        )));
    }

    let canonical = canonical_email(&registration.representative_email);
    let key = email_key(&canonical);

    let initial_credential = credentials::generate_initial_credential()?;
    let credential = credentials::hash_credential(&initial_credential)?;

    let account = StoredAccount {
        id: Uuid::new_v4().to_string(),
        email: registration.representative_email.clone(),
        canonical_email: canonical,
        display_name: registration.representative_name.clone(),
        company_name: registration.company_name.clone(),
        credential,
        role: Role::Dealer,
        must_rotate_credential: true,
        agreement_accepted: false,
        session_epoch: 0,
        created_at: Utc::now(),
        submission_id: Some(registration.id.clone()),
    };

    match AccountRepository::new(storage).create(&account, &key) {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => return Err(OnboardingError::AccountExists),
        Err(e) => return Err(e.into()),
    }

    let profile = StoredProfile {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        company_name: registration.company_name.clone(),
        address: None,
        phone: registration.representative_phone.clone(),
        website: None,
        latitude: None,
        longitude: None,
        services: registration.services,
        sub_locations: Vec::new(),
        publication_state: PublicationState::Draft,
        document_id: None,
        created_at: Utc::now(),
        published_at: None,
    };
    ProfileRepository::new(storage).create(&profile)?;

    info!(
        account_id = %account.id,
        registration_id = %registration.id,
        "Account provisioned"
    );
    audit_log!(
        storage,
        AuditEvent::new(AuditEventType::AccountProvisioned)
            .with_account(&account.id)
            .with_resource("registration", &registration.id)
    );

    Ok(ProvisionedAccount {
        account,
        profile,
        initial_credential,
    })
}
