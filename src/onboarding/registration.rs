// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration submission and the admin decision.
//!
//! Emails are canonicalized (NFKC, trimmed, lowercased) before any lookup, so
//! `"  Jane@Acme.TEST "` and `"jane@acme.test"` are the same applicant. The
//! canonical form is hashed into a fixed-width key for the filesystem index.
//!
//! A decision is valid only against a pending submission. Approval persists
//! the decision first and then provisions the account; if provisioning is
//! retried after a crash in between, the existing account is surfaced instead
//! of a duplicate.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::audit_log;
use crate::notify::NotificationDispatcher;
use crate::storage::{
    AccountRepository, AuditEvent, AuditEventType, FileStorage, ProfileRepository,
    RegistrationRepository, ServiceFlags, StorageError, StoredRegistration, SubmissionStatus,
};

use super::OnboardingError;

/// Canonical form of an email address: NFKC-normalized, trimmed, lowercased.
pub fn canonical_email(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_lowercase()
}

/// Fixed-width index key for a canonical email (SHA-256, hex).
///
/// Keys land in filenames; hashing keeps them filesystem-safe regardless of
/// what the address contains.
pub fn email_key(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// A new registration as submitted by an applicant.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub representative_name: String,
    pub representative_email: String,
    pub representative_phone: Option<String>,
    pub company_name: String,
    pub company_contact: Option<String>,
    pub territory: String,
    pub services: ServiceFlags,
    pub notes: Option<String>,
    pub origin_ip: Option<String>,
}

/// An admin decision on a pending submission.
#[derive(Debug, Clone)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

/// What a decision produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Approved and provisioned (or re-resolved to the already-provisioned
    /// account on retry).
    Approved {
        account_id: String,
        profile_id: Option<String>,
    },
    Rejected,
}

/// Accept a new registration submission.
pub async fn submit(
    storage: &FileStorage,
    dispatcher: &NotificationDispatcher,
    new: NewRegistration,
) -> Result<StoredRegistration, OnboardingError> {
    validate_submission(&new)?;

    let canonical = canonical_email(&new.representative_email);
    let key = email_key(&canonical);

    let registration = StoredRegistration {
        id: Uuid::new_v4().to_string(),
        representative_name: new.representative_name.trim().to_string(),
        representative_email: new.representative_email.trim().to_string(),
        representative_phone: new.representative_phone,
        company_name: new.company_name.trim().to_string(),
        company_contact: new.company_contact,
        territory: new.territory.trim().to_string(),
        services: new.services,
        notes: new.notes,
        submitted_at: Utc::now(),
        origin_ip: new.origin_ip,
        status: SubmissionStatus::Pending,
        decided_by: None,
        decided_at: None,
        rejection_reason: None,
    };

    let repo = RegistrationRepository::new(storage);
    match repo.create(&registration, &key, &canonical) {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => return Err(OnboardingError::DuplicateSubmission),
        Err(e) => return Err(e.into()),
    }

    info!(registration_id = %registration.id, company = %registration.company_name, "Registration submitted");
    let mut event = AuditEvent::new(AuditEventType::RegistrationSubmitted)
        .with_resource("registration", &registration.id);
    if let Some(ip) = &registration.origin_ip {
        event = event.with_ip(ip);
    }
    audit_log!(storage, event);

    dispatcher.notify_submission_received(&registration).await;

    Ok(registration)
}

/// Decide a pending submission.
pub async fn decide(
    storage: &FileStorage,
    dispatcher: &NotificationDispatcher,
    registration_id: &str,
    decision: Decision,
    decided_by: &str,
) -> Result<DecisionOutcome, OnboardingError> {
    let repo = RegistrationRepository::new(storage);
    let mut registration = repo.get(registration_id)?;

    if registration.status != SubmissionStatus::Pending {
        return Err(OnboardingError::InvalidStateTransition(format!(
            "submission {registration_id} is not pending"
        )));
    }

    match decision {
        Decision::Approve => {
            // Decision first, provisioning second: a crash in between leaves
            // an approved submission that the retry path below resolves.
            registration.status = SubmissionStatus::Approved;
            registration.decided_by = Some(decided_by.to_string());
            registration.decided_at = Some(Utc::now());
            repo.update(&registration)?;

            audit_log!(
                storage,
                AuditEvent::new(AuditEventType::RegistrationApproved)
                    .with_account(decided_by)
                    .with_resource("registration", registration_id)
            );

            match super::provision(storage, &registration) {
                Ok(provisioned) => {
                    dispatcher
                        .notify_approved(&provisioned.account, &provisioned.initial_credential)
                        .await;
                    Ok(DecisionOutcome::Approved {
                        account_id: provisioned.account.id,
                        profile_id: Some(provisioned.profile.id),
                    })
                }
                Err(OnboardingError::AccountExists) => {
                    // Already provisioned by an earlier attempt
                    let account = AccountRepository::new(storage).get_by_submission(registration_id)?;
                    warn!(
                        registration_id,
                        account_id = %account.id,
                        "Submission already provisioned; reusing account"
                    );
                    let profile_id = ProfileRepository::new(storage)
                        .get_by_account(&account.id)
                        .map(|p| p.id)
                        .ok();
                    Ok(DecisionOutcome::Approved {
                        account_id: account.id,
                        profile_id,
                    })
                }
                Err(e) => Err(e),
            }
        }
        Decision::Reject { reason } => {
            let reason = reason.trim().to_string();
            if reason.is_empty() {
                return Err(OnboardingError::Validation(
                    "a rejection reason is required".to_string(),
                ));
            }

            registration.status = SubmissionStatus::Rejected;
            registration.decided_by = Some(decided_by.to_string());
            registration.decided_at = Some(Utc::now());
            registration.rejection_reason = Some(reason.clone());
            repo.update(&registration)?;

            info!(registration_id, "Registration rejected");
            audit_log!(
                storage,
                AuditEvent::new(AuditEventType::RegistrationRejected)
                    .with_account(decided_by)
                    .with_resource("registration", registration_id)
                    .with_details(serde_json::json!({ "reason": reason }))
            );

            dispatcher.notify_rejected(&registration, &reason).await;

            Ok(DecisionOutcome::Rejected)
        }
    }
}

fn validate_submission(new: &NewRegistration) -> Result<(), OnboardingError> {
    if new.representative_name.trim().is_empty() {
        return Err(OnboardingError::Validation(
            "representative name is required".to_string(),
        ));
    }
    if new.company_name.trim().is_empty() {
        return Err(OnboardingError::Validation(
            "company name is required".to_string(),
        ));
    }
    if new.territory.trim().is_empty() {
        return Err(OnboardingError::Validation(
            "territory is required".to_string(),
        ));
    }

    let email = canonical_email(&new.representative_email);
    let valid = email.len() >= 3
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@');
    if !valid {
        return Err(OnboardingError::Validation(
            "a valid contact email is required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Mailer;
    use crate::storage::StoragePaths;
    use std::env;
    use std::fs;

    fn test_storage() -> FileStorage {
        let test_dir = env::temp_dir().join(format!("test-registration-{}", uuid::Uuid::new_v4()));
        let paths = StoragePaths::new(&test_dir);
        let mut storage = FileStorage::new(paths);
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStorage) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn test_dispatcher(storage: &FileStorage) -> NotificationDispatcher {
        let (mailer, _) = Mailer::memory();
        NotificationDispatcher::for_tests(mailer, storage.clone(), Some("ops@portal.test"))
    }

    fn new_registration(email: &str) -> NewRegistration {
        NewRegistration {
            representative_name: "Jane Doe".to_string(),
            representative_email: email.to_string(),
            representative_phone: None,
            company_name: "Acme Equipment".to_string(),
            company_contact: None,
            territory: "Northwest".to_string(),
            services: ServiceFlags {
                sales: true,
                ..Default::default()
            },
            notes: None,
            origin_ip: Some("203.0.113.9".to_string()),
        }
    }

    #[test]
    fn canonical_email_normalizes() {
        assert_eq!(canonical_email("  Jane@Acme.TEST "), "jane@acme.test");
        // NFKC folds the fullwidth form to ASCII
        assert_eq!(canonical_email("ｊａｎｅ@acme.test"), "jane@acme.test");
    }

    #[test]
    fn email_key_is_stable_hex() {
        let key = email_key("jane@acme.test");
        assert_eq!(key.len(), 64);
        assert_eq!(key, email_key("jane@acme.test"));
        assert_ne!(key, email_key("john@acme.test"));
    }

    #[tokio::test]
    async fn submit_stores_pending_registration() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let registration = submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();

        assert_eq!(registration.status, SubmissionStatus::Pending);
        let loaded = RegistrationRepository::new(&storage)
            .get(&registration.id)
            .unwrap();
        assert_eq!(loaded.company_name, "Acme Equipment");

        cleanup(&storage);
    }

    #[tokio::test]
    async fn duplicate_submission_detected_across_spellings() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();

        let result = submit(&storage, &dispatcher, new_registration("  JANE@Acme.Test ")).await;
        assert!(matches!(result, Err(OnboardingError::DuplicateSubmission)));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn submit_rejects_invalid_email() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let result = submit(&storage, &dispatcher, new_registration("not-an-email")).await;
        assert!(matches!(result, Err(OnboardingError::Validation(_))));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn approve_provisions_account_and_draft_profile() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let registration = submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();

        let outcome = decide(
            &storage,
            &dispatcher,
            &registration.id,
            Decision::Approve,
            "admin-1",
        )
        .await
        .unwrap();

        let DecisionOutcome::Approved {
            account_id,
            profile_id,
        } = outcome
        else {
            panic!("expected approval");
        };

        let account = AccountRepository::new(&storage).get(&account_id).unwrap();
        assert!(account.must_rotate_credential);
        assert!(!account.agreement_accepted);
        assert_eq!(account.submission_id.as_deref(), Some(registration.id.as_str()));

        let profile = ProfileRepository::new(&storage)
            .get(&profile_id.unwrap())
            .unwrap();
        assert_eq!(profile.account_id, account_id);
        assert_eq!(
            profile.publication_state,
            crate::storage::PublicationState::Draft
        );

        let updated = RegistrationRepository::new(&storage)
            .get(&registration.id)
            .unwrap();
        assert_eq!(updated.status, SubmissionStatus::Approved);
        assert_eq!(updated.decided_by.as_deref(), Some("admin-1"));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn reject_requires_reason_and_records_it() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let registration = submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();

        let missing = decide(
            &storage,
            &dispatcher,
            &registration.id,
            Decision::Reject {
                reason: "  ".to_string(),
            },
            "admin-1",
        )
        .await;
        assert!(matches!(missing, Err(OnboardingError::Validation(_))));

        let outcome = decide(
            &storage,
            &dispatcher,
            &registration.id,
            Decision::Reject {
                reason: "Territory already covered".to_string(),
            },
            "admin-1",
        )
        .await
        .unwrap();
        assert_eq!(outcome, DecisionOutcome::Rejected);

        let updated = RegistrationRepository::new(&storage)
            .get(&registration.id)
            .unwrap();
        assert_eq!(updated.status, SubmissionStatus::Rejected);
        assert_eq!(
            updated.rejection_reason.as_deref(),
            Some("Territory already covered")
        );

        cleanup(&storage);
    }

    #[tokio::test]
    async fn decided_submission_cannot_be_decided_again() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let registration = submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();

        decide(
            &storage,
            &dispatcher,
            &registration.id,
            Decision::Approve,
            "admin-1",
        )
        .await
        .unwrap();

        let again = decide(
            &storage,
            &dispatcher,
            &registration.id,
            Decision::Reject {
                reason: "changed my mind".to_string(),
            },
            "admin-1",
        )
        .await;
        assert!(matches!(
            again,
            Err(OnboardingError::InvalidStateTransition(_))
        ));

        cleanup(&storage);
    }

    #[tokio::test]
    async fn rejected_email_can_submit_again() {
        let storage = test_storage();
        let dispatcher = test_dispatcher(&storage);

        let first = submit(&storage, &dispatcher, new_registration("jane@acme.test"))
            .await
            .unwrap();
        decide(
            &storage,
            &dispatcher,
            &first.id,
            Decision::Reject {
                reason: "incomplete".to_string(),
            },
            "admin-1",
        )
        .await
        .unwrap();

        let second = submit(&storage, &dispatcher, new_registration("jane@acme.test")).await;
        assert!(second.is_ok());

        cleanup(&storage);
    }
}
