// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration submission repository.
//!
//! Submissions are the entry point of onboarding. Each is stored as a
//! separate JSON file under `registrations/`; an index file under
//! `registrations/by-email/` holds the current submission for a canonical
//! email and enforces the at-most-one-active-submission invariant.
//! Submissions are never deleted; they are the audit record of who applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

/// Lifecycle status of a registration submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting an admin decision
    Pending,
    /// Approved; an account has been (or is being) provisioned
    Approved,
    /// Rejected with a reason
    Rejected,
}

/// Service lines a dealer can request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServiceFlags {
    /// New equipment sales
    #[serde(default)]
    pub sales: bool,
    /// Maintenance and repair
    #[serde(default)]
    pub service: bool,
    /// Spare parts distribution
    #[serde(default)]
    pub parts: bool,
    /// Equipment rental
    #[serde(default)]
    pub rentals: bool,
}

/// A registration submission as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StoredRegistration {
    /// Unique submission identifier (UUID)
    pub id: String,
    /// Representative's full name
    pub representative_name: String,
    /// Representative's contact email (as typed)
    pub representative_email: String,
    /// Representative's phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_phone: Option<String>,
    /// Company name
    pub company_name: String,
    /// Company contact (switchboard, generic inbox)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_contact: Option<String>,
    /// Requested sales territory
    pub territory: String,
    /// Requested service lines
    #[serde(default)]
    pub services: ServiceFlags,
    /// Free-text notes from the applicant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the submission was received
    pub submitted_at: DateTime<Utc>,
    /// Network origin of the submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
    /// Current status
    pub status: SubmissionStatus,
    /// Who decided (account id of the operator)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    /// When the decision was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Rejection reason (set only for rejected submissions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl StoredRegistration {
    /// Whether this submission still blocks a new one for the same email.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            SubmissionStatus::Pending | SubmissionStatus::Approved
        )
    }
}

/// Contents of an email index entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailIndexEntry {
    registration_id: String,
    canonical_email: String,
}

/// Repository for registration submissions.
pub struct RegistrationRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> RegistrationRepository<'a> {
    /// Create a new RegistrationRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a registration exists.
    pub fn exists(&self, registration_id: &str) -> bool {
        self.storage
            .exists(self.storage.paths().registration(registration_id))
    }

    /// Get a registration by ID.
    pub fn get(&self, registration_id: &str) -> StorageResult<StoredRegistration> {
        let path = self.storage.paths().registration(registration_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Registration {registration_id}"
            )));
        }
        self.storage.read_json(path)
    }

    /// Get the registration currently indexed for a canonical email key.
    pub fn get_by_email_key(&self, email_key: &str) -> StorageResult<StoredRegistration> {
        let index_path = self.storage.paths().registration_email_index(email_key);
        if !self.storage.exists(&index_path) {
            return Err(StorageError::NotFound(format!(
                "Registration for email key {email_key}"
            )));
        }
        let entry: EmailIndexEntry = self.storage.read_json(index_path)?;
        self.get(&entry.registration_id)
    }

    /// Create a new registration, enforcing the one-active-per-email rule.
    ///
    /// The email index is claimed atomically; if the key is already taken by
    /// an active (pending/approved) submission, `AlreadyExists` is returned.
    /// A prior rejected submission releases the key to the new applicant.
    pub fn create(
        &self,
        registration: &StoredRegistration,
        email_key: &str,
        canonical_email: &str,
    ) -> StorageResult<()> {
        let index_path = self.storage.paths().registration_email_index(email_key);
        let entry = EmailIndexEntry {
            registration_id: registration.id.clone(),
            canonical_email: canonical_email.to_string(),
        };

        match self.storage.create_json_new(&index_path, &entry) {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => {
                // An index entry exists. Only an active submission blocks.
                match self.get_by_email_key(email_key) {
                    Ok(existing) if existing.is_active() => {
                        return Err(StorageError::AlreadyExists(format!(
                            "Active registration for {canonical_email}"
                        )));
                    }
                    // Rejected (or dangling index): take over the key.
                    _ => self.storage.write_json(&index_path, &entry)?,
                }
            }
            Err(e) => return Err(e),
        }

        self.storage
            .write_json(self.storage.paths().registration(&registration.id), registration)
    }

    /// Update an existing registration.
    pub fn update(&self, registration: &StoredRegistration) -> StorageResult<()> {
        let registration_id = &registration.id;

        if !self.exists(registration_id) {
            return Err(StorageError::NotFound(format!(
                "Registration {registration_id}"
            )));
        }

        self.storage
            .write_json(self.storage.paths().registration(registration_id), registration)
    }

    /// List all registrations.
    pub fn list_all(&self) -> StorageResult<Vec<StoredRegistration>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().registrations_dir(), "json")?;

        let mut registrations = Vec::new();
        for id in ids {
            if let Ok(registration) = self.get(&id) {
                registrations.push(registration);
            }
        }

        registrations.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(registrations)
    }

    /// List registrations with a given status.
    pub fn list_by_status(&self, status: SubmissionStatus) -> StorageResult<Vec<StoredRegistration>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.status == status)
            .collect())
    }
}
