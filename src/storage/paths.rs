// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the persistent storage layout.

use std::path::{Path, PathBuf};

/// Base directory for all persistent portal data.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the portal filesystem layout.
///
/// ```text
/// /data/
///   registrations/
///     {registration_id}.json
///     by-email/{email_key}.json       # active-submission uniqueness index
///   accounts/
///     {account_id}.json
///     by-email/{email_key}.json       # email -> account link
///     by-submission/{submission_id}.json  # provisioning idempotency link
///   profiles/
///     {profile_id}.json
///   agreements/
///     {account_id}.json               # acceptance record, single-use
///   documents/
///     {document_id}.json              # document metadata
///     {document_id}.html              # rendered agreement artifact
///   audit/
///     {date}/events.jsonl             # daily audit logs
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Registration Paths ==========

    /// Directory containing all registration submissions.
    pub fn registrations_dir(&self) -> PathBuf {
        self.root.join("registrations")
    }

    /// Path to a specific registration file.
    pub fn registration(&self, registration_id: &str) -> PathBuf {
        self.registrations_dir()
            .join(format!("{registration_id}.json"))
    }

    /// Directory holding the active-submission email index.
    pub fn registration_email_index_dir(&self) -> PathBuf {
        self.registrations_dir().join("by-email")
    }

    /// Path to the email index entry for a canonical email key.
    pub fn registration_email_index(&self, email_key: &str) -> PathBuf {
        self.registration_email_index_dir()
            .join(format!("{email_key}.json"))
    }

    // ========== Account Paths ==========

    /// Directory containing all accounts.
    pub fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    /// Path to a specific account file.
    pub fn account(&self, account_id: &str) -> PathBuf {
        self.accounts_dir().join(format!("{account_id}.json"))
    }

    /// Directory holding the email -> account links.
    pub fn account_email_index_dir(&self) -> PathBuf {
        self.accounts_dir().join("by-email")
    }

    /// Path to the email link for a canonical email key.
    pub fn account_email_index(&self, email_key: &str) -> PathBuf {
        self.account_email_index_dir()
            .join(format!("{email_key}.json"))
    }

    /// Directory holding the submission -> account provisioning links.
    pub fn account_submission_link_dir(&self) -> PathBuf {
        self.accounts_dir().join("by-submission")
    }

    /// Path to the provisioning link for a submission.
    pub fn account_submission_link(&self, submission_id: &str) -> PathBuf {
        self.account_submission_link_dir()
            .join(format!("{submission_id}.json"))
    }

    // ========== Profile Paths ==========

    /// Directory containing all dealer profiles.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Path to a specific profile file.
    pub fn profile(&self, profile_id: &str) -> PathBuf {
        self.profiles_dir().join(format!("{profile_id}.json"))
    }

    // ========== Agreement Paths ==========

    /// Directory containing agreement acceptance records.
    pub fn agreements_dir(&self) -> PathBuf {
        self.root.join("agreements")
    }

    /// Path to the acceptance record for an account.
    ///
    /// Keyed by account id: one acceptance per account, ever.
    pub fn agreement(&self, account_id: &str) -> PathBuf {
        self.agreements_dir().join(format!("{account_id}.json"))
    }

    // ========== Document Paths ==========

    /// Directory containing generated agreement documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Path to a document's metadata file.
    pub fn document_meta(&self, document_id: &str) -> PathBuf {
        self.documents_dir().join(format!("{document_id}.json"))
    }

    /// Path to a document's rendered artifact.
    pub fn document_file(&self, document_id: &str) -> PathBuf {
        self.documents_dir().join(format!("{document_id}.html"))
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
    }

    #[test]
    fn custom_root_for_testing() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(
            paths.registration("reg-123"),
            PathBuf::from("/tmp/test-data/registrations/reg-123.json")
        );
    }

    #[test]
    fn registration_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.registrations_dir(), PathBuf::from("/data/registrations"));
        assert_eq!(
            paths.registration_email_index("abc123"),
            PathBuf::from("/data/registrations/by-email/abc123.json")
        );
    }

    #[test]
    fn account_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.account("a1"), PathBuf::from("/data/accounts/a1.json"));
        assert_eq!(
            paths.account_submission_link("reg-1"),
            PathBuf::from("/data/accounts/by-submission/reg-1.json")
        );
        assert_eq!(
            paths.account_email_index("key1"),
            PathBuf::from("/data/accounts/by-email/key1.json")
        );
    }

    #[test]
    fn agreement_paths_keyed_by_account() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.agreement("acct-9"),
            PathBuf::from("/data/agreements/acct-9.json")
        );
    }

    #[test]
    fn document_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.document_meta("doc-1"),
            PathBuf::from("/data/documents/doc-1.json")
        );
        assert_eq!(
            paths.document_file("doc-1"),
            PathBuf::from("/data/documents/doc-1.html")
        );
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.audit_events_file("2026-01-28"),
            PathBuf::from("/data/audit/2026-01-28/events.jsonl")
        );
    }
}
