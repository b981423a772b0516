// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Agreement acceptance repository.
//!
//! One acceptance record per account, ever. The record is the authoritative
//! legal event: it is claimed with an atomic create-if-absent write keyed by
//! account id, so a double-click, a replay, or a concurrent request from
//! another process observes `AlreadyExists` instead of writing a second
//! record. After creation the record is immutable except for linking the
//! generated document id once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

/// An agreement acceptance record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StoredAcceptance {
    /// Owning account
    pub account_id: String,
    /// Representative name as entered at signing time
    pub representative_name: String,
    /// Company name as entered at signing time
    pub company_name: String,
    /// Captured signature bitmap, base64 PNG (absent on the degraded path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_png: Option<String>,
    /// When the agreement was accepted
    pub accepted_at: DateTime<Utc>,
    /// Originating IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
    /// User-agent string of the accepting request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Generated agreement document, linked after rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Repository for agreement acceptance records.
pub struct AgreementRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AgreementRepository<'a> {
    /// Create a new AgreementRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check whether an account has an acceptance record.
    pub fn exists(&self, account_id: &str) -> bool {
        self.storage.exists(self.storage.paths().agreement(account_id))
    }

    /// Get the acceptance record for an account.
    pub fn get(&self, account_id: &str) -> StorageResult<StoredAcceptance> {
        let path = self.storage.paths().agreement(account_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Acceptance for account {account_id}"
            )));
        }
        self.storage.read_json(path)
    }

    /// Create the acceptance record for an account.
    ///
    /// Single-use: the path claim is atomic, so exactly one concurrent
    /// caller wins and the rest observe `AlreadyExists`.
    pub fn create(&self, acceptance: &StoredAcceptance) -> StorageResult<()> {
        let path = self.storage.paths().agreement(&acceptance.account_id);
        self.storage.create_json_new(&path, acceptance)
    }

    /// Link the generated document to an existing acceptance record.
    ///
    /// The only permitted mutation, and only while no document is linked;
    /// re-running document generation against the same record is a no-op.
    pub fn attach_document(&self, account_id: &str, document_id: &str) -> StorageResult<()> {
        let mut acceptance = self.get(account_id)?;

        if acceptance.document_id.is_some() {
            return Ok(());
        }

        acceptance.document_id = Some(document_id.to_string());
        self.storage
            .write_json(self.storage.paths().agreement(account_id), &acceptance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, StoragePaths};
    use std::env;
    use std::fs;

    fn test_storage() -> FileStorage {
        let test_dir = env::temp_dir().join(format!("test-agr-repo-{}", uuid::Uuid::new_v4()));
        let paths = StoragePaths::new(&test_dir);
        let mut storage = FileStorage::new(paths);
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStorage) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn test_acceptance(account_id: &str) -> StoredAcceptance {
        StoredAcceptance {
            account_id: account_id.to_string(),
            representative_name: "Jane Doe".to_string(),
            company_name: "Acme Equipment".to_string(),
            signature_png: Some("iVBORw0KGgo=".to_string()),
            accepted_at: Utc::now(),
            origin_ip: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            document_id: None,
        }
    }

    #[test]
    fn create_and_get_acceptance() {
        let storage = test_storage();
        let repo = AgreementRepository::new(&storage);

        let acceptance = test_acceptance("acct-1");
        repo.create(&acceptance).unwrap();

        let loaded = repo.get("acct-1").unwrap();
        assert_eq!(loaded, acceptance);

        cleanup(&storage);
    }

    #[test]
    fn second_acceptance_rejected() {
        let storage = test_storage();
        let repo = AgreementRepository::new(&storage);

        repo.create(&test_acceptance("acct-1")).unwrap();

        let result = repo.create(&test_acceptance("acct-1"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        cleanup(&storage);
    }

    #[test]
    fn attach_document_links_once() {
        let storage = test_storage();
        let repo = AgreementRepository::new(&storage);

        repo.create(&test_acceptance("acct-1")).unwrap();
        repo.attach_document("acct-1", "doc-1").unwrap();

        // A retry against the same record keeps the first link
        repo.attach_document("acct-1", "doc-2").unwrap();

        let loaded = repo.get("acct-1").unwrap();
        assert_eq!(loaded.document_id.as_deref(), Some("doc-1"));

        cleanup(&storage);
    }

    #[test]
    fn missing_acceptance_not_found() {
        let storage = test_storage();
        let repo = AgreementRepository::new(&storage);

        let result = repo.get("nobody");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!repo.exists("nobody"));

        cleanup(&storage);
    }
}
