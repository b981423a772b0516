// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Accounts are created by the provisioner from an approved submission and
//! never deleted; a declined dealer keeps the record with the role
//! reassigned. Two link files guard uniqueness:
//!
//! - `accounts/by-submission/{submission_id}.json` makes provisioning
//!   idempotent under retry (exactly one account per submission).
//! - `accounts/by-email/{email_key}.json` maps a canonical email to its
//!   account for login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::access::Role;

use super::super::{FileStorage, StorageError, StorageResult};

/// A salted credential hash (PBKDF2-HMAC-SHA256).
///
/// The plaintext credential is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CredentialHash {
    /// Per-account random salt, base64
    pub salt: String,
    /// Derived hash, base64
    pub hash: String,
    /// PBKDF2 iteration count used at derivation time
    pub iterations: u32,
}

/// An account as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StoredAccount {
    /// Unique account identifier (UUID)
    pub id: String,
    /// Contact email as typed at registration
    pub email: String,
    /// Canonical (normalized) email used for lookup
    pub canonical_email: String,
    /// Representative display name
    pub display_name: String,
    /// Company name
    pub company_name: String,
    /// Credential hash
    pub credential: CredentialHash,
    /// Account role
    pub role: Role,
    /// Whether the mandatory first-login credential rotation is outstanding
    pub must_rotate_credential: bool,
    /// Whether the legal agreement has been accepted
    pub agreement_accepted: bool,
    /// Monotonic counter; sessions minted before the current epoch are dead
    pub session_epoch: u64,
    /// When the account was provisioned
    pub created_at: DateTime<Utc>,
    /// Submission this account was provisioned from (absent for seeded operators)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// Contents of a submission -> account link file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubmissionLink {
    account_id: String,
}

/// Contents of an email -> account link file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailLink {
    account_id: String,
}

/// Repository for account operations.
pub struct AccountRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if an account exists.
    pub fn exists(&self, account_id: &str) -> bool {
        self.storage.exists(self.storage.paths().account(account_id))
    }

    /// Get an account by ID.
    pub fn get(&self, account_id: &str) -> StorageResult<StoredAccount> {
        let path = self.storage.paths().account(account_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Account {account_id}")));
        }
        self.storage.read_json(path)
    }

    /// Get an account by canonical email key.
    pub fn get_by_email_key(&self, email_key: &str) -> StorageResult<StoredAccount> {
        let link_path = self.storage.paths().account_email_index(email_key);
        if !self.storage.exists(&link_path) {
            return Err(StorageError::NotFound(format!(
                "Account for email key {email_key}"
            )));
        }
        let link: EmailLink = self.storage.read_json(link_path)?;
        self.get(&link.account_id)
    }

    /// Get the account provisioned from a submission, if any.
    pub fn get_by_submission(&self, submission_id: &str) -> StorageResult<StoredAccount> {
        let link_path = self.storage.paths().account_submission_link(submission_id);
        if !self.storage.exists(&link_path) {
            return Err(StorageError::NotFound(format!(
                "Account for submission {submission_id}"
            )));
        }
        let link: SubmissionLink = self.storage.read_json(link_path)?;
        self.get(&link.account_id)
    }

    /// Create a new account, claiming its uniqueness links atomically.
    ///
    /// If the account carries a submission id, the submission link is claimed
    /// first; a second provisioning attempt for the same submission observes
    /// `AlreadyExists` without creating anything. The email link is claimed
    /// next, so one email maps to at most one account.
    pub fn create(&self, account: &StoredAccount, email_key: &str) -> StorageResult<()> {
        if let Some(submission_id) = &account.submission_id {
            let link_path = self.storage.paths().account_submission_link(submission_id);
            self.storage.create_json_new(
                &link_path,
                &SubmissionLink {
                    account_id: account.id.clone(),
                },
            )?;
        }

        let email_path = self.storage.paths().account_email_index(email_key);
        self.storage.create_json_new(
            &email_path,
            &EmailLink {
                account_id: account.id.clone(),
            },
        )?;

        self.storage
            .write_json(self.storage.paths().account(&account.id), account)
    }

    /// Update an existing account.
    pub fn update(&self, account: &StoredAccount) -> StorageResult<()> {
        let account_id = &account.id;

        if !self.exists(account_id) {
            return Err(StorageError::NotFound(format!("Account {account_id}")));
        }

        self.storage
            .write_json(self.storage.paths().account(account_id), account)
    }

    /// List all accounts (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredAccount>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().accounts_dir(), "json")?;

        let mut accounts = Vec::new();
        for id in ids {
            if let Ok(account) = self.get(&id) {
                accounts.push(account);
            }
        }

        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(accounts)
    }
}
