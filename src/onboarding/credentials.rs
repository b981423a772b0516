// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential hashing, policy and the forced rotation.
//!
//! Credentials are stored as salted PBKDF2-HMAC-SHA256 hashes; the plaintext
//! never touches disk. Rotation bumps the account's session epoch and drops
//! every live session before returning, so the old credential and any session
//! minted under it die together.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::info;

use crate::access::{Session, SessionManager};
use crate::audit_log;
use crate::storage::{
    AccountRepository, AuditEvent, AuditEventType, CredentialHash, FileStorage, StoredAccount,
};

use super::OnboardingError;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const MIN_CREDENTIAL_CHARS: usize = 10;

/// Characters used for generated initial credentials. Ambiguous glyphs
/// (0/O, 1/l/I) are left out.
const CREDENTIAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";
const INITIAL_CREDENTIAL_LEN: usize = 16;

/// Check a candidate credential against the policy: at least 10 characters,
/// at least one letter and at least one digit.
pub fn validate_policy(credential: &str) -> Result<(), OnboardingError> {
    if credential.chars().count() < MIN_CREDENTIAL_CHARS {
        return Err(OnboardingError::PolicyViolation(format!(
            "credential must be at least {MIN_CREDENTIAL_CHARS} characters"
        )));
    }
    if !credential.chars().any(char::is_alphabetic) {
        return Err(OnboardingError::PolicyViolation(
            "credential must contain a letter".to_string(),
        ));
    }
    if !credential.chars().any(char::is_numeric) {
        return Err(OnboardingError::PolicyViolation(
            "credential must contain a digit".to_string(),
        ));
    }
    Ok(())
}

/// Derive a salted hash for a credential.
pub fn hash_credential(credential: &str) -> Result<CredentialHash, OnboardingError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| OnboardingError::Crypto)?;

    let mut derived = [0u8; HASH_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        credential.as_bytes(),
        &mut derived,
    );

    Ok(CredentialHash {
        salt: Base64::encode_string(&salt),
        hash: Base64::encode_string(&derived),
        iterations: PBKDF2_ITERATIONS.get(),
    })
}

/// Verify a credential against its stored hash (constant-time comparison).
pub fn verify_credential(credential: &str, stored: &CredentialHash) -> bool {
    let Ok(salt) = Base64::decode_vec(&stored.salt) else {
        return false;
    };
    let Ok(hash) = Base64::decode_vec(&stored.hash) else {
        return false;
    };
    let Some(iterations) = NonZeroU32::new(stored.iterations) else {
        return false;
    };

    pbkdf2::verify(PBKDF2_ALG, iterations, &salt, credential.as_bytes(), &hash).is_ok()
}

/// Generate a random initial credential that satisfies the policy.
pub fn generate_initial_credential() -> Result<String, OnboardingError> {
    let rng = SystemRandom::new();

    // The alphabet mixes letters and digits, so a draw without a digit (or
    // without a letter) is rare; redraw until the policy holds.
    loop {
        let mut bytes = [0u8; INITIAL_CREDENTIAL_LEN];
        rng.fill(&mut bytes).map_err(|_| OnboardingError::Crypto)?;

        let candidate: String = bytes
            .iter()
            .map(|b| CREDENTIAL_ALPHABET[*b as usize % CREDENTIAL_ALPHABET.len()] as char)
            .collect();

        if validate_policy(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
}

/// Rotate an account's credential.
///
/// Verifies the current credential, applies the policy to the new one,
/// persists the new hash, clears the rotation flag, bumps the session epoch
/// and drops every live session for the account. The returned session is the
/// only valid one afterwards.
pub async fn rotate_credential(
    storage: &FileStorage,
    sessions: &SessionManager,
    account_id: &str,
    current_credential: &str,
    new_credential: &str,
) -> Result<(StoredAccount, Session), OnboardingError> {
    let repo = AccountRepository::new(storage);
    let mut account = repo.get(account_id)?;

    if !verify_credential(current_credential, &account.credential) {
        audit_log!(
            storage,
            AuditEvent::new(AuditEventType::CredentialRotated)
                .with_account(account_id)
                .failed("current credential mismatch")
        );
        return Err(OnboardingError::InvalidCredential);
    }

    validate_policy(new_credential)?;

    account.credential = hash_credential(new_credential)?;
    account.must_rotate_credential = false;
    account.session_epoch += 1;
    repo.update(&account)?;

    let dropped = sessions.invalidate_account(&account.id).await;
    let session = sessions.create(&account).await;

    info!(account_id = %account.id, dropped_sessions = dropped, "Credential rotated");
    audit_log!(
        storage,
        AuditEvent::new(AuditEventType::CredentialRotated).with_account(&account.id)
    );

    Ok((account, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::storage::StoragePaths;
    use chrono::Utc;
    use std::env;
    use std::fs;

    fn test_storage() -> FileStorage {
        let test_dir = env::temp_dir().join(format!("test-credentials-{}", uuid::Uuid::new_v4()));
        let paths = StoragePaths::new(&test_dir);
        let mut storage = FileStorage::new(paths);
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStorage) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn seeded_account(storage: &FileStorage, credential: &str) -> StoredAccount {
        let account = StoredAccount {
            id: "acct-1".to_string(),
            email: "jane@acme.test".to_string(),
            canonical_email: "jane@acme.test".to_string(),
            display_name: "Jane Doe".to_string(),
            company_name: "Acme Equipment".to_string(),
            credential: hash_credential(credential).unwrap(),
            role: Role::Dealer,
            must_rotate_credential: true,
            agreement_accepted: false,
            session_epoch: 0,
            created_at: Utc::now(),
            submission_id: None,
        };
        AccountRepository::new(storage)
            .create(&account, "key1")
            .unwrap();
        account
    }

    #[test]
    fn policy_rejects_short_credentials() {
        assert!(matches!(
            validate_policy("abc123"),
            Err(OnboardingError::PolicyViolation(_))
        ));
    }

    #[test]
    fn policy_requires_letter_and_digit() {
        assert!(matches!(
            validate_policy("1234567890"),
            Err(OnboardingError::PolicyViolation(_))
        ));
        assert!(matches!(
            validate_policy("abcdefghij"),
            Err(OnboardingError::PolicyViolation(_))
        ));
        assert!(validate_policy("abcdefghi1").is_ok());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_credential("correct horse 1").unwrap();
        assert!(verify_credential("correct horse 1", &hash));
        assert!(!verify_credential("wrong horse 1", &hash));
    }

    #[test]
    fn same_credential_hashes_differently() {
        let a = hash_credential("correct horse 1").unwrap();
        let b = hash_credential("correct horse 1").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn generated_credential_satisfies_policy() {
        for _ in 0..10 {
            let credential = generate_initial_credential().unwrap();
            assert!(validate_policy(&credential).is_ok());
        }
    }

    #[tokio::test]
    async fn rotation_clears_flag_and_drops_sessions() {
        let storage = test_storage();
        let sessions = SessionManager::new();
        let account = seeded_account(&storage, "initial-pw-1");

        let old_session = sessions.create(&account).await;

        let (updated, new_session) = rotate_credential(
            &storage,
            &sessions,
            "acct-1",
            "initial-pw-1",
            "brand new pw 2",
        )
        .await
        .unwrap();

        assert!(!updated.must_rotate_credential);
        assert_eq!(updated.session_epoch, 1);
        assert!(verify_credential("brand new pw 2", &updated.credential));

        // The pre-rotation session is gone; the fresh one carries the new epoch
        assert!(sessions.resolve(&old_session.token).await.is_none());
        assert_eq!(
            sessions.resolve(&new_session.token).await.unwrap().epoch,
            1
        );

        cleanup(&storage);
    }

    #[tokio::test]
    async fn rotation_rejects_wrong_current_credential() {
        let storage = test_storage();
        let sessions = SessionManager::new();
        seeded_account(&storage, "initial-pw-1");

        let result = rotate_credential(&storage, &sessions, "acct-1", "nope", "brand new pw 2").await;
        assert!(matches!(result, Err(OnboardingError::InvalidCredential)));

        // Flag untouched
        let account = AccountRepository::new(&storage).get("acct-1").unwrap();
        assert!(account.must_rotate_credential);

        cleanup(&storage);
    }

    #[tokio::test]
    async fn rotation_enforces_policy_on_new_credential() {
        let storage = test_storage();
        let sessions = SessionManager::new();
        seeded_account(&storage, "initial-pw-1");

        let result = rotate_credential(&storage, &sessions, "acct-1", "initial-pw-1", "short1").await;
        assert!(matches!(result, Err(OnboardingError::PolicyViolation(_))));

        cleanup(&storage);
    }
}
