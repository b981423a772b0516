// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated dealers.
//!
//! Use the `Auth` extractor in handlers to require a live session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(dealer): Auth) -> impl IntoResponse {
//!     // dealer is AuthenticatedDealer
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::{AccountRepository, StorageError, StoredAccount};

use super::{AuthError, Role};

/// The authenticated identity behind a request.
///
/// Built fresh per request from the session and the persisted account, so
/// gate decisions always see current flags rather than login-time state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedDealer {
    /// Account ID
    pub account_id: String,
    /// Contact email
    pub email: String,
    /// Representative display name
    pub display_name: String,
    /// Account role
    pub role: Role,
    /// Bearer token of the current session (not serialized)
    #[serde(skip)]
    pub session_token: String,
}

impl AuthenticatedDealer {
    /// Check if this identity is an elevated operator.
    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Resolve a request's bearer token to its account.
///
/// The session must exist and its epoch must match the account's current
/// `session_epoch`; a session minted before a credential rotation fails with
/// `SessionRevoked`.
pub async fn resolve_session_account(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(StoredAccount, String), AuthError> {
    let token = bearer_token(headers)?;

    let session = state
        .sessions
        .resolve(token)
        .await
        .ok_or(AuthError::UnknownSession)?;

    let repo = AccountRepository::new(&state.storage);
    let account = repo.get(&session.account_id).map_err(|e| match e {
        StorageError::NotFound(_) => AuthError::AccountMissing(session.account_id.clone()),
        other => AuthError::InternalError(other.to_string()),
    })?;

    if session.epoch != account.session_epoch {
        return Err(AuthError::SessionRevoked);
    }

    Ok((account, token.to_string()))
}

/// Extractor for authenticated dealers.
pub struct Auth(pub AuthenticatedDealer);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // The gate middleware may have resolved the identity already
        if let Some(dealer) = parts.extensions.get::<AuthenticatedDealer>().cloned() {
            return Ok(Auth(dealer));
        }

        let (account, token) = resolve_session_account(state, &parts.headers).await?;

        Ok(Auth(AuthenticatedDealer {
            account_id: account.id,
            email: account.email,
            display_name: account.display_name,
            role: account.role,
            session_token: token,
        }))
    }
}

/// Extractor that requires an elevated operator.
pub struct ElevatedOnly(pub AuthenticatedDealer);

impl FromRequestParts<AppState> for ElevatedOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(dealer) = Auth::from_request_parts(parts, state).await?;

        if !dealer.is_elevated() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(ElevatedOnly(dealer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CredentialHash;
    use axum::http::Request;
    use chrono::Utc;

    fn test_state() -> AppState {
        AppState::for_tests()
    }

    fn stored_account(id: &str, role: Role) -> StoredAccount {
        StoredAccount {
            id: id.to_string(),
            email: "jane@acme.test".to_string(),
            canonical_email: "jane@acme.test".to_string(),
            display_name: "Jane Doe".to_string(),
            company_name: "Acme Equipment".to_string(),
            credential: CredentialHash {
                salt: "c2FsdA==".to_string(),
                hash: "aGFzaA==".to_string(),
                iterations: 100_000,
            },
            role,
            must_rotate_credential: false,
            agreement_accepted: true,
            session_epoch: 0,
            created_at: Utc::now(),
            submission_id: None,
        }
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_resolves_live_session() {
        let state = test_state();
        let account = stored_account("acct-1", Role::Dealer);
        AccountRepository::new(&state.storage)
            .create(&account, "key1")
            .unwrap();
        let session = state.sessions.create(&account).await;

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {}", session.token))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(dealer) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(dealer.account_id, "acct-1");
        assert_eq!(dealer.role, Role::Dealer);
    }

    #[tokio::test]
    async fn stale_epoch_session_is_revoked() {
        let state = test_state();
        let mut account = stored_account("acct-1", Role::Dealer);
        let repo = AccountRepository::new(&state.storage);
        repo.create(&account, "key1").unwrap();
        let session = state.sessions.create(&account).await;

        // Rotation bumps the epoch after the session was minted
        account.session_epoch += 1;
        repo.update(&account).unwrap();

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {}", session.token))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::SessionRevoked)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let dealer = AuthenticatedDealer {
            account_id: "from_middleware".to_string(),
            email: "ops@portal.test".to_string(),
            display_name: "Ops".to_string(),
            role: Role::Elevated,
            session_token: String::new(),
        };
        parts.extensions.insert(dealer.clone());

        let Auth(resolved) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(resolved.account_id, "from_middleware");
    }

    #[tokio::test]
    async fn elevated_only_rejects_dealer() {
        let state = test_state();
        let account = stored_account("acct-1", Role::Dealer);
        AccountRepository::new(&state.storage)
            .create(&account, "key1")
            .unwrap();
        let session = state.sessions.create(&account).await;

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {}", session.token))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = ElevatedOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }
}
