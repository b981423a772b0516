// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The access gate.
//!
//! Every `/portal/*` request is checked against the account's onboarding
//! state. A dealer with an outstanding requirement is redirected (303) to
//! the page that resolves it; rotation outranks the agreement. The
//! credentials and agreement pages themselves are never gated, otherwise a
//! dealer could not clear the requirement. `/v1/*` is the non-interactive
//! surface and bypasses the gate entirely.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::StoredAccount;

use super::extractor::{resolve_session_account, AuthenticatedDealer};

/// Portal page that clears an outstanding rotation.
pub const ROTATION_PATH: &str = "/portal/credentials";
/// Portal page that clears an outstanding agreement.
pub const AGREEMENT_PATH: &str = "/portal/agreement";

/// Where a request stands with respect to onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessState {
    /// No valid session
    Anonymous,
    /// Mandatory credential rotation is outstanding
    NeedsRotation,
    /// Legal agreement has not been accepted
    NeedsAgreement,
    /// Fully onboarded (or elevated)
    Active,
}

/// Classify an account's access state.
///
/// Checks run in a fixed order: the elevated bypass is decided before any
/// onboarding flag, and rotation is decided before the agreement, so an
/// account with both outstanding is sent to rotation first.
pub fn evaluate_access_state(account: Option<&StoredAccount>) -> AccessState {
    let Some(account) = account else {
        return AccessState::Anonymous;
    };

    if account.role.is_elevated() {
        return AccessState::Active;
    }

    if account.must_rotate_credential {
        return AccessState::NeedsRotation;
    }

    if !account.agreement_accepted {
        return AccessState::NeedsAgreement;
    }

    AccessState::Active
}

/// Check whether a path bypasses the gate.
///
/// Anything outside `/portal` is exempt, as are the two pages that clear
/// outstanding requirements. The agreement page stays reachable after
/// acceptance.
pub fn is_gate_exempt(path: &str) -> bool {
    if !path.starts_with("/portal") {
        return true;
    }
    path == ROTATION_PATH || path == AGREEMENT_PATH
}

/// Gate middleware.
///
/// Applied across the whole app; non-portal paths pass straight through.
/// Gated requests that resolve to a fully active account get the identity
/// inserted into request extensions so handlers don't resolve it twice.
pub async fn access_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if is_gate_exempt(&path) {
        return next.run(req).await;
    }

    let (account, token) = match resolve_session_account(&state, req.headers()).await {
        Ok(resolved) => resolved,
        Err(err) => return err.into_response(),
    };

    match evaluate_access_state(Some(&account)) {
        AccessState::NeedsRotation => {
            tracing::debug!(account_id = %account.id, %path, "Gate: rotation outstanding");
            Redirect::to(ROTATION_PATH).into_response()
        }
        AccessState::NeedsAgreement => {
            tracing::debug!(account_id = %account.id, %path, "Gate: agreement outstanding");
            Redirect::to(AGREEMENT_PATH).into_response()
        }
        AccessState::Active | AccessState::Anonymous => {
            req.extensions_mut().insert(AuthenticatedDealer {
                account_id: account.id,
                email: account.email,
                display_name: account.display_name,
                role: account.role,
                session_token: token,
            });
            next.run(req).await
        }
    }
}
