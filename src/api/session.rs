// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    access::{evaluate_access_state, resolve_session_account, Auth},
    audit_log,
    error::ApiError,
    models::{AccessStateResponse, LoginRequest, SessionResponse},
    onboarding::{self, verify_credential},
    state::AppState,
    storage::{AccountRepository, AuditEvent, AuditEventType},
};

#[utoipa::path(
    post,
    path = "/v1/session",
    request_body = LoginRequest,
    tag = "Session",
    responses(
        (status = 200, body = SessionResponse),
        (status = 401, description = "Unknown email or wrong credential")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let canonical = onboarding::canonical_email(&request.email);
    let key = onboarding::email_key(&canonical);

    let repo = AccountRepository::new(&state.storage);
    let account = match repo.get_by_email_key(&key) {
        Ok(account) => account,
        Err(_) => {
            // Same response as a wrong credential; the lookup result is not
            // revealed to the caller.
            audit_log!(
                &state.storage,
                AuditEvent::new(AuditEventType::AuthFailure)
                    .with_details(serde_json::json!({ "reason": "unknown_email" }))
                    .failed("unknown email")
            );
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "Invalid email or credential",
            ));
        }
    };

    if !verify_credential(&request.credential, &account.credential) {
        audit_log!(
            &state.storage,
            AuditEvent::new(AuditEventType::AuthFailure)
                .with_account(&account.id)
                .failed("credential mismatch")
        );
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid email or credential",
        ));
    }

    let session = state.sessions.create(&account).await;
    audit_log!(
        &state.storage,
        AuditEvent::new(AuditEventType::AuthSuccess).with_account(&account.id)
    );

    Ok(Json(SessionResponse {
        token: session.token,
        account_id: account.id.clone(),
        access_state: evaluate_access_state(Some(&account)),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/session",
    tag = "Session",
    responses((status = 204, description = "Session invalidated"))
)]
pub async fn logout(Auth(dealer): Auth, State(state): State<AppState>) -> StatusCode {
    state.sessions.invalidate(&dealer.session_token).await;
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/v1/session/access-state",
    tag = "Session",
    responses((status = 200, body = AccessStateResponse))
)]
pub async fn access_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<AccessStateResponse> {
    // No session is not an error here; it is the Anonymous state.
    let access_state = match resolve_session_account(&state, &headers).await {
        Ok((account, _)) => evaluate_access_state(Some(&account)),
        Err(_) => evaluate_access_state(None),
    };

    Json(AccessStateResponse { access_state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessState;
    use crate::onboarding::provision;
    use crate::storage::{ServiceFlags, StoredRegistration, SubmissionStatus};
    use chrono::Utc;

    fn provisioned(state: &AppState) -> (String, String) {
        let registration = StoredRegistration {
            id: "reg-1".to_string(),
            representative_name: "Jane Doe".to_string(),
            representative_email: "jane@acme.test".to_string(),
            representative_phone: None,
            company_name: "Acme Equipment".to_string(),
            company_contact: None,
            territory: "Northwest".to_string(),
            services: ServiceFlags::default(),
            notes: None,
            submitted_at: Utc::now(),
            origin_ip: None,
            status: SubmissionStatus::Approved,
            decided_by: Some("admin-1".to_string()),
            decided_at: Some(Utc::now()),
            rejection_reason: None,
        };
        let provisioned = provision(&state.storage, &registration).unwrap();
        (provisioned.account.id, provisioned.initial_credential)
    }

    #[tokio::test]
    async fn login_with_initial_credential_needs_rotation() {
        let state = AppState::for_tests();
        let (account_id, credential) = provisioned(&state);

        let Json(response) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "  Jane@ACME.test ".to_string(),
                credential,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.account_id, account_id);
        assert_eq!(response.access_state, AccessState::NeedsRotation);
        assert!(state.sessions.resolve(&response.token).await.is_some());
    }

    #[tokio::test]
    async fn login_with_wrong_credential_fails() {
        let state = AppState::for_tests();
        provisioned(&state);

        let error = login(
            State(state),
            Json(LoginRequest {
                email: "jane@acme.test".to_string(),
                credential: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_unknown_email_fails_identically() {
        let state = AppState::for_tests();

        let error = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@acme.test".to_string(),
                credential: "whatever".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.message, "Invalid email or credential");
    }

    #[tokio::test]
    async fn access_state_without_session_is_anonymous() {
        let state = AppState::for_tests();

        let Json(response) = access_state(State(state), HeaderMap::new()).await;
        assert_eq!(response.access_state, AccessState::Anonymous);
    }

    #[tokio::test]
    async fn access_state_reflects_session() {
        let state = AppState::for_tests();
        let (_, credential) = provisioned(&state);

        let Json(login_response) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "jane@acme.test".to_string(),
                credential,
            }),
        )
        .await
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", login_response.token).parse().unwrap(),
        );

        let Json(response) = access_state(State(state), headers).await;
        assert_eq!(response.access_state, AccessState::NeedsRotation);
    }
}
