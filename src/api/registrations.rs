// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::{RegistrationResponse, SubmitRegistrationRequest},
    onboarding::{self, NewRegistration},
    state::AppState,
};

use super::ClientIp;

#[utoipa::path(
    post,
    path = "/v1/registrations",
    request_body = SubmitRegistrationRequest,
    tag = "Registrations",
    responses(
        (status = 201, body = RegistrationResponse),
        (status = 422, description = "Validation failed or an active registration exists for this email")
    )
)]
pub async fn submit_registration(
    State(state): State<AppState>,
    ClientIp(origin_ip): ClientIp,
    Json(request): Json<SubmitRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let new = NewRegistration {
        representative_name: request.representative_name,
        representative_email: request.representative_email,
        representative_phone: request.representative_phone,
        company_name: request.company_name,
        company_contact: request.company_contact,
        territory: request.territory,
        services: request.services,
        notes: request.notes,
        origin_ip,
    };

    let registration = onboarding::submit(&state.storage, &state.dispatcher, new).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            id: registration.id,
            status: registration.status,
            submitted_at: registration.submitted_at,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RegistrationRepository, ServiceFlags, SubmissionStatus};
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header::CONTENT_TYPE, Request};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn request(email: &str) -> SubmitRegistrationRequest {
        SubmitRegistrationRequest {
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
        }
    }

    #[tokio::test]
    async fn submit_returns_created_pending() {
        let state = AppState::for_tests();

        let (status, Json(response)) = submit_registration(
            State(state),
            ClientIp(None),
            Json(request("jane@acme.test")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.status, SubmissionStatus::Pending);
    }

    #[tokio::test]
    async fn duplicate_submission_is_unprocessable() {
        let state = AppState::for_tests();

        submit_registration(
            State(state.clone()),
            ClientIp(None),
            Json(request("jane@acme.test")),
        )
        .await
        .unwrap();

        let error = submit_registration(
            State(state),
            ClientIp(None),
            Json(request("Jane@ACME.test")),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn routed_request(with_connect_info: bool) -> Request<Body> {
        let body = serde_json::json!({
            "representative_name": "Jane Doe",
            "representative_email": "jane@acme.test",
            "company_name": "Acme Equipment",
            "territory": "Northwest",
        });
        let mut request = Request::builder()
            .method("POST")
            .uri("/v1/registrations")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        if with_connect_info {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 9], 4321))));
        }
        request
    }

    #[tokio::test]
    async fn routed_submission_records_origin_address() {
        let state = AppState::for_tests();

        let response = crate::api::router(state.clone())
            .oneshot(routed_request(true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let registrations = RegistrationRepository::new(&state.storage)
            .list_all()
            .unwrap();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].origin_ip.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn routed_submission_works_without_connect_info() {
        let state = AppState::for_tests();

        let response = crate::api::router(state.clone())
            .oneshot(routed_request(false))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let registrations = RegistrationRepository::new(&state.storage)
            .list_all()
            .unwrap();
        assert_eq!(registrations[0].origin_ip, None);
    }
}
