// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Module
//!
//! Route assembly for the three surfaces: `/v1` (non-interactive API, never
//! gated), `/portal` (interactive dealer surface behind the access gate) and
//! `/health`. Swagger UI is served at `/docs`.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    access::{access_gate, AccessState, AuthenticatedDealer, Role},
    models::{
        AcceptAgreementRequest, AcceptAgreementResponse, AccessStateResponse,
        AgreementPageResponse, DecisionRequest, DecisionResponse, LoginRequest,
        OwnProfileResponse, PortalHomeResponse, PublicProfileResponse, RegistrationResponse,
        RotateCredentialRequest, RotateCredentialResponse, SessionResponse,
        SubmitRegistrationRequest, UpdateProfileRequest,
    },
    state::AppState,
    storage::{
        AuditEvent, ServiceFlags, StoredAcceptance, StoredRegistration, SubLocation,
        SubmissionStatus,
    },
};

/// Origin address of the request, when the transport provides one.
///
/// Handlers that record origin addresses take this instead of requiring
/// [`ConnectInfo`], so they also work where connect info is not wired in.
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        ))
    }
}

pub mod admin;
pub mod documents;
pub mod health;
pub mod portal;
pub mod profiles;
pub mod registrations;
pub mod session;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/registrations",
            post(registrations::submit_registration).get(admin::list_registrations),
        )
        .route(
            "/registrations/{registration_id}/decision",
            post(admin::decide_registration),
        )
        .route("/session", post(session::login).delete(session::logout))
        .route("/session/access-state", get(session::access_state))
        .route("/profiles/{profile_id}", get(profiles::get_public_profile))
        .route(
            "/accounts/{account_id}/acceptance",
            get(admin::get_acceptance),
        )
        .route("/documents/{document_id}", get(documents::get_document))
        .route("/admin/audit", get(admin::query_audit));

    let portal_routes = Router::new()
        .route("/home", get(portal::home))
        .route(
            "/credentials",
            get(portal::credentials_page).post(portal::rotate_credentials),
        )
        .route(
            "/agreement",
            get(portal::agreement_page).post(portal::accept_agreement),
        )
        .route(
            "/profile",
            get(portal::own_profile).put(portal::update_profile),
        );

    Router::new()
        .nest("/v1", v1_routes)
        .nest("/portal", portal_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::health))
        .route("/health/ready", get(health::ready))
        // The gate decides per request path; /v1 and /health pass through
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        registrations::submit_registration,
        admin::list_registrations,
        admin::decide_registration,
        admin::get_acceptance,
        admin::query_audit,
        session::login,
        session::logout,
        session::access_state,
        profiles::get_public_profile,
        documents::get_document,
        portal::home,
        portal::credentials_page,
        portal::rotate_credentials,
        portal::agreement_page,
        portal::accept_agreement,
        portal::own_profile,
        portal::update_profile,
        health::health,
        health::ready
    ),
    components(
        schemas(
            SubmitRegistrationRequest,
            RegistrationResponse,
            StoredRegistration,
            SubmissionStatus,
            ServiceFlags,
            SubLocation,
            DecisionRequest,
            DecisionResponse,
            LoginRequest,
            SessionResponse,
            AccessStateResponse,
            AccessState,
            Role,
            AuthenticatedDealer,
            RotateCredentialRequest,
            RotateCredentialResponse,
            AgreementPageResponse,
            AcceptAgreementRequest,
            AcceptAgreementResponse,
            StoredAcceptance,
            PortalHomeResponse,
            PublicProfileResponse,
            OwnProfileResponse,
            UpdateProfileRequest,
            AuditEvent,
            portal::CredentialsPageResponse,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    tags(
        (name = "Registrations", description = "Dealer registration intake"),
        (name = "Admin", description = "Submission decisions and audit access"),
        (name = "Session", description = "Login, logout and access state"),
        (name = "Profiles", description = "Published dealer profiles"),
        (name = "Documents", description = "Generated agreement documents"),
        (name = "Portal", description = "Gated dealer portal"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;
