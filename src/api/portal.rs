// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Handlers for the gated `/portal/*` surface.
//!
//! The access gate middleware has already run for every route here except
//! the credentials and agreement pages, which stay reachable while their
//! requirement is outstanding.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    access::{evaluate_access_state, Auth},
    error::ApiError,
    models::{
        AcceptAgreementRequest, AcceptAgreementResponse, AgreementPageResponse, OwnProfileResponse,
        PortalHomeResponse, RotateCredentialRequest, RotateCredentialResponse,
        UpdateProfileRequest,
    },
    onboarding::{self, AcceptanceRequest},
    state::AppState,
    storage::{AccountRepository, AgreementRepository, ProfileRepository},
};

use super::ClientIp;

/// The credentials page: whether a rotation is outstanding.
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialsPageResponse {
    pub must_rotate_credential: bool,
}

#[utoipa::path(
    get,
    path = "/portal/home",
    tag = "Portal",
    responses((status = 200, body = PortalHomeResponse))
)]
pub async fn home(
    Auth(dealer): Auth,
    State(state): State<AppState>,
) -> Result<Json<PortalHomeResponse>, ApiError> {
    let account = AccountRepository::new(&state.storage).get(&dealer.account_id)?;

    Ok(Json(PortalHomeResponse {
        account_id: account.id.clone(),
        display_name: account.display_name.clone(),
        company_name: account.company_name.clone(),
        access_state: evaluate_access_state(Some(&account)),
    }))
}

#[utoipa::path(
    get,
    path = "/portal/credentials",
    tag = "Portal",
    responses((status = 200, body = CredentialsPageResponse))
)]
pub async fn credentials_page(
    Auth(dealer): Auth,
    State(state): State<AppState>,
) -> Result<Json<CredentialsPageResponse>, ApiError> {
    let account = AccountRepository::new(&state.storage).get(&dealer.account_id)?;

    Ok(Json(CredentialsPageResponse {
        must_rotate_credential: account.must_rotate_credential,
    }))
}

#[utoipa::path(
    post,
    path = "/portal/credentials",
    request_body = RotateCredentialRequest,
    tag = "Portal",
    responses(
        (status = 200, body = RotateCredentialResponse),
        (status = 401, description = "Current credential is wrong"),
        (status = 422, description = "New credential violates the policy")
    )
)]
pub async fn rotate_credentials(
    Auth(dealer): Auth,
    State(state): State<AppState>,
    Json(request): Json<RotateCredentialRequest>,
) -> Result<Json<RotateCredentialResponse>, ApiError> {
    let (account, session) = onboarding::rotate_credential(
        &state.storage,
        &state.sessions,
        &dealer.account_id,
        &request.current_credential,
        &request.new_credential,
    )
    .await?;

    Ok(Json(RotateCredentialResponse {
        token: session.token,
        access_state: evaluate_access_state(Some(&account)),
    }))
}

#[utoipa::path(
    get,
    path = "/portal/agreement",
    tag = "Portal",
    responses((status = 200, body = AgreementPageResponse))
)]
pub async fn agreement_page(
    Auth(dealer): Auth,
    State(state): State<AppState>,
) -> Result<Json<AgreementPageResponse>, ApiError> {
    // Readable before and after acceptance
    let acceptance = AgreementRepository::new(&state.storage)
        .get(&dealer.account_id)
        .ok();

    Ok(Json(AgreementPageResponse {
        agreement_text: state.agreement_text.as_ref().clone(),
        accepted: acceptance.is_some(),
        accepted_at: acceptance.as_ref().map(|a| a.accepted_at),
        document_id: acceptance.and_then(|a| a.document_id),
    }))
}

#[utoipa::path(
    post,
    path = "/portal/agreement",
    request_body = AcceptAgreementRequest,
    tag = "Portal",
    responses(
        (status = 200, body = AcceptAgreementResponse),
        (status = 409, description = "Already accepted"),
        (status = 422, description = "Missing names")
    )
)]
pub async fn accept_agreement(
    Auth(dealer): Auth,
    State(state): State<AppState>,
    ClientIp(origin_ip): ClientIp,
    headers: HeaderMap,
    Json(request): Json<AcceptAgreementRequest>,
) -> Result<Json<AcceptAgreementResponse>, ApiError> {
    let acceptance_request = AcceptanceRequest {
        representative_name: request.representative_name,
        company_name: request.company_name,
        signature_png: request.signature_png,
        origin_ip,
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let outcome = onboarding::accept_agreement(
        &state.storage,
        &state.dispatcher,
        &state.agreement_text,
        &dealer.account_id,
        acceptance_request,
    )
    .await?;

    let account = AccountRepository::new(&state.storage).get(&dealer.account_id)?;

    Ok(Json(AcceptAgreementResponse {
        accepted_at: outcome.acceptance.accepted_at,
        document_id: outcome.acceptance.document_id,
        access_state: evaluate_access_state(Some(&account)),
    }))
}

#[utoipa::path(
    get,
    path = "/portal/profile",
    tag = "Portal",
    responses(
        (status = 200, body = OwnProfileResponse),
        (status = 404, description = "No profile for this account")
    )
)]
pub async fn own_profile(
    Auth(dealer): Auth,
    State(state): State<AppState>,
) -> Result<Json<OwnProfileResponse>, ApiError> {
    let profile = ProfileRepository::new(&state.storage)
        .get_by_account(&dealer.account_id)
        .map_err(|_| ApiError::not_found("No profile for this account"))?;

    Ok(Json(profile.into()))
}

#[utoipa::path(
    put,
    path = "/portal/profile",
    request_body = UpdateProfileRequest,
    tag = "Portal",
    responses(
        (status = 200, body = OwnProfileResponse),
        (status = 422, description = "Invalid website URL or coordinates")
    )
)]
pub async fn update_profile(
    Auth(dealer): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<OwnProfileResponse>, ApiError> {
    if let Some(website) = &request.website {
        let parsed = url::Url::parse(website)
            .map_err(|_| ApiError::unprocessable("website must be an absolute URL"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ApiError::unprocessable("website must be an http(s) URL"));
        }
    }
    if let Some(latitude) = request.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ApiError::unprocessable("latitude out of range"));
        }
    }
    if let Some(longitude) = request.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ApiError::unprocessable("longitude out of range"));
        }
    }

    let repo = ProfileRepository::new(&state.storage);
    let mut profile = repo
        .get_by_account(&dealer.account_id)
        .map_err(|_| ApiError::not_found("No profile for this account"))?;

    // Publication state is not editable here; only company-facing details are.
    if request.address.is_some() {
        profile.address = request.address;
    }
    if request.phone.is_some() {
        profile.phone = request.phone;
    }
    if request.website.is_some() {
        profile.website = request.website;
    }
    if request.latitude.is_some() {
        profile.latitude = request.latitude;
    }
    if request.longitude.is_some() {
        profile.longitude = request.longitude;
    }
    if let Some(services) = request.services {
        profile.services = services;
    }
    if let Some(sub_locations) = request.sub_locations {
        profile.sub_locations = sub_locations;
    }

    repo.update(&profile)?;

    Ok(Json(profile.into()))
}
