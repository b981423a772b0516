// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    access::ElevatedOnly,
    audit_log,
    error::ApiError,
    models::{DecisionAction, DecisionRequest, DecisionResponse},
    onboarding::{self, Decision, DecisionOutcome},
    state::AppState,
    storage::{
        AgreementRepository, AuditEvent, AuditEventType, AuditRepository, RegistrationRepository,
        StoredAcceptance, StoredRegistration, SubmissionStatus,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RegistrationListQuery {
    /// Filter by status (`pending`, `approved`, `rejected`)
    pub status: Option<SubmissionStatus>,
}

#[utoipa::path(
    get,
    path = "/v1/registrations",
    params(RegistrationListQuery),
    tag = "Admin",
    responses(
        (status = 200, body = [StoredRegistration]),
        (status = 403, description = "Elevated role required")
    )
)]
pub async fn list_registrations(
    ElevatedOnly(operator): ElevatedOnly,
    State(state): State<AppState>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<StoredRegistration>>, ApiError> {
    let repo = RegistrationRepository::new(&state.storage);
    let registrations = match query.status {
        Some(status) => repo.list_by_status(status)?,
        None => repo.list_all()?,
    };

    audit_log!(
        &state.storage,
        AuditEvent::new(AuditEventType::AdminAccess)
            .with_account(&operator.account_id)
            .with_resource("registration", "list")
    );

    Ok(Json(registrations))
}

#[utoipa::path(
    post,
    path = "/v1/registrations/{registration_id}/decision",
    params(("registration_id" = String, Path, description = "Submission to decide")),
    request_body = DecisionRequest,
    tag = "Admin",
    responses(
        (status = 200, body = DecisionResponse),
        (status = 404, description = "Unknown submission"),
        (status = 409, description = "Submission already decided"),
        (status = 422, description = "Missing rejection reason")
    )
)]
pub async fn decide_registration(
    ElevatedOnly(operator): ElevatedOnly,
    State(state): State<AppState>,
    Path(registration_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let decision = match request.action {
        DecisionAction::Approve => Decision::Approve,
        DecisionAction::Reject => Decision::Reject {
            reason: request.reason.unwrap_or_default(),
        },
    };

    let outcome = onboarding::decide(
        &state.storage,
        &state.dispatcher,
        &registration_id,
        decision,
        &operator.account_id,
    )
    .await?;

    let response = match outcome {
        DecisionOutcome::Approved {
            account_id,
            profile_id,
        } => DecisionResponse {
            registration_id,
            status: SubmissionStatus::Approved,
            account_id: Some(account_id),
            profile_id,
        },
        DecisionOutcome::Rejected => DecisionResponse {
            registration_id,
            status: SubmissionStatus::Rejected,
            account_id: None,
            profile_id: None,
        },
    };

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/accounts/{account_id}/acceptance",
    params(("account_id" = String, Path, description = "Account to inspect")),
    tag = "Admin",
    responses(
        (status = 200, body = StoredAcceptance),
        (status = 404, description = "No acceptance on record")
    )
)]
pub async fn get_acceptance(
    ElevatedOnly(operator): ElevatedOnly,
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<StoredAcceptance>, ApiError> {
    let acceptance = AgreementRepository::new(&state.storage)
        .get(&account_id)
        .map_err(|_| ApiError::not_found("No acceptance on record for this account"))?;

    audit_log!(
        &state.storage,
        AuditEvent::new(AuditEventType::AdminAccess)
            .with_account(&operator.account_id)
            .with_resource("agreement", &account_id)
    );

    Ok(Json(acceptance))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Start date, `YYYY-MM-DD`
    pub start_date: String,
    /// End date, `YYYY-MM-DD` (inclusive)
    pub end_date: String,
}

#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    params(AuditQuery),
    tag = "Admin",
    responses(
        (status = 200, body = [AuditEvent]),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn query_audit(
    ElevatedOnly(operator): ElevatedOnly,
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    let repo = AuditRepository::new(&state.storage);
    let events = repo
        .read_events_range(&query.start_date, &query.end_date)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    audit_log!(
        &state.storage,
        AuditEvent::new(AuditEventType::AdminAccess)
            .with_account(&operator.account_id)
            .with_resource("audit", format!("{}..{}", query.start_date, query.end_date))
    );

    Ok(Json(events))
}
