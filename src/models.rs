// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API request and response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::access::AccessState;
use crate::storage::{PublicationState, ServiceFlags, SubLocation, SubmissionStatus, StoredProfile};

/// A new registration submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitRegistrationRequest {
    /// Representative's full name
    pub representative_name: String,
    /// Representative's contact email
    pub representative_email: String,
    /// Representative's phone number
    pub representative_phone: Option<String>,
    /// Company name
    pub company_name: String,
    /// Company contact (switchboard, generic inbox)
    pub company_contact: Option<String>,
    /// Requested sales territory
    pub territory: String,
    /// Requested service lines
    #[serde(default)]
    pub services: ServiceFlags,
    /// Free-text notes
    pub notes: Option<String>,
}

/// A submitted registration, as returned to the applicant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

/// The decision an operator takes on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

/// Request body for deciding a submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub action: DecisionAction,
    /// Required when rejecting
    pub reason: Option<String>,
}

/// What a decision produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DecisionResponse {
    pub registration_id: String,
    pub status: SubmissionStatus,
    /// Set when the decision provisioned (or re-resolved) an account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Login request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub credential: String,
}

/// A minted session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Opaque bearer token
    pub token: String,
    pub account_id: String,
    pub access_state: AccessState,
}

/// Current access state of the session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessStateResponse {
    pub access_state: AccessState,
}

/// Request body for the credential rotation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RotateCredentialRequest {
    pub current_credential: String,
    pub new_credential: String,
}

/// Result of a credential rotation: every prior session is dead and the
/// returned token is the only valid one.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RotateCredentialResponse {
    pub token: String,
    pub access_state: AccessState,
}

/// Request body for accepting the agreement.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AcceptAgreementRequest {
    pub representative_name: String,
    pub company_name: String,
    /// Captured signature, base64 PNG
    pub signature_png: Option<String>,
}

/// The agreement page: text plus where this account stands.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgreementPageResponse {
    pub agreement_text: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Result of an acceptance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcceptAgreementResponse {
    pub accepted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub access_state: AccessState,
}

/// The gated portal landing payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PortalHomeResponse {
    pub account_id: String,
    pub display_name: String,
    pub company_name: String,
    pub access_state: AccessState,
}

/// Editable profile details.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Validated as an absolute URL when present
    pub website: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub services: Option<ServiceFlags>,
    pub sub_locations: Option<Vec<SubLocation>>,
}

/// A dealer profile as served publicly (published profiles only).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicProfileResponse {
    pub id: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub services: ServiceFlags,
    pub sub_locations: Vec<SubLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<StoredProfile> for PublicProfileResponse {
    fn from(profile: StoredProfile) -> Self {
        Self {
            id: profile.id,
            company_name: profile.company_name,
            address: profile.address,
            phone: profile.phone,
            website: profile.website,
            latitude: profile.latitude,
            longitude: profile.longitude,
            services: profile.services,
            sub_locations: profile.sub_locations,
            published_at: profile.published_at,
        }
    }
}

/// A profile as served to its owner, including publication state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnProfileResponse {
    #[serde(flatten)]
    pub profile: PublicProfileResponse,
    pub publication_state: PublicationState,
}

impl From<StoredProfile> for OwnProfileResponse {
    fn from(profile: StoredProfile) -> Self {
        let publication_state = profile.publication_state;
        Self {
            profile: profile.into(),
            publication_state,
        }
    }
}
