// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ApiError,
    models::PublicProfileResponse,
    state::AppState,
    storage::{ProfileRepository, PublicationState},
};

#[utoipa::path(
    get,
    path = "/v1/profiles/{profile_id}",
    params(("profile_id" = String, Path, description = "Profile to fetch")),
    tag = "Profiles",
    responses(
        (status = 200, body = PublicProfileResponse),
        (status = 404, description = "Unknown or unpublished profile")
    )
)]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    let profile = ProfileRepository::new(&state.storage)
        .get(&profile_id)
        .map_err(|_| ApiError::not_found("Profile not found"))?;

    // Draft profiles are indistinguishable from missing ones externally
    if profile.publication_state != PublicationState::Published {
        return Err(ApiError::not_found("Profile not found"));
    }

    Ok(Json(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ServiceFlags, StoredProfile};
    use axum::http::StatusCode;
    use chrono::Utc;

    fn draft_profile(id: &str) -> StoredProfile {
        StoredProfile {
            id: id.to_string(),
            account_id: "acct-1".to_string(),
            company_name: "Acme Equipment".to_string(),
            address: Some("1 Main St".to_string()),
            phone: None,
            website: None,
            latitude: Some(45.52),
            longitude: Some(-122.68),
            services: ServiceFlags {
                sales: true,
                ..Default::default()
            },
            sub_locations: Vec::new(),
            publication_state: PublicationState::Draft,
            document_id: None,
            created_at: Utc::now(),
            published_at: None,
        }
    }

    #[tokio::test]
    async fn published_profile_is_served() {
        let state = AppState::for_tests();
        let repo = ProfileRepository::new(&state.storage);
        repo.create(&draft_profile("prof-1")).unwrap();
        repo.publish("prof-1").unwrap();

        let Json(response) = get_public_profile(State(state), Path("prof-1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.company_name, "Acme Equipment");
        assert!(response.published_at.is_some());
    }

    #[tokio::test]
    async fn draft_profile_reads_as_missing() {
        let state = AppState::for_tests();
        ProfileRepository::new(&state.storage)
            .create(&draft_profile("prof-1"))
            .unwrap();

        let error = get_public_profile(State(state), Path("prof-1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_profile_404s() {
        let state = AppState::for_tests();

        let error = get_public_profile(State(state), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
