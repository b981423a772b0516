// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::{documents::DocumentGenerator, error::ApiError, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/documents/{document_id}",
    params(("document_id" = String, Path, description = "Document to fetch")),
    tag = "Documents",
    responses(
        (status = 200, description = "Rendered agreement document", content_type = "text/html"),
        (status = 404, description = "Unknown document")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Response, ApiError> {
    let generator = DocumentGenerator::new(&state.storage);
    let html = generator
        .read_html(&document_id)
        .map_err(|_| ApiError::not_found("Document not found"))?;

    Ok(([(CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::RenderRequest;
    use axum::http::StatusCode;
    use chrono::Utc;

    #[tokio::test]
    async fn serves_rendered_document_as_html() {
        let state = AppState::for_tests();
        let generator = DocumentGenerator::new(&state.storage);
        let document = generator
            .render(&RenderRequest {
                account_id: "acct-1",
                representative_name: "Jane Doe",
                representative_email: "jane@acme.test",
                company_name: "Acme Equipment",
                accepted_at: Utc::now(),
                origin_ip: None,
                signature_png: None,
                agreement_text: "Clause one.",
            })
            .unwrap();

        let response = get_document(State(state), Path(document.id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn unknown_document_404s() {
        let state = AppState::for_tests();

        let error = get_document(State(state), Path("nda-nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
