// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::onboarding::OnboardingError;
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<OnboardingError> for ApiError {
    fn from(e: OnboardingError) -> Self {
        match &e {
            OnboardingError::Validation(_) | OnboardingError::PolicyViolation(_) => {
                ApiError::unprocessable(e.to_string())
            }
            OnboardingError::DuplicateSubmission => ApiError::unprocessable(e.to_string()),
            OnboardingError::AccountExists | OnboardingError::AlreadyAccepted => {
                ApiError::conflict(e.to_string())
            }
            OnboardingError::InvalidStateTransition(_) => ApiError::conflict(e.to_string()),
            OnboardingError::InvalidCredential => {
                ApiError::new(StatusCode::UNAUTHORIZED, e.to_string())
            }
            OnboardingError::Crypto => ApiError::internal(e.to_string()),
            OnboardingError::Storage(storage) => match storage {
                StorageError::NotFound(_) => ApiError::not_found(storage.to_string()),
                _ => ApiError::internal(storage.to_string()),
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match &e {
            StorageError::NotFound(_) => ApiError::not_found(e.to_string()),
            StorageError::AlreadyExists(_) => ApiError::conflict(e.to_string()),
            _ => ApiError::internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
