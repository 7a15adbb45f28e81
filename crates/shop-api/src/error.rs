//! # API Errors
//!
//! Every handler returns `Result<_, ApiError>`. Errors are rendered as
//! `{ "error": "...", "code": <status> }`. Server-side failures are logged
//! and answered with a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use shop_core::{PaymentError, ShopError};

use crate::auth::AuthError;
use crate::checkout::CheckoutError;
use crate::db::RepositoryError;
use crate::mail::MailError;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid request")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error("email is not configured")]
    MailUnavailable,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::MailUnavailable => 503,
            ApiError::Auth(e) => e.status_code(),
            ApiError::Shop(e) => e.status_code(),
            ApiError::Payment(e) => e.status_code(),
            ApiError::Repository(RepositoryError::NotFound(_)) => 404,
            ApiError::Repository(RepositoryError::Conflict(_)) => 409,
            ApiError::Repository(_) => 500,
            ApiError::Mail(_) => 500,
            ApiError::Internal(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn to_response(&self) -> ErrorResponse {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
            let message = match self {
                ApiError::MailUnavailable => self.to_string(),
                ApiError::Payment(_) => "payment provider unavailable".to_string(),
                _ => "internal server error".to_string(),
            };
            return ErrorResponse::new(message, status.as_u16());
        }

        let response = ErrorResponse::new(self.to_string(), status.as_u16());
        match self {
            ApiError::Validation(errors) => response.with_details(errors.to_string()),
            _ => response,
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::AccountNotFound => ApiError::Auth(AuthError::InvalidToken),
            CheckoutError::Shop(e) => ApiError::Shop(e),
            CheckoutError::Payment(e) => ApiError::Payment(e),
            CheckoutError::Repository(e) => ApiError::Repository(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
