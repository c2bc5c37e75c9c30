/// Error types for Feed Service
///
/// Every handler error funnels through `AppError`, whose `ResponseError`
/// impl is the single place that turns failures into HTTP responses.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::validation::FieldError;

/// Result type for feed-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for every 5xx; the detail only goes to the logs.
pub const GENERIC_SERVER_MESSAGE: &str = "Something went wrong";

#[derive(Error, Debug)]
pub enum AppError {
    /// One or more form fields failed their rules
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Malformed request body
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request is well-formed but cannot be processed (bad id, missing image)
    #[error("{0}")]
    Unprocessable(String),

    /// Uploaded file exceeds the configured limit
    #[error("Image exceeds the {0} byte upload limit")]
    PayloadTooLarge(usize),

    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Response envelope shared by every error status
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a [FieldError]>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            // Missing records answer 422 rather than 404; clients rely on it.
            AppError::NotFound(_) | AppError::Unprocessable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            GENERIC_SERVER_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let error = match self {
            AppError::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorBody {
            status: false,
            message,
            error,
        })
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed multipart body: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Malformed JSON body: {}", err))
    }
}
