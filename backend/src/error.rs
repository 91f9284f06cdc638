//! Error taxonomy of the signing backend and its HTTP mapping.
//!
//! `Unauthorized` and `AlreadySigned` are separate: a signing page
//! must tell a stale or forged link apart from a contract that has already been
//! signed, and neither may reveal more than `NotFound` about unknown ids.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    AlreadySigned(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn unprocessable(what: impl Into<String>) -> Self {
        AppError::Unprocessable(what.into())
    }

    /// The link was forged, stale, or the contract is not in a signable state.
    pub fn invalid_link() -> Self {
        AppError::Unauthorized("Invalid or expired signing link".to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::Unprocessable(format!("invalid base64 payload: {}", err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::AlreadySigned(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Pdf(_)
            | AppError::Image(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

impl AppError {
    /// Stable machine-readable code for clients that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::AlreadySigned(_) => "already_signed",
            AppError::Unprocessable(_) => "unprocessable",
            AppError::Conflict(_) => "conflict",
            _ => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_failures_map_to_distinct_statuses() {
        assert_eq!(AppError::invalid_link().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::AlreadySigned("done".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::not_found("missing").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::unprocessable("empty").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn codes_distinguish_already_signed_from_unauthorized() {
        assert_eq!(AppError::invalid_link().code(), "unauthorized");
        assert_eq!(AppError::AlreadySigned("x".into()).code(), "already_signed");
        assert_eq!(AppError::Internal("x".into()).code(), "internal");
    }
}
