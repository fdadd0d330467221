// src/error.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a request handler can produce. Each variant owns its
/// status code; the body is always `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A collaborator the request needs is not configured (e.g. no API key).
    #[error("{0}")]
    Misconfigured(String),

    /// The remote API answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        detail: String,
    },

    /// The remote API could not be reached at all.
    #[error("{message}")]
    ServiceUnavailable { message: String, detail: String },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("invalid document: {0}")]
    Bson(String),

    #[error("{0}")]
    Internal(String),
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::Bson(e.to_string())
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        AppError::Bson(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::Upstream { detail, .. } | AppError::ServiceUnavailable { detail, .. } => {
                Some(detail.clone())
            }
            AppError::Database(e) => Some(e.to_string()),
            AppError::Bson(e) | AppError::Internal(e) | AppError::Config(e) => Some(e.clone()),
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Bson(_) | AppError::Config(_) => {
                "Server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Misconfigured(_)
            | AppError::Database(_)
            | AppError::Bson(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        let mut body = json!({
            "success": false,
            "message": self.public_message(),
        });
        if let Some(detail) = self.detail() {
            body["error"] = json!(detail);
        }
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_the_remote_status() {
        let err = AppError::Upstream {
            status: 429,
            message: "AI assistant is temporarily unavailable. Please try again.".into(),
            detail: "rate limited".into(),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn connectivity_failures_are_503() {
        let err = AppError::ServiceUnavailable {
            message: "Could not connect".into(),
            detail: "Network error".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn misconfiguration_is_a_server_error() {
        let err = AppError::Misconfigured("not configured".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "not configured");
    }
}
