use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    NotFound { message: String, error: String },

    /// A business rule or request validation rejected the call.
    #[error("{message}")]
    Unprocessable { message: String, error: String },

    #[error("{message}")]
    ServiceUnavailable { message: String, error: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(error: impl Into<String>) -> Self {
        AppError::Unprocessable {
            message: "The given data was invalid.".to_string(),
            error: error.into(),
        }
    }

    /// Maps a domain failure, using `message` as the summary for business
    /// rule failures (e.g. "Failed to create order").
    pub fn from_domain(message: &str, e: DomainError) -> Self {
        match e {
            DomainError::OrderNotFound
            | DomainError::ProductNotFound(_)
            | DomainError::CustomerNotFound(_) => AppError::NotFound {
                message: e.to_string(),
                error: e.to_string(),
            },
            DomainError::InsufficientStock { .. } | DomainError::InvalidInput(_) => {
                AppError::Unprocessable {
                    message: message.to_string(),
                    error: e.to_string(),
                }
            }
            DomainError::CacheUnavailable(_) => AppError::ServiceUnavailable {
                message: "Order data is temporarily unavailable".to_string(),
                error: e.to_string(),
            },
            DomainError::OrderMutationFailed { .. } | DomainError::Internal(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::from_domain("Request failed", e)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound { message, error }
            | AppError::Unprocessable { message, error }
            | AppError::ServiceUnavailable { message, error } => {
                HttpResponse::build(self.status_code()).json(serde_json::json!({
                    "message": message,
                    "error": error
                }))
            }
            AppError::Internal(cause) => {
                log::error!("Request failed: {}", cause);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}
