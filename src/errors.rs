use crate::calendar::DateParseError;
use crate::config::ConfigError;
use crate::service::{ServiceError, ValidationError};
use crate::store::StoreError;
use axum::http::StatusCode;
use tracing::{error, warn};

/// Error surfaced to the page as a status code and a plain-text message.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Database is not configured".to_string(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::TableMissing => StatusCode::BAD_GATEWAY,
            StoreError::Unreachable(source) => {
                error!("store unreachable: {source}");
                StatusCode::SERVICE_UNAVAILABLE
            }
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidRecord(_) | StoreError::Rejected { .. } => StatusCode::BAD_GATEWAY,
        };
        error!("store request failed: {err}");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        warn!("rejected load: {err}");
        Self::bad_request(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(err) => err.into(),
            ServiceError::Store(err) => err.into(),
        }
    }
}

impl From<DateParseError> for AppError {
    fn from(err: DateParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(_) => {
                warn!("rejected store settings: {err}");
                Self::bad_request(err.to_string())
            }
            other => {
                error!("config persistence failed: {other}");
                Self::internal(other)
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
