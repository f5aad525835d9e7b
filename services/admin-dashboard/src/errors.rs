use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Backend answered with a non-2xx status
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Cannot reach backend: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Misconfigured(String),

    #[error("{0}")]
    Validation(String),

    #[error("Too many login attempts, try again in a minute")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for DashboardError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "type": self.error_type()
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            // client errors from the backend pass through, everything else is a bad gateway
            DashboardError::Backend { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(StatusCode::is_client_error)
                .unwrap_or(StatusCode::BAD_GATEWAY),
            DashboardError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DashboardError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl DashboardError {
    pub fn error_type(&self) -> &'static str {
        match self {
            DashboardError::Backend { .. } => "backend_error",
            DashboardError::Unreachable(_) => "backend_unreachable",
            DashboardError::Unauthorized(_) => "unauthorized",
            DashboardError::Misconfigured(_) => "misconfigured",
            DashboardError::Validation(_) => "validation_error",
            DashboardError::RateLimited => "rate_limit",
            DashboardError::Internal(_) => "internal_error",
        }
    }
}

impl From<lead_core::Error> for DashboardError {
    fn from(err: lead_core::Error) -> Self {
        DashboardError::Validation(err.to_string())
    }
}
