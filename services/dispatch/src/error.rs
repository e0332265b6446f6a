use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use courier_core::error::error_response;

use crate::domain::types::ChannelError;

/// Dispatch service error variants.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),
    #[error("message not found")]
    MessageNotFound,
    #[error("tenant not found")]
    TenantNotFound,
    #[error("auto-reply rule not found")]
    RuleNotFound,
    #[error("cannot send")]
    CannotSend,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("unauthorized")]
    Unauthorized,
    #[error("scheduler secret not configured")]
    SchedulerNotConfigured,
    #[error("channel request failed: {0}")]
    Channel(ChannelError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::TenantNotFound => "TENANT_NOT_FOUND",
            Self::RuleNotFound => "RULE_NOT_FOUND",
            Self::CannotSend => "CANNOT_SEND",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::SchedulerNotConfigured => "SCHEDULER_NOT_CONFIGURED",
            Self::Channel(_) => "CHANNEL",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MessageNotFound | Self::TenantNotFound | Self::RuleNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::CannotSend => StatusCode::CONFLICT,
            Self::InvalidSignature | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::SchedulerNotConfigured | Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Channel(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Gateway cancellation surfaces as [`DispatchError::Cancelled`], not as a
/// channel failure.
impl From<ChannelError> for DispatchError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Cancelled => Self::Cancelled,
            other => Self::Channel(other),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}
