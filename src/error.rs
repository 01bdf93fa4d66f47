use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::model::leave::HoldToken;

/// Error taxonomy for the leave lifecycle.
///
/// The first group is client input, the second business-rule rejections,
/// the last internal divergence between the request store and the ledger.
/// Divergences are bugs, not bad input, and are logged loudly before
/// surfacing.
#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("start_date cannot be after end_date")]
    InvalidDateRange,

    #[error("a reason is required for this leave type")]
    InvalidReason,

    #[error("insufficient leave balance")]
    InsufficientBalance,

    #[error("request overlaps an existing pending or approved request")]
    OverlappingRequest,

    #[error("not found")]
    NotFound,

    #[error("leave request already decided")]
    AlreadyDecided,

    #[error("entitlement cannot drop below consumed plus held days")]
    InvalidAdjustment,

    #[error("balance already provisioned for this employee and leave type")]
    AlreadyProvisioned,

    #[error("unknown or already resolved hold token {0}")]
    UnknownHold(HoldToken),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LeaveError {
    /// Internal-consistency failures: never expected in a healthy system,
    /// never retried, never masked.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LeaveError::UnknownHold(_) | LeaveError::Storage(_))
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidDateRange | LeaveError::InvalidReason => StatusCode::BAD_REQUEST,
            LeaveError::InsufficientBalance | LeaveError::InvalidAdjustment => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LeaveError::OverlappingRequest
            | LeaveError::AlreadyDecided
            | LeaveError::AlreadyProvisioned => StatusCode::CONFLICT,
            LeaveError::NotFound => StatusCode::NOT_FOUND,
            LeaveError::UnknownHold(_) | LeaveError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_fatal() {
            tracing::error!(error = %self, "internal error while handling leave operation");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}
