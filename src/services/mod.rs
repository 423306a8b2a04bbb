mod feedback_receivers_service;
mod feedbacks_service;
mod filters;
mod redemption_service;
mod tokens_service;

pub use feedback_receivers_service::FeedbackReceiversService;
pub use feedbacks_service::FeedbacksService;
pub use filters::{FeedbackListFilters, TokenListFilters};
pub use redemption_service::{RedemptionError, RedemptionService};
pub use tokens_service::TokensService;

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller passed a structurally invalid value. Always detected before
    /// any store round trip.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        // Full cause goes to the log; only the summary reaches clients.
        tracing::error!("store operation failed: {err}");
        ServiceError::OperationFailed(err.to_string())
    }
}
