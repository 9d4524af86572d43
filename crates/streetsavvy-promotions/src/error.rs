//! Error types for the promotions engine

use thiserror::Error;

use crate::domain::value_objects::EntityId;
use crate::ports::outbound::StoreError;

/// Errors surfaced to callers of the use cases
#[derive(Error, Debug)]
pub enum PromoError {
    /// Caller input failed validation
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Engagement action is not one of the recognized kinds
    #[error("invalid action: {0:?} (expected \"clicked\" or \"used\")")]
    InvalidAction(String),

    /// The user has no recorded location
    #[error("no location recorded for user {0}")]
    LocationUnavailable(EntityId),

    /// The user does not exist
    #[error("user not found: {0}")]
    UserNotFound(EntityId),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PromoError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::InvalidAction(_) => "invalid_action",
            Self::LocationUnavailable(_) => "location_unavailable",
            Self::UserNotFound(_) => "user_not_found",
            Self::Store(_) => "store_error",
        }
    }
}

/// Result type for the promotions engine
pub type PromoResult<T> = Result<T, PromoError>;
