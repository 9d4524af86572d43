//! Outbound ports (store and clock traits)
//!
//! Infrastructure implements these; services receive them as
//! `Arc<dyn ...>` handles from the composition root.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::aggregates::{CampaignRecord, Engagement, LocationEvent, PreferenceUpdate, User};
use crate::domain::services::UsageCount;
use crate::domain::value_objects::EntityId;

/// User profile store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_user(&self, id: &EntityId) -> StoreResult<Option<User>>;

    /// Overwrite the preference fields that are set in `update`, keeping
    /// the stored value for the others. Returns false if the user is unknown.
    async fn update_preferences(
        &self,
        id: &EntityId,
        update: &PreferenceUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}

/// Location ping log
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Most recent event for the user
    async fn latest_location(&self, user_id: &EntityId) -> StoreResult<Option<LocationEvent>>;

    /// Append a location event
    async fn append_location(&self, event: &LocationEvent) -> StoreResult<()>;
}

/// Campaign catalogue
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// All campaigns joined with vendor and segment, in one batch.
    ///
    /// Rows that fail to decode are skipped; a failure of the fetch itself
    /// is an error.
    async fn load_campaigns(&self) -> StoreResult<Vec<CampaignRecord>>;
}

/// Engagement history
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Append `engagement` unless an engagement with the same user,
    /// campaign and action exists with `engaged_at >= since`.
    ///
    /// The check and the append happen as one unit. Returns true if the
    /// row was appended, false if it was a duplicate.
    async fn append_engagement_unless_recent(
        &self,
        engagement: &Engagement,
        since: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// `used` engagement counts for the user grouped by vendor id
    async fn used_counts_by_vendor(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>>;

    /// `used` engagement counts for the user grouped by vendor type
    async fn used_counts_by_vendor_type(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>>;
}

/// Liveness of the backing store
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Succeeds if the store can serve requests
    async fn ping(&self) -> StoreResult<()>;
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("decode error: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
