//! Engagement Aggregate
//!
//! One row per recorded interaction. Rows are appended, never updated, so
//! the table doubles as the history the preference updater aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{EngagementAction, EntityId, GeoPoint};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub engagement_id: Uuid,
    pub user_id: EntityId,
    pub campaign_id: EntityId,
    pub action: EngagementAction,
    pub location: GeoPoint,
    pub engaged_at: DateTime<Utc>,
}

impl Engagement {
    pub fn record(
        user_id: EntityId,
        campaign_id: EntityId,
        action: EngagementAction,
        location: GeoPoint,
        engaged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            engagement_id: Uuid::new_v4(),
            user_id,
            campaign_id,
            action,
            location,
            engaged_at,
        }
    }

    /// Same user, campaign and action as `other`
    pub fn same_key(&self, other: &Engagement) -> bool {
        self.user_id == other.user_id
            && self.campaign_id == other.campaign_id
            && self.action == other.action
    }
}
