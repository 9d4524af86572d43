//! Inbound ports (Use case traits)
//!
//! The operations the request-handling layer calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Campaign, CampaignMatch, LocationEvent, User};
use crate::domain::value_objects::{EngagementAction, EntityId, GeoPoint};
use crate::error::PromoResult;

/// Default search radius for [`CampaignUseCases::campaigns_near`]
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 1.0;

/// Campaign discovery use cases
#[async_trait]
pub trait CampaignUseCases: Send + Sync {
    /// Campaigns the user currently qualifies for. Uses `location` when
    /// given, otherwise the user's latest recorded location.
    async fn eligible_campaigns(
        &self,
        user_id: &EntityId,
        location: Option<GeoPoint>,
    ) -> PromoResult<Vec<CampaignMatch>>;

    /// Live campaigns, without location or audience filtering
    async fn active_campaigns(&self) -> PromoResult<Vec<Campaign>>;

    /// Live campaigns whose vendor is within `radius_km` of the point
    async fn campaigns_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> PromoResult<Vec<Campaign>>;
}

/// Engagement recording use cases
#[async_trait]
pub trait EngagementUseCases: Send + Sync {
    /// Record a raw action string (`clicked` or `used`)
    async fn record_engagement(
        &self,
        user_id: &EntityId,
        campaign_id: &EntityId,
        action: &str,
    ) -> PromoResult<EngagementResult>;
}

/// User profile and location use cases
#[async_trait]
pub trait UserUseCases: Send + Sync {
    async fn get_user(&self, user_id: &EntityId) -> PromoResult<User>;

    async fn record_location(&self, user_id: &EntityId, lat: f64, lng: f64) -> PromoResult<LocationEvent>;
}

/// Outcome of an engagement submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngagementResult {
    pub user_id: EntityId,
    pub campaign_id: EntityId,
    pub action: EngagementAction,
    pub duplicate: bool,
}
