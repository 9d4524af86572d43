//! Campaign discovery service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::application::resolve_location;
use crate::domain::aggregates::{Campaign, CampaignMatch, CampaignRecord};
use crate::domain::services::EligibilityPolicy;
use crate::domain::value_objects::{EntityId, GeoPoint};
use crate::error::{PromoError, PromoResult};
use crate::ports::inbound::{CampaignUseCases, DEFAULT_NEARBY_RADIUS_KM};
use crate::ports::outbound::{CampaignRepository, Clock, LocationRepository, UserRepository};

pub struct EligibilityService {
    campaigns: Arc<dyn CampaignRepository>,
    users: Arc<dyn UserRepository>,
    locations: Arc<dyn LocationRepository>,
    clock: Arc<dyn Clock>,
}

impl EligibilityService {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        users: Arc<dyn UserRepository>,
        locations: Arc<dyn LocationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            campaigns,
            users,
            locations,
            clock,
        }
    }

    async fn load_campaigns(&self) -> PromoResult<Vec<CampaignRecord>> {
        self.campaigns.load_campaigns().await.map_err(|e| {
            error!(error = %e, "failed to load campaigns");
            PromoError::from(e)
        })
    }
}

#[async_trait]
impl CampaignUseCases for EligibilityService {
    async fn eligible_campaigns(
        &self,
        user_id: &EntityId,
        location: Option<GeoPoint>,
    ) -> PromoResult<Vec<CampaignMatch>> {
        let location = match location {
            Some(point) => point,
            None => resolve_location(self.locations.as_ref(), user_id).await?,
        };

        let user = self.users.find_user(user_id).await.map_err(|e| {
            error!(%user_id, error = %e, "failed to load user");
            PromoError::from(e)
        })?;
        let Some(user) = user else {
            info!(%user_id, "unknown user has no audience segments");
            return Ok(Vec::new());
        };

        let records = self.load_campaigns().await?;
        let matches =
            EligibilityPolicy::eligible_campaigns(&records, &user, &location, self.clock.now());

        for m in &matches {
            info!(%user_id, campaign_id = %m.campaign_id, vendor_address = %m.vendor_address, "user matches campaign");
        }
        info!(%user_id, %location, candidates = records.len(), matched = matches.len(), "evaluated campaign eligibility");
        Ok(matches)
    }

    async fn active_campaigns(&self) -> PromoResult<Vec<Campaign>> {
        let records = self.load_campaigns().await?;
        let active = EligibilityPolicy::active_campaigns(&records, self.clock.now());
        info!(candidates = records.len(), active = active.len(), "listed active campaigns");
        Ok(active)
    }

    async fn campaigns_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> PromoResult<Vec<Campaign>> {
        let point = GeoPoint::new(lat, lng)?;
        let radius_km = radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(PromoError::InvalidParameter(format!(
                "radius_km must be a positive number, got {radius_km}"
            )));
        }

        let records = self.load_campaigns().await?;
        let nearby = EligibilityPolicy::campaigns_near(&records, &point, radius_km, self.clock.now());
        info!(location = %point, radius_km, found = nearby.len(), "listed campaigns near point");
        Ok(nearby)
    }
}
