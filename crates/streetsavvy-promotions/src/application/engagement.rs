//! Engagement recording service
//!
//! Deduplication is a time-windowed lookup against engagement history,
//! scoped by action: one `clicked` per user/campaign per five minutes, one
//! `used` per user/campaign per UTC calendar day.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use tracing::{error, info, warn};

use crate::application::preferences::PreferenceRefresher;
use crate::application::resolve_location;
use crate::domain::aggregates::Engagement;
use crate::domain::value_objects::{EngagementAction, EntityId};
use crate::error::{PromoError, PromoResult};
use crate::ports::inbound::{EngagementResult, EngagementUseCases};
use crate::ports::outbound::{Clock, EngagementRepository, LocationRepository};

/// Minutes within which a repeated click is a duplicate
pub const CLICK_DEDUP_WINDOW_MINUTES: i64 = 5;

/// Earliest `engaged_at` that makes a new `action` at `now` a duplicate
pub fn dedup_window_start(action: EngagementAction, now: DateTime<Utc>) -> DateTime<Utc> {
    match action {
        EngagementAction::Clicked => now - Duration::minutes(CLICK_DEDUP_WINDOW_MINUTES),
        EngagementAction::Used => Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)),
    }
}

pub struct EngagementService {
    engagements: Arc<dyn EngagementRepository>,
    locations: Arc<dyn LocationRepository>,
    clock: Arc<dyn Clock>,
    refresher: PreferenceRefresher,
}

impl EngagementService {
    pub fn new(
        engagements: Arc<dyn EngagementRepository>,
        locations: Arc<dyn LocationRepository>,
        clock: Arc<dyn Clock>,
        refresher: PreferenceRefresher,
    ) -> Self {
        Self {
            engagements,
            locations,
            clock,
            refresher,
        }
    }
}

#[async_trait]
impl EngagementUseCases for EngagementService {
    async fn record_engagement(
        &self,
        user_id: &EntityId,
        campaign_id: &EntityId,
        action: &str,
    ) -> PromoResult<EngagementResult> {
        let action: EngagementAction = action.parse().map_err(|e: PromoError| {
            warn!(%user_id, %campaign_id, action, "rejected engagement with unknown action");
            e
        })?;

        let location = resolve_location(self.locations.as_ref(), user_id).await?;
        let now = self.clock.now();
        let since = dedup_window_start(action, now);
        let engagement = Engagement::record(user_id.clone(), campaign_id.clone(), action, location, now);

        let appended = self
            .engagements
            .append_engagement_unless_recent(&engagement, since)
            .await
            .map_err(|e| {
                error!(%user_id, %campaign_id, %action, error = %e, "failed to record engagement");
                PromoError::from(e)
            })?;

        if appended {
            info!(%user_id, %campaign_id, %action, %location, engagement_id = %engagement.engagement_id, "recorded engagement");
            if action == EngagementAction::Used {
                self.refresher.submit(user_id.clone());
            }
        } else {
            info!(%user_id, %campaign_id, %action, since = %since, "duplicate engagement ignored");
        }

        Ok(EngagementResult {
            user_id: user_id.clone(),
            campaign_id: campaign_id.clone(),
            action,
            duplicate: !appended,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PreferenceService;
    use crate::infrastructure::{FixedClock, InMemoryStore};
    use crate::ports::outbound::UserRepository;

    struct Harness {
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        service: EngagementService,
    }

    fn harness() -> Harness {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.seed_demo_data(start);
        let clock = Arc::new(FixedClock::new(start));
        let preferences = Arc::new(PreferenceService::new(store.clone(), store.clone(), clock.clone()));
        let refresher = PreferenceRefresher::spawn(preferences, 16);
        let service = EngagementService::new(store.clone(), store.clone(), clock.clone(), refresher);
        Harness { store, clock, service }
    }

    fn ids() -> (EntityId, EntityId) {
        (EntityId::from("u1"), EntityId::from("c1"))
    }

    #[test]
    fn test_window_starts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 10).unwrap();
        assert_eq!(
            dedup_window_start(EngagementAction::Clicked, now),
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 25, 10).unwrap()
        );
        assert_eq!(
            dedup_window_start(EngagementAction::Used, now),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_click_twice_within_window_is_duplicate() {
        let h = harness();
        let (user, campaign) = ids();
        let first = h.service.record_engagement(&user, &campaign, "clicked").await.unwrap();
        assert!(!first.duplicate);

        h.clock.advance(Duration::seconds(1));
        let second = h.service.record_engagement(&user, &campaign, "clicked").await.unwrap();
        assert!(second.duplicate);
        assert_eq!(h.store.engagement_count(), 1);
    }

    #[tokio::test]
    async fn test_click_after_window_is_recorded() {
        let h = harness();
        let (user, campaign) = ids();
        h.service.record_engagement(&user, &campaign, "clicked").await.unwrap();
        h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
        let again = h.service.record_engagement(&user, &campaign, "clicked").await.unwrap();
        assert!(!again.duplicate);
        assert_eq!(h.store.engagement_count(), 2);
    }

    #[tokio::test]
    async fn test_used_once_per_day() {
        let h = harness();
        let (user, campaign) = ids();
        assert!(!h.service.record_engagement(&user, &campaign, "used").await.unwrap().duplicate);
        h.clock.advance(Duration::hours(11));
        assert!(h.service.record_engagement(&user, &campaign, "used").await.unwrap().duplicate);
        assert_eq!(h.store.engagement_count(), 1);

        h.clock.advance(Duration::hours(1));
        assert!(!h.service.record_engagement(&user, &campaign, "used").await.unwrap().duplicate);
        assert_eq!(h.store.engagement_count(), 2);
    }

    #[tokio::test]
    async fn test_click_and_use_are_independent() {
        let h = harness();
        let (user, campaign) = ids();
        assert!(!h.service.record_engagement(&user, &campaign, "clicked").await.unwrap().duplicate);
        assert!(!h.service.record_engagement(&user, &campaign, "used").await.unwrap().duplicate);
        assert_eq!(h.store.engagement_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_action_writes_nothing() {
        let h = harness();
        let (user, campaign) = ids();
        let err = h.service.record_engagement(&user, &campaign, "redeemed").await.unwrap_err();
        assert!(matches!(err, PromoError::InvalidAction(_)));
        assert_eq!(h.store.engagement_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_location_writes_nothing() {
        let h = harness();
        let err = h
            .service
            .record_engagement(&EntityId::from("u3"), &EntityId::from("c1"), "clicked")
            .await
            .unwrap_err();
        assert!(matches!(err, PromoError::LocationUnavailable(_)));
        assert_eq!(h.store.engagement_count(), 0);
    }

    #[tokio::test]
    async fn test_engagement_captures_location_and_time() {
        let h = harness();
        let (user, campaign) = ids();
        h.service.record_engagement(&user, &campaign, "clicked").await.unwrap();
        let stored = h.store.engagements();
        assert_eq!(stored[0].location.lat(), 40.0);
        assert_eq!(stored[0].location.lng(), -74.0);
        assert_eq!(stored[0].engaged_at, h.clock.now());
        assert_eq!(stored[0].action, EngagementAction::Clicked);
    }

    #[tokio::test]
    async fn test_used_refreshes_preferences_in_background() {
        let h = harness();
        let (user, campaign) = ids();
        h.service.record_engagement(&user, &campaign, "used").await.unwrap();

        let mut refreshed = None;
        for _ in 0..100 {
            let u = h.store.find_user(&user).await.unwrap().unwrap();
            if u.most_frequent_vendor.is_some() {
                refreshed = Some(u);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let u = refreshed.expect("preferences were not refreshed");
        assert_eq!(u.most_frequent_vendor.as_deref(), Some("v1"));
        assert_eq!(u.most_frequent_vendor_type.as_deref(), Some("cafe"));
    }
}
