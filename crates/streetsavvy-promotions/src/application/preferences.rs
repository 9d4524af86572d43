//! Preference updater and its background queue.
//!
//! [`PreferenceService`] recomputes a user's most frequent vendor and vendor
//! type from `used` engagement history. [`PreferenceRefresher`] runs it off
//! the request path: submissions go onto a bounded queue drained by a
//! worker task, and worker failures go onto an error channel drained by a
//! logging task. Nothing here reports back to the submitter.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::services::PreferenceAggregator;
use crate::domain::value_objects::EntityId;
use crate::error::PromoResult;
use crate::ports::outbound::{Clock, EngagementRepository, UserRepository};

pub struct PreferenceService {
    users: Arc<dyn UserRepository>,
    engagements: Arc<dyn EngagementRepository>,
    clock: Arc<dyn Clock>,
}

impl PreferenceService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        engagements: Arc<dyn EngagementRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            engagements,
            clock,
        }
    }

    /// Recompute and store preferences. Fields with no history keep their
    /// stored value; a user with no `used` engagements is left untouched.
    ///
    /// Returns whether an update was written.
    pub async fn refresh_preferences(&self, user_id: &EntityId) -> PromoResult<bool> {
        let by_vendor = self.engagements.used_counts_by_vendor(user_id).await?;
        let by_type = self.engagements.used_counts_by_vendor_type(user_id).await?;

        let update = PreferenceAggregator::derive(&by_vendor, &by_type);
        if update.is_empty() {
            debug!(%user_id, "no used engagements, preferences unchanged");
            return Ok(false);
        }

        let written = self
            .users
            .update_preferences(user_id, &update, self.clock.now())
            .await?;
        info!(
            %user_id,
            vendor = update.vendor.as_deref().unwrap_or(""),
            vendor_type = update.vendor_type.as_deref().unwrap_or(""),
            written,
            "refreshed user preferences"
        );
        Ok(written)
    }

    /// Run a refresh, turning an error into a timestamped [`RefreshFailure`]
    async fn refresh_or_failure(&self, user_id: EntityId) -> Option<RefreshFailure> {
        match self.refresh_preferences(&user_id).await {
            Ok(_) => None,
            Err(e) => Some(RefreshFailure {
                user_id,
                error: e.to_string(),
                at: self.clock.now(),
            }),
        }
    }
}

/// A background refresh that failed
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    pub user_id: EntityId,
    pub error: String,
    pub at: chrono::DateTime<Utc>,
}

/// Fire-and-forget handle for scheduling preference refreshes
#[derive(Clone)]
pub struct PreferenceRefresher {
    queue: mpsc::Sender<EntityId>,
}

impl PreferenceRefresher {
    /// Start the worker and error-logging tasks on the current runtime
    pub fn spawn(service: Arc<PreferenceService>, capacity: usize) -> Self {
        let (queue, mut jobs) = mpsc::channel::<EntityId>(capacity.max(1));
        let (failures, mut failed) = mpsc::unbounded_channel::<RefreshFailure>();

        tokio::spawn(async move {
            while let Some(user_id) = jobs.recv().await {
                if let Some(failure) = service.refresh_or_failure(user_id).await {
                    let _ = failures.send(failure);
                }
            }
            debug!("preference refresh queue closed");
        });

        tokio::spawn(async move {
            while let Some(failure) = failed.recv().await {
                warn!(
                    user_id = %failure.user_id,
                    error = %failure.error,
                    at = %failure.at,
                    "background preference refresh failed"
                );
            }
        });

        Self { queue }
    }

    /// Queue a refresh for `user_id`. Never waits; a full queue drops the
    /// request with a warning.
    pub fn submit(&self, user_id: EntityId) {
        match self.queue.try_send(user_id) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(user_id)) => {
                warn!(%user_id, "preference refresh queue full, dropping request");
            }
            Err(mpsc::error::TrySendError::Closed(user_id)) => {
                warn!(%user_id, "preference refresh worker stopped, dropping request");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Engagement;
    use crate::domain::value_objects::{EngagementAction, GeoPoint};
    use crate::infrastructure::{FixedClock, InMemoryStore};
    use crate::ports::outbound::{StoreError, StoreResult};
    use crate::domain::services::UsageCount;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn setup() -> (Arc<InMemoryStore>, PreferenceService) {
        let store = Arc::new(InMemoryStore::new());
        store.seed_demo_data(start());
        let clock = Arc::new(FixedClock::new(start()));
        let svc = PreferenceService::new(store.clone(), store.clone(), clock);
        (store, svc)
    }

    async fn used(store: &InMemoryStore, user: &str, campaign: &str, days_ago: i64) {
        let e = Engagement::record(
            EntityId::from(user),
            EntityId::from(campaign),
            EngagementAction::Used,
            GeoPoint::new(40.0, -74.0).unwrap(),
            start() - Duration::days(days_ago),
        );
        assert!(store.append_engagement_unless_recent(&e, e.engaged_at).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_history_leaves_user_untouched() {
        let (store, svc) = setup();
        let before = store.find_user(&EntityId::from("u2")).await.unwrap().unwrap();
        assert!(!svc.refresh_preferences(&EntityId::from("u2")).await.unwrap());
        let after = store.find_user(&EntityId::from("u2")).await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(after.most_frequent_vendor_type.as_deref(), Some("bakery"));
    }

    #[tokio::test]
    async fn test_most_used_vendor_wins() {
        let (store, svc) = setup();
        used(&store, "u1", "c1", 3).await;
        used(&store, "u1", "c2", 2).await;
        used(&store, "u1", "c2", 1).await;
        assert!(svc.refresh_preferences(&EntityId::from("u1")).await.unwrap());

        let u = store.find_user(&EntityId::from("u1")).await.unwrap().unwrap();
        assert_eq!(u.most_frequent_vendor.as_deref(), Some("v2"));
        assert_eq!(u.most_frequent_vendor_type.as_deref(), Some("bakery"));
    }

    #[tokio::test]
    async fn test_tie_breaks_to_lowest_id() {
        let (store, svc) = setup();
        used(&store, "u1", "c2", 2).await;
        used(&store, "u1", "c1", 1).await;
        svc.refresh_preferences(&EntityId::from("u1")).await.unwrap();

        let u = store.find_user(&EntityId::from("u1")).await.unwrap().unwrap();
        assert_eq!(u.most_frequent_vendor.as_deref(), Some("v1"));
        assert_eq!(u.most_frequent_vendor_type.as_deref(), Some("bakery"));
    }

    #[tokio::test]
    async fn test_clicks_do_not_count() {
        let (store, svc) = setup();
        let click = Engagement::record(
            EntityId::from("u1"),
            EntityId::from("c1"),
            EngagementAction::Clicked,
            GeoPoint::new(40.0, -74.0).unwrap(),
            start(),
        );
        store.append_engagement_unless_recent(&click, start()).await.unwrap();
        assert!(!svc.refresh_preferences(&EntityId::from("u1")).await.unwrap());
        let u = store.find_user(&EntityId::from("u1")).await.unwrap().unwrap();
        assert!(u.most_frequent_vendor.is_none());
    }

    struct BrokenHistory;

    #[async_trait]
    impl EngagementRepository for BrokenHistory {
        async fn append_engagement_unless_recent(
            &self,
            _engagement: &Engagement,
            _since: DateTime<Utc>,
        ) -> StoreResult<bool> {
            Err(StoreError::Connection("down".into()))
        }

        async fn used_counts_by_vendor(&self, _user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
            Err(StoreError::Query("relation does not exist".into()))
        }

        async fn used_counts_by_vendor_type(&self, _user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
            Err(StoreError::Query("relation does not exist".into()))
        }
    }

    #[tokio::test]
    async fn test_refresh_error_is_returned_to_worker() {
        let store = Arc::new(InMemoryStore::new());
        let svc = PreferenceService::new(store, Arc::new(BrokenHistory), Arc::new(FixedClock::new(start())));
        assert!(svc.refresh_preferences(&EntityId::from("u1")).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_is_stamped_with_service_clock() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(start()));
        let svc = PreferenceService::new(store, Arc::new(BrokenHistory), clock.clone());
        clock.advance(Duration::minutes(30));

        let failure = svc.refresh_or_failure(EntityId::from("u1")).await.unwrap();
        assert_eq!(failure.user_id, EntityId::from("u1"));
        assert_eq!(failure.at, start() + Duration::minutes(30));
        assert!(failure.error.contains("relation does not exist"));
    }

    #[tokio::test]
    async fn test_successful_refresh_reports_no_failure() {
        let (_store, svc) = setup();
        assert!(svc.refresh_or_failure(EntityId::from("u2")).await.is_none());
    }

    #[tokio::test]
    async fn test_submit_never_blocks_when_worker_fails() {
        let store = Arc::new(InMemoryStore::new());
        let svc = Arc::new(PreferenceService::new(
            store,
            Arc::new(BrokenHistory),
            Arc::new(FixedClock::new(start())),
        ));
        let refresher = PreferenceRefresher::spawn(svc, 1);
        for _ in 0..10 {
            refresher.submit(EntityId::from("u1"));
        }
    }
}
