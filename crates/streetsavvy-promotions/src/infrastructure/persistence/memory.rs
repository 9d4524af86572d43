//! In-memory store
//!
//! Backs tests and the `memory` store mode. All tables sit behind one lock
//! so engagement dedup-and-append is atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use parking_lot::RwLock;
use tracing::warn;

use crate::domain::aggregates::{
    Campaign, CampaignRecord, Engagement, LocationEvent, PreferenceUpdate, Segment, User, Vendor,
};
use crate::domain::services::UsageCount;
use crate::domain::value_objects::{EngagementAction, EntityId, GeoPoint};
use crate::ports::outbound::{
    CampaignRepository, EngagementRepository, LocationRepository, StoreHealth, StoreResult,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<EntityId, User>,
    vendors: HashMap<EntityId, Vendor>,
    segments: HashMap<EntityId, Segment>,
    // Vec keeps insertion order, which stands in for storage order.
    campaigns: Vec<Campaign>,
    locations: Vec<LocationEvent>,
    engagements: Vec<Engagement>,
}

impl Tables {
    fn used_by<'a>(&'a self, user_id: &'a EntityId) -> impl Iterator<Item = &'a Vendor> + 'a {
        self.engagements
            .iter()
            .filter(move |e| &e.user_id == user_id && e.action == EngagementAction::Used)
            .filter_map(move |e| self.campaigns.iter().find(|c| c.campaign_id == e.campaign_id))
            .filter_map(move |c| self.vendors.get(&c.vendor_id))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.tables.write().users.insert(user.user_id.clone(), user);
    }

    pub fn insert_vendor(&self, vendor: Vendor) {
        self.tables.write().vendors.insert(vendor.vendor_id.clone(), vendor);
    }

    pub fn insert_segment(&self, segment: Segment) {
        self.tables.write().segments.insert(segment.segment_id.clone(), segment);
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.tables.write().campaigns.push(campaign);
    }

    pub fn engagements(&self) -> Vec<Engagement> {
        self.tables.read().engagements.clone()
    }

    pub fn engagement_count(&self) -> usize {
        self.tables.read().engagements.len()
    }

    /// Load a small fixed catalogue around (40.0, -74.0). Campaign dates
    /// are relative to `now`, and user `u1` is placed at the center.
    ///
    /// - vendors: `v1` cafe ~180 m away, `v2` bakery ~620 m away, `v3` bar ~14 km away
    /// - campaigns: `c1` (v1, gold, 0.5 km), `c2` (v2, bakery fans, 0.2 km),
    ///   `c3` (v3, gold, 2 km), `c4` (v1, gold, disabled)
    /// - users: `u1` gold at the center, `u2` silver bakery fan nearby,
    ///   `u3` gold with no location
    pub fn seed_demo_data(&self, now: DateTime<Utc>) {
        let today = now.date_naive();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);

        let vendors = [
            ("v1", "12 Hudson St", "cafe", 40.001, -74.001),
            ("v2", "88 Canal St", "bakery", 40.004, -74.002),
            ("v3", "500 Ocean Ave", "bar", 40.1, -74.1),
        ];
        for (id, address, vendor_type, lat, lng) in vendors {
            self.insert_vendor(Vendor::new(
                EntityId::from(id),
                address,
                vendor_type,
                GeoPoint::new_unchecked(lat, lng),
            ));
        }

        let segments = [
            ("s1", "loyalty_tier_gold"),
            ("s2", "most_frequent_vendor_type_bakery"),
            ("s3", "loyalty_tier_silver"),
        ];
        for (id, name) in segments {
            self.insert_segment(Segment::new(EntityId::from(id), name));
        }

        let campaigns = [
            ("c1", "v1", "Morning Latte", "LATTE10", "10% off any latte", 0.5, true, "s1"),
            ("c2", "v2", "Fresh Croissants", "CROISSANT", "Buy one get one", 0.2, true, "s2"),
            ("c3", "v3", "Happy Hour", "HAPPY", "Half-price drinks", 2.0, true, "s1"),
            ("c4", "v1", "Retired Promo", "OLD", "No longer running", 0.5, false, "s1"),
        ];
        for (id, vendor, title, code, description, radius, enabled, segment) in campaigns {
            self.insert_campaign(Campaign {
                campaign_id: EntityId::from(id),
                vendor_id: EntityId::from(vendor),
                title: title.into(),
                code: code.into(),
                description: description.into(),
                geofence_radius_km: radius,
                enabled,
                start_date: today - Duration::days(7),
                end_date: today + Duration::days(30),
                run_time: nine,
                segment_id: EntityId::from(segment),
            });
        }

        self.insert_user(User::create(EntityId::from("u1"), Some("gold".into())));
        self.insert_user(
            User::create(EntityId::from("u2"), Some("silver".into())).with_preferences(Some("v2"), Some("bakery")),
        );
        self.insert_user(User::create(EntityId::from("u3"), Some("gold".into())));

        let mut tables = self.tables.write();
        tables.locations.push(LocationEvent::new(
            EntityId::from("u1"),
            GeoPoint::new_unchecked(40.0, -74.0),
            now,
        ));
        tables.locations.push(LocationEvent::new(
            EntityId::from("u2"),
            GeoPoint::new_unchecked(40.0041, -74.0021),
            now,
        ));
    }
}

fn into_counts(counts: BTreeMap<String, u64>) -> Vec<UsageCount> {
    counts.into_iter().map(|(key, count)| UsageCount { key, count }).collect()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: &EntityId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn update_preferences(
        &self,
        id: &EntityId,
        update: &PreferenceUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(id) {
            Some(user) => {
                user.apply_preferences(update, at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn latest_location(&self, user_id: &EntityId) -> StoreResult<Option<LocationEvent>> {
        let tables = self.tables.read();
        Ok(tables
            .locations
            .iter()
            .filter(|e| &e.user_id == user_id)
            .max_by_key(|e| e.event_time)
            .cloned())
    }

    async fn append_location(&self, event: &LocationEvent) -> StoreResult<()> {
        self.tables.write().locations.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CampaignRepository for InMemoryStore {
    async fn load_campaigns(&self) -> StoreResult<Vec<CampaignRecord>> {
        let tables = self.tables.read();
        let mut records = Vec::with_capacity(tables.campaigns.len());
        for campaign in &tables.campaigns {
            let vendor = tables.vendors.get(&campaign.vendor_id);
            let segment = tables.segments.get(&campaign.segment_id);
            match (vendor, segment) {
                (Some(vendor), Some(segment)) => {
                    records.push(CampaignRecord::new(campaign.clone(), vendor.clone(), segment));
                }
                _ => {
                    warn!(campaign_id = %campaign.campaign_id, "skipping campaign with dangling vendor or segment");
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl EngagementRepository for InMemoryStore {
    async fn append_engagement_unless_recent(
        &self,
        engagement: &Engagement,
        since: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let recent = tables
            .engagements
            .iter()
            .any(|e| e.same_key(engagement) && e.engaged_at >= since);
        if recent {
            return Ok(false);
        }
        tables.engagements.push(engagement.clone());
        Ok(true)
    }

    async fn used_counts_by_vendor(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
        let tables = self.tables.read();
        let mut counts = BTreeMap::new();
        for vendor in tables.used_by(user_id) {
            *counts.entry(vendor.vendor_id.to_string()).or_insert(0) += 1;
        }
        Ok(into_counts(counts))
    }

    async fn used_counts_by_vendor_type(&self, user_id: &EntityId) -> StoreResult<Vec<UsageCount>> {
        let tables = self.tables.read();
        let mut counts = BTreeMap::new();
        for vendor in tables.used_by(user_id) {
            *counts.entry(vendor.vendor_type.clone()).or_insert(0) += 1;
        }
        Ok(into_counts(counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_load_campaigns_preserves_order_and_joins() {
        let store = InMemoryStore::new();
        store.seed_demo_data(now());
        let records = store.load_campaigns().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.campaign.campaign_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4"]);
        assert_eq!(records[1].vendor.vendor_type, "bakery");
    }

    #[tokio::test]
    async fn test_dangling_campaign_is_skipped() {
        let store = InMemoryStore::new();
        store.seed_demo_data(now());
        let mut orphan = store.load_campaigns().await.unwrap()[0].campaign.clone();
        orphan.campaign_id = EntityId::from("orphan");
        orphan.vendor_id = EntityId::from("no-such-vendor");
        store.insert_campaign(orphan);
        assert_eq!(store.load_campaigns().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_latest_location_picks_newest() {
        let store = InMemoryStore::new();
        let user = EntityId::from("u1");
        let newer = LocationEvent::new(user.clone(), GeoPoint::new_unchecked(2.0, 2.0), now());
        let older = LocationEvent::new(user.clone(), GeoPoint::new_unchecked(1.0, 1.0), now() - Duration::hours(1));
        store.append_location(&newer).await.unwrap();
        store.append_location(&older).await.unwrap();
        assert_eq!(store.latest_location(&user).await.unwrap().unwrap(), newer);
    }

    #[tokio::test]
    async fn test_dedup_is_keyed_by_user_campaign_action() {
        let store = InMemoryStore::new();
        let at = GeoPoint::new_unchecked(40.0, -74.0);
        let base = Engagement::record(EntityId::from("u1"), EntityId::from("c1"), EngagementAction::Clicked, at, now());
        assert!(store.append_engagement_unless_recent(&base, now()).await.unwrap());
        assert!(!store.append_engagement_unless_recent(&base, now()).await.unwrap());

        let other_campaign = Engagement::record(EntityId::from("u1"), EntityId::from("c2"), EngagementAction::Clicked, at, now());
        let other_user = Engagement::record(EntityId::from("u2"), EntityId::from("c1"), EngagementAction::Clicked, at, now());
        let other_action = Engagement::record(EntityId::from("u1"), EntityId::from("c1"), EngagementAction::Used, at, now());
        for e in [other_campaign, other_user, other_action] {
            assert!(store.append_engagement_unless_recent(&e, now()).await.unwrap());
        }
        assert_eq!(store.engagement_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_append_once() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let e = Engagement::record(
                    EntityId::from("u1"),
                    EntityId::from("c1"),
                    EngagementAction::Clicked,
                    GeoPoint::new_unchecked(40.0, -74.0),
                    now(),
                );
                store.append_engagement_unless_recent(&e, now() - Duration::minutes(5)).await.unwrap()
            }));
        }
        let mut appended = 0;
        for h in handles {
            if h.await.unwrap() {
                appended += 1;
            }
        }
        assert_eq!(appended, 1);
        assert_eq!(store.engagement_count(), 1);
    }

    #[tokio::test]
    async fn test_update_preferences_unknown_user() {
        let store = InMemoryStore::new();
        let update = PreferenceUpdate { vendor: Some("v1".into()), vendor_type: None };
        assert!(!store.update_preferences(&EntityId::from("nobody"), &update, now()).await.unwrap());
    }
}
