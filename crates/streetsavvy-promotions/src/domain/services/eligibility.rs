//! Campaign eligibility domain service
//!
//! Composes the temporal, geofence and segment rules over a batch of
//! campaign records. Output preserves input order; no ranking is applied.

use chrono::{DateTime, Utc};

use crate::domain::aggregates::{Campaign, CampaignMatch, CampaignRecord, User};
use crate::domain::services::{geo, temporal};
use crate::domain::value_objects::GeoPoint;

pub struct EligibilityPolicy;

impl EligibilityPolicy {
    /// Whether `user` standing at `location` qualifies for `record` at `now`
    pub fn is_eligible(
        record: &CampaignRecord,
        user: &User,
        location: &GeoPoint,
        now: DateTime<Utc>,
    ) -> bool {
        temporal::is_live(&record.campaign, now)
            && geo::within_radius(location, &record.vendor.location, record.campaign.geofence_radius_km)
            && record.segment.matches(user)
    }

    /// Campaigns `user` qualifies for, enriched with vendor display data
    pub fn eligible_campaigns(
        records: &[CampaignRecord],
        user: &User,
        location: &GeoPoint,
        now: DateTime<Utc>,
    ) -> Vec<CampaignMatch> {
        records
            .iter()
            .filter(|r| Self::is_eligible(r, user, location, now))
            .map(CampaignMatch::from)
            .collect()
    }

    /// Live campaigns, ignoring location and audience
    pub fn active_campaigns(records: &[CampaignRecord], now: DateTime<Utc>) -> Vec<Campaign> {
        records
            .iter()
            .filter(|r| temporal::is_live(&r.campaign, now))
            .map(|r| r.campaign.clone())
            .collect()
    }

    /// Live campaigns whose vendor lies within `radius_km` of `point`
    pub fn campaigns_near(
        records: &[CampaignRecord],
        point: &GeoPoint,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> Vec<Campaign> {
        records
            .iter()
            .filter(|r| temporal::is_live(&r.campaign, now))
            .filter(|r| geo::within_radius(point, &r.vendor.location, radius_km))
            .map(|r| r.campaign.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Segment, Vendor};
    use crate::domain::value_objects::EntityId;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn record(id: &str, radius_km: f64, enabled: bool, segment: &str) -> CampaignRecord {
        let vendor = Vendor::new(
            EntityId::from("v1"),
            "1 Main St",
            "cafe",
            GeoPoint::new(40.001, -74.001).unwrap(),
        );
        let campaign = Campaign {
            campaign_id: EntityId::from(id),
            vendor_id: vendor.vendor_id.clone(),
            title: "Latte".into(),
            code: "LATTE".into(),
            description: "Free latte".into(),
            geofence_radius_km: radius_km,
            enabled,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            run_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            segment_id: EntityId::from("s1"),
        };
        CampaignRecord::new(campaign, vendor, &Segment::new(EntityId::from("s1"), segment))
    }

    fn gold_user() -> User {
        User::create(EntityId::from("u1"), Some("gold".into()))
    }

    fn here() -> GeoPoint {
        GeoPoint::new(40.0, -74.0).unwrap()
    }

    #[test]
    fn test_campaign_within_fence_is_returned() {
        let records = vec![record("c1", 0.5, true, "loyalty_tier_gold")];
        let matches = EligibilityPolicy::eligible_campaigns(&records, &gold_user(), &here(), now());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].campaign_id.as_str(), "c1");
        assert_eq!(matches[0].vendor_address, "1 Main St");
        assert_eq!(matches[0].vendor_type, "cafe");
        assert_eq!(matches[0].vendor_lat, 40.001);
    }

    #[test]
    fn test_campaign_outside_fence_is_excluded() {
        let records = vec![record("c1", 0.01, true, "loyalty_tier_gold")];
        assert!(EligibilityPolicy::eligible_campaigns(&records, &gold_user(), &here(), now()).is_empty());
    }

    #[test]
    fn test_segment_mismatch_is_excluded() {
        let records = vec![record("c1", 0.5, true, "loyalty_tier_platinum")];
        assert!(EligibilityPolicy::eligible_campaigns(&records, &gold_user(), &here(), now()).is_empty());
    }

    #[test]
    fn test_disabled_is_excluded_everywhere() {
        let records = vec![record("c1", 0.5, false, "loyalty_tier_gold")];
        assert!(EligibilityPolicy::eligible_campaigns(&records, &gold_user(), &here(), now()).is_empty());
        assert!(EligibilityPolicy::active_campaigns(&records, now()).is_empty());
        assert!(EligibilityPolicy::campaigns_near(&records, &here(), 1.0, now()).is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let records = vec![
            record("c2", 0.5, true, "loyalty_tier_gold"),
            record("c1", 0.5, true, "loyalty_tier_gold"),
            record("c3", 0.5, true, "loyalty_tier_gold"),
        ];
        let ids: Vec<_> = EligibilityPolicy::eligible_campaigns(&records, &gold_user(), &here(), now())
            .into_iter()
            .map(|m| m.campaign_id.to_string())
            .collect();
        assert_eq!(ids, vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn test_active_ignores_location_and_segment() {
        let records = vec![record("c1", 0.01, true, "nobody")];
        assert_eq!(EligibilityPolicy::active_campaigns(&records, now()).len(), 1);
    }

    #[test]
    fn test_near_uses_query_radius() {
        let records = vec![record("c1", 0.01, true, "nobody")];
        assert_eq!(EligibilityPolicy::campaigns_near(&records, &here(), 1.0, now()).len(), 1);
        assert!(EligibilityPolicy::campaigns_near(&records, &here(), 0.05, now()).is_empty());
    }
}
