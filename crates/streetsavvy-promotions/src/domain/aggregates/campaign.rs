//! Campaign Aggregate
//!
//! Campaigns are authored by vendor tooling and read-only here. The engine
//! loads them joined with their vendor and segment as [`CampaignRecord`]s.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::vendor::Vendor;
use crate::domain::services::segment::SegmentRule;
use crate::domain::value_objects::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: EntityId,
    pub vendor_id: EntityId,
    pub title: String,
    pub code: String,
    pub description: String,
    pub geofence_radius_km: f64,
    pub enabled: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Activation time of day, applied on `start_date` only
    pub run_time: NaiveTime,
    pub segment_id: EntityId,
}

/// Audience segment. The name carries the matching rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_id: EntityId,
    pub segment_name: String,
}

impl Segment {
    pub fn new(segment_id: EntityId, segment_name: impl Into<String>) -> Self {
        Self { segment_id, segment_name: segment_name.into() }
    }

    pub fn rule(&self) -> SegmentRule {
        SegmentRule::parse(&self.segment_name)
    }
}

/// A campaign joined with its vendor and parsed segment rule
#[derive(Clone, Debug, PartialEq)]
pub struct CampaignRecord {
    pub campaign: Campaign,
    pub vendor: Vendor,
    pub segment: SegmentRule,
}

impl CampaignRecord {
    pub fn new(campaign: Campaign, vendor: Vendor, segment: &Segment) -> Self {
        Self { campaign, vendor, segment: segment.rule() }
    }
}

/// Campaign fields enriched with vendor display data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignMatch {
    pub campaign_id: EntityId,
    pub vendor_id: EntityId,
    pub title: String,
    pub code: String,
    pub description: String,
    pub geofence_radius_km: f64,
    pub vendor_address: String,
    pub vendor_type: String,
    pub vendor_lat: f64,
    pub vendor_lng: f64,
}

impl From<&CampaignRecord> for CampaignMatch {
    fn from(record: &CampaignRecord) -> Self {
        let c = &record.campaign;
        let v = &record.vendor;
        Self {
            campaign_id: c.campaign_id.clone(),
            vendor_id: c.vendor_id.clone(),
            title: c.title.clone(),
            code: c.code.clone(),
            description: c.description.clone(),
            geofence_radius_km: c.geofence_radius_km,
            vendor_address: v.address.clone(),
            vendor_type: v.vendor_type.clone(),
            vendor_lat: v.location.lat(),
            vendor_lng: v.location.lng(),
        }
    }
}
