//! Preference aggregation
//!
//! Picks a user's most frequent vendor and vendor type from per-key counts
//! of `used` engagements. Ties go to the lexicographically lowest key so
//! the outcome does not depend on storage ordering.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::PreferenceUpdate;

/// Count of `used` engagements grouped by a key (vendor id or vendor type)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCount {
    pub key: String,
    pub count: u64,
}

impl UsageCount {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self { key: key.into(), count }
    }
}

pub struct PreferenceAggregator;

impl PreferenceAggregator {
    /// Highest count wins; empty keys and zero counts are ignored
    pub fn most_frequent(counts: &[UsageCount]) -> Option<&str> {
        counts
            .iter()
            .filter(|c| c.count > 0 && !c.key.is_empty())
            .min_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)))
            .map(|c| c.key.as_str())
    }

    /// Vendor and vendor type are chosen independently
    pub fn derive(vendor_counts: &[UsageCount], vendor_type_counts: &[UsageCount]) -> PreferenceUpdate {
        PreferenceUpdate {
            vendor: Self::most_frequent(vendor_counts).map(str::to_string),
            vendor_type: Self::most_frequent(vendor_type_counts).map(str::to_string),
        }
    }
}
