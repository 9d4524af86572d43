//! Audience segment rules.
//!
//! Segments are stored as names following a naming convention
//! (`loyalty_tier_<tier>`, `most_frequent_vendor_type_<type>`,
//! `most_frequent_vendor_<vendor id>`). The name is parsed once into a
//! [`SegmentRule`] and matched against user attributes.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::User;

pub const LOYALTY_TIER_PREFIX: &str = "loyalty_tier_";
pub const VENDOR_TYPE_PREFIX: &str = "most_frequent_vendor_type_";
pub const VENDOR_PREFIX: &str = "most_frequent_vendor_";

/// What the vendor-type prefix adds to the vendor prefix
const VENDOR_TYPE_SUFFIX: &str = "type_";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SegmentRule {
    ByLoyaltyTier(String),
    ByVendorType(String),
    ByVendor(String),
    /// Name follows no known convention; never matches
    Unrecognized(String),
}

impl SegmentRule {
    pub fn parse(name: &str) -> Self {
        // The vendor-type prefix extends the vendor prefix, so test it first.
        if let Some(tier) = name.strip_prefix(LOYALTY_TIER_PREFIX) {
            Self::ByLoyaltyTier(tier.to_string())
        } else if let Some(vendor_type) = name.strip_prefix(VENDOR_TYPE_PREFIX) {
            Self::ByVendorType(vendor_type.to_string())
        } else if let Some(vendor) = name.strip_prefix(VENDOR_PREFIX) {
            Self::ByVendor(vendor.to_string())
        } else {
            Self::Unrecognized(name.to_string())
        }
    }

    /// Whether `user` belongs to this segment. Missing or empty user
    /// attributes never match.
    pub fn matches(&self, user: &User) -> bool {
        let (target, attribute) = match self {
            Self::ByLoyaltyTier(t) => (t, user.loyalty_tier.as_deref()),
            Self::ByVendorType(t) => {
                // `most_frequent_vendor_type_x` also reads as vendor id `type_x`.
                let vendor_reading = user
                    .most_frequent_vendor
                    .as_deref()
                    .and_then(|v| v.strip_prefix(VENDOR_TYPE_SUFFIX))
                    == Some(t.as_str());
                if vendor_reading {
                    return true;
                }
                (t, user.most_frequent_vendor_type.as_deref())
            }
            Self::ByVendor(t) => (t, user.most_frequent_vendor.as_deref()),
            Self::Unrecognized(_) => return false,
        };
        !target.is_empty() && attribute == Some(target.as_str())
    }

    /// Stored name this rule was parsed from
    pub fn name(&self) -> String {
        match self {
            Self::ByLoyaltyTier(t) => format!("{LOYALTY_TIER_PREFIX}{t}"),
            Self::ByVendorType(t) => format!("{VENDOR_TYPE_PREFIX}{t}"),
            Self::ByVendor(t) => format!("{VENDOR_PREFIX}{t}"),
            Self::Unrecognized(name) => name.clone(),
        }
    }
}
