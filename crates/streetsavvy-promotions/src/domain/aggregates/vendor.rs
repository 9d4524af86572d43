//! Vendor Aggregate

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EntityId, GeoPoint};

/// A vendor; its fixed location is the geofence center for its campaigns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: EntityId,
    pub address: String,
    pub vendor_type: String,
    pub location: GeoPoint,
}

impl Vendor {
    pub fn new(
        vendor_id: EntityId,
        address: impl Into<String>,
        vendor_type: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        Self {
            vendor_id,
            address: address.into(),
            vendor_type: vendor_type.into(),
            location,
        }
    }
}
