//! Location Event
//!
//! Append-only log entry; a user's current location is their latest event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EntityId, GeoPoint};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationEvent {
    pub user_id: EntityId,
    pub point: GeoPoint,
    pub event_time: DateTime<Utc>,
}

impl LocationEvent {
    pub fn new(user_id: EntityId, point: GeoPoint, event_time: DateTime<Utc>) -> Self {
        Self { user_id, point, event_time }
    }
}
