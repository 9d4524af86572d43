//! Application layer
//!
//! Orchestrates use cases over the injected store and clock.

pub mod eligibility;
pub mod engagement;
pub mod preferences;
pub mod users;

pub use eligibility::EligibilityService;
pub use engagement::{dedup_window_start, EngagementService, CLICK_DEDUP_WINDOW_MINUTES};
pub use preferences::{PreferenceRefresher, PreferenceService, RefreshFailure};
pub use users::UserService;

use tracing::{debug, error, info};

use crate::domain::value_objects::{EntityId, GeoPoint};
use crate::error::{PromoError, PromoResult};
use crate::ports::outbound::LocationRepository;

/// The user's most recent recorded location
pub(crate) async fn resolve_location(
    locations: &dyn LocationRepository,
    user_id: &EntityId,
) -> PromoResult<GeoPoint> {
    let latest = locations.latest_location(user_id).await.map_err(|e| {
        error!(%user_id, error = %e, "failed to load latest location");
        PromoError::from(e)
    })?;
    match latest {
        Some(event) => {
            debug!(%user_id, location = %event.point, at = %event.event_time, "resolved user location");
            Ok(event.point)
        }
        None => {
            info!(%user_id, "no location recorded for user");
            Err(PromoError::LocationUnavailable(user_id.clone()))
        }
    }
}
