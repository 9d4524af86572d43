//! User profile and location service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::aggregates::{LocationEvent, User};
use crate::domain::value_objects::{EntityId, GeoPoint};
use crate::error::{PromoError, PromoResult};
use crate::ports::inbound::UserUseCases;
use crate::ports::outbound::{Clock, LocationRepository, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    locations: Arc<dyn LocationRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        locations: Arc<dyn LocationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, locations, clock }
    }
}

#[async_trait]
impl UserUseCases for UserService {
    async fn get_user(&self, user_id: &EntityId) -> PromoResult<User> {
        let user = self.users.find_user(user_id).await.map_err(|e| {
            error!(%user_id, error = %e, "failed to load user");
            PromoError::from(e)
        })?;
        user.ok_or_else(|| {
            debug!(%user_id, "user not found");
            PromoError::UserNotFound(user_id.clone())
        })
    }

    async fn record_location(&self, user_id: &EntityId, lat: f64, lng: f64) -> PromoResult<LocationEvent> {
        let point = GeoPoint::new(lat, lng)?;
        let event = LocationEvent::new(user_id.clone(), point, self.clock.now());
        self.locations.append_location(&event).await.map_err(|e| {
            error!(%user_id, error = %e, "failed to append location");
            PromoError::from(e)
        })?;
        info!(%user_id, location = %point, "recorded location ping");
        Ok(event)
    }
}
