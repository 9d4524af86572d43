//! StreetSavvy Promotions API
//!
//! HTTP surface over the promotions engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        REST API (axum)                       │
//! │   /health   /api/users/...   /api/campaigns/...   OpenAPI    │
//! └───────────────┬───────────────────┬──────────────────────────┘
//!                 │                   │
//!        ┌────────▼────────┐  ┌───────▼────────┐  ┌──────────────┐
//!        │   Eligibility   │  │   Engagement   │──► Preference   │
//!        │    service      │  │    service     │  │ refresh queue│
//!        └────────┬────────┘  └───────┬────────┘  └──────┬───────┘
//!                 └──────────┬────────┴──────────────────┘
//!                      ┌─────▼──────┐
//!                      │   store    │  memory | postgres
//!                      └────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod routes;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use streetsavvy_promotions::{
    CampaignRepository, CampaignUseCases, Clock, EligibilityService, EngagementRepository,
    EngagementService, EngagementUseCases, LocationRepository, PreferenceRefresher,
    PreferenceService, StoreHealth, UserRepository, UserService, UserUseCases,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use error::ApiError;
pub use models::*;

/// API state
#[derive(Clone)]
pub struct ApiState {
    pub campaigns: Arc<dyn CampaignUseCases>,
    pub engagements: Arc<dyn EngagementUseCases>,
    pub users: Arc<dyn UserUseCases>,
    pub store: Arc<dyn StoreHealth>,
}

impl ApiState {
    /// Wire the services over one store. Spawns the preference refresh
    /// workers, so this must run inside a tokio runtime.
    pub fn from_store<S>(store: Arc<S>, clock: Arc<dyn Clock>, queue_capacity: usize) -> Self
    where
        S: UserRepository
            + LocationRepository
            + CampaignRepository
            + EngagementRepository
            + StoreHealth
            + 'static,
    {
        let preferences = Arc::new(PreferenceService::new(store.clone(), store.clone(), clock.clone()));
        let refresher = PreferenceRefresher::spawn(preferences, queue_capacity);

        Self {
            campaigns: Arc::new(EligibilityService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                clock.clone(),
            )),
            engagements: Arc::new(EngagementService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                refresher,
            )),
            users: Arc::new(UserService::new(store.clone(), store.clone(), clock)),
            store,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "StreetSavvy Promotions API",
        version = "0.1.0",
        description = "Location-aware vendor campaigns and engagement tracking",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::users::get_user,
        routes::users::record_location,
        routes::users::nearby_campaigns,
        routes::campaigns::active_campaigns,
        routes::campaigns::nearby_campaigns,
        routes::engagements::engage,
    ),
    components(
        schemas(
            ErrorResponse,
            UserView, LocationCreate, LocationView,
            CampaignView, CampaignMatchView,
            EngagementCreate, EngagementView,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User profiles and location pings"),
        (name = "campaigns", description = "Campaign discovery"),
        (name = "engagements", description = "Click and use tracking")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest(
            "/users",
            routes::users::router().merge(routes::engagements::router()),
        )
        .nest("/campaigns", routes::campaigns::router())
}
