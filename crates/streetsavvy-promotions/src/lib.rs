//! StreetSavvy Promotions Engine
//!
//! Decides which geofenced vendor campaigns a user currently qualifies for
//! and records engagement (click/use) events against them.
//!
//! ## Architecture
//!
//! - **Domain Layer**: aggregates, value objects and the pure matching rules
//!   (geofence, temporal validity, audience segments)
//! - **Application Layer**: eligibility, engagement and preference services
//! - **Ports Layer**: use-case traits and the store/clock interfaces
//! - **Infrastructure Layer**: in-memory and Postgres stores, system clock
//!
//! ## Flow
//!
//! ```text
//!  user id ──► resolve location ──► batch load campaigns ──► live? ─► in fence? ─► segment? ──► matches
//!
//!  engagement ──► validate ──► resolve location ──► dedup + append ──┬──► { duplicate }
//!                                                                    └──► (used) preference queue
//! ```

pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;
pub mod error;

pub use domain::aggregates::{
    Campaign, CampaignMatch, CampaignRecord, Engagement, LocationEvent, Segment, User, Vendor,
};
pub use domain::value_objects::{EngagementAction, EntityId, GeoPoint};
pub use domain::services::SegmentRule;
pub use application::{
    EligibilityService, EngagementService, PreferenceRefresher, PreferenceService, UserService,
};
pub use ports::inbound::{CampaignUseCases, EngagementResult, EngagementUseCases, UserUseCases};
pub use ports::outbound::{
    CampaignRepository, Clock, EngagementRepository, LocationRepository, StoreError, StoreHealth,
    StoreResult, UserRepository,
};
pub use error::{PromoError, PromoResult};
