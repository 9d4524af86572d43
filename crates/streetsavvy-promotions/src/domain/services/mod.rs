//! Domain services module
//!
//! Pure matching rules. Nothing here touches storage or the clock.

pub mod geo;
pub mod temporal;
pub mod segment;
pub mod eligibility;
pub mod preference;

pub use geo::{planar_distance_m, within_radius};
pub use temporal::is_live;
pub use segment::SegmentRule;
pub use eligibility::EligibilityPolicy;
pub use preference::{PreferenceAggregator, UsageCount};
