//! Aggregates module

pub mod user;
pub mod vendor;
pub mod campaign;
pub mod location;
pub mod engagement;

pub use user::{User, PreferenceUpdate};
pub use vendor::Vendor;
pub use campaign::{Campaign, CampaignMatch, CampaignRecord, Segment};
pub use location::LocationEvent;
pub use engagement::Engagement;
