//! Infrastructure layer
//!
//! Concrete stores and clocks behind the outbound ports.

pub mod clock;
pub mod persistence;

pub use clock::{FixedClock, SystemClock};
pub use persistence::memory::InMemoryStore;
pub use persistence::postgres::{PostgresConfig, PostgresStore};
