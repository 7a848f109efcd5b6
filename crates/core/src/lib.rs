//! Domain layer for the ambulance device list bootstrap.
//!
//! Holds the seed document shape, the fixture that feeds it and the retry
//! schedule used while waiting for MongoDB.

pub mod fixture;
pub mod retry;
pub mod types;

pub use fixture::{FixtureError, FixtureSource, SeedFixture};
pub use retry::RetryPolicy;
pub use types::{DeviceEntry, DeviceLog, INDEXED_FIELD};
