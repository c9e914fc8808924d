//! Test harness utilities shared by the unit and behavioural suites.

mod config_loader;
mod hub;
mod reporter;
mod world;

pub use config_loader::{MockLoader, TestConfigLoader};
pub use hub::FakeHub;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
