//! Refrigeration rack state simulation: sensor snapshots, operating ranges,
//! baseline generation and fault injection.

mod error;
mod fault;
mod generator;
mod range;
mod snapshot;

pub use error::SimError;
pub use fault::{FaultArchetype, FaultCatalog, FaultInjector, Perturbation, Transform};
pub use generator::StateGenerator;
pub use range::{OperatingRange, OperatingRanges};
pub use snapshot::{PartialReadings, Readings, Sensor, SensorSnapshot};
