use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use tracing::debug;

use crate::range::{OperatingRange, OperatingRanges};
use crate::snapshot::SensorSnapshot;

/// Produces baseline snapshots by sampling every sensor uniformly within its
/// operating range.
#[derive(Clone, Debug)]
pub struct StateGenerator<R = StdRng> {
    ranges: Arc<OperatingRanges>,
    rng: R,
}

impl StateGenerator<StdRng> {
    pub fn seeded(ranges: Arc<OperatingRanges>, seed: u64) -> Self {
        Self::with_rng(ranges, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(ranges: Arc<OperatingRanges>) -> Self {
        Self::with_rng(ranges, StdRng::from_entropy())
    }
}

impl<R: Rng> StateGenerator<R> {
    pub fn with_rng(ranges: Arc<OperatingRanges>, rng: R) -> Self {
        Self { ranges, rng }
    }

    pub fn generate_normal(&mut self) -> SensorSnapshot {
        let r = Arc::clone(&self.ranges);
        let snapshot = SensorSnapshot {
            suction_pressure_psig: self.sample(r.suction_pressure_psig),
            discharge_pressure_psig: self.sample(r.discharge_pressure_psig),
            discharge_temp_f: self.sample(r.discharge_temp_f),
            superheat_f: self.sample(r.superheat_f),
            subcooling_f: self.sample(r.subcooling_f),
            compressor_amps: self.sample(r.compressor_amps),
            condenser_fan_speed: self.sample_percent(r.condenser_fan_speed),
            liquid_line_temp_f: self.sample(r.liquid_line_temp_f),
            alarms: BTreeSet::new(),
        };
        debug!(?snapshot, "generated normal snapshot");
        snapshot
    }

    fn sample(&mut self, range: OperatingRange) -> f64 {
        Uniform::new_inclusive(range.min(), range.max()).sample(&mut self.rng)
    }

    // Ranges that passed `OperatingRanges::validate` always hold a whole percent.
    fn sample_percent(&mut self, range: OperatingRange) -> u8 {
        let lo = range.min().ceil().clamp(0.0, 100.0) as u8;
        let hi = range.max().floor().clamp(0.0, 100.0) as u8;
        if lo >= hi {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }
}
