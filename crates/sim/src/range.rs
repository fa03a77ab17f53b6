use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::snapshot::{Readings, Sensor};

/// Inclusive known-good band for one sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr", into = "RangeRepr")]
pub struct OperatingRange {
    min: f64,
    max: f64,
}

#[derive(Serialize, Deserialize)]
struct RangeRepr {
    min: f64,
    max: f64,
}

impl TryFrom<RangeRepr> for OperatingRange {
    type Error = SimError;

    fn try_from(r: RangeRepr) -> Result<Self, Self::Error> {
        OperatingRange::new(r.min, r.max)
    }
}

impl From<OperatingRange> for RangeRepr {
    fn from(r: OperatingRange) -> Self {
        RangeRepr { min: r.min, max: r.max }
    }
}

impl OperatingRange {
    pub fn new(min: f64, max: f64) -> Result<Self, SimError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SimError::InvalidRange { min, max, reason: "bounds must be finite" });
        }
        if min > max {
            return Err(SimError::InvalidRange { min, max, reason: "min exceeds max" });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Normal operating ranges for every tracked sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatingRanges {
    pub suction_pressure_psig: OperatingRange,
    pub discharge_pressure_psig: OperatingRange,
    pub discharge_temp_f: OperatingRange,
    pub superheat_f: OperatingRange,
    pub subcooling_f: OperatingRange,
    pub compressor_amps: OperatingRange,
    pub condenser_fan_speed: OperatingRange,
    pub liquid_line_temp_f: OperatingRange,
}

impl Default for OperatingRanges {
    /// R-448A medium-temperature rack.
    fn default() -> Self {
        let r = |min, max| OperatingRange { min, max };
        Self {
            suction_pressure_psig: r(35.0, 45.0),
            discharge_pressure_psig: r(180.0, 220.0),
            discharge_temp_f: r(160.0, 200.0),
            superheat_f: r(8.0, 15.0),
            subcooling_f: r(8.0, 15.0),
            compressor_amps: r(10.0, 15.0),
            condenser_fan_speed: r(60.0, 100.0),
            liquid_line_temp_f: r(90.0, 110.0),
        }
    }
}

impl OperatingRanges {
    pub fn get(&self, sensor: Sensor) -> OperatingRange {
        match sensor {
            Sensor::SuctionPressure => self.suction_pressure_psig,
            Sensor::DischargePressure => self.discharge_pressure_psig,
            Sensor::DischargeTemp => self.discharge_temp_f,
            Sensor::Superheat => self.superheat_f,
            Sensor::Subcooling => self.subcooling_f,
            Sensor::CompressorCurrent => self.compressor_amps,
            Sensor::CondenserFanSpeed => self.condenser_fan_speed,
            Sensor::LiquidLineTemp => self.liquid_line_temp_f,
        }
    }

    /// Fan duty is sampled as a whole percentage, so its band must lie inside
    /// 0..=100 and contain at least one integer.
    pub fn validate(&self) -> Result<(), SimError> {
        let fan = self.condenser_fan_speed;
        if fan.min < 0.0 || fan.max > 100.0 {
            return Err(SimError::InvalidRange {
                min: fan.min,
                max: fan.max,
                reason: "condenser fan duty must lie within 0..=100",
            });
        }
        if fan.min.ceil() > fan.max.floor() {
            return Err(SimError::InvalidRange {
                min: fan.min,
                max: fan.max,
                reason: "condenser fan duty range contains no whole percentage",
            });
        }
        Ok(())
    }

    /// Sensors whose reading falls outside its band. Absent readings are not
    /// reported.
    pub fn out_of_range<R: Readings + ?Sized>(&self, readings: &R) -> Vec<Sensor> {
        Sensor::ALL
            .into_iter()
            .filter(|s| matches!(readings.reading(*s), Some(v) if !self.get(*s).contains(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_inverted_and_non_finite_bounds() {
        assert_matches!(OperatingRange::new(5.0, 1.0), Err(SimError::InvalidRange { .. }));
        assert_matches!(OperatingRange::new(f64::NAN, 1.0), Err(SimError::InvalidRange { .. }));
        assert!(OperatingRange::new(3.0, 3.0).is_ok());
    }

    #[test]
    fn deserialization_validates_bounds() {
        let ok: OperatingRange = serde_json::from_str(r#"{"min": 35, "max": 45}"#).unwrap();
        assert!(ok.contains(35.0) && ok.contains(45.0) && !ok.contains(45.1));
        assert!(serde_json::from_str::<OperatingRange>(r#"{"min": 45, "max": 35}"#).is_err());
    }

    #[test]
    fn default_ranges_are_valid() {
        assert!(OperatingRanges::default().validate().is_ok());
    }

    #[test]
    fn fan_range_without_whole_percent_is_rejected() {
        let mut r = OperatingRanges::default();
        r.condenser_fan_speed = OperatingRange::new(60.2, 60.8).unwrap();
        assert_matches!(r.validate(), Err(SimError::InvalidRange { .. }));
        r.condenser_fan_speed = OperatingRange::new(50.0, 120.0).unwrap();
        assert_matches!(r.validate(), Err(SimError::InvalidRange { .. }));
    }
}
