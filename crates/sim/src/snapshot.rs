use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// One tracked rack sensor. Serialized under its wire key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sensor {
    #[serde(rename = "suction_pressure_psig")]
    SuctionPressure,
    #[serde(rename = "discharge_pressure_psig")]
    DischargePressure,
    #[serde(rename = "discharge_temp_f")]
    DischargeTemp,
    #[serde(rename = "superheat_f")]
    Superheat,
    #[serde(rename = "subcooling_f")]
    Subcooling,
    #[serde(rename = "compressor_amps")]
    CompressorCurrent,
    #[serde(rename = "condenser_fan_speed")]
    CondenserFanSpeed,
    #[serde(rename = "liquid_line_temp_f")]
    LiquidLineTemp,
}

impl Sensor {
    pub const ALL: [Sensor; 8] = [
        Sensor::SuctionPressure,
        Sensor::DischargePressure,
        Sensor::DischargeTemp,
        Sensor::Superheat,
        Sensor::Subcooling,
        Sensor::CompressorCurrent,
        Sensor::CondenserFanSpeed,
        Sensor::LiquidLineTemp,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Sensor::SuctionPressure => "suction_pressure_psig",
            Sensor::DischargePressure => "discharge_pressure_psig",
            Sensor::DischargeTemp => "discharge_temp_f",
            Sensor::Superheat => "superheat_f",
            Sensor::Subcooling => "subcooling_f",
            Sensor::CompressorCurrent => "compressor_amps",
            Sensor::CondenserFanSpeed => "condenser_fan_speed",
            Sensor::LiquidLineTemp => "liquid_line_temp_f",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Sensor::SuctionPressure | Sensor::DischargePressure => "psig",
            Sensor::DischargeTemp
            | Sensor::Superheat
            | Sensor::Subcooling
            | Sensor::LiquidLineTemp => "°F",
            Sensor::CompressorCurrent => "A",
            Sensor::CondenserFanSpeed => "%",
        }
    }

    pub fn from_key(key: &str) -> Option<Sensor> {
        Sensor::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Read access to sensor values, whether every field is known or not.
///
/// `None` means the reading is absent. Evaluators treat an absent reading as
/// satisfying no comparison at all.
pub trait Readings {
    fn reading(&self, sensor: Sensor) -> Option<f64>;
}

/// Point-in-time reading of every tracked sensor plus the active alarms.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub suction_pressure_psig: f64,
    pub discharge_pressure_psig: f64,
    pub discharge_temp_f: f64,
    pub superheat_f: f64,
    pub subcooling_f: f64,
    pub compressor_amps: f64,
    /// 0..=100 percent duty
    pub condenser_fan_speed: u8,
    pub liquid_line_temp_f: f64,
    pub alarms: BTreeSet<String>,
}

impl SensorSnapshot {
    pub fn value(&self, sensor: Sensor) -> f64 {
        match sensor {
            Sensor::SuctionPressure => self.suction_pressure_psig,
            Sensor::DischargePressure => self.discharge_pressure_psig,
            Sensor::DischargeTemp => self.discharge_temp_f,
            Sensor::Superheat => self.superheat_f,
            Sensor::Subcooling => self.subcooling_f,
            Sensor::CompressorCurrent => self.compressor_amps,
            Sensor::CondenserFanSpeed => f64::from(self.condenser_fan_speed),
            Sensor::LiquidLineTemp => self.liquid_line_temp_f,
        }
    }

    /// Returns a copy with one reading replaced. Fan speed is rounded and
    /// clamped to a valid duty percentage.
    pub fn with_value(mut self, sensor: Sensor, value: f64) -> Self {
        match sensor {
            Sensor::SuctionPressure => self.suction_pressure_psig = value,
            Sensor::DischargePressure => self.discharge_pressure_psig = value,
            Sensor::DischargeTemp => self.discharge_temp_f = value,
            Sensor::Superheat => self.superheat_f = value,
            Sensor::Subcooling => self.subcooling_f = value,
            Sensor::CompressorCurrent => self.compressor_amps = value,
            Sensor::CondenserFanSpeed => self.condenser_fan_speed = fan_duty(value),
            Sensor::LiquidLineTemp => self.liquid_line_temp_f = value,
        }
        self
    }

    pub fn with_alarm(mut self, alarm: impl Into<String>) -> Self {
        self.alarms.insert(alarm.into());
        self
    }

    pub fn has_alarm(&self, alarm: &str) -> bool {
        self.alarms.contains(alarm)
    }
}

impl Readings for SensorSnapshot {
    fn reading(&self, sensor: Sensor) -> Option<f64> {
        Some(self.value(sensor))
    }
}

fn fan_duty(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Sensor record as it arrives from outside the core: any field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialReadings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suction_pressure_psig: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_pressure_psig: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_temp_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superheat_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcooling_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressor_amps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condenser_fan_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_line_temp_f: Option<f64>,
    #[serde(default)]
    pub alarms: BTreeSet<String>,
}

impl PartialReadings {
    pub fn get(&self, sensor: Sensor) -> Option<f64> {
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

    pub fn set(&mut self, sensor: Sensor, value: f64) {
        let slot = match sensor {
            Sensor::SuctionPressure => &mut self.suction_pressure_psig,
            Sensor::DischargePressure => &mut self.discharge_pressure_psig,
            Sensor::DischargeTemp => &mut self.discharge_temp_f,
            Sensor::Superheat => &mut self.superheat_f,
            Sensor::Subcooling => &mut self.subcooling_f,
            Sensor::CompressorCurrent => &mut self.compressor_amps,
            Sensor::CondenserFanSpeed => &mut self.condenser_fan_speed,
            Sensor::LiquidLineTemp => &mut self.liquid_line_temp_f,
        };
        *slot = Some(value);
    }

    pub fn with(mut self, sensor: Sensor, value: f64) -> Self {
        self.set(sensor, value);
        self
    }

    /// Sensors with no usable value (absent or not finite).
    pub fn missing(&self) -> Vec<Sensor> {
        Sensor::ALL
            .into_iter()
            .filter(|s| !matches!(self.get(*s), Some(v) if v.is_finite()))
            .collect()
    }
}

impl Readings for PartialReadings {
    fn reading(&self, sensor: Sensor) -> Option<f64> {
        self.get(sensor).filter(|v| v.is_finite())
    }
}

impl From<&SensorSnapshot> for PartialReadings {
    fn from(s: &SensorSnapshot) -> Self {
        let mut out = PartialReadings {
            alarms: s.alarms.clone(),
            ..Default::default()
        };
        for sensor in Sensor::ALL {
            out.set(sensor, s.value(sensor));
        }
        out
    }
}

impl TryFrom<PartialReadings> for SensorSnapshot {
    type Error = SimError;

    fn try_from(r: PartialReadings) -> Result<Self, Self::Error> {
        let missing = r.missing();
        if !missing.is_empty() {
            let keys: Vec<&str> = missing.iter().map(|s| s.key()).collect();
            return Err(SimError::MalformedSnapshot(format!(
                "missing or non-finite readings: {}",
                keys.join(", ")
            )));
        }

        let fan = r.condenser_fan_speed.unwrap_or_default();
        if !(0.0..=100.0).contains(&fan) {
            return Err(SimError::MalformedSnapshot(format!(
                "condenser_fan_speed {fan} outside 0..=100"
            )));
        }

        Ok(SensorSnapshot {
            suction_pressure_psig: r.suction_pressure_psig.unwrap_or_default(),
            discharge_pressure_psig: r.discharge_pressure_psig.unwrap_or_default(),
            discharge_temp_f: r.discharge_temp_f.unwrap_or_default(),
            superheat_f: r.superheat_f.unwrap_or_default(),
            subcooling_f: r.subcooling_f.unwrap_or_default(),
            compressor_amps: r.compressor_amps.unwrap_or_default(),
            condenser_fan_speed: fan_duty(fan),
            liquid_line_temp_f: r.liquid_line_temp_f.unwrap_or_default(),
            alarms: r.alarms,
        })
    }
}
