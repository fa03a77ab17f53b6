use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimError;
use crate::snapshot::{Sensor, SensorSnapshot};

/// How a fault moves one reading away from its baseline value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Scale(f64),
    Offset(f64),
    Set(f64),
}

impl Transform {
    pub fn apply(self, baseline: f64) -> f64 {
        match self {
            Transform::Scale(k) => baseline * k,
            Transform::Offset(d) => baseline + d,
            Transform::Set(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    pub sensor: Sensor,
    pub transform: Transform,
}

/// Named recipe that turns a normal snapshot into a faulted one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaultArchetype {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub perturbations: Vec<Perturbation>,
    #[serde(default)]
    pub alarms: BTreeSet<String>,
}

impl FaultArchetype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            perturbations: Vec::new(),
            alarms: BTreeSet::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn scale(self, sensor: Sensor, factor: f64) -> Self {
        self.perturb(sensor, Transform::Scale(factor))
    }

    pub fn offset(self, sensor: Sensor, delta: f64) -> Self {
        self.perturb(sensor, Transform::Offset(delta))
    }

    pub fn set(self, sensor: Sensor, value: f64) -> Self {
        self.perturb(sensor, Transform::Set(value))
    }

    pub fn alarm(mut self, alarm: impl Into<String>) -> Self {
        self.alarms.insert(alarm.into());
        self
    }

    fn perturb(mut self, sensor: Sensor, transform: Transform) -> Self {
        self.perturbations.push(Perturbation { sensor, transform });
        self
    }

    /// Applies the recipe to a copy of `baseline`.
    ///
    /// Every transform reads the baseline value of its field. When a field is
    /// perturbed more than once, the last declared transform's result is kept.
    pub fn apply(&self, baseline: &SensorSnapshot) -> SensorSnapshot {
        let mut out = baseline.clone();
        for p in &self.perturbations {
            let value = p.transform.apply(baseline.value(p.sensor));
            out = out.with_value(p.sensor, value);
        }
        out.alarms.extend(self.alarms.iter().cloned());
        out
    }
}

/// Ordered set of fault archetypes with unique names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FaultArchetype>", into = "Vec<FaultArchetype>")]
pub struct FaultCatalog {
    archetypes: Vec<FaultArchetype>,
}

impl TryFrom<Vec<FaultArchetype>> for FaultCatalog {
    type Error = SimError;

    fn try_from(archetypes: Vec<FaultArchetype>) -> Result<Self, Self::Error> {
        FaultCatalog::new(archetypes)
    }
}

impl From<FaultCatalog> for Vec<FaultArchetype> {
    fn from(c: FaultCatalog) -> Self {
        c.archetypes
    }
}

impl Default for FaultCatalog {
    fn default() -> Self {
        Self {
            archetypes: vec![
                FaultArchetype::new("low_charge")
                    .describe("Low refrigerant charge")
                    .scale(Sensor::SuctionPressure, 0.7)
                    .scale(Sensor::Superheat, 1.5)
                    .scale(Sensor::Subcooling, 0.5)
                    .scale(Sensor::DischargeTemp, 1.2)
                    .alarm("low_suction_pressure"),
                FaultArchetype::new("high_discharge_temp")
                    .describe("High discharge temperature")
                    .set(Sensor::DischargeTemp, 250.0)
                    .scale(Sensor::DischargePressure, 1.3)
                    .set(Sensor::CondenserFanSpeed, 30.0)
                    .alarm("high_discharge_temp"),
                FaultArchetype::new("low_suction_pressure")
                    .describe("Low suction pressure")
                    .set(Sensor::SuctionPressure, 25.0)
                    .set(Sensor::Superheat, 25.0)
                    .scale(Sensor::CompressorCurrent, 0.8)
                    .alarm("low_suction_pressure"),
            ],
        }
    }
}

impl FaultCatalog {
    pub fn new(archetypes: Vec<FaultArchetype>) -> Result<Self, SimError> {
        let mut seen = BTreeSet::new();
        for a in &archetypes {
            if !seen.insert(a.name.as_str()) {
                return Err(SimError::DuplicateArchetype(a.name.clone()));
            }
        }
        Ok(Self { archetypes })
    }

    pub fn get(&self, name: &str) -> Result<&FaultArchetype, SimError> {
        self.archetypes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SimError::InvalidArchetype(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.archetypes.iter().map(|a| a.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaultArchetype> {
        self.archetypes.iter()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Looks archetypes up by name and applies them without touching the input.
#[derive(Clone, Debug)]
pub struct FaultInjector {
    catalog: Arc<FaultCatalog>,
}

impl FaultInjector {
    pub fn new(catalog: Arc<FaultCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FaultCatalog {
        &self.catalog
    }

    pub fn inject(&self, snapshot: &SensorSnapshot, archetype: &str) -> Result<SensorSnapshot, SimError> {
        let recipe = self.catalog.get(archetype)?;
        let faulted = recipe.apply(snapshot);
        debug!(archetype, alarms = ?faulted.alarms, "injected fault");
        Ok(faulted)
    }
}
