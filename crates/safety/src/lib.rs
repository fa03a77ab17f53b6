use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sim::{Readings, Sensor};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("WARNING"),
            Severity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Single-sided limit on a reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Max(f64),
    Min(f64),
}

impl Bound {
    pub fn limit(self) -> f64 {
        match self {
            Bound::Max(v) | Bound::Min(v) => v,
        }
    }

    pub fn is_exceeded_by(self, reading: f64) -> bool {
        match self {
            Bound::Max(limit) => reading > limit,
            Bound::Min(limit) => reading < limit,
        }
    }
}

/// A fixed critical limit with the warning raised when it is crossed.
///
/// `message` is a template: `{reading}` and `{limit}` are replaced with the
/// offending value and the bound, and the severity is prefixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyThreshold {
    pub sensor: Sensor,
    pub bound: Bound,
    pub severity: Severity,
    pub message: String,
}

impl SafetyThreshold {
    pub fn new(sensor: Sensor, bound: Bound, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            sensor,
            bound,
            severity,
            message: message.into(),
        }
    }

    pub fn render(&self, reading: f64) -> String {
        let body = self
            .message
            .replace("{reading}", &reading.to_string())
            .replace("{limit}", &self.bound.limit().to_string());
        format!("{}: {}", self.severity, body)
    }
}

/// Built-in limits, checked in this order.
pub fn default_thresholds() -> Vec<SafetyThreshold> {
    vec![
        SafetyThreshold::new(
            Sensor::DischargeTemp,
            Bound::Max(275.0),
            Severity::Critical,
            "Discharge temperature {reading}°F exceeds maximum safe limit of {limit}°F. Shut down if persistent.",
        ),
        SafetyThreshold::new(
            Sensor::SuctionPressure,
            Bound::Min(20.0),
            Severity::Warning,
            "Suction pressure {reading} psig below minimum safe limit of {limit} psig. Check for low charge or restriction.",
        ),
        SafetyThreshold::new(
            Sensor::Superheat,
            Bound::Max(30.0),
            Severity::Warning,
            "Superheat {reading}°F exceeds maximum of {limit}°F. Check for a starved evaporator or restriction.",
        ),
        SafetyThreshold::new(
            Sensor::Subcooling,
            Bound::Min(5.0),
            Severity::Warning,
            "Subcooling {reading}°F below minimum of {limit}°F. Verify refrigerant charge.",
        ),
    ]
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SafetyWarning {
    pub sensor: Sensor,
    pub severity: Severity,
    pub reading: f64,
    pub limit: f64,
    pub message: String,
}

/// Scans readings against the configured limits, independently of any
/// diagnosis.
#[derive(Clone, Debug)]
pub struct SafetyEvaluator {
    thresholds: Arc<Vec<SafetyThreshold>>,
}

impl Default for SafetyEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(default_thresholds()))
    }
}

impl SafetyEvaluator {
    pub fn new(thresholds: Arc<Vec<SafetyThreshold>>) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[SafetyThreshold] {
        &self.thresholds
    }

    /// One warning per crossed limit, in threshold order. A missing reading
    /// never crosses a limit, whichever side the limit is on.
    pub fn check<R: Readings + ?Sized>(&self, readings: &R) -> Vec<SafetyWarning> {
        let mut out = Vec::new();
        for t in self.thresholds.iter() {
            let Some(reading) = readings.reading(t.sensor) else {
                debug!(sensor = %t.sensor, "reading absent, threshold skipped");
                continue;
            };
            if t.bound.is_exceeded_by(reading) {
                out.push(SafetyWarning {
                    sensor: t.sensor,
                    severity: t.severity,
                    reading,
                    limit: t.bound.limit(),
                    message: t.render(reading),
                });
            }
        }
        out
    }

    pub fn evaluate<R: Readings + ?Sized>(&self, readings: &R) -> Vec<String> {
        self.check(readings).into_iter().map(|w| w.message).collect()
    }
}
