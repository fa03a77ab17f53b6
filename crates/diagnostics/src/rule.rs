use serde::{Deserialize, Serialize};
use sim::{Readings, Sensor};

use crate::error::DiagnosticsError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Below,
    Above,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub sensor: Sensor,
    pub comparison: Comparison,
    pub value: f64,
}

impl Condition {
    pub fn below(sensor: Sensor, value: f64) -> Self {
        Self { sensor, comparison: Comparison::Below, value }
    }

    pub fn above(sensor: Sensor, value: f64) -> Self {
        Self { sensor, comparison: Comparison::Above, value }
    }

    /// False when the reading is absent.
    pub fn holds<R: Readings + ?Sized>(&self, readings: &R) -> bool {
        match readings.reading(self.sensor) {
            Some(v) => match self.comparison {
                Comparison::Below => v < self.value,
                Comparison::Above => v > self.value,
            },
            None => false,
        }
    }
}

/// Conjunction of conditions mapped to a fixed diagnosis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRule {
    pub id: String,
    pub diagnosis: String,
    pub confidence: f64,
    pub conditions: Vec<Condition>,
    pub next_steps: Vec<String>,
}

impl DiagnosisRule {
    pub fn matches<R: Readings + ?Sized>(&self, readings: &R) -> bool {
        self.conditions.iter().all(|c| c.holds(readings))
    }

    fn validate(&self) -> Result<(), DiagnosticsError> {
        let invalid = |reason| DiagnosticsError::InvalidRule { id: self.id.clone(), reason };
        if self.conditions.is_empty() {
            return Err(invalid("rule has no conditions"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(invalid("confidence must lie within [0, 1]"));
        }
        if self.conditions.iter().any(|c| !c.value.is_finite()) {
            return Err(invalid("condition value must be finite"));
        }
        Ok(())
    }
}

/// Rules in priority order. The first match wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DiagnosisRule>", into = "Vec<DiagnosisRule>")]
pub struct RuleSet {
    rules: Vec<DiagnosisRule>,
}

impl TryFrom<Vec<DiagnosisRule>> for RuleSet {
    type Error = DiagnosticsError;

    fn try_from(rules: Vec<DiagnosisRule>) -> Result<Self, Self::Error> {
        RuleSet::new(rules)
    }
}

impl From<RuleSet> for Vec<DiagnosisRule> {
    fn from(r: RuleSet) -> Self {
        r.rules
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: vec![
                DiagnosisRule {
                    id: "low_charge_or_restriction".into(),
                    diagnosis: "Possible low refrigerant charge or liquid line restriction".into(),
                    confidence: 0.85,
                    conditions: vec![
                        Condition::below(Sensor::SuctionPressure, 35.0),
                        Condition::above(Sensor::Superheat, 20.0),
                    ],
                    next_steps: steps(&[
                        "Check sight glass for bubbles",
                        "Measure subcooling at condenser",
                        "Inspect liquid line for restrictions",
                        "Verify refrigerant charge",
                    ]),
                },
                DiagnosisRule {
                    id: "high_discharge_temp".into(),
                    diagnosis: "High discharge temperature condition".into(),
                    confidence: 0.90,
                    conditions: vec![Condition::above(Sensor::DischargeTemp, 200.0)],
                    next_steps: steps(&[
                        "Check condenser fan operation",
                        "Verify condenser cleanliness",
                        "Check for non-condensables",
                        "Verify proper refrigerant charge",
                    ]),
                },
            ],
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<DiagnosisRule>) -> Result<Self, DiagnosticsError> {
        let mut set = Self { rules: Vec::with_capacity(rules.len()) };
        for rule in rules {
            set.push(rule)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, rule: DiagnosisRule) -> Result<(), DiagnosticsError> {
        let len = self.rules.len();
        self.insert(len, rule)
    }

    /// Inserts `rule` so that it is evaluated at `position` (0 = first).
    pub fn insert(&mut self, position: usize, rule: DiagnosisRule) -> Result<(), DiagnosticsError> {
        if position > self.rules.len() {
            return Err(DiagnosticsError::RuleIndexOutOfRange { position, len: self.rules.len() });
        }
        rule.validate()?;
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(DiagnosticsError::DuplicateRule(rule.id));
        }
        self.rules.insert(position, rule);
        Ok(())
    }

    pub fn first_match<R: Readings + ?Sized>(&self, readings: &R) -> Option<&DiagnosisRule> {
        self.rules.iter().find(|r| r.matches(readings))
    }

    pub fn rules(&self) -> &[DiagnosisRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
