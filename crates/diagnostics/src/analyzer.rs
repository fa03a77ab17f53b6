use std::sync::Arc;

use serde::Serialize;
use sim::Readings;
use tracing::debug;

use crate::rule::RuleSet;

pub const NO_FAULT_DIAGNOSIS: &str = "No clear fault condition detected";
pub const NO_FAULT_NEXT_STEP: &str = "Continue monitoring system parameters";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnosis {
    /// Id of the matching rule, `None` for the no-fault result.
    pub rule_id: Option<String>,
    pub diagnosis: String,
    pub confidence: f64,
    pub next_steps: Vec<String>,
}

impl Diagnosis {
    pub fn no_fault() -> Self {
        Self {
            rule_id: None,
            diagnosis: NO_FAULT_DIAGNOSIS.to_string(),
            confidence: 0.0,
            next_steps: vec![NO_FAULT_NEXT_STEP.to_string()],
        }
    }

    pub fn is_fault(&self) -> bool {
        self.rule_id.is_some()
    }
}

/// Picks a single diagnosis from an ordered rule table.
///
/// Simultaneous fault signatures are not merged or ranked: whichever rule
/// comes first in the table decides the outcome.
#[derive(Clone, Debug)]
pub struct SymptomAnalyzer {
    rules: Arc<RuleSet>,
}

impl Default for SymptomAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(RuleSet::default()))
    }
}

impl SymptomAnalyzer {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn analyze<R: Readings + ?Sized>(&self, readings: &R) -> Diagnosis {
        match self.rules.first_match(readings) {
            Some(rule) => {
                debug!(rule = %rule.id, confidence = rule.confidence, "rule matched");
                Diagnosis {
                    rule_id: Some(rule.id.clone()),
                    diagnosis: rule.diagnosis.clone(),
                    confidence: rule.confidence,
                    next_steps: rule.next_steps.clone(),
                }
            }
            None => Diagnosis::no_fault(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Condition, DiagnosisRule};
    use sim::{PartialReadings, Sensor};

    fn nominal() -> PartialReadings {
        PartialReadings::default()
            .with(Sensor::SuctionPressure, 40.0)
            .with(Sensor::DischargePressure, 200.0)
            .with(Sensor::DischargeTemp, 180.0)
            .with(Sensor::Superheat, 12.0)
            .with(Sensor::Subcooling, 10.0)
            .with(Sensor::CompressorCurrent, 12.5)
            .with(Sensor::CondenserFanSpeed, 80.0)
            .with(Sensor::LiquidLineTemp, 100.0)
    }

    #[test]
    fn low_suction_with_high_superheat() {
        let r = PartialReadings::default()
            .with(Sensor::SuctionPressure, 30.0)
            .with(Sensor::Superheat, 25.0);
        let d = SymptomAnalyzer::default().analyze(&r);
        assert_eq!(d.diagnosis, "Possible low refrigerant charge or liquid line restriction");
        assert_eq!(d.confidence, 0.85);
        assert_eq!(d.next_steps.len(), 4);
        assert_eq!(d.next_steps[0], "Check sight glass for bubbles");
    }

    #[test]
    fn high_discharge_temperature() {
        let r = PartialReadings::default()
            .with(Sensor::DischargeTemp, 210.0)
            .with(Sensor::SuctionPressure, 40.0)
            .with(Sensor::Superheat, 10.0);
        let d = SymptomAnalyzer::default().analyze(&r);
        assert_eq!(d.diagnosis, "High discharge temperature condition");
        assert_eq!(d.confidence, 0.90);
        assert_eq!(d.rule_id.as_deref(), Some("high_discharge_temp"));
    }

    #[test]
    fn nominal_readings_give_no_fault() {
        let d = SymptomAnalyzer::default().analyze(&nominal());
        assert_eq!(d, Diagnosis::no_fault());
        assert_eq!(d.diagnosis, NO_FAULT_DIAGNOSIS);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.next_steps, vec![NO_FAULT_NEXT_STEP.to_string()]);
        assert!(!d.is_fault());
    }

    #[test]
    fn first_matching_rule_wins_over_later_ones() {
        let r = nominal()
            .with(Sensor::SuctionPressure, 28.0)
            .with(Sensor::Superheat, 22.0)
            .with(Sensor::DischargeTemp, 240.0);
        let d = SymptomAnalyzer::default().analyze(&r);
        assert_eq!(d.rule_id.as_deref(), Some("low_charge_or_restriction"));
    }

    #[test]
    fn extended_rule_at_front_takes_priority() {
        let mut rules = RuleSet::default();
        rules
            .insert(
                0,
                DiagnosisRule {
                    id: "overheated_compressor".into(),
                    diagnosis: "Compressor overheating".into(),
                    confidence: 0.95,
                    conditions: vec![Condition::above(Sensor::DischargeTemp, 260.0)],
                    next_steps: vec!["Shut down compressor".into()],
                },
            )
            .unwrap();
        let a = SymptomAnalyzer::new(Arc::new(rules));
        let d = a.analyze(&nominal().with(Sensor::DischargeTemp, 270.0));
        assert_eq!(d.diagnosis, "Compressor overheating");
        let d = a.analyze(&nominal().with(Sensor::DischargeTemp, 230.0));
        assert_eq!(d.diagnosis, "High discharge temperature condition");
    }

    #[test]
    fn analysis_is_repeatable() {
        let a = SymptomAnalyzer::default();
        let r = nominal().with(Sensor::DischargeTemp, 215.0);
        assert_eq!(a.analyze(&r), a.analyze(&r));
    }
}
