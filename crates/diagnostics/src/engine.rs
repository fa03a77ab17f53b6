use safety::SafetyEvaluator;
use serde::Serialize;
use sim::Readings;
use tracing::debug;

use crate::analyzer::SymptomAnalyzer;
use crate::reference::{ReferenceResolver, StaticReferenceResolver};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticResult {
    pub diagnosis: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub next_steps: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub source_references: Vec<String>,
}

/// Runs the safety scan and the symptom analysis over the same readings and
/// attaches references for the chosen diagnosis.
#[derive(Clone, Debug)]
pub struct DiagnosticsEngine<Res = StaticReferenceResolver> {
    safety: SafetyEvaluator,
    analyzer: SymptomAnalyzer,
    resolver: Res,
}

impl DiagnosticsEngine<StaticReferenceResolver> {
    pub fn new(safety: SafetyEvaluator, analyzer: SymptomAnalyzer) -> Self {
        Self {
            safety,
            analyzer,
            resolver: StaticReferenceResolver::default(),
        }
    }

    /// Built-in thresholds, rules and citations.
    pub fn builtin() -> Self {
        Self::new(SafetyEvaluator::default(), SymptomAnalyzer::default())
    }
}

impl Default for DiagnosticsEngine<StaticReferenceResolver> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<Res: ReferenceResolver> DiagnosticsEngine<Res> {
    pub fn with_resolver<Other: ReferenceResolver>(self, resolver: Other) -> DiagnosticsEngine<Other> {
        DiagnosticsEngine {
            safety: self.safety,
            analyzer: self.analyzer,
            resolver,
        }
    }

    pub fn safety(&self) -> &SafetyEvaluator {
        &self.safety
    }

    pub fn analyzer(&self) -> &SymptomAnalyzer {
        &self.analyzer
    }

    pub fn diagnose<R: Readings + ?Sized>(&self, readings: &R) -> DiagnosticResult {
        let safety_warnings = self.safety.evaluate(readings);
        let d = self.analyzer.analyze(readings);
        let source_references = self.resolver.resolve(&d.diagnosis);

        debug!(
            diagnosis = %d.diagnosis,
            confidence = d.confidence,
            warnings = safety_warnings.len(),
            "diagnosis complete"
        );

        DiagnosticResult {
            diagnosis: d.diagnosis,
            confidence: d.confidence,
            next_steps: d.next_steps,
            safety_warnings,
            source_references,
        }
    }
}
