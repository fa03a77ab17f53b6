//! Symptom-to-diagnosis evaluation for a refrigeration rack, plus the
//! configuration tables the whole simulation is built from.

mod analyzer;
mod config;
mod engine;
mod error;
mod reference;
mod rule;

pub use analyzer::{Diagnosis, SymptomAnalyzer, NO_FAULT_DIAGNOSIS, NO_FAULT_NEXT_STEP};
pub use config::{RackConfig, RackTables};
pub use engine::{DiagnosticResult, DiagnosticsEngine};
pub use error::{ConfigError, DiagnosticsError};
pub use reference::{resolver_fn, FnResolver, ReferenceResolver, StaticReferenceResolver};
pub use rule::{Comparison, Condition, DiagnosisRule, RuleSet};
