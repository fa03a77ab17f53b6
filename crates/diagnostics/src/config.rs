use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use safety::{default_thresholds, SafetyEvaluator, SafetyThreshold};
use serde::{Deserialize, Serialize};
use sim::{FaultCatalog, FaultInjector, OperatingRanges, StateGenerator};
use tracing::info;

use crate::analyzer::SymptomAnalyzer;
use crate::engine::DiagnosticsEngine;
use crate::error::ConfigError;
use crate::reference::StaticReferenceResolver;
use crate::rule::RuleSet;

/// Static tables as read from a JSON file. Every table except `references`
/// must be present and non-empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RackConfig {
    pub ranges: Option<OperatingRanges>,
    pub archetypes: Option<FaultCatalog>,
    pub thresholds: Option<Vec<SafetyThreshold>>,
    pub rules: Option<RuleSet>,
    /// Citations per diagnosis label; unknown labels use the built-in fallback.
    #[serde(default)]
    pub references: BTreeMap<String, Vec<String>>,
}

impl RackConfig {
    pub fn builtin() -> Self {
        Self {
            ranges: Some(OperatingRanges::default()),
            archetypes: Some(FaultCatalog::default()),
            thresholds: Some(default_thresholds()),
            rules: Some(RuleSet::default()),
            references: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), "loaded rack configuration");
        Ok(config)
    }

    /// Validates every table and freezes them for sharing.
    pub fn into_tables(self) -> Result<RackTables, ConfigError> {
        let ranges = self.ranges.ok_or(ConfigError::MissingConfiguration { table: "ranges" })?;
        ranges.validate()?;

        let catalog = self
            .archetypes
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::MissingConfiguration { table: "archetypes" })?;
        let thresholds = self
            .thresholds
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingConfiguration { table: "thresholds" })?;
        let rules = self
            .rules
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingConfiguration { table: "rules" })?;

        Ok(RackTables {
            ranges: Arc::new(ranges),
            catalog: Arc::new(catalog),
            thresholds: Arc::new(thresholds),
            rules: Arc::new(rules),
            references: StaticReferenceResolver::default().with_entries(self.references),
        })
    }
}

/// Immutable, validated tables shared by every simulation session.
#[derive(Clone, Debug)]
pub struct RackTables {
    ranges: Arc<OperatingRanges>,
    catalog: Arc<FaultCatalog>,
    thresholds: Arc<Vec<SafetyThreshold>>,
    rules: Arc<RuleSet>,
    references: StaticReferenceResolver,
}

impl Default for RackTables {
    fn default() -> Self {
        Self {
            ranges: Arc::new(OperatingRanges::default()),
            catalog: Arc::new(FaultCatalog::default()),
            thresholds: Arc::new(default_thresholds()),
            rules: Arc::new(RuleSet::default()),
            references: StaticReferenceResolver::default(),
        }
    }
}

impl RackTables {
    pub fn ranges(&self) -> &OperatingRanges {
        &self.ranges
    }

    pub fn catalog(&self) -> &FaultCatalog {
        &self.catalog
    }

    pub fn generator(&self, seed: u64) -> StateGenerator {
        StateGenerator::seeded(Arc::clone(&self.ranges), seed)
    }

    pub fn generator_from_entropy(&self) -> StateGenerator {
        StateGenerator::from_entropy(Arc::clone(&self.ranges))
    }

    pub fn injector(&self) -> FaultInjector {
        FaultInjector::new(Arc::clone(&self.catalog))
    }

    pub fn safety(&self) -> SafetyEvaluator {
        SafetyEvaluator::new(Arc::clone(&self.thresholds))
    }

    pub fn analyzer(&self) -> SymptomAnalyzer {
        SymptomAnalyzer::new(Arc::clone(&self.rules))
    }

    pub fn engine(&self) -> DiagnosticsEngine {
        DiagnosticsEngine::new(self.safety(), self.analyzer()).with_resolver(self.references.clone())
    }
}
