use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use diagnostics::DiagnosticResult;
use serde::Serialize;
use sim::PartialReadings;
use tracing::{debug, warn};

use crate::assistant::{format_system_state, Assistant, AssistantReply};
use crate::error::CollaboratorError;
use crate::search::ManualSearch;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub result: DiagnosticResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AssistantReply>,
    /// Non-fatal collaborator problems.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Optional external collaborators, each call bounded by `timeout`.
#[derive(Clone)]
pub struct Collaborators {
    search: Option<Arc<dyn ManualSearch>>,
    assistant: Option<Arc<dyn Assistant>>,
    timeout: Duration,
    search_limit: usize,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            search: None,
            assistant: None,
            timeout: DEFAULT_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Collaborators {
    pub fn with_search(mut self, search: Arc<dyn ManualSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Decorates an already computed result. Collaborator failures and
    /// timeouts end up in `notes`; the diagnosis and safety warnings are never
    /// altered.
    pub async fn enrich(&self, readings: &PartialReadings, mut result: DiagnosticResult) -> EnrichedResult {
        let mut notes = Vec::new();
        let mut context = Vec::new();

        if let Some(search) = &self.search {
            let query = search_query(&result.diagnosis, readings);
            let call = search.search(&query, None, self.search_limit);
            match bounded("manual search", self.timeout, call).await {
                Ok(hits) if !hits.is_empty() => {
                    let mut refs: Vec<String> = Vec::with_capacity(hits.len());
                    for hit in hits {
                        if !refs.contains(&hit.reference) {
                            refs.push(hit.reference);
                        }
                        context.push(hit.content);
                    }
                    result.source_references = refs;
                }
                Ok(_) => debug!(%query, "no manual sections matched, keeping static references"),
                Err(e) => {
                    warn!(error = %e, "manual search unavailable");
                    notes.push(e.to_string());
                }
            }
        }

        let mut analysis = None;
        if let Some(assistant) = &self.assistant {
            let state = format_system_state(readings);
            match bounded("assistant", self.timeout, assistant.ask(&state, &context)).await {
                Ok(reply) => analysis = Some(reply),
                Err(e) => {
                    warn!(error = %e, "assistant unavailable");
                    notes.push(e.to_string());
                }
            }
        }

        EnrichedResult { result, analysis, notes }
    }
}

fn search_query(diagnosis: &str, readings: &PartialReadings) -> String {
    let mut parts = vec![diagnosis.to_string()];
    parts.extend(readings.alarms.iter().map(|a| a.replace('_', " ")));
    parts.join(" ")
}

/// Dropping the future on timeout cancels the call.
async fn bounded<T, F>(collaborator: &'static str, after: Duration, call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| CollaboratorError::Timeout { collaborator, after })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{KeywordIndex, ManualSection, SearchHit};
    use async_trait::async_trait;
    use diagnostics::DiagnosticsEngine;
    use sim::Sensor;

    struct Stalled;

    #[async_trait]
    impl ManualSearch for Stalled {
        async fn search(&self, _: &str, _: Option<&str>, _: usize) -> Result<Vec<SearchHit>, CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    struct Broken;

    #[async_trait]
    impl Assistant for Broken {
        async fn ask(&self, _: &str, _: &[String]) -> Result<AssistantReply, CollaboratorError> {
            Err(CollaboratorError::Failed {
                collaborator: "assistant",
                reason: "missing API key".into(),
            })
        }
    }

    struct Echo;

    #[async_trait]
    impl Assistant for Echo {
        async fn ask(&self, state: &str, context: &[String]) -> Result<AssistantReply, CollaboratorError> {
            Ok(AssistantReply {
                text: format!("{} sections for:\n{state}", context.len()),
                references: vec!["Echo".into()],
            })
        }
    }

    fn hot() -> PartialReadings {
        let mut r = PartialReadings::default().with(Sensor::DischargeTemp, 250.0);
        r.alarms.insert("high_discharge_temp".into());
        r
    }

    fn index() -> Arc<KeywordIndex> {
        Arc::new(KeywordIndex::new(vec![ManualSection {
            reference: "Copeland AE4-1327: Section 4.1".into(),
            component: None,
            content: "High discharge temperature: check condenser fan".into(),
        }]))
    }

    #[tokio::test]
    async fn search_hits_replace_static_references() {
        let r = hot();
        let result = DiagnosticsEngine::builtin().diagnose(&r);
        let enriched = Collaborators::default()
            .with_search(index())
            .with_assistant(Arc::new(Echo))
            .enrich(&r, result.clone())
            .await;

        assert_eq!(enriched.result.source_references, vec!["Copeland AE4-1327: Section 4.1"]);
        assert_eq!(enriched.result.diagnosis, result.diagnosis);
        let analysis = enriched.analysis.unwrap();
        assert!(analysis.text.starts_with("1 sections for:"));
        assert!(analysis.text.contains("discharge_temp_f: 250"));
        assert!(enriched.notes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_search_times_out_and_keeps_result() {
        let r = hot();
        let result = DiagnosticsEngine::builtin().diagnose(&r);
        let enriched = Collaborators::default()
            .with_search(Arc::new(Stalled))
            .with_timeout(Duration::from_millis(200))
            .enrich(&r, result.clone())
            .await;

        assert_eq!(enriched.result, result);
        assert_eq!(enriched.notes.len(), 1);
        assert!(enriched.notes[0].contains("timed out"));
    }

    #[tokio::test]
    async fn failing_assistant_becomes_a_note() {
        let r = hot();
        let result = DiagnosticsEngine::builtin().diagnose(&r);
        let enriched = Collaborators::default()
            .with_assistant(Arc::new(Broken))
            .enrich(&r, result.clone())
            .await;

        assert_eq!(enriched.result, result);
        assert!(enriched.analysis.is_none());
        assert_eq!(enriched.notes, vec!["assistant failed: missing API key".to_string()]);
    }

    #[tokio::test]
    async fn no_collaborators_is_a_no_op() {
        let r = hot();
        let result = DiagnosticsEngine::builtin().diagnose(&r);
        let enriched = Collaborators::default().enrich(&r, result.clone()).await;
        assert_eq!(enriched.result, result);
        assert!(enriched.analysis.is_none() && enriched.notes.is_empty());
    }

    #[tokio::test]
    async fn search_limit_caps_references() {
        let index = Arc::new(KeywordIndex::new(vec![
            ManualSection {
                reference: "Copeland AE4-1327: Section 4.1".into(),
                component: None,
                content: "High discharge temperature: check condenser fan".into(),
            },
            ManualSection {
                reference: "Heatcraft Condenser Guide".into(),
                component: None,
                content: "Discharge pressure rises when the condenser is dirty".into(),
            },
        ]));
        let r = hot();
        let result = DiagnosticsEngine::builtin().diagnose(&r);

        let all = Collaborators::default().with_search(index.clone()).enrich(&r, result.clone()).await;
        assert_eq!(all.result.source_references.len(), 2);

        let capped = Collaborators::default()
            .with_search(index)
            .with_search_limit(1)
            .enrich(&r, result)
            .await;
        assert_eq!(capped.result.source_references, vec!["Copeland AE4-1327: Section 4.1"]);
    }

    #[test]
    fn query_includes_alarm_words() {
        assert_eq!(
            search_query("High discharge temperature condition", &hot()),
            "High discharge temperature condition high discharge temp"
        );
    }
}
