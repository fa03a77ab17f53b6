use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub score: f64,
    pub reference: String,
}

/// Ranked retrieval over service-manual text.
#[async_trait]
pub trait ManualSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        component: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, CollaboratorError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualSection {
    pub reference: String,
    #[serde(default)]
    pub component: Option<String>,
    pub content: String,
}

/// In-process search scoring sections by the share of query terms they
/// contain.
#[derive(Clone, Debug, Default)]
pub struct KeywordIndex {
    sections: Vec<(ManualSection, BTreeSet<String>)>,
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

impl KeywordIndex {
    pub fn new(sections: Vec<ManualSection>) -> Self {
        let sections = sections
            .into_iter()
            .map(|s| {
                let t = terms(&s.content);
                (s, t)
            })
            .collect();
        Self { sections }
    }

    pub fn from_json(json: &str) -> Result<Self, CollaboratorError> {
        let sections: Vec<ManualSection> = serde_json::from_str(json).map_err(|e| CollaboratorError::Failed {
            collaborator: "manual index",
            reason: e.to_string(),
        })?;
        Ok(Self::new(sections))
    }

    pub fn load(path: &Path) -> Result<Self, CollaboratorError> {
        let json = std::fs::read_to_string(path).map_err(|e| CollaboratorError::Failed {
            collaborator: "manual index",
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn rank(&self, query: &str, component: Option<&str>, limit: usize) -> Vec<SearchHit> {
        let wanted = terms(query);
        if wanted.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .sections
            .iter()
            .filter(|(s, _)| component.is_none() || s.component.as_deref() == component)
            .filter_map(|(s, t)| {
                let shared = wanted.intersection(t).count();
                if shared == 0 {
                    return None;
                }
                let mut metadata = BTreeMap::from([("source".to_string(), s.reference.clone())]);
                if let Some(c) = &s.component {
                    metadata.insert("component_type".to_string(), c.clone());
                }
                Some(SearchHit {
                    content: s.content.clone(),
                    metadata,
                    score: shared as f64 / wanted.len() as f64,
                    reference: s.reference.clone(),
                })
            })
            .collect();

        // Stable sort keeps index order among equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }
}

#[async_trait]
impl ManualSearch for KeywordIndex {
    async fn search(
        &self,
        query: &str,
        component: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, CollaboratorError> {
        Ok(self.rank(query, component, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> KeywordIndex {
        KeywordIndex::new(vec![
            ManualSection {
                reference: "Copeland AE4-1327: Section 3.2".into(),
                component: Some("ZB58KCE-TFD".into()),
                content: "High discharge temperature protection trips the compressor".into(),
            },
            ManualSection {
                reference: "Danfoss AKV Service Manual: Page 45".into(),
                component: Some("AKV".into()),
                content: "Low suction pressure with high superheat points to a starved evaporator".into(),
            },
            ManualSection {
                reference: "Sporlan Sight Glass Bulletin".into(),
                component: None,
                content: "Bubbles in the sight glass indicate low refrigerant charge".into(),
            },
        ])
    }

    #[tokio::test]
    async fn ranks_by_term_overlap() {
        let hits = index().search("high discharge temperature", None, 5).await.unwrap();
        assert_eq!(hits[0].reference, "Copeland AE4-1327: Section 3.2");
        assert_eq!(hits[0].score, 1.0);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn component_filter_and_limit_apply() {
        let hits = index().search("high superheat suction", Some("AKV"), 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.get("component_type").map(String::as_str), Some("AKV"));

        let hits = index().search("high low charge pressure", None, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn unrelated_query_finds_nothing() {
        assert!(index().search("ice machine", None, 5).await.unwrap().is_empty());
        assert!(index().search("", None, 5).await.unwrap().is_empty());
    }

    #[test]
    fn sections_load_from_json() {
        let idx = KeywordIndex::from_json(r#"[{"reference": "R", "content": "condenser fan"}]"#).unwrap();
        assert_eq!(idx.len(), 1);
        assert!(KeywordIndex::from_json("{").is_err());
    }
}
