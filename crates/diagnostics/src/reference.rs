use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps a diagnosis label to ordered citation strings.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, diagnosis: &str) -> Vec<String>;
}

impl<T: ReferenceResolver + ?Sized> ReferenceResolver for Box<T> {
    fn resolve(&self, diagnosis: &str) -> Vec<String> {
        (**self).resolve(diagnosis)
    }
}

impl<T: ReferenceResolver + ?Sized> ReferenceResolver for Arc<T> {
    fn resolve(&self, diagnosis: &str) -> Vec<String> {
        (**self).resolve(diagnosis)
    }
}

/// Resolver backed by a closure. See [`resolver_fn`].
#[derive(Clone, Copy, Debug)]
pub struct FnResolver<F>(F);

pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    FnResolver(f)
}

impl<F> ReferenceResolver for FnResolver<F>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn resolve(&self, diagnosis: &str) -> Vec<String> {
        (self.0)(diagnosis)
    }
}

/// Fixed citation table keyed by exact diagnosis label.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticReferenceResolver {
    by_diagnosis: BTreeMap<String, Vec<String>>,
    fallback: Vec<String>,
}

impl Default for StaticReferenceResolver {
    fn default() -> Self {
        Self::new(
            BTreeMap::new(),
            vec![
                "Copeland AE4-1327: Section 3.2".to_string(),
                "Danfoss AKV Service Manual: Page 45".to_string(),
            ],
        )
    }
}

impl StaticReferenceResolver {
    pub fn new(by_diagnosis: BTreeMap<String, Vec<String>>, fallback: Vec<String>) -> Self {
        Self { by_diagnosis, fallback }
    }

    /// Replaces the entries for the given labels, keeping the fallback.
    pub fn with_entries(mut self, entries: BTreeMap<String, Vec<String>>) -> Self {
        self.by_diagnosis.extend(entries);
        self
    }
}

impl ReferenceResolver for StaticReferenceResolver {
    fn resolve(&self, diagnosis: &str) -> Vec<String> {
        self.by_diagnosis
            .get(diagnosis)
            .unwrap_or(&self.fallback)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_gets_fallback() {
        let r = StaticReferenceResolver::default();
        assert_eq!(
            r.resolve("anything"),
            vec!["Copeland AE4-1327: Section 3.2", "Danfoss AKV Service Manual: Page 45"]
        );
    }

    #[test]
    fn known_label_uses_its_entry() {
        let entries = BTreeMap::from([(
            "High discharge temperature condition".to_string(),
            vec!["Copeland AE4-1327: Section 4.1".to_string()],
        )]);
        let r = StaticReferenceResolver::default().with_entries(entries);
        assert_eq!(
            r.resolve("High discharge temperature condition"),
            vec!["Copeland AE4-1327: Section 4.1"]
        );
        assert_eq!(r.resolve("other").len(), 2);
    }

    #[test]
    fn closures_resolve() {
        let r = resolver_fn(|d: &str| vec![format!("manual for {d}")]);
        assert_eq!(r.resolve("x"), vec!["manual for x"]);
    }
}
