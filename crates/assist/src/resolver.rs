use diagnostics::ReferenceResolver;

use crate::search::KeywordIndex;

const RESOLVE_LIMIT: usize = 3;

/// The in-process index can answer synchronously, so it can stand in for the
/// static citation table inside the engine.
impl ReferenceResolver for KeywordIndex {
    fn resolve(&self, diagnosis: &str) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        for hit in self.rank(diagnosis, None, RESOLVE_LIMIT) {
            if !refs.contains(&hit.reference) {
                refs.push(hit.reference);
            }
        }
        refs
    }
}
