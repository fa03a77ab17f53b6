#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("unknown fault archetype: {0}")]
    InvalidArchetype(String),

    #[error("duplicate fault archetype: {0}")]
    DuplicateArchetype(String),

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("invalid operating range [{min}, {max}]: {reason}")]
    InvalidRange {
        min: f64,
        max: f64,
        reason: &'static str,
    },
}
