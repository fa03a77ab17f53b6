use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{collaborator} timed out after {after:?}")]
    Timeout {
        collaborator: &'static str,
        after: Duration,
    },

    #[error("{collaborator} failed: {reason}")]
    Failed {
        collaborator: &'static str,
        reason: String,
    },
}
