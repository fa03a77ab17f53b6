use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("invalid rule {id}: {reason}")]
    InvalidRule { id: String, reason: &'static str },

    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("rule position {position} out of range for {len} rules")]
    RuleIndexOutOfRange { position: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration table: {table}")]
    MissingConfiguration { table: &'static str },

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Sim(#[from] sim::SimError),

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),
}
