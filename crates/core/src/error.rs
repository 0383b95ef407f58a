use thiserror::Error;
use uuid::Uuid;

pub type LeadScopeResult<T> = Result<T, LeadScopeError>;

#[derive(Error, Debug)]
pub enum LeadScopeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session {0} has no start timestamp")]
    MissingTemporalAnchor(Uuid),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
