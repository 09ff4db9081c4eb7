use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Illegal state transition: {0}")]
    IllegalTransition(String),
    /// An optimistic-lock (version CAS) or unique-key race was lost.
    #[error("Concurrent modification conflict")]
    Conflict,
    #[error("Internal error: {0}")]
    Internal(String),
}
