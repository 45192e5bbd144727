use thiserror::Error;

/// Failures surfaced by a connection handle or data channel handle.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("description rejected: {0}")]
    DescriptionRejected(String),

    #[error("candidate rejected: {0}")]
    CandidateRejected(String),

    #[error("data channel error: {0}")]
    DataChannel(String),

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
