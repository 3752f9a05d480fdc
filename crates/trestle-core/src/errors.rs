use thiserror::Error;

/// Failures at the Store boundary. The Coordinator maps these onto distinct
/// response codes, so NotFound and Invalid must stay separate from plain
/// storage trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("assessment not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Transient storage failures are safe to retry because the upsert is
    /// idempotent per (assessment_id, form_type).
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

/// Failures on the submission-client side of the wire.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("an identical submission is already in flight")]
    AlreadyInFlight,

    #[error("no assessment id cached for this session yet")]
    MissingAssessmentId,

    #[error("rejected by server (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
