use thiserror::Error;

/// A completed job record that violates the upstream service's own contract.
///
/// These are never retried locally: a record reported as completed but
/// missing required fields (or carrying invalid timing data) means the
/// upstream response is broken, not that we should poll again.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedResultError {
    #[error("completed job record is missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("utterance for speaker {speaker} has end {end_ms}ms before start {start_ms}ms")]
    InvalidTiming {
        speaker: String,
        start_ms: u64,
        end_ms: u64,
    },

    #[error("job record has status `{status}`, expected `completed`")]
    NotCompleted { status: String },
}

/// Failure while turning chunks into a searchable index.
///
/// The whole index build is retryable by the caller; a partially built
/// index is never kept.
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("embedding failed while indexing chunk `{chunk_id}`: {source}")]
    Embedding {
        chunk_id: String,
        source: CapabilityError,
    },

    #[error("embedding returned {got} vectors for {expected} chunks")]
    BatchShape { expected: usize, got: usize },

    #[error("failed to persist index for document `{document_id}`: {source}")]
    Storage {
        document_id: String,
        source: std::io::Error,
    },

    #[error("failed to encode index for document `{document_id}`: {source}")]
    Encode {
        document_id: String,
        source: serde_json::Error,
    },

    #[error("no index stored for document `{document_id}`")]
    NotFound { document_id: String },
}

/// Failure during a single question-answer turn.
///
/// A failed turn leaves the conversation state untouched; the caller may
/// ask again. Timeouts get their own variant so the HTTP layer can decide
/// on a retry policy without string-matching messages.
#[derive(Debug, Error)]
pub enum RetrievalQueryError {
    #[error("failed to embed query: {0}")]
    Embedding(CapabilityError),

    #[error("similarity search failed: {0}")]
    Search(String),

    #[error("answer generation failed: {0}")]
    Generation(CapabilityError),

    #[error("external capability timed out during {stage}")]
    Timeout { stage: &'static str },
}

/// Error from an external capability call (embedding or generation).
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("malformed API response: {0}")]
    Response(String),

    #[error("request timed out")]
    Timeout,
}

impl CapabilityError {
    /// Whether this failure was a timeout, surfaced so query errors can
    /// carry a distinguishable timeout reason.
    pub fn is_timeout(&self) -> bool {
        match self {
            CapabilityError::Timeout => true,
            CapabilityError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}
