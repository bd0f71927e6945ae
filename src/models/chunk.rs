use serde::{Deserialize, Serialize};

/// Origin of a chunk's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSource {
    FullTranscript,
    SpeakerTranscript,
}

/// Whether a chunk covers the whole conversation or a single speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Complete,
    SpeakerSpecific,
}

/// Provenance metadata carried by every chunk.
///
/// `speaker` is present exactly when the chunk was cut from one speaker's
/// concatenated text; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: ChunkSource,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub speaker: Option<String>,
}

impl ChunkMetadata {
    pub fn complete() -> Self {
        Self {
            source: ChunkSource::FullTranscript,
            kind: ChunkKind::Complete,
            speaker: None,
        }
    }

    pub fn speaker_specific(speaker: &str) -> Self {
        Self {
            source: ChunkSource::SpeakerTranscript,
            kind: ChunkKind::SpeakerSpecific,
            speaker: Some(speaker.to_string()),
        }
    }
}

/// A bounded substring of a source text, the unit of retrieval.
///
/// Chunk ids are deterministic (`full-<n>`, `speaker-<label>-<n>`) so that
/// rebuilding an index overwrites the same identities and query-expansion
/// dedup has a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// Human-readable provenance label used in prompts and source listings
    pub fn label(&self) -> String {
        match &self.metadata.speaker {
            Some(speaker) => format!("Speaker {}", speaker),
            None => "Full transcript".to_string(),
        }
    }
}
