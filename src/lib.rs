pub mod chat;
pub mod chunking;
pub mod error;
pub mod index;
pub mod io;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod retrieval;

pub use chat::{Answer, ChatConfig, ChatSession, ChatTurn, ConversationState};
pub use chunking::{ChunkConfig, chunk_transcript, split_text};
pub use error::{CapabilityError, IndexingError, MalformedResultError, RetrievalQueryError};
pub use index::{IndexConfig, VectorIndex, build_index};
pub use io::{load_result_file, parse_result_json, render_report, write_normalized, write_report};
pub use llm::{Embedder, Generator, OpenAiClient, OpenAiConfig};
pub use models::{
    DocumentChunk, NormalizedTranscript, SpeakerAggregate, TranscriptResult, Utterance,
};
pub use normalize::normalize;
pub use retrieval::{RetrievedChunk, RetrieverConfig, retrieve, retrieve_expanded};
