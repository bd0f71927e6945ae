use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunking::{ChunkConfig, chunk_transcript};
use crate::error::{IndexingError, RetrievalQueryError};
use crate::index::{IndexConfig, VectorIndex, build_index};
use crate::llm::{ANSWER_SYSTEM_PROMPT, Embedder, Generator, build_answer_prompt};
use crate::models::NormalizedTranscript;
use crate::retrieval::{RetrievedChunk, RetrieverConfig, retrieve, retrieve_expanded};

/// One completed question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// Append-only question/answer history for one chat session.
///
/// Serves both as memory fed into later prompts and as a display log.
/// Turns are only recorded for successful answers, so a failed turn never
/// leaves a partial entry behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    turns: Vec<ChatTurn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    fn record(&mut self, question: &str, answer: &str) {
        self.turns.push(ChatTurn {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a chat session
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub chunking: ChunkConfig,
    pub indexing: IndexConfig,
    pub retriever: RetrieverConfig,
    /// Prompt history window: only this many of the most recent turns are
    /// fed into each prompt. The full history is still kept for display.
    pub max_history_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            indexing: IndexConfig::default(),
            retriever: RetrieverConfig::default(),
            max_history_turns: 50,
        }
    }
}

/// A generated answer with the chunks used as evidence
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
}

/// One transcript's question-answering session.
///
/// A session only exists once its index has been built, so `ask` is never
/// reachable in an unindexed state. `ask` takes `&mut self`, which
/// serializes conversation appends.
pub struct ChatSession {
    index: VectorIndex,
    conversation: ConversationState,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: ChatConfig,
}

impl ChatSession {
    /// Chunk the transcript, build its index, and start a fresh
    /// conversation. The whole call is retryable on `IndexingError`.
    pub async fn initialize(
        document_id: &str,
        transcript: &NormalizedTranscript,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: ChatConfig,
    ) -> Result<Self, IndexingError> {
        let chunks = chunk_transcript(transcript, &config.chunking);
        info!(
            "Chunked transcript into {} chunks ({} speakers)",
            chunks.len(),
            transcript.speaker_order.len()
        );

        let index = build_index(document_id, chunks, embedder.as_ref(), &config.indexing).await?;

        Ok(Self {
            index,
            conversation: ConversationState::new(),
            embedder,
            generator,
            config,
        })
    }

    /// Resume a session over a previously persisted index
    pub fn from_index(
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: ChatConfig,
    ) -> Self {
        Self {
            index,
            conversation: ConversationState::new(),
            embedder,
            generator,
            config,
        }
    }

    /// Answer one question against the indexed transcript.
    ///
    /// Retrieves evidence chunks, assembles the prompt with recent history,
    /// and invokes the generator once. The turn is appended to the
    /// conversation only on success; any capability failure surfaces as a
    /// `RetrievalQueryError` and leaves the history untouched. An empty
    /// retrieval is not a failure: the prompt tells the generator nothing
    /// transcript-grounded was found.
    pub async fn ask(&mut self, question: &str) -> Result<Answer, RetrievalQueryError> {
        let retrieved = if self.config.retriever.expand_queries {
            retrieve_expanded(
                &self.index,
                self.embedder.as_ref(),
                self.generator.as_ref(),
                question,
                &self.config.retriever,
            )
            .await?
        } else {
            retrieve(
                &self.index,
                self.embedder.as_ref(),
                question,
                &self.config.retriever,
            )
            .await?
        };
        debug!("Retrieved {} chunks for question", retrieved.len());

        let history = self.conversation.recent(self.config.max_history_turns);
        let prompt = build_answer_prompt(&retrieved, history, question);

        let text = self
            .generator
            .generate(ANSWER_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalQueryError::Timeout {
                        stage: "answer generation",
                    }
                } else {
                    RetrievalQueryError::Generation(e)
                }
            })?;

        self.conversation.record(question, &text);

        Ok(Answer {
            text,
            sources: retrieved,
        })
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Persist the session's index, overwriting any prior index for the
    /// same document id.
    pub fn save_index(&self, dir: &Path) -> Result<(), IndexingError> {
        self.index.save(dir)
    }
}
