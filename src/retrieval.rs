use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CapabilityError, RetrievalQueryError};
use crate::index::VectorIndex;
use crate::llm::{
    EXPANSION_SYSTEM_PROMPT, Embedder, Generator, build_expansion_prompt, parse_expansions,
};
use crate::models::DocumentChunk;

/// A chunk returned by similarity search, with its score in [0,1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Configuration for retrieval
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Maximum chunks returned per query
    pub k: usize,
    /// Minimum similarity score for admission
    pub min_score: f32,
    /// Paraphrase the query and merge results across phrasings
    pub expand_queries: bool,
    /// Number of alternate phrasings to request
    pub num_expansions: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            k: 4,
            min_score: 0.5,
            expand_queries: false,
            num_expansions: 3,
        }
    }
}

fn embedding_error(e: CapabilityError) -> RetrievalQueryError {
    if e.is_timeout() {
        RetrievalQueryError::Timeout {
            stage: "query embedding",
        }
    } else {
        RetrievalQueryError::Embedding(e)
    }
}

fn generation_error(stage: &'static str, e: CapabilityError) -> RetrievalQueryError {
    if e.is_timeout() {
        RetrievalQueryError::Timeout { stage }
    } else {
        RetrievalQueryError::Generation(e)
    }
}

/// Embed the query with the same capability that built the index and rank
/// the indexed chunks against it. An empty result is not an error.
pub async fn retrieve(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    query: &str,
    config: &RetrieverConfig,
) -> Result<Vec<RetrievedChunk>, RetrievalQueryError> {
    let vector = embedder.embed(query).await.map_err(embedding_error)?;

    if let Some(dim) = index.dimension() {
        if dim != vector.len() {
            return Err(RetrievalQueryError::Search(format!(
                "query dimension {} does not match index dimension {}",
                vector.len(),
                dim
            )));
        }
    }

    Ok(index.search(&vector, config.k, config.min_score))
}

/// Retrieval with query expansion: ask the generator for alternate
/// phrasings, retrieve for the original and each phrasing, and merge.
/// Deduplication is by chunk identity; a chunk found under several
/// phrasings keeps its maximum score.
pub async fn retrieve_expanded(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    query: &str,
    config: &RetrieverConfig,
) -> Result<Vec<RetrievedChunk>, RetrievalQueryError> {
    let prompt = build_expansion_prompt(query, config.num_expansions);
    let raw = generator
        .generate(EXPANSION_SYSTEM_PROMPT, &prompt)
        .await
        .map_err(|e| generation_error("query expansion", e))?;

    let mut queries = vec![query.to_string()];
    for phrasing in parse_expansions(&raw).into_iter().take(config.num_expansions) {
        if !queries.contains(&phrasing) {
            queries.push(phrasing);
        }
    }
    debug!("Retrieving across {} query phrasings", queries.len());

    let mut best: BTreeMap<String, RetrievedChunk> = BTreeMap::new();
    for q in &queries {
        for hit in retrieve(index, embedder, q, config).await? {
            best.entry(hit.chunk.chunk_id.clone())
                .and_modify(|existing| {
                    if hit.score > existing.score {
                        existing.score = hit.score;
                    }
                })
                .or_insert(hit);
        }
    }

    let mut merged: Vec<RetrievedChunk> = best.into_values().collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(config.k);
    Ok(merged)
}
