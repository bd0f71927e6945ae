use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IndexingError;
use crate::llm::Embedder;
use crate::models::DocumentChunk;
use crate::retrieval::RetrievedChunk;

/// Configuration for index construction
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Chunks embedded per request, bounding load on the embedding API
    pub batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

/// One indexed chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Similarity-search index over one transcript's chunks.
///
/// Built once per transcript and read-mostly afterwards. Persisted as one
/// JSON file per document id; rebuilding against the same store path
/// replaces the prior content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Identity of the source document, keys the persisted file
    pub document_id: String,
    /// When this index was built
    pub built_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// Build an index by embedding every chunk.
///
/// Embedding runs in batches of `config.batch_size`; any embedding
/// failure aborts the build, a partially built index is never returned.
pub async fn build_index(
    document_id: &str,
    chunks: Vec<DocumentChunk>,
    embedder: &dyn Embedder,
    config: &IndexConfig,
) -> Result<VectorIndex, IndexingError> {
    let mut entries = Vec::with_capacity(chunks.len());
    let batch_size = config.batch_size.max(1);

    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await.map_err(|source| {
            IndexingError::Embedding {
                chunk_id: batch[0].chunk_id.clone(),
                source,
            }
        })?;

        if vectors.len() != batch.len() {
            return Err(IndexingError::BatchShape {
                expected: batch.len(),
                got: vectors.len(),
            });
        }

        for (chunk, embedding) in batch.iter().cloned().zip(vectors) {
            debug!("Indexed chunk {}", chunk.chunk_id);
            entries.push(IndexEntry { chunk, embedding });
        }
    }

    info!(
        "Built index for document {} with {} chunks",
        document_id,
        entries.len()
    );

    Ok(VectorIndex {
        document_id: document_id.to_string(),
        built_at: Utc::now(),
        entries,
    })
}

impl VectorIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension of the stored embeddings, if any entries exist
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    /// Rank chunks by cosine similarity to a query vector.
    ///
    /// Scores are clamped to [0,1] (a negative cosine means irrelevant, not
    /// anti-relevant). Results are descending, at most `k` long, and every
    /// entry clears `min_score`. An empty result is not an error.
    pub fn search(&self, query: &[f32], k: usize, min_score: f32) -> Vec<RetrievedChunk> {
        let mut hits: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding).max(0.0),
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }

    fn file_path(dir: &Path, document_id: &str) -> PathBuf {
        dir.join(format!("{document_id}.json"))
    }

    /// Persist the index under `dir`, overwriting any prior index for the
    /// same document id.
    pub fn save(&self, dir: &Path) -> Result<(), IndexingError> {
        std::fs::create_dir_all(dir).map_err(|source| IndexingError::Storage {
            document_id: self.document_id.clone(),
            source,
        })?;

        let encoded = serde_json::to_vec_pretty(self).map_err(|source| IndexingError::Encode {
            document_id: self.document_id.clone(),
            source,
        })?;

        let path = Self::file_path(dir, &self.document_id);
        std::fs::write(&path, encoded).map_err(|source| IndexingError::Storage {
            document_id: self.document_id.clone(),
            source,
        })?;

        info!("Persisted index to {:?}", path);
        Ok(())
    }

    /// Load a previously persisted index for `document_id` from `dir`
    pub fn load(dir: &Path, document_id: &str) -> Result<Self, IndexingError> {
        let path = Self::file_path(dir, document_id);
        if !path.exists() {
            return Err(IndexingError::NotFound {
                document_id: document_id.to_string(),
            });
        }

        let content = std::fs::read(&path).map_err(|source| IndexingError::Storage {
            document_id: document_id.to_string(),
            source,
        })?;

        serde_json::from_slice(&content).map_err(|source| IndexingError::Encode {
            document_id: document_id.to_string(),
            source,
        })
    }
}

/// Cosine similarity between two vectors; 0.0 when either has zero norm
/// or the dimensions disagree.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use crate::models::ChunkMetadata;
    use async_trait::async_trait;

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id: id.to_string(),
            text: text.to_string(),
            metadata: ChunkMetadata::complete(),
        }
    }

    /// Embeds to a fixed 2-d vector per known text
    struct TableEmbedder;

    fn table_vector(text: &str) -> Vec<f32> {
        match text {
            "east" => vec![1.0, 0.0],
            "northeast" => vec![0.6, 0.8],
            "north" => vec![0.0, 1.0],
            "west" => vec![-1.0, 0.0],
            _ => vec![0.0, 0.0],
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
            Ok(table_vector(text))
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
            Err(CapabilityError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    async fn directions_index() -> VectorIndex {
        build_index(
            "doc-1",
            vec![
                chunk("full-0", "east"),
                chunk("full-1", "northeast"),
                chunk("full-2", "north"),
                chunk("full-3", "west"),
            ],
            &TableEmbedder,
            &IndexConfig::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_descending_and_filters() {
        let index = directions_index().await;
        let hits = index.search(&[1.0, 0.0], 4, 0.5);

        // west has cosine -1, clamped to 0; north has cosine 0
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.chunk_id, "full-0");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].chunk.chunk_id, "full-1");
        assert!((hits[1].score - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_caps_at_k() {
        let index = directions_index().await;
        let hits = index.search(&[1.0, 0.0], 1, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.chunk_id, "full-0");
    }

    #[tokio::test]
    async fn test_search_empty_when_nothing_clears_threshold() {
        let index = directions_index().await;
        // Highest cosine against this query is ~0.71, below the threshold
        let hits = index.search(&[-1.0, 1.0], 4, 0.9);
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_never_returns_below_min_score() {
        let index = directions_index().await;
        let hits = index.search(&[0.0, 1.0], 4, 0.6);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.score >= 0.6));
    }

    #[tokio::test]
    async fn test_build_index_surfaces_embedding_failure() {
        let err = build_index(
            "doc-1",
            vec![chunk("full-0", "east")],
            &FailingEmbedder,
            &IndexConfig::default(),
        )
        .await
        .unwrap_err();

        match err {
            IndexingError::Embedding { chunk_id, .. } => assert_eq!(chunk_id, "full-0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = directions_index().await;
        index.save(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path(), "doc-1").unwrap();
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.document_id, "doc-1");

        let hits = loaded.search(&[1.0, 0.0], 1, 0.5);
        assert_eq!(hits[0].chunk.chunk_id, "full-0");
    }

    #[tokio::test]
    async fn test_rebuild_overwrites_prior_index() {
        let dir = tempfile::tempdir().unwrap();
        directions_index().await.save(dir.path()).unwrap();

        let smaller = build_index(
            "doc-1",
            vec![chunk("full-0", "north")],
            &TableEmbedder,
            &IndexConfig::default(),
        )
        .await
        .unwrap();
        smaller.save(dir.path()).unwrap();

        let loaded = VectorIndex::load(dir.path(), "doc-1").unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_load_missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(dir.path(), "doc-9").unwrap_err();
        assert!(matches!(err, IndexingError::NotFound { .. }));
    }
}
