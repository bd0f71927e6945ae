use crate::models::{ChunkMetadata, DocumentChunk, NormalizedTranscript};

/// Configuration for the boundary-preferring text splitter
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters
    pub max_chars: usize,
    /// Characters carried from the end of one chunk into the next
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 2500,
            overlap_chars: 200,
        }
    }
}

impl ChunkConfig {
    /// Overlap clamped below the chunk size so splitting always advances
    fn effective_overlap(&self) -> usize {
        self.overlap_chars.min(self.max_chars.saturating_sub(1))
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring to
/// cut at a paragraph break, then a line break, then a space, then an
/// arbitrary character boundary. Each chunk after the first begins with the
/// last `overlap_chars` characters of its predecessor, preserving context
/// across a cut.
///
/// Lengths are measured in characters, so multi-byte text never splits
/// inside a code point. Empty input yields no chunks.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    if text.is_empty() || config.max_chars == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= config.max_chars {
        return vec![text.to_string()];
    }

    let overlap = config.effective_overlap();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let window_end = (start + config.max_chars).min(chars.len());
        if window_end == chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }
        let cut = find_cut(&chars, start, window_end, overlap);
        chunks.push(chars[start..cut].iter().collect());
        start = cut - overlap;
    }
    chunks
}

/// Pick the cut point inside `[start, window_end]`.
///
/// The cut must land after `start + overlap` so the next chunk starts
/// strictly beyond this one while still overlapping it by exactly
/// `overlap` characters.
fn find_cut(chars: &[char], start: usize, window_end: usize, overlap: usize) -> usize {
    let min_cut = start + overlap + 1;

    // Paragraph break: cut just after the blank line
    for j in (start..window_end.saturating_sub(1)).rev() {
        if chars[j] == '\n' && chars[j + 1] == '\n' {
            let cut = j + 2;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Line break
    for j in (start..window_end).rev() {
        if chars[j] == '\n' {
            let cut = j + 1;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Space
    for j in (start..window_end).rev() {
        if chars[j] == ' ' {
            let cut = j + 1;
            if cut >= min_cut {
                return cut;
            }
            break;
        }
    }

    // Hard character cut
    window_end
}

/// Produce the retrieval chunks for one normalized transcript: the full
/// transcript first, then each speaker's concatenated text in
/// first-appearance order. The sequence is deterministic; empty source
/// texts contribute no chunks.
pub fn chunk_transcript(
    transcript: &NormalizedTranscript,
    config: &ChunkConfig,
) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();

    for (n, text) in split_text(&transcript.full_text, config).into_iter().enumerate() {
        chunks.push(DocumentChunk {
            chunk_id: format!("full-{n}"),
            text,
            metadata: ChunkMetadata::complete(),
        });
    }

    for (speaker, aggregate) in transcript.speakers_in_order() {
        for (n, text) in split_text(&aggregate.text, config).into_iter().enumerate() {
            chunks.push(DocumentChunk {
                chunk_id: format!("speaker-{speaker}-{n}"),
                text,
                metadata: ChunkMetadata::speaker_specific(speaker),
            });
        }
    }

    chunks
}
