use crate::chat::ChatTurn;
use crate::retrieval::RetrievedChunk;

/// System prompt for answer generation over transcript context
pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are an AI assistant analyzing a conversation transcript. Use the provided transcript excerpts to answer the question. If you don't know the answer, say that you don't know. Don't try to make up an answer.

When answering:
1. If the context mentions specific speakers, include who said what. Be specific about which speaker said what, e.g. Speaker A: "Hello, how are you?"
2. Provide direct quotes when relevant.
3. Be concise but comprehensive.
4. If the answer requires multiple points, use a numbered list.
5. You may add external background knowledge about a topic, but you must clearly demarcate it as background information.
6. If no relevant information was found in the transcript, only provide background information and state plainly that nothing relevant was found in the transcript."#;

/// System prompt for query expansion
pub const EXPANSION_SYSTEM_PROMPT: &str = "You rephrase search queries. Output only the alternate phrasings, one per line, with no numbering or commentary.";

/// Build the user prompt for one answer turn: retrieved excerpts labelled
/// by provenance, prior turns oldest first, then the new question.
pub fn build_answer_prompt(
    retrieved: &[RetrievedChunk],
    history: &[ChatTurn],
    question: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("# Transcript excerpts\n\n");
    if retrieved.is_empty() {
        prompt.push_str("No transcript excerpts cleared the relevance threshold for this question.\n\n");
    } else {
        for hit in retrieved {
            prompt.push_str(&format!("## {}\n", hit.chunk.label()));
            prompt.push_str(hit.chunk.text.trim());
            prompt.push_str("\n\n");
        }
    }

    if !history.is_empty() {
        prompt.push_str("# Chat history\n\n");
        for turn in history {
            prompt.push_str(&format!("Q: {}\n", turn.question));
            prompt.push_str(&format!("A: {}\n\n", turn.answer));
        }
    }

    prompt.push_str("# Question\n\n");
    prompt.push_str(question);
    prompt.push('\n');

    prompt
}

/// Build the user prompt asking for alternate phrasings of a query
pub fn build_expansion_prompt(question: &str, count: usize) -> String {
    format!(
        "Give {count} alternate phrasings of the following question about a conversation transcript:\n\n{question}\n"
    )
}

/// Parse generated phrasings: one per line, numbering and bullets
/// stripped, blanks dropped.
pub fn parse_expansions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == '-')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, DocumentChunk};

    fn hit(id: &str, text: &str, speaker: Option<&str>) -> RetrievedChunk {
        RetrievedChunk {
            chunk: DocumentChunk {
                chunk_id: id.to_string(),
                text: text.to_string(),
                metadata: match speaker {
                    Some(s) => ChunkMetadata::speaker_specific(s),
                    None => ChunkMetadata::complete(),
                },
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_answer_prompt_labels_sources() {
        let retrieved = vec![
            hit("full-0", "hello hi there", None),
            hit("speaker-A-0", "hello bye", Some("A")),
        ];
        let prompt = build_answer_prompt(&retrieved, &[], "who greeted first?");

        assert!(prompt.contains("## Full transcript"));
        assert!(prompt.contains("## Speaker A"));
        assert!(prompt.contains("who greeted first?"));
    }

    #[test]
    fn test_answer_prompt_history_oldest_first() {
        let history = vec![
            ChatTurn {
                question: "first?".to_string(),
                answer: "one".to_string(),
            },
            ChatTurn {
                question: "second?".to_string(),
                answer: "two".to_string(),
            },
        ];
        let prompt = build_answer_prompt(&[], &history, "third?");

        let first = prompt.find("Q: first?").unwrap();
        let second = prompt.find("Q: second?").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_answer_prompt_notes_empty_context() {
        let prompt = build_answer_prompt(&[], &[], "anything?");
        assert!(prompt.contains("No transcript excerpts cleared the relevance threshold"));
    }

    #[test]
    fn test_parse_expansions_strips_numbering() {
        let text = "1. Who spoke the most?\n2) Which speaker talked longest?\n- What speaker dominated?\n\n";
        let parsed = parse_expansions(text);
        assert_eq!(
            parsed,
            vec![
                "Who spoke the most?",
                "Which speaker talked longest?",
                "What speaker dominated?"
            ]
        );
    }
}
