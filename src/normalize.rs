use std::collections::BTreeMap;

use crate::error::MalformedResultError;
use crate::models::{
    Entity, NormalizedTranscript, SentimentSegment, SpeakerAggregate, TranscriptResult,
};

/// Summary placeholder used when the API returned no summary
pub const DEFAULT_SUMMARY: &str = "No summary available.";

/// Normalize a completed job record into speaker-indexed structures.
///
/// `text` and `utterances` are required on a completed record; their
/// absence is a contract violation by the upstream service. Optional
/// analysis fields (summary, entities, sentiment, topics, safety) each
/// default to an empty or placeholder value when absent.
///
/// Pure and deterministic: no I/O, identical input yields identical
/// output.
pub fn normalize(result: &TranscriptResult) -> Result<NormalizedTranscript, MalformedResultError> {
    if result.status != crate::models::JobStatus::Completed {
        return Err(MalformedResultError::NotCompleted {
            status: result.status.as_str().to_string(),
        });
    }

    let full_text = result
        .text
        .as_ref()
        .ok_or(MalformedResultError::MissingField { field: "text" })?;
    let utterances = result
        .utterances
        .as_ref()
        .ok_or(MalformedResultError::MissingField { field: "utterances" })?;

    let mut speaker_order: Vec<String> = Vec::new();
    let mut speakers: BTreeMap<String, SpeakerAggregate> = BTreeMap::new();

    for utterance in utterances {
        if utterance.end < utterance.start {
            return Err(MalformedResultError::InvalidTiming {
                speaker: utterance.speaker.clone(),
                start_ms: utterance.start,
                end_ms: utterance.end,
            });
        }
        let duration = utterance.end - utterance.start;

        let aggregate = speakers
            .entry(utterance.speaker.clone())
            .or_insert_with(|| {
                speaker_order.push(utterance.speaker.clone());
                SpeakerAggregate {
                    total_duration_ms: 0,
                    text: String::new(),
                }
            });
        aggregate.total_duration_ms += duration;
        aggregate.text.push(' ');
        aggregate.text.push_str(&utterance.text);
        aggregate.text.push(' ');
    }

    let entities = result
        .entities
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|e| Entity {
            text: e.text.clone(),
            entity_type: e.entity_type.clone(),
        })
        .collect();

    let sentiment_segments = result
        .sentiment_analysis_results
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|s| SentimentSegment {
            text: s.text.clone(),
            start_ms: s.start,
            end_ms: s.end,
            sentiment: s.sentiment,
        })
        .collect();

    Ok(NormalizedTranscript {
        full_text: full_text.clone(),
        summary: result
            .summary
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        speaker_order,
        speakers,
        entities,
        sentiment_segments,
        topics: result
            .iab_categories_result
            .as_ref()
            .map(|r| r.summary.clone())
            .unwrap_or_default(),
        safety_labels: result
            .content_safety_labels
            .as_ref()
            .map(|r| r.summary.clone())
            .unwrap_or_default(),
    })
}
