use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{NormalizedTranscript, Sentiment};

/// Write the normalized transcript as machine-readable JSON
pub fn write_normalized(path: &Path, transcript: &NormalizedTranscript) -> Result<()> {
    let json = serde_json::to_string_pretty(transcript)
        .context("Failed to serialize normalized transcript")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(())
}

/// Write a human-readable analysis report
pub fn write_report(path: &Path, transcript: &NormalizedTranscript) -> Result<()> {
    std::fs::write(path, render_report(transcript))
        .with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(())
}

/// Render a plain-text report: speaker durations, summary, sentiment
/// counts, topics, and safety flags.
pub fn render_report(transcript: &NormalizedTranscript) -> String {
    let mut out = String::new();

    out.push_str("Transcript Analysis\n");
    out.push_str("===================\n\n");

    out.push_str("Speakers\n");
    out.push_str("--------\n");
    let total_ms = transcript.total_speaking_ms();
    for (speaker, aggregate) in transcript.speakers_in_order() {
        let share = if total_ms > 0 {
            aggregate.total_duration_ms as f64 / total_ms as f64 * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "Speaker {}: {:.1}s speaking time ({:.1}%)\n",
            speaker,
            aggregate.total_duration_ms as f64 / 1000.0,
            share
        ));
    }

    out.push_str("\nSummary\n");
    out.push_str("-------\n");
    out.push_str(&transcript.summary);
    out.push('\n');

    if !transcript.sentiment_segments.is_empty() {
        let mut positive = 0usize;
        let mut neutral = 0usize;
        let mut negative = 0usize;
        for segment in &transcript.sentiment_segments {
            match segment.sentiment {
                Sentiment::Positive => positive += 1,
                Sentiment::Neutral => neutral += 1,
                Sentiment::Negative => negative += 1,
            }
        }
        out.push_str("\nSentiment\n");
        out.push_str("---------\n");
        out.push_str(&format!(
            "Positive: {}, Neutral: {}, Negative: {}\n",
            positive, neutral, negative
        ));
    }

    if !transcript.topics.is_empty() {
        out.push_str("\nTopics\n");
        out.push_str("------\n");
        let mut topics: Vec<(&String, &f64)> = transcript.topics.iter().collect();
        topics.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (label, confidence) in topics.into_iter().take(10) {
            out.push_str(&format!("{}: {:.2}\n", label, confidence));
        }
    }

    if !transcript.entities.is_empty() {
        out.push_str("\nEntities\n");
        out.push_str("--------\n");
        for entity in &transcript.entities {
            out.push_str(&format!("{} ({})\n", entity.text, entity.entity_type));
        }
    }

    if !transcript.safety_labels.is_empty() {
        out.push_str("\nContent Safety\n");
        out.push_str("--------------\n");
        for (label, confidence) in &transcript.safety_labels {
            out.push_str(&format!("{}: {:.2}\n", label, confidence));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentSegment, SpeakerAggregate};
    use std::collections::BTreeMap;

    fn transcript() -> NormalizedTranscript {
        let mut speakers = BTreeMap::new();
        speakers.insert(
            "A".to_string(),
            SpeakerAggregate {
                total_duration_ms: 3000,
                text: " hello ".to_string(),
            },
        );
        speakers.insert(
            "B".to_string(),
            SpeakerAggregate {
                total_duration_ms: 1000,
                text: " hi ".to_string(),
            },
        );
        let mut topics = BTreeMap::new();
        topics.insert("Technology&Computing".to_string(), 0.91);
        NormalizedTranscript {
            full_text: "hello hi".to_string(),
            summary: "Two people greet.".to_string(),
            speaker_order: vec!["A".to_string(), "B".to_string()],
            speakers,
            entities: vec![],
            sentiment_segments: vec![SentimentSegment {
                text: "hello".to_string(),
                start_ms: 0,
                end_ms: 1000,
                sentiment: Sentiment::Positive,
            }],
            topics,
            safety_labels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_report_contains_speaker_shares() {
        let report = render_report(&transcript());
        assert!(report.contains("Speaker A: 3.0s speaking time (75.0%)"));
        assert!(report.contains("Speaker B: 1.0s speaking time (25.0%)"));
        assert!(report.contains("Two people greet."));
        assert!(report.contains("Positive: 1, Neutral: 0, Negative: 0"));
        assert!(report.contains("Technology&Computing: 0.91"));
    }

    #[test]
    fn test_write_normalized_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normalized.json");
        let original = transcript();
        write_normalized(&path, &original).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: NormalizedTranscript = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, original);
    }
}
