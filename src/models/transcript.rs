use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-speaker totals accumulated over all of a speaker's utterances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerAggregate {
    /// Sum of (end - start) over this speaker's utterances, in milliseconds
    pub total_duration_ms: u64,
    /// Utterance texts concatenated in original speech order
    pub text: String,
}

/// Detected entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: String,
}

/// Sentiment polarity of one analyzed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Sentiment attached to a time range of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSegment {
    pub text: String,
    /// Start timestamp in milliseconds
    pub start_ms: u64,
    /// End timestamp in milliseconds
    pub end_ms: u64,
    pub sentiment: Sentiment,
}

/// Immutable snapshot of one completed job's analysis.
///
/// `speaker_order` carries first-appearance order explicitly; downstream
/// color/legend assignment is positional, so enumeration must never be
/// re-sorted. The mapping itself is a BTreeMap so serialized output is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTranscript {
    /// Full transcript text
    pub full_text: String,
    /// Summary text, placeholder when the API returned none
    pub summary: String,
    /// Speaker labels in order of first appearance
    pub speaker_order: Vec<String>,
    /// Speaker label -> aggregate
    pub speakers: BTreeMap<String, SpeakerAggregate>,
    /// Detected entities
    pub entities: Vec<Entity>,
    /// Sentiment per analyzed segment
    pub sentiment_segments: Vec<SentimentSegment>,
    /// Topic label -> confidence in [0,1]
    pub topics: BTreeMap<String, f64>,
    /// Safety category -> confidence in [0,1]
    pub safety_labels: BTreeMap<String, f64>,
}

impl NormalizedTranscript {
    /// Iterate speakers in first-appearance order
    pub fn speakers_in_order(&self) -> impl Iterator<Item = (&str, &SpeakerAggregate)> {
        self.speaker_order
            .iter()
            .filter_map(|s| self.speakers.get(s).map(|agg| (s.as_str(), agg)))
    }

    /// Total speaking time across all speakers, in milliseconds.
    ///
    /// Gaps and overlaps are not reconciled, so this need not equal the
    /// audio duration.
    pub fn total_speaking_ms(&self) -> u64 {
        self.speakers.values().map(|s| s.total_duration_ms).sum()
    }

    pub fn speaker(&self, label: &str) -> Option<&SpeakerAggregate> {
        self.speakers.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedTranscript {
        let mut speakers = BTreeMap::new();
        speakers.insert(
            "B".to_string(),
            SpeakerAggregate {
                total_duration_ms: 3000,
                text: " hi there ".to_string(),
            },
        );
        speakers.insert(
            "A".to_string(),
            SpeakerAggregate {
                total_duration_ms: 2000,
                text: " hello ".to_string(),
            },
        );
        NormalizedTranscript {
            full_text: "hello hi there".to_string(),
            summary: "No summary available.".to_string(),
            speaker_order: vec!["A".to_string(), "B".to_string()],
            speakers,
            entities: vec![],
            sentiment_segments: vec![],
            topics: BTreeMap::new(),
            safety_labels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_speakers_in_order_follows_first_appearance() {
        let t = sample();
        let order: Vec<&str> = t.speakers_in_order().map(|(s, _)| s).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn test_total_speaking_ms() {
        assert_eq!(sample().total_speaking_ms(), 5000);
    }
}
