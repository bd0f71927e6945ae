use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Completed transcript job record from the AssemblyAI v2 API.
///
/// Only the fields the pipeline consumes are modelled. `text` and
/// `utterances` are required on a completed record but optional here so
/// that validation happens in `normalize` with a named field, not as a
/// deserialization failure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptResult {
    /// Job identifier assigned by the API
    #[serde(default)]
    pub id: Option<String>,
    /// Job status as reported by the API
    pub status: JobStatus,
    /// Full transcript text
    #[serde(default)]
    pub text: Option<String>,
    /// Speaker-labelled utterances in speech order
    #[serde(default)]
    pub utterances: Option<Vec<Utterance>>,
    /// Generated summary, when summarization was requested
    #[serde(default)]
    pub summary: Option<String>,
    /// Detected entities, when entity detection was requested
    #[serde(default)]
    pub entities: Option<Vec<RawEntity>>,
    /// Sentiment per utterance segment
    #[serde(default)]
    pub sentiment_analysis_results: Option<Vec<RawSentimentSegment>>,
    /// IAB topic categorization
    #[serde(default)]
    pub iab_categories_result: Option<IabCategoriesResult>,
    /// Content safety flags
    #[serde(default)]
    pub content_safety_labels: Option<ContentSafetyResult>,
}

/// Job lifecycle states reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

/// One contiguous speech segment attributed to a single speaker
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Utterance {
    /// Speaker label, e.g. "A" or "B"
    pub speaker: String,
    /// Start timestamp in milliseconds
    pub start: u64,
    /// End timestamp in milliseconds
    pub end: u64,
    /// Spoken text
    pub text: String,
}

/// Detected entity as delivered by the API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEntity {
    pub entity_type: String,
    pub text: String,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
}

/// Sentiment for one analyzed segment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSentimentSegment {
    pub text: String,
    pub start: u64,
    pub end: u64,
    pub sentiment: super::Sentiment,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// Topic categorization summary: label -> confidence in [0,1]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IabCategoriesResult {
    #[serde(default)]
    pub summary: BTreeMap<String, f64>,
}

/// Content safety summary: category -> confidence in [0,1]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentSafetyResult {
    #[serde(default)]
    pub summary: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completed_result() {
        let json = r#"{
            "id": "tr_123",
            "status": "completed",
            "text": "hello hi there",
            "utterances": [
                {"speaker": "A", "start": 0, "end": 2000, "text": "hello"},
                {"speaker": "B", "start": 2000, "end": 5000, "text": "hi there"}
            ],
            "summary": "A short greeting.",
            "entities": [{"entity_type": "person_name", "text": "Sam"}],
            "sentiment_analysis_results": [
                {"text": "hello", "start": 0, "end": 2000, "sentiment": "POSITIVE", "speaker": "A"}
            ],
            "iab_categories_result": {"summary": {"Hobbies&Interests": 0.73}},
            "content_safety_labels": {"summary": {}}
        }"#;

        let result: TranscriptResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.text.as_deref(), Some("hello hi there"));
        let utterances = result.utterances.unwrap();
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].speaker, "A");
        assert_eq!(utterances[1].end, 5000);
        assert_eq!(result.entities.unwrap()[0].entity_type, "person_name");
        let topics = result.iab_categories_result.unwrap().summary;
        assert_eq!(topics.get("Hobbies&Interests"), Some(&0.73));
    }

    #[test]
    fn test_parse_minimal_result() {
        // Optional analysis fields absent entirely
        let json = r#"{"status": "completed", "text": "hi", "utterances": []}"#;
        let result: TranscriptResult = serde_json::from_str(json).unwrap();

        assert!(result.summary.is_none());
        assert!(result.entities.is_none());
        assert!(result.sentiment_analysis_results.is_none());
        assert!(result.iab_categories_result.is_none());
    }

    #[test]
    fn test_parse_in_progress_result() {
        let json = r#"{"id": "tr_9", "status": "processing"}"#;
        let result: TranscriptResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.status, JobStatus::Processing);
        assert!(result.text.is_none());
        assert!(result.utterances.is_none());
    }
}
