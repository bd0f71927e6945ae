use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::llm::{Embedder, Generator};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (from OPENAI_API_KEY env var)
    pub api_key: String,
    /// Chat model used for answer generation
    pub chat_model: String,
    /// Model used for text embeddings
    pub embedding_model: String,
    /// Sampling temperature (0-2, higher = more creative)
    pub temperature: f64,
    /// Maximum tokens in a generated answer
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, CapabilityError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            CapabilityError::Response("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            api_key,
            chat_model: "gpt-4-turbo-preview".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        })
    }

    /// Create with custom settings
    pub fn new(api_key: String, chat_model: String, embedding_model: String) -> Self {
        Self {
            api_key,
            chat_model,
            embedding_model,
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI API client providing both the embedding and the generation
/// capability behind one HTTP client.
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, CapabilityError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        request: &Req,
    ) -> Result<Resp, CapabilityError> {
        let response = self
            .client
            .post(format!("{OPENAI_API_URL}/{endpoint}"))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CapabilityError::Timeout
                } else {
                    CapabilityError::Transport(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::Response(e.to_string()))
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, CapabilityError> {
        let request = ChatCompletionRequest {
            model: self.config.chat_model.clone(),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let response: ChatCompletionResponse = self.post("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CapabilityError::Response("no choices in response".to_string()))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let input = [text.to_string()];
        let vectors = self.embed_batch(&input).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Response("no embedding in response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response: EmbeddingResponse = self.post("embeddings", &request).await?;

        if response.data.len() != texts.len() {
            return Err(CapabilityError::Response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        // Result vectors must line up with the input texts
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatCompletionRequest {
            model: "gpt-4-turbo-preview".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1024),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4-turbo-preview");
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_chat_response() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Speaker A said hello."}}
            ]
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "Speaker A said hello.");
    }

    #[test]
    fn test_parse_embedding_response_out_of_order() {
        let json = r#"{
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        }"#;
        let mut response: EmbeddingResponse = serde_json::from_str(json).unwrap();
        response.data.sort_by_key(|d| d.index);
        assert_eq!(response.data[0].embedding, vec![1.0, 0.0]);
    }
}
