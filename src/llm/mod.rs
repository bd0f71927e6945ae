pub mod client;
pub mod prompts;

pub use client::*;
pub use prompts::*;

use async_trait::async_trait;

use crate::error::CapabilityError;

/// External embedding capability: text in, fixed-dimension vector out.
///
/// Identical text must map to the same vector within one session, so a
/// query embedded with the same capability that built the index compares
/// meaningfully against the stored chunks.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;

    /// Embed several texts; the result has one vector per input, in order.
    /// The default delegates to `embed` one text at a time.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// External generation capability: prompt in, natural-language text out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, CapabilityError>;
}
