//! Vectorizers: turn transcripts into fixed-length vectors for retrieval.
//!
//! [`HashingVectorizer`] runs locally with no model download: each token is
//! hashed with SHA-256 into one of `dimensions` buckets with a sign bit, and
//! the result is L2-normalized. [`ProviderVectorizer`] delegates to the LLM
//! provider's embeddings endpoint.

use async_trait::async_trait;
use parlor_core::error::ExemplarError;
use parlor_core::provider::{EmbeddingRequest, Provider};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Default bucket count for [`HashingVectorizer`].
pub const DEFAULT_DIMENSIONS: usize = 512;

#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Stable identifier, stored with the compiled program.
    fn name(&self) -> String;

    /// One vector per input, in input order.
    async fn vectorize(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExemplarError>;
}

/// Signed feature hashing over lowercase alphanumeric tokens.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dimensions: usize,
}

impl HashingVectorizer {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Vectorizer for HashingVectorizer {
    fn name(&self) -> String {
        format!("hashing-{}", self.dimensions)
    }

    async fn vectorize(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExemplarError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Embeddings from the configured provider.
pub struct ProviderVectorizer {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderVectorizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Vectorizer for ProviderVectorizer {
    fn name(&self) -> String {
        format!("{}:{}", self.provider.name(), self.model)
    }

    async fn vectorize(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExemplarError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| ExemplarError::Vectorize(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(ExemplarError::Vectorize(format!(
                "expected {} embeddings, provider returned {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        debug!(
            model = %response.model,
            count = response.embeddings.len(),
            "Embeddings received"
        );
        Ok(response.embeddings)
    }
}
