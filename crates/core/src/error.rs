//! Error types for the Parlor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Parlor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Exemplar / program errors ---
    #[error("Exemplar error: {0}")]
    Exemplar(#[from] ExemplarError),

    // --- LLM output that could not be read back into fields ---
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ExemplarError {
    #[error("Failed to read training data at {path}: {reason}")]
    DatasetRead { path: PathBuf, reason: String },

    #[error("Failed to parse training data at {path}: {reason}")]
    DatasetParse { path: PathBuf, reason: String },

    #[error("Training set is empty")]
    EmptyDataset,

    #[error("No model found at {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Failed to save model to {path}: {reason}")]
    ModelSave { path: PathBuf, reason: String },

    #[error("Vectorization failed: {0}")]
    Vectorize(String),
}
