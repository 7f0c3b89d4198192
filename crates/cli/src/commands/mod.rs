//! Subcommand implementations and the wiring they share.

pub mod chat;
pub mod check;
pub mod onboard;
pub mod status;
pub mod train;

use parlor_config::{AppConfig, VectorizerKind};
use parlor_core::provider::Provider;
use parlor_memory::{HashingVectorizer, ProviderVectorizer, Vectorizer};
use std::sync::Arc;

/// Load config, turning the error into a message for the user.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The default provider from the configured router.
pub fn default_provider(
    config: &AppConfig,
) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    let router = parlor_providers::router::build_from_config(config);
    Ok(router.default().ok_or("No default provider configured")?)
}

/// The vectorizer selected by `knn.vectorizer`.
pub fn vectorizer(config: &AppConfig, provider: Arc<dyn Provider>) -> Arc<dyn Vectorizer> {
    match config.knn.vectorizer {
        VectorizerKind::Hashing => Arc::new(HashingVectorizer::default()),
        VectorizerKind::Provider => {
            Arc::new(ProviderVectorizer::new(provider, &config.knn.embedding_model))
        }
    }
}
