//! # Parlor Core
//!
//! Domain types, traits, and error definitions for the Parlor creator chat agent.
//! This crate has **no framework dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! ## Seams
//!
//! The two things that make a chat turn non-deterministic are defined as
//! traits here so tests can replace them:
//! - [`Provider`]: the hosted LLM (completions and embeddings)
//! - [`Clock`]: wall-clock time (time of day, summary timestamps)

pub mod clock;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, ExemplarError, ProviderError, Result};
pub use message::{ChatHistory, ChatMessage, Message, Role};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    SamplingParams, Usage,
};
