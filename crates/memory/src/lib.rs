//! Few-shot exemplar memory for Parlor.
//!
//! - [`dataset`]: historical conversations paired with the creator's reply
//! - [`vectorizer`]: turning transcripts into vectors
//! - [`vector`]: cosine similarity and k-nearest-neighbour ranking
//! - [`program`]: the compiled exemplar set, persisted as one JSON file

pub mod dataset;
pub mod program;
pub mod vector;
pub mod vectorizer;

pub use dataset::{Dataset, TrainingExample};
pub use program::{Demo, ProgramState, PROGRAM_VERSION};
pub use vector::{cosine_similarity, k_nearest, Neighbor};
pub use vectorizer::{HashingVectorizer, ProviderVectorizer, Vectorizer};
