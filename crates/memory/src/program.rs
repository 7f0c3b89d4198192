//! The compiled few-shot program.
//!
//! Compiling a training set means vectorizing every example's transcript
//! once; the result is persisted as a single pretty-printed JSON file so
//! later runs skip the work.

use crate::dataset::{Dataset, TrainingExample};
use crate::vector::k_nearest;
use chrono::{DateTime, Utc};
use parlor_core::error::ExemplarError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// File format version. Bumped when the layout changes.
pub const PROGRAM_VERSION: u32 = 1;

/// A training example prepared for retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demo {
    /// Conversation transcript (the retrieval key)
    pub question: String,
    /// The creator's reply
    pub answer: String,
    pub embedding: Vec<f32>,
}

impl Demo {
    pub fn from_example(example: &TrainingExample, embedding: Vec<f32>) -> Self {
        Self {
            question: example.question(),
            answer: example.output.clone(),
            embedding,
        }
    }
}

/// Persisted state of a compiled program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramState {
    pub version: u32,
    /// Exemplars retrieved per call
    pub k: usize,
    /// Which vectorizer produced the embeddings
    pub vectorizer: String,
    /// Persona instructions at compile time
    #[serde(default)]
    pub instructions: String,
    pub demos: Vec<Demo>,
    pub created_at: DateTime<Utc>,
}

impl ProgramState {
    /// Pair each example with its embedding.
    pub fn compile(
        dataset: &Dataset,
        embeddings: Vec<Vec<f32>>,
        k: usize,
        vectorizer: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Result<Self, ExemplarError> {
        if dataset.is_empty() {
            return Err(ExemplarError::EmptyDataset);
        }
        if embeddings.len() != dataset.len() {
            return Err(ExemplarError::Vectorize(format!(
                "{} examples but {} embeddings",
                dataset.len(),
                embeddings.len()
            )));
        }

        let demos = dataset
            .iter()
            .zip(embeddings)
            .map(|(example, embedding)| Demo::from_example(example, embedding))
            .collect();

        Ok(Self {
            version: PROGRAM_VERSION,
            k,
            vectorizer: vectorizer.into(),
            instructions: instructions.into(),
            demos,
            created_at: Utc::now(),
        })
    }

    /// Read a program file.
    pub fn load(path: &Path) -> Result<Self, ExemplarError> {
        if !path.exists() {
            return Err(ExemplarError::ModelNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExemplarError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let state: Self = serde_json::from_str(&content).map_err(|e| ExemplarError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if state.version != PROGRAM_VERSION {
            return Err(ExemplarError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported version {} (expected {PROGRAM_VERSION})",
                    state.version
                ),
            });
        }

        debug!(path = %path.display(), demos = state.demos.len(), "Program loaded");
        Ok(state)
    }

    /// Write the program as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ExemplarError> {
        let save_err = |reason: String| ExemplarError::ModelSave {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| save_err(e.to_string()))?;

        info!(path = %path.display(), demos = self.demos.len(), "Program saved");
        Ok(())
    }

    /// The `k` demos closest to `query`, most similar first.
    pub fn nearest(&self, query: &[f32]) -> Vec<&Demo> {
        k_nearest(
            self.demos.iter().map(|d| d.embedding.as_slice()),
            query,
            self.k,
        )
        .into_iter()
        .map(|n| &self.demos[n.index])
        .collect()
    }
}
