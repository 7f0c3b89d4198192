//! Training data: historical conversations with the reply the creator sent.
//!
//! The file is a JSON array:
//!
//! ```json
//! [
//!   {
//!     "chat_history": {"messages": [{"from_creator": false, "content": "hey"}]},
//!     "output": "hey you, how's your day going?"
//!   }
//! ]
//! ```

use parlor_core::error::ExemplarError;
use parlor_core::message::ChatHistory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One (conversation so far, creator reply) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    #[serde(default)]
    pub chat_history: ChatHistory,

    #[serde(default)]
    pub output: String,
}

impl TrainingExample {
    pub fn new(chat_history: ChatHistory, output: impl Into<String>) -> Self {
        Self {
            chat_history,
            output: output.into(),
        }
    }

    /// The retrieval key: the conversation rendered as a transcript.
    pub fn question(&self) -> String {
        self.chat_history.transcript()
    }
}

/// An in-memory training set.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    examples: Vec<TrainingExample>,
}

impl Dataset {
    pub fn from_examples(examples: Vec<TrainingExample>) -> Self {
        Self { examples }
    }

    /// Load a training set from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ExemplarError> {
        let content = std::fs::read_to_string(path).map_err(|e| ExemplarError::DatasetRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let dataset = Self::from_json(&content).map_err(|e| ExemplarError::DatasetParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), count = dataset.len(), "Training data loaded");
        Ok(dataset)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let examples: Vec<TrainingExample> = serde_json::from_str(json)?;
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingExample> {
        self.examples.iter()
    }

    pub fn get(&self, index: usize) -> Option<&TrainingExample> {
        self.examples.get(index)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TrainingExample;
    type IntoIter = std::slice::Iter<'a, TrainingExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}
