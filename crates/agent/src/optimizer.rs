//! k-NN few-shot optimizer.
//!
//! Compiling vectorizes every training transcript once and persists the
//! result. The compiled program embeds the live conversation on each call,
//! picks the `k` most similar demos and passes them to the chatter.

use crate::chatter::Chatter;
use crate::responder::Completion;
use parlor_core::error::{Error, ExemplarError};
use parlor_core::message::ChatHistory;
use parlor_memory::{Dataset, ProgramState, Vectorizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct KnnOptimizer {
    model_path: PathBuf,
    k: usize,
    vectorizer: Arc<dyn Vectorizer>,
    instructions: String,
}

impl KnnOptimizer {
    /// Creates the model directory if it does not exist.
    pub fn new(
        model_path: impl Into<PathBuf>,
        k: usize,
        vectorizer: Arc<dyn Vectorizer>,
        instructions: impl Into<String>,
    ) -> Result<Self, ExemplarError> {
        let model_path = model_path.into();
        if let Some(parent) = model_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExemplarError::ModelSave {
                path: model_path.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            model_path,
            k,
            vectorizer,
            instructions: instructions.into(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Load the saved program, or compile one from the training data at
    /// `training_data` and save it.
    ///
    /// The training data is only read when no saved program exists.
    pub async fn load_or_train(&self, training_data: &Path) -> Result<ProgramState, ExemplarError> {
        if self.model_path.exists() {
            info!(path = %self.model_path.display(), "Loading existing k-NN program");
            return self.load();
        }

        info!(path = %self.model_path.display(), "Training new k-NN program");
        let dataset = Dataset::load(training_data)?;
        self.train(&dataset).await
    }

    /// Compile `dataset` and save it, replacing any existing program.
    pub async fn train(&self, dataset: &Dataset) -> Result<ProgramState, ExemplarError> {
        if dataset.is_empty() {
            return Err(ExemplarError::EmptyDataset);
        }

        let questions: Vec<String> = dataset.iter().map(|e| e.question()).collect();
        let embeddings = self.vectorizer.vectorize(&questions).await?;
        let state = ProgramState::compile(
            dataset,
            embeddings,
            self.k,
            self.vectorizer.name(),
            self.instructions.clone(),
        )?;
        state.save(&self.model_path)?;
        Ok(state)
    }

    /// Read the saved program.
    ///
    /// Fails when it was compiled with a different vectorizer, since the
    /// stored vectors would not be comparable, or with different persona
    /// instructions.
    pub fn load(&self) -> Result<ProgramState, ExemplarError> {
        let mut state = ProgramState::load(&self.model_path)?;

        let configured = self.vectorizer.name();
        if state.vectorizer != configured {
            return Err(ExemplarError::ModelLoad {
                path: self.model_path.clone(),
                reason: format!(
                    "compiled with vectorizer '{}' but '{configured}' is configured; retrain",
                    state.vectorizer
                ),
            });
        }

        if state.instructions != self.instructions {
            return Err(ExemplarError::ModelLoad {
                path: self.model_path.clone(),
                reason: "compiled with different persona instructions; retrain".into(),
            });
        }

        if state.k != self.k {
            debug!(stored = state.k, configured = self.k, "Using configured k");
            state.k = self.k;
        }
        Ok(state)
    }

    /// Bind a compiled program to a chatter.
    pub fn compile(&self, state: ProgramState, chatter: Chatter) -> CompiledProgram {
        CompiledProgram {
            state,
            vectorizer: self.vectorizer.clone(),
            chatter,
        }
    }
}

/// A ready-to-call few-shot program.
pub struct CompiledProgram {
    state: ProgramState,
    vectorizer: Arc<dyn Vectorizer>,
    chatter: Chatter,
}

impl CompiledProgram {
    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    /// Generate the creator's next message for `history`.
    pub async fn forward(&self, history: &ChatHistory) -> Result<Completion, Error> {
        let query = history.transcript();
        let mut vectors = self.vectorizer.vectorize(&[query]).await?;
        let query_vector = vectors.pop().ok_or_else(|| {
            ExemplarError::Vectorize("vectorizer returned no vector for the query".into())
        })?;

        let demos = self.state.nearest(&query_vector);
        debug!(demos = demos.len(), "Retrieved demos");
        self.chatter.forward(history, &demos).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::Responder;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use parlor_core::clock::FixedClock;
    use parlor_core::message::ChatMessage;
    use parlor_core::provider::SamplingParams;
    use parlor_memory::{HashingVectorizer, TrainingExample};
    use parlor_security::ContentFilter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hashing vectorizer that counts calls.
    struct CountingVectorizer {
        inner: HashingVectorizer,
        calls: AtomicUsize,
    }

    impl CountingVectorizer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: HashingVectorizer::default(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Vectorizer for CountingVectorizer {
        fn name(&self) -> String {
            self.inner.name()
        }

        async fn vectorize(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExemplarError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.vectorize(texts).await
        }
    }

    fn dataset() -> Dataset {
        let example = |fan: &str, reply: &str| {
            TrainingExample::new(
                ChatHistory::from_messages(vec![ChatMessage::fan(fan)]),
                reply,
            )
        };
        Dataset::from_examples(vec![
            example("good morning beautiful", "morning! coffee in hand and thinking of you"),
            example("what are you wearing tonight", "come see my new set"),
            example("how was the gym", "leg day destroyed me"),
        ])
    }

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("conversations.json");
        let dataset = dataset();
        let examples: Vec<&TrainingExample> = dataset.iter().collect();
        std::fs::write(&path, serde_json::to_string(&examples).unwrap()).unwrap();
        path
    }

    fn chatter(provider: Arc<SequentialMockProvider>) -> Chatter {
        let responder = Responder::new(
            provider,
            "mock-model",
            SamplingParams::default(),
            "persona",
            ContentFilter::builtin().unwrap(),
        );
        Chatter::with_clock(
            responder,
            Arc::new(FixedClock::new(chrono::Utc::now())),
        )
    }

    #[tokio::test]
    async fn new_creates_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("models").join("knn_model.json");
        KnnOptimizer::new(&model_path, 7, CountingVectorizer::new(), "").unwrap();
        assert!(dir.path().join("models").is_dir());
        assert!(!model_path.exists());
    }

    #[tokio::test]
    async fn first_run_trains_second_run_loads() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("models").join("knn_model.json");
        let data = write_dataset(dir.path());

        let first_vectorizer = CountingVectorizer::new();
        let first = KnnOptimizer::new(&model_path, 2, first_vectorizer.clone(), "persona").unwrap();
        let trained = first.load_or_train(&data).await.unwrap();
        assert!(model_path.exists());
        assert_eq!(trained.demos.len(), 3);
        assert_eq!(first_vectorizer.calls(), 1);

        let second_vectorizer = CountingVectorizer::new();
        let second =
            KnnOptimizer::new(&model_path, 2, second_vectorizer.clone(), "persona").unwrap();
        let loaded = second
            .load_or_train(Path::new("/nonexistent/conversations.json"))
            .await
            .unwrap();
        assert_eq!(second_vectorizer.calls(), 0);
        assert_eq!(loaded.demos, trained.demos);
    }

    #[tokio::test]
    async fn malformed_model_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("knn_model.json");
        std::fs::write(&model_path, "{ not json").unwrap();

        let optimizer = KnnOptimizer::new(&model_path, 7, CountingVectorizer::new(), "").unwrap();
        let err = optimizer
            .load_or_train(Path::new("/unused.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExemplarError::ModelLoad { .. }));
    }

    #[tokio::test]
    async fn load_without_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer =
            KnnOptimizer::new(dir.path().join("knn_model.json"), 7, CountingVectorizer::new(), "")
                .unwrap();
        assert!(matches!(
            optimizer.load().unwrap_err(),
            ExemplarError::ModelNotFound(_)
        ));
    }

    #[tokio::test]
    async fn vectorizer_mismatch_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("knn_model.json");
        KnnOptimizer::new(&model_path, 7, Arc::new(HashingVectorizer::new(64)), "")
            .unwrap()
            .train(&dataset())
            .await
            .unwrap();

        let err = KnnOptimizer::new(&model_path, 7, Arc::new(HashingVectorizer::default()), "")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("hashing-64"));
    }

    #[tokio::test]
    async fn instructions_mismatch_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("knn_model.json");
        let vectorizer = Arc::new(HashingVectorizer::default());
        KnnOptimizer::new(&model_path, 7, vectorizer.clone(), "You are a creator on OnlyFans")
            .unwrap()
            .train(&dataset())
            .await
            .unwrap();

        let err = KnnOptimizer::new(
            &model_path,
            7,
            vectorizer.clone(),
            "You are a creator on Fansly",
        )
        .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ExemplarError::ModelLoad { .. }));
        assert!(err.to_string().contains("persona instructions"));

        let state = KnnOptimizer::new(&model_path, 7, vectorizer, "You are a creator on OnlyFans")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(state.instructions, "You are a creator on OnlyFans");
    }

    #[tokio::test]
    async fn configured_k_overrides_stored_k() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("knn_model.json");
        let vectorizer = Arc::new(HashingVectorizer::default());
        KnnOptimizer::new(&model_path, 7, vectorizer.clone(), "")
            .unwrap()
            .train(&dataset())
            .await
            .unwrap();

        let state = KnnOptimizer::new(&model_path, 1, vectorizer, "")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(state.k, 1);
    }

    #[tokio::test]
    async fn empty_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let optimizer =
            KnnOptimizer::new(dir.path().join("knn_model.json"), 7, CountingVectorizer::new(), "")
                .unwrap();
        let err = optimizer.train(&Dataset::default()).await.unwrap_err();
        assert!(matches!(err, ExemplarError::EmptyDataset));
        assert!(!optimizer.model_path().exists());
    }

    #[tokio::test]
    async fn forward_uses_nearest_demos() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer = Arc::new(HashingVectorizer::default());
        let optimizer =
            KnnOptimizer::new(dir.path().join("knn_model.json"), 1, vectorizer, "").unwrap();
        let state = optimizer.train(&dataset()).await.unwrap();

        let provider = Arc::new(SequentialMockProvider::single_text(
            "We mention the gym.\nYour Message: sore but happy",
        ));
        let program = optimizer.compile(state, chatter(provider.clone()));

        let history = ChatHistory::from_messages(vec![ChatMessage::fan("how was the gym today")]);
        let completion = program.forward(&history).await.unwrap();
        assert_eq!(completion.output, "sore but happy");

        let prompt = prompt_text(&provider.requests()[0]);
        assert!(prompt.contains("Your Message: leg day destroyed me"));
        assert!(!prompt.contains("come see my new set"));
    }
}
