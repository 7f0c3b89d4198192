//! `parlor train`: Compile the k-NN program from training data.

use parlor_agent::KnnOptimizer;
use parlor_memory::Dataset;
use std::path::PathBuf;

pub async fn run(data: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let data = data.unwrap_or_else(|| config.knn.training_data.clone());

    let dataset = Dataset::load(&data)?;
    println!("Loaded {} examples from {}", dataset.len(), data.display());

    let provider = super::default_provider(&config)?;
    let vectorizer = super::vectorizer(&config, provider);
    let optimizer = KnnOptimizer::new(
        &config.knn.model_path,
        config.knn.k,
        vectorizer,
        config.persona.instructions(),
    )?;

    let state = optimizer.train(&dataset).await?;

    println!("Compiled {} demos", state.demos.len());
    println!("  Vectorizer:  {}", state.vectorizer);
    println!("  k:           {}", state.k);
    println!("  Saved to:    {}", optimizer.model_path().display());

    Ok(())
}
