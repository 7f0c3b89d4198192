//! `parlor status`: Show configuration and program status.

use parlor_config::AppConfig;
use parlor_core::error::ProviderError;
use parlor_memory::ProgramState;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("Parlor Status");
    println!("=============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.default_provider);
    println!("  Model:          {}", config.model());
    println!("  API key:        {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Temperature:    {}", config.sampling.temperature);
    println!("  Max tokens:     {}", config.sampling.max_tokens);
    println!(
        "  Context:        {} messages, summary every {}, keep {} summaries",
        config.context.max_messages, config.context.summary_interval, config.context.max_summaries
    );
    println!("  k:              {}", config.knn.k);
    println!("  Vectorizer:     {:?}", config.knn.vectorizer);
    println!("  Platform:       {}", config.persona.platform);
    println!("  Placeholder:    {}", config.filter.placeholder);

    println!();
    if config.has_api_key() {
        let provider = super::default_provider(&config)?;
        println!("  {}", describe_health(provider.health_check().await));
    }

    match ProgramState::load(&config.knn.model_path) {
        Ok(state) => println!(
            "  ✅ Program: {} demos ({}), compiled {}",
            state.demos.len(),
            state.vectorizer,
            state.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
        Err(e) => println!("  ⚠️  Program: {e}"),
    }

    if config.knn.training_data.exists() {
        println!("  ✅ Training data: {}", config.knn.training_data.display());
    } else {
        println!(
            "  ⚠️  No training data at {}",
            config.knn.training_data.display()
        );
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, run `parlor onboard` first");
    }

    Ok(())
}

fn describe_health(result: Result<bool, ProviderError>) -> String {
    match result {
        Ok(true) => "✅ Provider reachable".into(),
        Ok(false) => "⚠️  Provider responded with an error status".into(),
        Err(e) => format!("⚠️  Provider unreachable: {e}"),
    }
}
