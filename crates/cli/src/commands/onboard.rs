//! `parlor onboard`: First-time setup.

use parlor_config::AppConfig;

/// A starter training file: one conversation and the reply that was sent.
const SAMPLE_TRAINING_DATA: &str = r#"[
  {
    "chat_history": {
      "messages": [
        {"from_creator": false, "content": "hey! just subscribed"},
        {"from_creator": true, "content": "omg hi, welcome!! so happy you're here"},
        {"from_creator": false, "content": "what are you up to today?"}
      ]
    },
    "output": "just finished shooting something new, you'll see it soon 😉 what about you?"
  }
]
"#;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let defaults = AppConfig::default();

    println!("Parlor — First-Time Setup");
    println!("=========================\n");

    // Create directories
    for dir in [
        Some(config_dir.as_path()),
        defaults.knn.model_path.parent(),
        defaults.knn.training_data.parent(),
    ]
    .into_iter()
    .flatten()
    {
        if dir.exists() {
            println!("  Directory exists: {}", dir.display());
        } else {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created directory: {}", dir.display());
        }
    }

    if !defaults.knn.training_data.exists() {
        std::fs::write(&defaults.knn.training_data, SAMPLE_TRAINING_DATA)?;
        println!(
            "✅ Wrote sample training data: {}",
            defaults.knn.training_data.display()
        );
    }

    // Create config file
    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Add your API key to {} (or set TOGETHER_API_KEY)", config_path.display());
        println!("   2. Replace the sample training data with real conversations");
        println!("   3. Run: parlor train");
        println!("   4. Run: parlor chat\n");
    }

    println!("Setup complete.\n");

    Ok(())
}
