//! `parlor chat`: Interactive or single-message chat mode.

use parlor_agent::{
    ChatContextManager, ChatSession, Chatter, Command, KnnOptimizer, LlmSummarizer, Responder,
    SessionReply,
};
use parlor_config::AppConfig;
use parlor_security::ContentFilter;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export TOGETHER_API_KEY=...   (recommended)");
        eprintln!("    export OPENAI_API_KEY=...     (for OpenAI direct)");
        eprintln!("    export PARLOR_API_KEY=...     (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let mut session = build_session(&config).await?;

    if let Some(msg) = message {
        // Single message mode
        let completion = session.chat_turn(msg.trim()).await?;
        println!("{}", completion.output);
        return Ok(());
    }

    println!();
    println!("Parlor Chat");
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.model());
    println!("  Platform:  {}", config.persona.platform);
    println!();
    println!("Commands:");
    for (command, help) in Command::HELP {
        println!("  {command} - {help}");
    }
    println!();

    let mut rx = spawn_stdin_reader();
    prompt()?;

    while let Some(line) = rx.recv().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        };

        match session.handle(&line).await {
            Ok(SessionReply::Exit) => break,
            Ok(reply) => print_reply(reply),
            Err(e) => println!("Error: {e}"),
        }

        prompt()?;
    }

    println!();
    Ok(())
}

/// Assemble the chat session from configuration.
async fn build_session(config: &AppConfig) -> Result<ChatSession, Box<dyn std::error::Error>> {
    let provider = super::default_provider(config)?;
    let vectorizer = super::vectorizer(config, provider.clone());
    let instructions = config.persona.instructions();

    let optimizer = KnnOptimizer::new(
        &config.knn.model_path,
        config.knn.k,
        vectorizer,
        instructions.clone(),
    )?;
    let state = optimizer.load_or_train(&config.knn.training_data).await?;

    let filter = ContentFilter::new(&config.filter, &config.persona.platform)?;
    let sampling = config.sampling.params();
    let responder = Responder::new(
        provider.clone(),
        config.model(),
        sampling.clone(),
        instructions,
        filter,
    );
    let program = optimizer.compile(state, Chatter::new(responder));

    let summarizer = Arc::new(LlmSummarizer::new(
        provider,
        config.model(),
        sampling,
    ));
    let context = ChatContextManager::from_config(&config.context, summarizer);

    Ok(ChatSession::new(context, program))
}

/// Read stdin lines on a background task, skipping blank ones.
///
/// The channel closes on EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let reader = BufReader::new(io::stdin());
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF (Ctrl+D)
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    rx
}

fn prompt() -> std::io::Result<()> {
    print!("You: ");
    std::io::stdout().flush()
}

fn print_reply(reply: SessionReply) {
    match reply {
        SessionReply::Response(completion) => {
            println!("\nResponse: {}\n", completion.output);
        }
        SessionReply::Topics(topics) => {
            let topics = if topics.is_empty() {
                "No topics found".to_string()
            } else {
                topics.join(", ")
            };
            println!("\nRelevant Topics: {topics}");
        }
        SessionReply::Stats(stats) => {
            println!("\nConversation Statistics:");
            println!("{stats}");
        }
        SessionReply::Context(context) => {
            println!("\nCurrent Context:");
            println!("{context}");
        }
        SessionReply::Exit => {}
    }
}
