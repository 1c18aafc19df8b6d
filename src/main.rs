use console::style;
use dialoguer::Input;
use tracing::info;
use webrag::Result;
use webrag::config::Config;
use webrag::pipeline::ingest;
use webrag::qa::QaEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting ingestion for {} URLs into {:?}",
        config.urls.len(),
        config.data_dir
    );

    let chunks = ingest(&config).await?;
    let engine = QaEngine::build_index(&config, chunks).await?;
    println!(
        "{} {} chunks indexed. Ask a question (empty line to exit).",
        style("Ready:").green().bold(),
        engine.indexed_chunks().await?
    );

    loop {
        let question: String = Input::new()
            .with_prompt("Question")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| anyhow::anyhow!("Failed to read question: {}", e))?;

        if question.trim().is_empty() {
            break;
        }

        let answer = engine.ask(question.trim()).await?;
        println!("\n{}\n{}\n", style("Answer:").cyan().bold(), answer);
    }

    Ok(())
}
