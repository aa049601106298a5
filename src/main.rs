//! Evaluate one RAG answer described in free text and print the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use ragjudge::{Config, RagEvaluation};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ragjudge", version)]
struct Args {
    /// Free text containing the question, answer, context, optional ground truth and requested metrics.
    /// Read from stdin when neither this nor --file is given.
    text: Option<String>,

    /// Read the input text from a file
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn read_input(args: &Args) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", &config.ragjudge.log_level),
    )
    .init();

    let input = read_input(&args)?;
    if input.trim().is_empty() {
        anyhow::bail!("Input text cannot be empty");
    }

    log::info!(
        "ragjudge v{} using {:?} deployment '{}'",
        env!("CARGO_PKG_VERSION"),
        config.llm.provider,
        config.llm.deployment
    );

    let api_key = config.api_key()?;
    let pipeline = RagEvaluation::from_config(&config, &api_key)?;

    let result = pipeline
        .evaluate_text(&input)
        .await
        .context("Evaluation failed")?;

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", json);

    Ok(())
}
