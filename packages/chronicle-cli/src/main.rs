//! Command-line entry point for timeline synthesis.
//!
//! Reads articles from a directory, answers a question against them and
//! prints JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chronicle::{
    load_articles, Chronicle, ChronicleConfig, EventExtractor, MemoryStore, OpenAiOracle,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Build news timelines that answer a question")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question with a timeline built from an article directory
    Timeline {
        /// Directory of `*.txt` articles
        articles: PathBuf,

        /// The question to answer
        question: String,

        /// Date the question is asked on (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the analysis, hits and extractions as well as the timeline
        #[arg(long)]
        full: bool,
    },

    /// Extract events and entities from every article
    Extract {
        articles: PathBuf,

        /// Topic to focus event extraction on
        #[arg(long)]
        topic: Option<String>,
    },

    /// Report formatting problems in an article directory
    Validate { articles: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chronicle=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Timeline {
            articles,
            question,
            today,
            full,
        } => {
            let config = ChronicleConfig::from_env().context("Failed to load configuration")?;
            let oracle =
                OpenAiOracle::from_config(&config.oracle).context("Failed to create oracle")?;
            let store = Arc::new(load_store(&articles)?);

            let chronicle = Chronicle::new(oracle, store.clone(), Some(store), config)
                .context("Failed to build pipeline")?;
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let output = chronicle.run(&question, today).await;

            let rendered = if full {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string_pretty(&output.timeline)
            };
            println!("{}", rendered.context("Failed to serialize output")?);
        }

        Commands::Extract { articles, topic } => {
            let config = ChronicleConfig::from_env().context("Failed to load configuration")?;
            let oracle =
                OpenAiOracle::from_config(&config.oracle).context("Failed to create oracle")?;
            let articles = load_articles(&articles).context("Failed to load articles")?;

            let extractor = EventExtractor::new(oracle, &config);
            let results = extractor
                .extract_articles_with_cache::<MemoryStore>(&articles, None, topic.as_deref())
                .await;
            println!(
                "{}",
                serde_json::to_string_pretty(&results).context("Failed to serialize results")?
            );
        }

        Commands::Validate { articles } => {
            let articles = load_articles(&articles).context("Failed to load articles")?;
            let report: Vec<_> = articles
                .iter()
                .map(|article| {
                    json!({
                        "path": article.source_id(),
                        "title": article.title,
                        "issues": article.validate(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_store(dir: &Path) -> Result<MemoryStore> {
    let articles = load_articles(dir).context("Failed to load articles")?;
    tracing::info!(articles = articles.len(), dir = %dir.display(), "Indexed articles");
    Ok(MemoryStore::with_articles(articles))
}
