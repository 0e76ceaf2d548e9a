//! Search console for trawl views.
//!
//! Loads a view configuration from JSON, compiles query strings against
//! it and, for everything beyond `compile`, executes them against a
//! live Elasticsearch or OpenSearch cluster.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use trawl_client::{HttpEngine, HttpEngineConfig};
use trawl_core::{compile, Action, DocumentView, RequestParams, ViewConfig};

#[derive(Parser)]
#[command(
    name = "trawl",
    about = "Query-string search console for Elasticsearch and OpenSearch",
    version
)]
struct Cli {
    /// Path to the view configuration JSON.
    #[arg(long, global = true, default_value = "view.json")]
    config: PathBuf,

    /// Cluster root URL.
    #[arg(long, global = true, default_value = "http://localhost:9200")]
    engine: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a query string and print the engine body without executing it.
    Compile {
        /// Raw query string, such as `state=published&ordering=-title`.
        query: String,
    },

    /// Execute a list request and print the result envelope.
    List {
        #[arg(default_value = "")]
        query: String,
    },

    /// Fetch one document by id.
    Get { id: String },

    /// Run the native suggesters.
    Suggest { query: String },

    /// Run the functional suggesters.
    FunctionalSuggest { query: String },

    /// Find documents similar to the given one.
    MoreLikeThis {
        id: String,
        #[arg(default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let output = match cli.command {
        Command::Compile { query } => {
            let params = RequestParams::from_query_string(&query, &config.separators);
            compile(&params, &config, Action::List)?.to_body()
        }
        Command::List { query } => {
            connect(config, &cli.engine)?
                .list(&pairs(&query), None)
                .await?
        }
        Command::Get { id } => connect(config, &cli.engine)?.retrieve(&id).await?,
        Command::Suggest { query } => {
            connect(config, &cli.engine)?
                .suggest(&pairs(&query))
                .await?
        }
        Command::FunctionalSuggest { query } => {
            connect(config, &cli.engine)?
                .functional_suggest(&pairs(&query))
                .await?
        }
        Command::MoreLikeThis { id, query } => {
            connect(config, &cli.engine)?
                .more_like_this(&id, &pairs(&query), None)
                .await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(path: &Path) -> Result<ViewConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read view configuration from {}", path.display()))?;
    let config: ViewConfig = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid view configuration", path.display()))?;
    Ok(config)
}

fn connect(config: ViewConfig, base_url: &str) -> Result<DocumentView> {
    let engine = HttpEngine::new(HttpEngineConfig {
        base_url: base_url.to_owned(),
        ..HttpEngineConfig::default()
    })?;
    DocumentView::new(config, Arc::new(engine)).context("invalid view configuration")
}

fn pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}
