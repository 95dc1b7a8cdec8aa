//! ragproxy CLI - index local text files and ask questions about them
//!
//! # Commands
//!
//! ```bash
//! # Embed text and show vector stats
//! ragproxy embed "What is the capital of France?" --query
//!
//! # Index files and show the closest paragraphs
//! ragproxy search "capital of France" --input notes.txt -k 3
//!
//! # Index files and answer a question with a local Ollama model
//! ragproxy ask "What is the capital of France?" --input notes.txt
//! ```
//!
//! Every paragraph (blank-line separated block) of an input file becomes one
//! document in the index. Logging goes to stderr and is controlled by
//! `RUST_LOG`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ragproxy_lib::{
    config::Config,
    embed::{BgeEmbedder, Embedder},
    generate::OllamaGenerator,
    rag::RagPipeline,
    store::MemoryStore,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Pipeline = RagPipeline<BgeEmbedder, MemoryStore, OllamaGenerator>;

#[derive(Parser)]
#[command(name = "ragproxy")]
#[command(about = "Retrieval-augmented question answering over local text files")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses query prompt prefix)
        #[arg(short, long)]
        query: bool,
    },

    /// Index files and show the documents closest to a query
    Search {
        /// Query to search for
        query: String,

        #[command(flatten)]
        corpus: Corpus,

        /// Number of results to return
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Index files and answer a query with retrieved context
    Ask {
        /// Question to answer
        query: String,

        #[command(flatten)]
        corpus: Corpus,

        /// Number of documents used as context
        #[arg(short, long)]
        k: Option<usize>,

        /// Length budget for the generated answer
        #[arg(long)]
        max_length: Option<usize>,

        /// Ollama model tag
        #[arg(long)]
        model: Option<String>,

        /// Ollama server URL
        #[arg(long, env = "RAGPROXY_OLLAMA_URL")]
        base_url: Option<String>,
    },
}

#[derive(Args)]
struct Corpus {
    /// Text files to index
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,
}

/// Split a text into paragraphs, one document each.
fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.extend(paragraphs(&text.replace("\r\n", "\n")).map(str::to_string));
    }
    Ok(documents)
}

/// Exit status of a process stopped by SIGINT.
const INTERRUPTED: i32 = 130;

/// What a Ctrl-C should do at the moment it arrives.
#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    /// Stop the running query at its next stage boundary
    Cancel,
    /// Terminate the process
    Exit,
}

/// Ctrl-C routing: a query in progress is cancelled cooperatively, anything
/// else (model download, indexing, a repeated Ctrl-C) exits immediately.
#[derive(Clone, Default)]
struct Interrupt {
    querying: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl Interrupt {
    /// Route the next Ctrl-C to the query's cancellation token.
    fn arm(&self) {
        self.querying.store(true, Ordering::SeqCst);
    }

    fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn handle(&self) -> InterruptAction {
        if self.querying.load(Ordering::SeqCst) && !self.cancel.is_cancelled() {
            self.cancel.cancel();
            InterruptAction::Cancel
        } else {
            InterruptAction::Exit
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

fn load_embedder(config: &Config) -> Result<BgeEmbedder> {
    eprintln!(
        "Loading {} (first run downloads the model)...",
        config.embedding.model.name()
    );
    Ok(BgeEmbedder::with_progress(
        config.embedding.model,
        config.embedding.show_download_progress,
    )?)
}

/// Build a pipeline and index `inputs` into it.
fn build_pipeline(config: &Config, inputs: &[PathBuf]) -> Result<Pipeline> {
    let documents = read_documents(inputs)?;
    let embedder = load_embedder(config)?;
    let generator = OllamaGenerator::new(config.generation.ollama())?;
    let store = MemoryStore::with_dimension(embedder.dimension());

    let pipeline = RagPipeline::new(embedder, store, generator).with_config(config.pipeline());

    let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
    eprintln!("Indexing {} documents...", texts.len());
    pipeline.index(&texts)?;
    info!(documents = pipeline.len(), "index ready");

    Ok(pipeline)
}

fn embed(config: &Config, text: &str, query: bool) -> Result<()> {
    let embedder = load_embedder(config)?;

    let embedding = if query {
        println!("Embedding as query: {text}");
        embedder.embed_query(text)?
    } else {
        println!("Embedding as document: {text}");
        embedder
            .embed_documents(&[text])?
            .into_iter()
            .next()
            .context("model returned no embedding")?
    };

    println!("\nEmbedding stats:");
    println!("  Dimensions: {}", embedding.len());
    println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
    println!("  Min: {:.4}", embedding.iter().copied().fold(f32::INFINITY, f32::min));
    println!("  Max: {:.4}", embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max));
    Ok(())
}

fn search(config: &Config, inputs: &[PathBuf], query: &str) -> Result<()> {
    let pipeline = build_pipeline(config, inputs)?;
    let k = pipeline.config().top_k;

    eprintln!("Searching: '{query}' (k={k})");
    let results = pipeline.retrieve(query, k)?;

    println!("=== Results ===\n");
    for (i, result) in results.iter().enumerate() {
        println!("#{} (score: {:.4}, document {})", i + 1, result.score, result.position);
        println!("---");
        let preview: String = result.text.chars().take(300).collect();
        let ellipsis = if result.text.chars().count() > 300 { "..." } else { "" };
        println!("{preview}{ellipsis}\n");
    }
    Ok(())
}

fn ask(config: &Config, inputs: &[PathBuf], query: &str, interrupt: &Interrupt) -> Result<()> {
    let pipeline = build_pipeline(config, inputs)?;

    eprintln!("Asking {}: '{query}'", config.generation.model);
    interrupt.arm();
    let answer = pipeline.process_query_with_cancel(query, interrupt.token())?;

    println!("{answer}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    // Ctrl-C stops a running query at the next stage boundary, and the
    // process everywhere else
    let interrupt = Interrupt::default();
    let handler = interrupt.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match handler.handle() {
                InterruptAction::Cancel => eprintln!("\nCancelling..."),
                InterruptAction::Exit => process::exit(INTERRUPTED),
            }
        }
    });

    // model inference and the blocking HTTP client must stay off the async runtime
    tokio::task::spawn_blocking(move || match cli.command {
        Commands::Embed { text, query } => embed(&config, &text, query),

        Commands::Search { query, corpus, k } => {
            if let Some(k) = k {
                config.retrieval.top_k = k;
            }
            search(&config, &corpus.inputs, &query)
        }

        Commands::Ask {
            query,
            corpus,
            k,
            max_length,
            model,
            base_url,
        } => {
            if let Some(k) = k {
                config.retrieval.top_k = k;
            }
            if let Some(max_length) = max_length {
                config.generation.max_length = max_length;
            }
            if let Some(model) = model {
                config.generation.model = model;
            }
            if let Some(base_url) = base_url {
                config.generation.base_url = base_url;
            }
            ask(&config, &corpus.inputs, &query, &interrupt)
        }
    })
    .await?
}
