//! Vector collection manager.
//!
//! Runs the interactive menu by default; the subcommands do the same
//! operations non-interactively.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use enhancer::collections::{
    chroma, commands, local, menu, ChromaStore, LocalStore, VectorStore, DEFAULT_RESULTS,
};
use enhancer::llm_client::{gemini, GeminiClient};

#[derive(Parser)]
#[command(name = "collections", version, about = "Manage vector document collections")]
struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "COLLECTIONS_STORE", default_value_t = StoreKind::Local)]
    store: StoreKind,

    /// Directory for the local store
    #[arg(long, env = "COLLECTIONS_DIR", default_value = local::DEFAULT_PERSIST_DIR)]
    persist_dir: PathBuf,

    /// Chroma server URL
    #[arg(long, env = "CHROMA_URL", default_value = chroma::DEFAULT_URL)]
    chroma_url: String,

    /// API key for the embedding model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = gemini::DEFAULT_BASE_URL)]
    gemini_base_url: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = gemini::DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    Local,
    Chroma,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,
    /// List collections
    List,
    /// Create a collection
    Create { name: String },
    /// Delete a collection
    Delete { name: String },
    /// Add every PDF in a folder to a collection
    Ingest { collection: String, folder: PathBuf },
    /// Semantic search within a collection
    Query {
        collection: String,
        text: String,
        /// Number of results
        #[arg(short = 'n', long, default_value_t = DEFAULT_RESULTS)]
        n_results: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // stdout belongs to the menu; logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let embedder = Arc::new(
        GeminiClient::new(cli.gemini_api_key)?
            .with_base_url(cli.gemini_base_url)
            .with_embedding_model(cli.embedding_model),
    );

    let store: Box<dyn VectorStore> = match cli.store {
        StoreKind::Local => Box::new(
            LocalStore::open(&cli.persist_dir, embedder)
                .await
                .with_context(|| format!("Failed to open store at {}", cli.persist_dir.display()))?,
        ),
        StoreKind::Chroma => Box::new(ChromaStore::new(cli.chroma_url, embedder)?),
    };
    let store = store.as_ref();

    let mut out = io::stdout().lock();
    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => menu::run_menu(store, &mut io::stdin().lock(), &mut out).await?,
        Commands::List => {
            commands::list(store, &mut out).await?;
        }
        Commands::Create { name } => commands::create(store, &mut out, &name).await?,
        Commands::Delete { name } => commands::delete(store, &mut out, &name).await?,
        Commands::Ingest { collection, folder } => {
            commands::ingest(store, &mut out, &collection, &folder).await?
        }
        Commands::Query {
            collection,
            text,
            n_results,
        } => commands::query(store, &mut out, &collection, &text, n_results).await?,
    }

    Ok(())
}
