//! ragdb CLI - Administration of a ragdb database.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ragdb_chunk::{Chunker, HfTokenizer, TokenChunker};
use ragdb_core::{RagConfig, SchemaVersion, Store};
use ragdb_store::{compare_settings, SqliteStore, StoreOptions};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// ragdb - Local document store for retrieval-augmented generation
#[derive(Parser)]
#[command(name = "ragdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (overrides the configured path)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Configuration file (default: user config dir, then ./ragdb.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, or upgrade an existing one
    Init,

    /// Show schema version and statistics
    Info,

    /// Print the stored settings snapshot and any drift from the active config
    Settings,

    /// Preview how a file would be chunked
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Hugging Face tokenizer.json (default: word tokenizer)
        #[arg(short, long)]
        tokenizer: Option<PathBuf>,
    },

    /// Delete a document with its chunks and embeddings
    Delete {
        /// Document id
        id: i64,
    },

    /// Drop all embeddings and adopt a changed embedding model (chunking must be unchanged)
    ResetEmbeddings,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(cli: &Cli) -> CliResult<RagConfig> {
    let mut config = match &cli.config {
        Some(path) => RagConfig::load(path)?,
        None => RagConfig::load_default()?,
    };

    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }

    Ok(config)
}

fn open_store(config: &RagConfig, skip_validation: bool) -> CliResult<SqliteStore> {
    let options = StoreOptions {
        skip_validation,
        ..StoreOptions::default()
    };
    Ok(SqliteStore::open(&config.database.path, config, options)?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Init => {
            init_database(&config)?;
        }
        Commands::Info => {
            info(&config).await?;
        }
        Commands::Settings => {
            settings(&config)?;
        }
        Commands::Chunk { file, tokenizer } => {
            chunk_file(&config, &file, tokenizer.as_deref())?;
        }
        Commands::Delete { id } => {
            delete(&config, id).await?;
        }
        Commands::ResetEmbeddings => {
            reset_embeddings(&config).await?;
        }
    }

    Ok(())
}

/// Close the store, then surface the command's own error first.
fn finish<T>(store: SqliteStore, result: CliResult<T>) -> CliResult<T> {
    let closed = store.close();
    let value = result?;
    closed?;
    Ok(value)
}

fn init_database(config: &RagConfig) -> CliResult<()> {
    let store = open_store(config, false)?;

    let result = (|| -> CliResult<()> {
        for description in store.applied_upgrades() {
            println!("Applied upgrade: {}", description);
        }
        println!(
            "Initialized database at: {} (schema {})",
            config.database.path.display(),
            store.schema_version()?
        );
        Ok(())
    })();

    finish(store, result)
}

async fn info(config: &RagConfig) -> CliResult<()> {
    let store = open_store(config, false)?;

    let result: CliResult<()> = async {
        let stats = store.get_stats().await?;

        println!("Database:   {}", config.database.path.display());
        println!("Schema:     {}", store.schema_version()?);
        println!("Software:   {}", SchemaVersion::current());
        println!(
            "Embeddings: {} / {} (dim {})",
            config.embedding.provider,
            config.embedding.model,
            store.dimension()
        );
        println!("Documents:  {}", stats.documents);
        println!("Chunks:     {}", stats.chunks);
        println!("Vectors:    {}", stats.embeddings);
        println!("Size:       {} bytes", stats.storage_bytes);
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .await;

    finish(store, result)
}

fn settings(config: &RagConfig) -> CliResult<()> {
    // Skip the guard so drift can be shown rather than refused.
    let store = open_store(config, true)?;

    let result = (|| -> CliResult<()> {
        let stored = store.settings().get()?;
        println!("{}", serde_json::to_string_pretty(&stored)?);

        if stored.is_empty() {
            println!("\nNo settings snapshot stored.");
            return Ok(());
        }

        let mismatches = compare_settings(&stored, config)?;
        if mismatches.is_empty() {
            println!("\nActive configuration matches the stored settings.");
            return Ok(());
        }

        println!("\nActive configuration differs:");
        for mismatch in &mismatches {
            println!("  {}", mismatch);
        }
        if mismatches.iter().any(|m| m.key.starts_with("chunking.")) {
            println!("Chunking changed: every document must be re-chunked and re-embedded.");
        } else {
            println!("Run 'ragdb reset-embeddings' and re-embed to adopt it.");
        }
        Ok(())
    })();

    finish(store, result)
}

async fn delete(config: &RagConfig, id: i64) -> CliResult<()> {
    let store = open_store(config, false)?;

    let result: CliResult<()> = async {
        store.delete_document(id).await?;
        println!("Deleted document {}", id);
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .await;

    finish(store, result)
}

fn chunk_file(config: &RagConfig, file: &Path, tokenizer: Option<&Path>) -> CliResult<()> {
    let text = fs::read_to_string(file)?;

    let chunker = match tokenizer {
        Some(path) => TokenChunker::with_tokenizer(
            &config.chunking,
            Arc::new(HfTokenizer::from_file(path)?),
        )?,
        None => TokenChunker::new(&config.chunking)?,
    };

    let chunks = chunker.chunk(&text)?;
    println!(
        "{} tokens -> {} chunk(s) (size={}, overlap={})",
        chunker.count_tokens(&text)?,
        chunks.len(),
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    for (i, chunk) in chunks.iter().enumerate() {
        println!("\n--- chunk {} ({} tokens) ---", i, chunker.count_tokens(chunk)?);
        println!("{}", chunk);
    }

    Ok(())
}

/// Drop every embedding and adopt the active embedding settings.
///
/// Refused when chunk geometry changed: stored chunks would no longer
/// match the snapshot, and only a full rebuild re-chunks them.
async fn reset_embeddings(config: &RagConfig) -> CliResult<()> {
    let store = open_store(config, true)?;

    let result: CliResult<()> = async {
        let stored = store.settings().get()?;
        if !stored.is_empty() {
            let chunking: Vec<String> = compare_settings(&stored, config)?
                .iter()
                .filter(|m| m.key.starts_with("chunking."))
                .map(ToString::to_string)
                .collect();

            if !chunking.is_empty() {
                return Err(format!(
                    "Chunking settings changed ({}); existing chunks must be rebuilt, not just re-embedded",
                    chunking.join("; ")
                )
                .into());
            }
        }

        store.recreate_embedding_index().await?;
        store.save_settings().await?;

        let stats = store.get_stats().await?;
        println!(
            "Recreated embedding index (dim {}); {} chunks need re-embedding.",
            store.dimension(),
            stats.chunks
        );
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .await;

    finish(store, result)
}
