//! Bitcoin Blockchain Explorer - Main entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use btc_explorer::{
    api::ApiServer,
    database::Database,
    esplora::EsploraClient,
    indexer::{IndexerService, SyncOptions},
};

#[derive(Parser)]
#[command(version, about = "Bitcoin blockchain explorer backend", long_about = None)]
struct Cli {
    /// SQLite database path; falls back to DATABASE_URL, then
    /// ./btc_explorer.db
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the most recent blocks from the Esplora API
    Sync {
        #[arg(long, default_value = "https://blockstream.info/api")]
        api_url: String,
        /// Attempt budget per request
        #[arg(long, default_value_t = 5)]
        max_retries: u32,
        /// How many of the most recent blocks to process
        #[arg(long, default_value_t = 10)]
        blocks: usize,
        /// Concurrent page fetches within a block
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
        /// Pause before each page fetch, in milliseconds
        #[arg(long, default_value_t = 500)]
        request_delay_ms: u64,
        /// Pause between blocks, in milliseconds
        #[arg(long, default_value_t = 1000)]
        block_pause_ms: u64,
    },
    /// Serve the read-only browsing API
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Drop and recreate the database schema
    Setup,
}

fn default_database_path() -> PathBuf {
    std::env::var("DATABASE_URL")
        .map(|url| {
            if let Some(path) = url.strip_prefix("sqlite:") {
                PathBuf::from(path)
            } else {
                PathBuf::from(url)
            }
        })
        .unwrap_or_else(|_| PathBuf::from("btc_explorer.db"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let database_path = cli.db_path.unwrap_or_else(default_database_path);
    info!("Database path: {:?}", database_path);
    let database = Arc::new(
        Database::new(&database_path)
            .await
            .with_context(|| format!("opening database at {:?}", database_path))?,
    );

    match cli.command {
        Command::Setup => {
            database.reset().await.context("rebuilding schema")?;
            info!("Database schema is ready");
        }
        Command::Sync {
            api_url,
            max_retries,
            blocks,
            concurrency,
            request_delay_ms,
            block_pause_ms,
        } => {
            database.migrate().await.context("running migrations")?;
            let client =
                EsploraClient::new(&api_url, max_retries).context("building API client")?;
            let options = SyncOptions {
                block_limit: blocks,
                concurrency,
                request_delay: Duration::from_millis(request_delay_ms),
                block_pause: Duration::from_millis(block_pause_ms),
            };
            IndexerService::new(database, options).run(&client).await?;
        }
        Command::Serve { port } => {
            database.migrate().await.context("running migrations")?;
            ApiServer::new(database, port).start().await?;
        }
    }

    Ok(())
}
