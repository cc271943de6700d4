//! Command-line interface for mongovault
//!
//! # Usage Examples
//!
//! ```bash
//! # Export all collections to ./mongovault-export
//! mongovault export --mongo-uri mongodb://localhost:27017 --mongo-db shop
//!
//! # Re-import, recreating the database and its indexes
//! mongovault import --mongo-uri mongodb://localhost:27017 --mongo-db shop
//!
//! # Partial import without validation
//! mongovault import --mongo-db shop --collections users --no-validate --no-drop
//! ```

use clap::{Parser, Subcommand};
use mongovault::config::{ConnectionOpts, ImportOpts};
use mongovault::files::LocalFileStore;
use mongovault::store::MongoStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mongovault")]
#[command(about = "Export MongoDB collections to JSON and import them back with schema validation")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export all collections: raw JSON, inferred schemas, SQL migration
    Export {
        /// Store connection options
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Directory receiving the export artifacts
        #[arg(long, default_value = "./mongovault-export")]
        output_dir: PathBuf,
    },

    /// Import previously exported collections back into the store
    Import {
        /// Store connection options
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Directory holding the export artifacts
        #[arg(long, default_value = "./mongovault-export")]
        input_dir: PathBuf,

        /// Import behavior flags
        #[command(flatten)]
        opts: ImportOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Export {
            connection,
            output_dir,
        } => {
            let store = MongoStore::connect(&connection.mongo_uri, &connection.mongo_db).await?;
            let files = LocalFileStore::new(output_dir);
            mongovault::run_export(&store, &files, &connection.mongo_db).await?;
        }
        Commands::Import {
            connection,
            input_dir,
            opts,
        } => {
            let store = MongoStore::connect(&connection.mongo_uri, &connection.mongo_db).await?;
            let files = LocalFileStore::new(input_dir);
            mongovault::run_import(&store, &files, &opts).await?;
        }
    }
    Ok(())
}
