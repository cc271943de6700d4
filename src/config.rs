//! Command-line options shared by the export and import entry points.
//!
//! All options are explicit values constructed once at the entry point and
//! passed down; there is no process-wide mutable configuration.

use clap::Args;

/// Store connection options, environment-sourced.
///
/// Both values are required: a missing connection string or database name is
/// a fatal startup condition.
#[derive(Args, Clone, Debug)]
pub struct ConnectionOpts {
    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI")]
    pub mongo_uri: String,

    /// Source/target database name
    #[arg(long, env = "MONGO_DB")]
    pub mongo_db: String,
}

/// Import behavior flags.
#[derive(Args, Clone, Debug)]
pub struct ImportOpts {
    /// Do not drop and recreate the target database before importing
    #[arg(long)]
    pub no_drop: bool,

    /// Do not recreate indexes from the exported schema
    #[arg(long)]
    pub no_indexes: bool,

    /// Insert documents as-is, without schema validation or coercion
    #[arg(long)]
    pub no_validate: bool,

    /// Do not clear target collections before inserting
    #[arg(long)]
    pub no_clear: bool,

    /// Skip documents that fail validation instead of inserting them
    #[arg(long)]
    pub skip_invalid: bool,

    /// Restrict the import to these collections (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub collections: Vec<String>,

    /// Number of documents per bulk insert
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,
}

impl Default for ImportOpts {
    fn default() -> Self {
        Self {
            no_drop: false,
            no_indexes: false,
            no_validate: false,
            no_clear: false,
            skip_invalid: false,
            collections: Vec::new(),
            batch_size: 1000,
        }
    }
}

impl ImportOpts {
    /// Whether a collection is selected by the `--collections` filter.
    pub fn includes_collection(&self, name: &str) -> bool {
        self.collections.is_empty() || self.collections.iter().any(|c| c == name)
    }
}
