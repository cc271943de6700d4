//! mongovault library
//!
//! Exports a MongoDB database's collections to JSON files with inferred
//! per-field schemas and derived relational migration scripts, and imports
//! them back with schema-directed type validation.
//!
//! # Pipeline
//!
//! - Export: document store → [`vault_core::infer_fields`] → schema + data +
//!   SQL artifacts on the file store
//! - Import: schema manifest + data files → [`vault_coerce::validate`] →
//!   batched bulk inserts → index recreation
//!
//! # CLI Usage
//!
//! ```bash
//! # Export every collection of $MONGO_DB
//! mongovault export --mongo-uri mongodb://localhost:27017 --mongo-db shop
//!
//! # Import it back, skipping invalid documents
//! mongovault import --mongo-uri mongodb://localhost:27017 --mongo-db shop \
//!   --skip-invalid --batch-size 500 --collections users,orders
//! ```

pub mod config;
pub mod export;
pub mod files;
pub mod import;
pub mod store;
pub mod testing;

pub use config::{ConnectionOpts, ImportOpts};
pub use export::{run_export, ExportSummary};
pub use files::{FileStore, LocalFileStore};
pub use import::{run_import, ImportSummary};
pub use store::{DocumentStore, MongoStore};
