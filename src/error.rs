//! Error types for mongodb-conn-mgr

use std::path::PathBuf;
use thiserror::Error;

/// Errors that may occur when working with mongodb-conn-mgr
#[derive(Error, Debug)]
pub enum Error {
   /// IO error when accessing migration files. Standard library IO errors
   /// are converted to this variant.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the MongoDB driver. Failures from connection establishment,
   /// liveness probes, sessions, and database commands are all propagated
   /// unmodified through this variant.
   #[error("MongoDB driver error: {0}")]
   Mongo(#[from] mongodb::error::Error),

   /// No client handle is available where one is required
   #[error("Client missing or not configured")]
   ClientMissing,

   /// The configured migrations directory does not exist
   #[error("Migrations directory '{}' does not exist", .0.display())]
   MigrationsDirMissing(PathBuf),

   /// A migration file could not be parsed as a JSON command list
   #[error("Invalid migration file '{file}': {source}")]
   InvalidMigrationFile {
      file: String,
      source: serde_json::Error,
   },
}
