//! # mongodb-conn-mgr
//!
//! A minimal wrapper around the MongoDB driver that manages one shared,
//! lazily established connection per manager instance, with changelog-tracked
//! data migrations.
//!
//! ## Core Types
//!
//! - **[`MongoDatabase`]**: Connection manager owning the shared client and database handles
//! - **[`MongoDatabaseConfig`]**: Immutable connection configuration
//! - **[`Connector`]**: Collaborator trait for connection establishment and liveness probes
//! - **[`MigrationRunner`]**: Collaborator trait for applying pending migrations
//! - **[`DirectoryMigrator`]**: Migration runner reading ordered `*.json` command files
//! - **[`Error`]**: Error type for all operations
//!
//! ## Architecture
//!
//! - **Lazy connection**: The first operation that needs the database connects
//!   and probes the administrative database; later operations reuse the handles
//! - **Serialized initialization**: Shared state lives behind a mutex, so
//!   concurrent first-connection attempts serialize instead of racing
//! - **Narrow collaborators**: Connection establishment and migration
//!   execution sit behind traits, so both can be stubbed in tests
//! - **Changelog tracking**: Applied migrations are recorded in a `changelog`
//!   collection and skipped on subsequent runs
//!
//! ## Usage
//!
//! ```no_run
//! use mongodb_conn_mgr::{MongoDatabase, MongoDatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mongodb_conn_mgr::Result<()> {
//!     let config = MongoDatabaseConfig::new("mongodb://localhost:27017", "app");
//!     let db = Arc::new(MongoDatabase::new(config));
//!
//!     // Apply pending migrations from the `migrations` directory
//!     let applied = db.perform_migrations().await?;
//!     println!("applied {} migrations", applied.len());
//!
//!     // First call establishes the connection; later calls reuse it
//!     let database = db.database().await?;
//!     let users = database.collection::<mongodb::bson::Document>("users");
//!
//!     // Liveness check and sessions ride on the same shared client
//!     db.ping().await?;
//!     let session = db.session().await?;
//!     drop(session);
//!
//!     db.close_connection().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design Principles
//!
//! - Delegates connection pooling and wire protocol entirely to the driver
//! - No retry, backoff, or health-recheck logic: a stored handle is reused
//!   as-is, and every failure is logged once and propagated to the caller
//! - Managers are plain values handed to consumers (usually in an `Arc`),
//!   not process-wide globals
//!
mod config;
mod connector;
mod database;
mod error;
mod migrate;

// Re-export public types
pub use config::{DEFAULT_POOL_SIZE, MongoDatabaseConfig};
pub use connector::{ConnectionState, Connector, DriverConnector};
pub use database::MongoDatabase;
pub use error::Error;
pub use migrate::{
   CHANGELOG_COLLECTION, DirectoryMigrator, MIGRATIONS_DIR, MigrationConfig, MigrationRunner,
};

// Re-export driver handle types for convenience
pub use mongodb::{Client, ClientSession, Database};

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
