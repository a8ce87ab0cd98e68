//! Ordered data/schema migrations tracked in a changelog collection

use crate::Result;
use crate::config::MongoDatabaseConfig;
use crate::error::Error;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Client;
use mongodb::bson::{DateTime, Document};
use mongodb::options::ClientOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed name of the directory migration files are read from
pub const MIGRATIONS_DIR: &str = "migrations";

/// Fixed name of the collection that records applied migrations
pub const CHANGELOG_COLLECTION: &str = "changelog";

/// Configuration handed to a [`MigrationRunner`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
   /// Connection string for the deployment migrations run against
   pub endpoint: String,

   /// Database the migrations and changelog apply to
   pub database_name: String,

   /// Directory containing ordered `*.json` migration files
   pub migrations_dir: PathBuf,

   /// Collection used to track which migration files have been applied
   pub changelog_collection: String,
}

impl MigrationConfig {
   /// Build the migration configuration for a manager's database, using the
   /// fixed migrations directory and changelog collection names
   pub fn for_database(config: &MongoDatabaseConfig) -> Self {
      Self {
         endpoint: config.endpoint.clone(),
         database_name: config.database_name.clone(),
         migrations_dir: PathBuf::from(MIGRATIONS_DIR),
         changelog_collection: CHANGELOG_COLLECTION.to_string(),
      }
   }
}

/// Collaborator that applies pending migrations and reports which ran
///
/// The contract is deliberately narrow so the concrete implementation can be
/// swapped or stubbed in tests: given a configuration, apply whatever is
/// pending and return the applied identifiers in application order.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
   async fn apply_pending(&self, config: &MigrationConfig) -> Result<Vec<String>>;
}

/// A single migration loaded from disk: the source file name (its identifier)
/// and the database commands it runs
#[derive(Debug, Clone)]
struct Migration {
   file_name: String,
   commands: Vec<Document>,
}

/// Document stored in the changelog collection for each applied migration
#[derive(Debug, Serialize, Deserialize)]
struct ChangelogEntry {
   file_name: String,
   applied_at: DateTime,
}

/// Production [`MigrationRunner`] that reads `*.json` files from the
/// migrations directory and executes them as ordered database commands
///
/// Each migration file is a JSON array of MongoDB database commands, executed
/// in order via `runCommand` against the configured database. Files are
/// applied in file-name order; applied file names are recorded in the
/// changelog collection and skipped on subsequent runs.
///
/// The runner opens its own connection, independent of any shared manager
/// state, and shuts it down after the run completes. There is no rollback:
/// a failed run leaves the changelog recording exactly the files that
/// completed before the failure.
#[derive(Debug, Default)]
pub struct DirectoryMigrator;

#[async_trait]
impl MigrationRunner for DirectoryMigrator {
   async fn apply_pending(&self, config: &MigrationConfig) -> Result<Vec<String>> {
      if !config.migrations_dir.is_dir() {
         return Err(Error::MigrationsDirMissing(config.migrations_dir.clone()));
      }

      // Load and validate every file before touching the database
      let migrations = load_migrations(&config.migrations_dir)?;

      let options = ClientOptions::parse(&config.endpoint).await?;
      let client = Client::with_options(options)?;
      let database = client.database(&config.database_name);
      let changelog = database.collection::<ChangelogEntry>(&config.changelog_collection);

      let mut already_applied = HashSet::new();
      let mut cursor = changelog.find(Document::new()).await?;
      while let Some(entry) = cursor.try_next().await? {
         already_applied.insert(entry.file_name);
      }

      let mut applied = Vec::new();

      for migration in migrations {
         if already_applied.contains(&migration.file_name) {
            continue;
         }

         info!("Applying migration '{}'", migration.file_name);

         for command in &migration.commands {
            database.run_command(command.clone()).await?;
         }

         changelog
            .insert_one(ChangelogEntry {
               file_name: migration.file_name.clone(),
               applied_at: DateTime::now(),
            })
            .await?;

         applied.push(migration.file_name);
      }

      client.shutdown().await;

      Ok(applied)
   }
}

/// Load every `*.json` migration file from the directory, sorted by file name
fn load_migrations(dir: &Path) -> Result<Vec<Migration>> {
   let mut migrations = Vec::new();

   for entry in fs::read_dir(dir)? {
      let path = entry?.path();

      if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
         continue;
      }

      let file_name = match path.file_name().and_then(|name| name.to_str()) {
         Some(name) => name.to_string(),
         None => continue,
      };

      let raw = fs::read_to_string(&path)?;
      let commands: Vec<Document> =
         serde_json::from_str(&raw).map_err(|source| Error::InvalidMigrationFile {
            file: file_name.clone(),
            source,
         })?;

      migrations.push(Migration {
         file_name,
         commands,
      });
   }

   // File names are the migration identifiers; apply in lexicographic order
   migrations.sort_by(|a, b| a.file_name.cmp(&b.file_name));

   Ok(migrations)
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::fs::File;
   use std::io::Write;

   fn write_migration(dir: &Path, name: &str, contents: &str) {
      let mut file = File::create(dir.join(name)).unwrap();
      file.write_all(contents.as_bytes()).unwrap();
   }

   #[test]
   fn test_load_migrations_sorted_by_file_name() {
      let dir = tempfile::tempdir().unwrap();
      write_migration(
         dir.path(),
         "20240102_add_index.json",
         r#"[{ "createIndexes": "users", "indexes": [] }]"#,
      );
      write_migration(
         dir.path(),
         "20240101_init.json",
         r#"[{ "create": "users" }]"#,
      );

      let migrations = load_migrations(dir.path()).unwrap();

      assert_eq!(migrations.len(), 2);
      assert_eq!(migrations[0].file_name, "20240101_init.json");
      assert_eq!(migrations[1].file_name, "20240102_add_index.json");
   }

   #[test]
   fn test_load_migrations_skips_non_json_files() {
      let dir = tempfile::tempdir().unwrap();
      write_migration(dir.path(), "20240101_init.json", r#"[{ "create": "users" }]"#);
      write_migration(dir.path(), "README.md", "not a migration");

      let migrations = load_migrations(dir.path()).unwrap();

      assert_eq!(migrations.len(), 1);
      assert_eq!(migrations[0].file_name, "20240101_init.json");
   }

   #[test]
   fn test_load_migrations_rejects_invalid_json() {
      let dir = tempfile::tempdir().unwrap();
      write_migration(dir.path(), "20240101_broken.json", "{ not json");

      let result = load_migrations(dir.path());

      assert!(matches!(
         result.unwrap_err(),
         Error::InvalidMigrationFile { file, .. } if file == "20240101_broken.json"
      ));
   }

   #[test]
   fn test_migration_config_uses_fixed_names() {
      let config = MongoDatabaseConfig::new("mongodb://localhost:27017", "app");
      let migration_config = MigrationConfig::for_database(&config);

      assert_eq!(migration_config.endpoint, "mongodb://localhost:27017");
      assert_eq!(migration_config.database_name, "app");
      assert_eq!(migration_config.migrations_dir, PathBuf::from("migrations"));
      assert_eq!(migration_config.changelog_collection, "changelog");
   }
}
