//! MongoDB connection manager with a lazily established shared connection

use crate::Result;
use crate::config::MongoDatabaseConfig;
use crate::connector::{ConnectionState, Connector, DriverConnector};
use crate::error::Error;
use crate::migrate::{DirectoryMigrator, MigrationConfig, MigrationRunner};
use mongodb::{Client, ClientSession, Database};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// MongoDB connection manager with one shared, lazily established connection.
///
/// The first operation that needs the database establishes the connection and
/// confirms reachability with a liveness probe; every later operation reuses
/// the stored handles without re-inspecting their health. Consumers share a
/// single manager instance (typically behind an `Arc`) rather than each
/// opening their own connection.
///
/// # Example
///
/// ```no_run
/// use mongodb_conn_mgr::{MongoDatabase, MongoDatabaseConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), mongodb_conn_mgr::Error> {
/// let config = MongoDatabaseConfig::new("mongodb://localhost:27017", "app");
/// let db = Arc::new(MongoDatabase::new(config));
///
/// // First call connects; later calls reuse the shared handles
/// let database = db.database().await?;
/// let users = database.collection::<mongodb::bson::Document>("users");
///
/// db.close_connection().await?;
/// # Ok(())
/// # }
/// ```
pub struct MongoDatabase {
   /// Immutable configuration, set once at construction
   config: MongoDatabaseConfig,

   /// Shared connection state: both handles present, or neither.
   /// The mutex is the single mutation point, so concurrent callers racing to
   /// establish the first connection serialize instead of overwriting each
   /// other's handles.
   state: Mutex<Option<ConnectionState>>,

   /// Establishes and probes connections; stubbed in tests
   connector: Arc<dyn Connector>,

   /// Applies pending migrations; stubbed in tests
   migrator: Arc<dyn MigrationRunner>,
}

impl MongoDatabase {
   /// Create a manager with the production driver connector and directory
   /// migration runner. No connection is made until the first operation.
   pub fn new(config: MongoDatabaseConfig) -> Self {
      Self::with_collaborators(
         config,
         Arc::new(DriverConnector),
         Arc::new(DirectoryMigrator),
      )
   }

   /// Create a manager with explicit collaborators
   ///
   /// Use this to substitute a stub [`Connector`] or [`MigrationRunner`],
   /// e.g. to count connection attempts or inject failures in tests.
   pub fn with_collaborators(
      config: MongoDatabaseConfig,
      connector: Arc<dyn Connector>,
      migrator: Arc<dyn MigrationRunner>,
   ) -> Self {
      Self {
         config,
         state: Mutex::new(None),
         connector,
         migrator,
      }
   }

   /// The configuration this manager was constructed with
   pub fn config(&self) -> &MongoDatabaseConfig {
      &self.config
   }

   /// Establish the shared connection if one is not already held
   ///
   /// Idempotent: when the shared state already holds both handles this
   /// returns immediately without touching the network or inspecting handle
   /// health. Otherwise the connector builds a client from the configuration,
   /// connects, and probes the administrative database; on success both
   /// handles are stored for reuse. On failure the state is cleared so no
   /// half-initialized handle can be reused, and the failure propagates to
   /// the caller. The partially constructed client from a failed attempt is
   /// dropped rather than explicitly closed.
   pub async fn open_connection(&self) -> Result<()> {
      let mut state = self.state.lock().await;

      if state.is_some() {
         return Ok(());
      }

      match self.connector.establish(&self.config).await {
         Ok(connection) => {
            *state = Some(connection);
            Ok(())
         }
         Err(err) => {
            *state = None;
            error!(
               "Error occurred while connecting to database '{}': {}",
               self.config.database_name, err
            );
            Err(err)
         }
      }
   }

   /// Get the shared database handle, establishing the connection first if
   /// necessary
   ///
   /// The returned [`Database`] is bound to the configured database name and
   /// is cheap to clone; it remains usable until [`close_connection`] is
   /// called.
   ///
   /// [`close_connection`]: MongoDatabase::close_connection
   pub async fn database(&self) -> Result<Database> {
      self.open_connection().await?;

      let state = self.state.lock().await;

      state
         .as_ref()
         .map(|connection| connection.database.clone())
         .ok_or(Error::ClientMissing)
   }

   /// Close the shared connection and clear both handles
   ///
   /// A no-op when no connection is held. After closing, the next operation
   /// that needs the database establishes a fresh connection.
   pub async fn close_connection(&self) -> Result<()> {
      let mut state = self.state.lock().await;

      let Some(connection) = state.take() else {
         return Ok(());
      };

      connection.client.shutdown().await;

      Ok(())
   }

   /// Confirm the shared connection is usable by probing the administrative
   /// database
   ///
   /// Ensures a connection first, then requires a live client handle
   /// ([`Error::ClientMissing`] if absent after the ensure step) and issues
   /// the liveness probe. Probe failures propagate unmodified.
   pub async fn ping(&self) -> Result<()> {
      self.database().await?;

      let client = self.client().await.ok_or(Error::ClientMissing)?;

      match self.connector.probe(&client).await {
         Ok(()) => Ok(()),
         Err(err) => {
            error!(
               "Liveness probe failed for database '{}': {}",
               self.config.database_name, err
            );
            Err(err)
         }
      }
   }

   /// Start a new logical session on the shared client, establishing the
   /// connection first if necessary
   pub async fn session(&self) -> Result<ClientSession> {
      self.open_connection().await?;

      let client = self.client().await.ok_or(Error::ClientMissing)?;

      Ok(client.start_session().await?)
   }

   /// Apply all pending migrations for the configured database
   ///
   /// Builds a [`MigrationConfig`] targeting this manager's endpoint and
   /// database, with the fixed `migrations` directory and `changelog`
   /// collection names, and hands it to the migration runner. The runner
   /// manages its own connection, independent of the shared state here.
   ///
   /// Returns the applied migration identifiers in application order. Any
   /// runner failure is logged and re-signaled; no rollback is attempted.
   pub async fn perform_migrations(&self) -> Result<Vec<String>> {
      let migration_config = MigrationConfig::for_database(&self.config);

      match self.migrator.apply_pending(&migration_config).await {
         Ok(applied) => Ok(applied),
         Err(err) => {
            error!(
               "Error occurred while performing migrations for database '{}': {}",
               self.config.database_name, err
            );
            Err(err)
         }
      }
   }

   /// Clone the shared client handle, if one is held
   async fn client(&self) -> Option<Client> {
      let state = self.state.lock().await;

      state.as_ref().map(|connection| connection.client.clone())
   }
}

impl std::fmt::Debug for MongoDatabase {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("MongoDatabase")
         .field("config", &self.config)
         .finish_non_exhaustive()
   }
}
