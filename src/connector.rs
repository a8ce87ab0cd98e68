//! Connection establishment for MongoDB deployments

use crate::Result;
use crate::config::MongoDatabaseConfig;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Tls, TlsOptions};
use mongodb::{Client, Database};
use std::time::Duration;

/// Fixed timeout for establishing a connection to the deployment
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed timeout for selecting a reachable server for each operation
///
/// The driver exposes no per-socket timeout; server selection is the
/// equivalent knob for bounding how long an operation waits on the network.
pub(crate) const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// An established client handle paired with the database handle bound to the
/// configured database name
///
/// Invariant: the two handles are created together and stored together; the
/// manager never holds one without the other.
#[derive(Debug, Clone)]
pub struct ConnectionState {
   pub client: Client,
   pub database: Database,
}

/// Collaborator that establishes connections and probes their liveness
///
/// [`DriverConnector`] is the production implementation. The trait exists so
/// the connection lifecycle can be exercised in tests with a stub that counts
/// establish attempts or injects failures.
#[async_trait]
pub trait Connector: Send + Sync {
   /// Build a client from the configuration, connect, and confirm
   /// reachability with a liveness probe
   async fn establish(&self, config: &MongoDatabaseConfig) -> Result<ConnectionState>;

   /// Issue a liveness probe against the administrative database
   async fn probe(&self, client: &Client) -> Result<()>;
}

/// Production [`Connector`] backed by the MongoDB driver
#[derive(Debug, Default)]
pub struct DriverConnector;

#[async_trait]
impl Connector for DriverConnector {
   async fn establish(&self, config: &MongoDatabaseConfig) -> Result<ConnectionState> {
      let mut options = ClientOptions::parse(&config.endpoint).await?;
      options.min_pool_size = Some(config.pool_size);
      options.connect_timeout = Some(CONNECT_TIMEOUT);
      options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

      if config.use_encrypted_transport {
         options.tls = Some(Tls::Enabled(TlsOptions::default()));
      }

      let client = Client::with_options(options)?;

      // The driver connects lazily, so force a round trip before handing the
      // client out: an unreachable deployment must fail here, not on first use
      self.probe(&client).await?;

      let database = client.database(&config.database_name);

      Ok(ConnectionState { client, database })
   }

   async fn probe(&self, client: &Client) -> Result<()> {
      client
         .database("admin")
         .run_command(doc! { "ping": 1 })
         .await?;

      Ok(())
   }
}
