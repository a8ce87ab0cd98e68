//! Configuration for MongoDB connections

use serde::{Deserialize, Serialize};

/// Default minimum connection pool size when no hint is provided
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Configuration for a [`MongoDatabase`](crate::MongoDatabase)
///
/// The configuration is set once at construction and never mutated. The pool
/// size is a hint passed to the driver as its minimum pool size.
///
/// # Examples
///
/// ```
/// use mongodb_conn_mgr::MongoDatabaseConfig;
///
/// // Defaults: unencrypted transport, pool size 10, log level "info"
/// let config = MongoDatabaseConfig::new("mongodb://localhost:27017", "app");
///
/// // Override individual fields
/// let config = MongoDatabaseConfig {
///     use_encrypted_transport: true,
///     pool_size: 25,
///     ..MongoDatabaseConfig::new("mongodb://db.internal:27017", "app")
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDatabaseConfig {
   /// Connection string for the MongoDB deployment (e.g. `mongodb://host:27017`)
   pub endpoint: String,

   /// Name of the database all handles from this manager are bound to
   pub database_name: String,

   /// Whether to require TLS on the driver connection
   #[serde(default)]
   pub use_encrypted_transport: bool,

   /// Log level hint for consumers; not interpreted by this crate
   #[serde(default = "default_log_level")]
   pub log_level: String,

   /// Minimum connection pool size hint passed to the driver
   ///
   /// Default: 10
   #[serde(default = "default_pool_size")]
   pub pool_size: u32,
}

impl MongoDatabaseConfig {
   /// Create a configuration for the given endpoint and database name with
   /// default transport, log level, and pool size settings
   pub fn new(endpoint: impl Into<String>, database_name: impl Into<String>) -> Self {
      Self {
         endpoint: endpoint.into(),
         database_name: database_name.into(),
         use_encrypted_transport: false,
         log_level: default_log_level(),
         pool_size: DEFAULT_POOL_SIZE,
      }
   }
}

fn default_log_level() -> String {
   "info".to_string()
}

fn default_pool_size() -> u32 {
   DEFAULT_POOL_SIZE
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_new_applies_defaults() {
      let config = MongoDatabaseConfig::new("mongodb://localhost:27017", "app");

      assert_eq!(config.endpoint, "mongodb://localhost:27017");
      assert_eq!(config.database_name, "app");
      assert!(!config.use_encrypted_transport);
      assert_eq!(config.log_level, "info");
      assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
   }

   #[test]
   fn test_deserialize_fills_optional_fields() {
      let config: MongoDatabaseConfig = serde_json::from_str(
         r#"{ "endpoint": "mongodb://db:27017", "database_name": "app" }"#,
      )
      .unwrap();

      assert!(!config.use_encrypted_transport);
      assert_eq!(config.log_level, "info");
      assert_eq!(config.pool_size, 10);
   }
}
