use mongodb_conn_mgr::{DirectoryMigrator, Error, MigrationConfig, MigrationRunner};
use std::fs;
use std::path::PathBuf;

fn config_with_dir(dir: PathBuf) -> MigrationConfig {
   MigrationConfig {
      endpoint: "mongodb://localhost:27017".to_string(),
      database_name: "conn_mgr_migrate_test".to_string(),
      migrations_dir: dir,
      changelog_collection: "changelog".to_string(),
   }
}

#[tokio::test]
async fn test_missing_migrations_dir_is_rejected_before_connecting() {
   let migrator = DirectoryMigrator;
   let config = config_with_dir(PathBuf::from("does_not_exist_migrations"));

   let err = migrator.apply_pending(&config).await.unwrap_err();

   assert!(matches!(err, Error::MigrationsDirMissing(_)));
}

#[tokio::test]
async fn test_invalid_migration_file_is_rejected_before_connecting() {
   let dir = tempfile::tempdir().unwrap();
   fs::write(dir.path().join("20240101_broken.json"), "{ not json").unwrap();

   let migrator = DirectoryMigrator;
   let config = config_with_dir(dir.path().to_path_buf());

   let err = migrator.apply_pending(&config).await.unwrap_err();

   assert!(matches!(
      err,
      Error::InvalidMigrationFile { file, .. } if file == "20240101_broken.json"
   ));
}

// End-to-end run against a real deployment; run with `cargo test -- --ignored`
#[tokio::test]
#[ignore = "requires a running mongod on localhost:27017"]
async fn test_pending_migrations_apply_once_and_in_order() {
   let dir = tempfile::tempdir().unwrap();
   fs::write(
      dir.path().join("20240101_init.json"),
      r#"[{ "create": "users" }]"#,
   )
   .unwrap();
   fs::write(
      dir.path().join("20240102_add_index.json"),
      r#"[{
         "createIndexes": "users",
         "indexes": [{ "key": { "email": 1 }, "name": "email_idx" }]
      }]"#,
   )
   .unwrap();

   let migrator = DirectoryMigrator;
   let config = config_with_dir(dir.path().to_path_buf());

   let applied = migrator.apply_pending(&config).await.unwrap();
   assert_eq!(
      applied,
      vec![
         "20240101_init.json".to_string(),
         "20240102_add_index.json".to_string()
      ]
   );

   // Second run finds everything recorded in the changelog and applies nothing
   let applied = migrator.apply_pending(&config).await.unwrap();
   assert!(applied.is_empty());

   // Cleanup
   let client = mongodb::Client::with_uri_str(&config.endpoint).await.unwrap();
   client
      .database(&config.database_name)
      .drop()
      .await
      .unwrap();
   client.shutdown().await;
}
