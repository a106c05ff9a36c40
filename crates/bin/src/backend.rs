//! Backend creation and store lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use purrcafe::{
    MeowIdGenerator, Store, StoreConfig,
    backend::{BackendImpl, database::InMemory},
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "purrcafe.db";
const JSON_FILE: &str = "purrcafe.json";

fn data_dir(config: &BackendConfig) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Create the appropriate backend based on configuration
pub fn create_backend(
    config: &BackendConfig,
) -> Result<Box<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    match config.backend {
        Backend::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let db_path = data_dir.join(SQLITE_FILE);
                tracing::debug!("Using SQLite backend at {}", db_path.display());
                Ok(Box::new(purrcafe::backend::database::Sqlite::open_sqlite(
                    &db_path,
                )?))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err("SQLite backend requires the 'sqlite' feature".into())
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::debug!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            Ok(Box::new(InMemory::load_from_file(&json_path)?))
        }
    }
}

/// Open the store, applying the JSON configuration file if one was given.
pub fn open_store(config: &BackendConfig) -> Result<Store, Box<dyn std::error::Error>> {
    let store_config = match &config.config {
        Some(path) => StoreConfig::from_json_file(path)?,
        None => StoreConfig::default(),
    };
    let backend = create_backend(config)?;
    Ok(Store::open_with(
        backend,
        store_config,
        Arc::new(MeowIdGenerator::default()),
    )?)
}

/// Write an in-memory store back to its JSON file. Other backends persist on commit.
pub fn persist(store: &Store, config: &BackendConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = store.backend().as_any().downcast_ref::<InMemory>() {
        in_memory.save_to_file(data_dir(config).join(JSON_FILE))?;
    }
    Ok(())
}
