//! Server shared state
//!
//! Holds configuration and the favorites store the API serves.

use crate::config::Config;
use crate::error::Result;
use crate::store::{self, file::FileStore, AnyStore};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::warn;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    /// Backing favorites store
    pub store: AnyStore,

    started: Instant,
}

impl AppState {
    /// Open the configured store
    ///
    /// The server is itself the http backend, so an `http` setting falls
    /// back to the favorites file.
    pub fn new(config: Config) -> Result<Self> {
        let store = match config.store.backend.as_str() {
            "http" => {
                warn!("store.backend is http; serving from the favorites file instead");
                let path = match &config.store.path {
                    Some(path) => path.into(),
                    None => FileStore::default_path()?,
                };
                AnyStore::File(FileStore::load_from(path)?)
            }
            _ => store::open(&config)?,
        };
        Ok(Self::with_store(config, store))
    }

    /// Serve an already opened store
    pub fn with_store(config: Config, store: AnyStore) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            started: Instant::now(),
        }
    }

    /// Name of the backing store
    pub fn backend_name(&self) -> &'static str {
        match self.store {
            AnyStore::Memory(_) => "memory",
            AnyStore::File(_) => "file",
            AnyStore::Http(_) => "http",
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
