//! Favorites store backends
//!
//! The remote store holds the authoritative list of favorite schools, each
//! with its full zone history. Every backend implements `FavoritesStore`.
//!
//! - `memory`: in-process store with failure injection (tests, embedding)
//! - `file`: JSON file in the XDG data directory
//! - `http`: client for the `catchment serve` API

pub mod file;
pub mod http;
pub mod memory;

use crate::catchment::{School, SchoolId};
use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Remote favorites store contract
pub trait FavoritesStore: Send + Sync {
    /// Every stored school with its zones and average
    fn list(&self) -> impl Future<Output = Result<Vec<School>>> + Send;

    fn create(&self, school: &School) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite a stored school with the given version
    fn update(&self, school: &School) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, id: SchoolId) -> impl Future<Output = Result<()>> + Send;
}

/// Store operation names, for logging and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Store backend chosen by configuration
#[derive(Debug)]
pub enum AnyStore {
    Memory(memory::MemoryStore),
    File(file::FileStore),
    Http(http::HttpStore),
}

impl FavoritesStore for AnyStore {
    async fn list(&self) -> Result<Vec<School>> {
        match self {
            Self::Memory(store) => store.list().await,
            Self::File(store) => store.list().await,
            Self::Http(store) => store.list().await,
        }
    }

    async fn create(&self, school: &School) -> Result<()> {
        match self {
            Self::Memory(store) => store.create(school).await,
            Self::File(store) => store.create(school).await,
            Self::Http(store) => store.create(school).await,
        }
    }

    async fn update(&self, school: &School) -> Result<()> {
        match self {
            Self::Memory(store) => store.update(school).await,
            Self::File(store) => store.update(school).await,
            Self::Http(store) => store.update(school).await,
        }
    }

    async fn delete(&self, id: SchoolId) -> Result<()> {
        match self {
            Self::Memory(store) => store.delete(id).await,
            Self::File(store) => store.delete(id).await,
            Self::Http(store) => store.delete(id).await,
        }
    }
}

/// Open the store described by `config.store`
pub fn open(config: &Config) -> Result<AnyStore> {
    match config.store.backend.as_str() {
        "memory" => Ok(AnyStore::Memory(memory::MemoryStore::new())),
        "file" => {
            let path = match &config.store.path {
                Some(path) => path.into(),
                None => file::FileStore::default_path()?,
            };
            Ok(AnyStore::File(file::FileStore::load_from(path)?))
        }
        "http" => Ok(AnyStore::Http(http::HttpStore::new(
            &config.store.url,
            Duration::from_secs(config.store.timeout_secs),
        )?)),
        other => Err(Error::Config(format!("Unknown store backend: {}", other))),
    }
}

/// List all available store backends
pub fn available_backends() -> Vec<&'static str> {
    vec!["file", "http", "memory"]
}
