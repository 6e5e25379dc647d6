// Start of file: /src/grid/mod.rs

/*
* Client side of the data grid holding the `persons` cache and its id sequence.
* `PersonGrid` is the seam; `connect` picks the backend from configuration.
*/

pub mod memory_grid;
pub mod redis_grid;

use std::{collections::BTreeSet, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::environment::{EnvironmentVariables, GridBackend};
use crate::models::{PersonEntity, PersonProfile, PersonQuery};

pub use memory_grid::MemoryGrid;
pub use redis_grid::RedisGrid;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Grid backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Failed to encode or decode a cached person: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("No grid node reachable among: {0}")]
    Unreachable(String),
}

pub type GridResult<T> = Result<T, GridError>;

/// Operations on the `persons` cache.
///
/// Operations touching two entries (`link`, `unlink`, `remove`) are atomic:
/// either every entry involved is updated or none is.
#[async_trait]
pub trait PersonGrid: Send + Sync + Debug {
    /// Name of the backend, reported by the status endpoint.
    fn backend(&self) -> &'static str;

    /// Increments the id sequence and returns the new value. The first id is 1.
    async fn next_id(&self) -> GridResult<u64>;

    /// Stores a new person without friends.
    async fn insert(&self, id: u64, profile: PersonProfile) -> GridResult<()>;

    async fn get(&self, id: u64) -> GridResult<Option<PersonEntity>>;

    /// Persons that exist among `ids`, ascending by id.
    async fn get_all(&self, ids: &BTreeSet<u64>) -> GridResult<Vec<(u64, PersonEntity)>>;

    /// Persons matching `query`, ascending by id.
    async fn scan(&self, query: &PersonQuery) -> GridResult<Vec<(u64, PersonEntity)>>;

    /// Replaces the profile of an existing person, keeping its friendships.
    /// Returns the stored entity, with the friend ids read in the same atomic
    /// step as the write, or `None` when the key is absent.
    async fn replace(&self, id: u64, profile: PersonProfile) -> GridResult<Option<PersonEntity>>;

    /// Removes the person and drops it from its friends' friend sets.
    async fn remove(&self, id: u64) -> GridResult<bool>;

    /// Makes `a` and `b` friends of each other.
    ///
    /// Returns `false` without writing anything when either person is missing,
    /// when `a == b`, or when either side already holds the other.
    async fn link(&self, a: u64, b: u64) -> GridResult<bool>;

    /// Inverse of [`PersonGrid::link`]; both sides must hold each other.
    async fn unlink(&self, a: u64, b: u64) -> GridResult<bool>;

    /// Friend ids of `id`, empty when the person is missing.
    async fn friend_ids(&self, id: u64) -> GridResult<BTreeSet<u64>>;

    async fn contains_friend(&self, id: u64, friend_id: u64) -> GridResult<bool>;

    async fn size(&self) -> GridResult<usize>;

    async fn shutdown(&self);
}

/// Opens the grid configured by the environment
pub async fn connect(env: &EnvironmentVariables) -> anyhow::Result<Arc<dyn PersonGrid>> {
    let grid: Arc<dyn PersonGrid> = match env.grid_backend {
        GridBackend::Memory => Arc::new(MemoryGrid::new()),
        GridBackend::Redis => Arc::new(RedisGrid::connect(env).await?),
    };

    info!(
        backend = env.grid_backend.as_str(),
        node = %env.grid_node_name,
        "Grid client started"
    );

    Ok(grid)
}

// End of file: /src/grid/mod.rs
