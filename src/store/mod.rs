pub mod disk;
pub mod memory;

use crate::core::Payload;
use anyhow::Result;
use async_trait::async_trait;

pub use disk::JsonFileStore;
pub use memory::MemoryStore;

/// Where the snapshot payload rests between rebuilds.
///
/// The service holds the store behind a trait so tests can swap the file
/// store for an in-memory one, and a broken store degrades to a cache miss
/// rather than taking the API down.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the stored payload; `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Payload>>;

    /// Replaces the stored payload.
    async fn save(&self, payload: &Payload) -> Result<()>;
}
