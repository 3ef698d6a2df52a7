use crate::core::Payload;
use crate::store::SnapshotStore;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// In-memory store, for tests and ephemeral runs.
pub struct MemoryStore {
    inner: Mutex<Option<Payload>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<Option<Payload>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, payload: &Payload) -> Result<()> {
        *self.inner.lock().await = Some(payload.clone());
        Ok(())
    }
}
