use crate::core::Payload;
use crate::fetch::PayloadBuilder;
use crate::store::SnapshotStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Daily snapshot cache in front of the scraper.
///
/// A payload is fresh while its `lastUpdated` falls on today's UTC date.
/// [`SnapshotService::current`] serves the stored payload when fresh and
/// rebuilds otherwise; [`SnapshotService::refresh`] always rebuilds. The
/// mutex keeps one rebuild in flight: a burst of stale readers costs one
/// scrape of the provider, not one per reader.
pub struct SnapshotService {
    builder: Arc<dyn PayloadBuilder>,
    store: Arc<dyn SnapshotStore>,
    rebuild: Mutex<()>,
}

impl SnapshotService {
    pub fn new(builder: Arc<dyn PayloadBuilder>, store: Arc<dyn SnapshotStore>) -> Self {
        SnapshotService {
            builder,
            store,
            rebuild: Mutex::new(()),
        }
    }

    /// Today's payload, rebuilding first when the stored one is missing or
    /// stale.
    pub async fn current(&self) -> Result<Payload> {
        if let Some(payload) = self.load_fresh().await {
            return Ok(payload);
        }

        let _guard = self.rebuild.lock().await;
        // Another reader may have rebuilt while this one waited on the lock.
        if let Some(payload) = self.load_fresh().await {
            return Ok(payload);
        }
        self.rebuild_locked().await
    }

    /// Unconditional rebuild. Concurrent refreshes queue on the lock and
    /// each performs its own scrape.
    pub async fn refresh(&self) -> Result<Payload> {
        let _guard = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    /// A store that cannot be read counts as a miss, not an outage.
    async fn load_fresh(&self) -> Option<Payload> {
        match self.store.load().await {
            Ok(Some(payload)) if payload.is_fresh_at(Utc::now()) => {
                debug!("Serving stored payload from {}", payload.last_updated);
                Some(payload)
            }
            Ok(Some(payload)) => {
                debug!("Stored payload from {} is stale", payload.last_updated);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load stored payload: {:#}", e);
                None
            }
        }
    }

    async fn rebuild_locked(&self) -> Result<Payload> {
        info!("Rebuilding snapshot payload");
        let payload = self
            .builder
            .build_payload()
            .await
            .context("Failed to build snapshot payload")?;
        self.store
            .save(&payload)
            .await
            .context("Failed to persist snapshot payload")?;
        Ok(payload)
    }
}
