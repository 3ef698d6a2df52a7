use crate::core::Payload;
use crate::store::SnapshotStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Keeps the payload as a single pretty-printed JSON file.
///
/// Saves go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous snapshot intact and readers never see a torn file.
/// The pretty printing is deliberate: the file doubles as something people
/// open in an editor to check what the service last scraped.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Payload>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read snapshot file: {}", self.path.display())
                });
            }
        };

        let payload = serde_json::from_slice(&bytes).with_context(|| {
            format!("Failed to parse snapshot file: {}", self.path.display())
        })?;
        debug!("Loaded snapshot from {}", self.path.display());
        Ok(Some(payload))
    }

    async fn save(&self, payload: &Payload) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create snapshot directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_vec_pretty(payload).context("Failed to serialize snapshot")?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write snapshot file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace snapshot file: {}", self.path.display()))?;
        debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtractionTrace, FundSnapshot, MetricRecord, MetricValue, Period};
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_payload() -> Payload {
        let mut performance = MetricRecord::new();
        performance.insert(Period::OneYear, MetricValue::Number(9.8));
        Payload {
            last_updated: Utc::now(),
            funds: vec![FundSnapshot {
                id: "F00000ABCD".to_string(),
                name: "Global Equity Fund".to_string(),
                isin: "ES0112345678".to_string(),
                category: "RV Global".to_string(),
                comment: None,
                performance,
                sharpe: MetricRecord::new(),
                volatility: MetricRecord::new(),
                ter: "-".to_string(),
                source_url: "http://example.com/snapshot".to_string(),
                debug: ExtractionTrace::default(),
            }],
            plans: vec![],
        }
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("snapshot.json"));

        assert!(store.load().await.unwrap().is_none());

        let payload = sample_payload();
        store.save(&payload).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_cleans_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("snapshot.json");
        let store = JsonFileStore::new(&path);

        store.save(&sample_payload()).await.unwrap();

        assert!(path.exists());
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_file_is_human_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        JsonFileStore::new(&path).save(&sample_payload()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"funds\""), "expected indented JSON:\n{text}");
        assert!(text.contains("\"lastUpdated\""));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(JsonFileStore::new(&path).load().await.is_err());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("snapshot.json"));

        let first = sample_payload();
        store.save(&first).await.unwrap();

        let mut second = sample_payload();
        second.funds.clear();
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.funds.is_empty());
    }
}
