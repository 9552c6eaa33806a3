use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    EventRecord, EventRow, EventStore, Query, StoreError, StoreResult, new_id, remove_row,
    replace_row,
};

const EVENTS_FILE: &str = "events.json";

/// Event store backed by a single JSON document in a data directory.
///
/// Every operation reads the document; writes go to a temp file that is
/// renamed over the original. The mutex serializes read-modify-write cycles
/// within one process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(EVENTS_FILE);
        debug!(path = %path.display(), "opened event store");

        Ok(FileStore {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<Vec<EventRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, rows: &[EventRecord]) -> StoreResult<()> {
        let content =
            serde_json::to_string_pretty(rows).map_err(|e| StoreError::Backend(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for FileStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<EventRecord>> {
        let _guard = self.lock.lock().await;
        let rows = self.read().await?;
        Ok(query.run(&rows))
    }

    async fn insert(&self, row: EventRow) -> StoreResult<EventRecord> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read().await?;

        let record = EventRecord::new(new_id(), row);
        rows.push(record.clone());
        self.write(&rows).await?;

        Ok(record)
    }

    async fn update(
        &self,
        id: &str,
        owner_id: &str,
        row: EventRow,
    ) -> StoreResult<Option<EventRecord>> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read().await?;

        let updated = replace_row(&mut rows, id, owner_id, row);
        if updated.is_some() {
            self.write(&rows).await?;
        }
        Ok(updated)
    }

    async fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read().await?;

        let removed = remove_row(&mut rows, id, owner_id);
        if removed {
            self.write(&rows).await?;
        }
        Ok(removed)
    }
}
