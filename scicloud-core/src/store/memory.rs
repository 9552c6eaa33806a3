use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{EventRecord, EventRow, EventStore, Query, StoreResult, new_id, remove_row, replace_row};

/// In-process event store. Rows are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<EventRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<EventRecord>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<EventRecord>> {
        Ok(query.run(self.rows().iter()))
    }

    async fn insert(&self, row: EventRow) -> StoreResult<EventRecord> {
        let record = EventRecord::new(new_id(), row);
        self.rows().push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &str,
        owner_id: &str,
        row: EventRow,
    ) -> StoreResult<Option<EventRecord>> {
        Ok(replace_row(&mut self.rows(), id, owner_id, row))
    }

    async fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        Ok(remove_row(&mut self.rows(), id, owner_id))
    }
}
