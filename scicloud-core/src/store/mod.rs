//! Tabular event storage.
//!
//! The store knows nothing about owners beyond the `owner_id` column and
//! nothing about validation. It evaluates [`Query`] values against rows
//! shaped like the persisted record and assigns ids on insert.

mod file;
mod memory;
mod query;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use query::{Column, Direction, Filter, Query};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Category;
use crate::time::TimeOfDay;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt event data: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Writable columns of a persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub all_day: bool,
    pub category: Category,
    pub color: Option<String>,
    pub location: Option<String>,
    pub attendees: Option<Vec<String>>,
}

/// A persisted event: store-managed columns plus the written row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    /// Bumped on every update
    #[serde(default)]
    pub revision: u64,
    #[serde(flatten)]
    pub row: EventRow,
}

impl EventRecord {
    pub fn new(id: String, row: EventRow) -> Self {
        EventRecord {
            id,
            revision: 0,
            row,
        }
    }

    /// Column value in its persisted text form.
    pub fn column(&self, column: Column) -> Option<String> {
        let row = &self.row;
        match column {
            Column::Id => Some(self.id.clone()),
            Column::OwnerId => Some(row.owner_id.clone()),
            Column::Title => Some(row.title.clone()),
            Column::Description => row.description.clone(),
            Column::EventDate => Some(row.event_date.format("%Y-%m-%d").to_string()),
            Column::StartTime => row.start_time.map(|t| t.to_string()),
            Column::EndTime => row.end_time.map(|t| t.to_string()),
            Column::Category => Some(row.category.as_str().to_string()),
        }
    }
}

/// Filtered select/insert/update/delete over event rows.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Rows matching every filter in the query, ordered and paged.
    async fn select(&self, query: &Query) -> StoreResult<Vec<EventRecord>>;

    /// Insert a row, assigning a fresh id.
    async fn insert(&self, row: EventRow) -> StoreResult<EventRecord>;

    /// Replace the row keyed by `(id, owner_id)`. None if no such row.
    async fn update(&self, id: &str, owner_id: &str, row: EventRow)
    -> StoreResult<Option<EventRecord>>;

    /// Delete the row keyed by `(id, owner_id)`. False if no such row.
    async fn delete(&self, id: &str, owner_id: &str) -> StoreResult<bool>;
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Apply an update in place on a row set held in insertion order.
fn replace_row(
    rows: &mut [EventRecord],
    id: &str,
    owner_id: &str,
    row: EventRow,
) -> Option<EventRecord> {
    let record = rows
        .iter_mut()
        .find(|r| r.id == id && r.row.owner_id == owner_id)?;

    record.row = EventRow {
        owner_id: owner_id.to_string(),
        ..row
    };
    record.revision += 1;
    Some(record.clone())
}

fn remove_row(rows: &mut Vec<EventRecord>, id: &str, owner_id: &str) -> bool {
    let before = rows.len();
    rows.retain(|r| !(r.id == id && r.row.owner_id == owner_id));
    rows.len() != before
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn row(owner: &str, title: &str, date: &str, start: Option<&str>, end: Option<&str>) -> EventRow {
        EventRow {
            owner_id: owner.to_string(),
            title: title.to_string(),
            description: None,
            event_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start_time: start.map(|s| s.parse().unwrap()),
            end_time: end.map(|s| s.parse().unwrap()),
            all_day: start.is_none(),
            category: Category::Experiment,
            color: None,
            location: None,
            attendees: None,
        }
    }
}
