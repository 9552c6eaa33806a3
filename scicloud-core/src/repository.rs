//! Owner-scoped event persistence.
//!
//! Converts between store rows and [`Event`] values, builds the store
//! queries, and enforces the time-range invariant before anything is written.
//! Every call resolves the caller through the [`IdentityProvider`]; no
//! operation ever touches another owner's rows.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{SciCloudError, SciCloudResult};
use crate::event::{Category, Event, EventId, OwnerId};
use crate::identity::IdentityProvider;
use crate::store::{Column, Direction, EventRecord, EventRow, EventStore, Query};
use crate::time::TimeOfDay;
use crate::validation::check_time_range;

/// Optional filters shared by list and search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Inclusive lower bound on the event date
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the event date
    pub end_date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventFilter {
    pub fn range(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        EventFilter {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }
}

/// Data for a new event, using persisted field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
    #[serde(default)]
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub all_day: bool,
    pub category: Category,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
}

/// Partial update. Outer `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<TimeOfDay>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<TimeOfDay>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Option<Vec<String>>>,
}

/// Present-but-null becomes `Some(None)`, absent stays `None` via `default`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EventPatch {
    fn touches_times(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || self.all_day.is_some()
    }

    fn apply(self, row: &mut EventRow) {
        if let Some(title) = self.title {
            row.title = title;
        }
        if let Some(description) = self.description {
            row.description = description;
        }
        if let Some(date) = self.event_date {
            row.event_date = date;
        }
        if let Some(start) = self.start_time {
            row.start_time = start;
        }
        if let Some(end) = self.end_time {
            row.end_time = end;
        }
        if let Some(all_day) = self.all_day {
            row.all_day = all_day;
        }
        if let Some(category) = self.category {
            row.category = category;
        }
        if let Some(color) = self.color {
            row.color = color;
        }
        if let Some(location) = self.location {
            row.location = location;
        }
        if let Some(attendees) = self.attendees {
            row.attendees = attendees;
        }
    }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        let row = record.row;
        Event {
            id: EventId::new(record.id),
            title: row.title,
            description: row.description,
            date: row.event_date,
            start_time: row.start_time,
            end_time: row.end_time,
            all_day: row.all_day,
            category: row.category,
            color: row.color,
            location: row.location,
            attendees: row.attendees.unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn EventStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn EventStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        EventRepository { store, identity }
    }

    /// The authenticated caller, or `NotAuthenticated`.
    pub fn owner(&self) -> SciCloudResult<OwnerId> {
        self.identity
            .current_owner()
            .ok_or(SciCloudError::NotAuthenticated)
    }

    fn scoped(owner: &OwnerId, filter: &EventFilter) -> Query {
        let mut query = Query::new().eq(Column::OwnerId, owner.as_str());

        if let Some(start) = filter.start_date {
            query = query.gte(Column::EventDate, start.format("%Y-%m-%d").to_string());
        }
        if let Some(end) = filter.end_date {
            query = query.lte(Column::EventDate, end.format("%Y-%m-%d").to_string());
        }
        if let Some(category) = filter.category {
            query = query.eq(Column::Category, category.as_str());
        }

        query
            .order_by(Column::EventDate, Direction::Asc)
            .order_by(Column::StartTime, Direction::Asc)
            .limit(filter.limit)
            .offset(filter.offset.unwrap_or(0))
    }

    /// Events matching the filter, ordered by date then start time.
    #[tracing::instrument(skip(self))]
    pub async fn list_events(&self, filter: &EventFilter) -> SciCloudResult<Vec<Event>> {
        let owner = self.owner()?;
        let rows = self.store.select(&Self::scoped(&owner, filter)).await?;
        debug!(owner = %owner, count = rows.len(), "listed events");

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Case-insensitive match on title or description, plus the usual filters.
    #[tracing::instrument(skip(self))]
    pub async fn search_events(&self, text: &str, filter: &EventFilter) -> SciCloudResult<Vec<Event>> {
        let owner = self.owner()?;
        let query = Self::scoped(&owner, filter).ilike(&[Column::Title, Column::Description], text);
        let rows = self.store.select(&query).await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// The caller's event with this id. Other owners' events are `None`.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn get_event(&self, id: &EventId) -> SciCloudResult<Option<Event>> {
        let owner = self.owner()?;
        Ok(self.find_record(&owner, id).await?.map(Event::from))
    }

    async fn find_record(&self, owner: &OwnerId, id: &EventId) -> SciCloudResult<Option<EventRecord>> {
        let query = Query::new()
            .eq(Column::OwnerId, owner.as_str())
            .eq(Column::Id, id.as_str())
            .limit(Some(1));

        Ok(self.store.select(&query).await?.into_iter().next())
    }

    #[tracing::instrument(skip(self, data), fields(title = %data.title, date = %data.event_date))]
    pub async fn create_event(&self, data: NewEvent) -> SciCloudResult<Event> {
        let owner = self.owner()?;
        check_time_range(data.all_day, data.start_time, data.end_time)?;

        let mut row = EventRow {
            owner_id: owner.as_str().to_string(),
            title: data.title,
            description: data.description,
            event_date: data.event_date,
            start_time: data.start_time,
            end_time: data.end_time,
            all_day: data.all_day,
            category: data.category,
            color: data.color,
            location: data.location,
            attendees: data.attendees,
        };
        clear_all_day_times(&mut row);

        let record = self.store.insert(row).await?;
        info!(owner = %owner, id = %record.id, "created event");
        Ok(record.into())
    }

    /// Merge the patch into the stored row and write it back.
    ///
    /// When the patch touches `start_time`, `end_time` or `all_day`, the
    /// merged row must still satisfy the time-range invariant.
    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> SciCloudResult<Event> {
        let owner = self.owner()?;
        let existing = self
            .find_record(&owner, id)
            .await?
            .ok_or_else(|| SciCloudError::NotFound(id.to_string()))?;

        let check_times = patch.touches_times();
        let mut row = existing.row;
        patch.apply(&mut row);
        clear_all_day_times(&mut row);

        if check_times {
            check_time_range(row.all_day, row.start_time, row.end_time)?;
        }

        let record = self
            .store
            .update(id.as_str(), owner.as_str(), row)
            .await?
            .ok_or_else(|| SciCloudError::NotFound(id.to_string()))?;

        info!(owner = %owner, id = %id, revision = record.revision, "updated event");
        Ok(record.into())
    }

    /// Delete the caller's event. An id that is absent or owned by someone
    /// else is `NotFound`.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete_event(&self, id: &EventId) -> SciCloudResult<()> {
        let owner = self.owner()?;

        if !self.store.delete(id.as_str(), owner.as_str()).await? {
            return Err(SciCloudError::NotFound(id.to_string()));
        }

        info!(owner = %owner, id = %id, "deleted event");
        Ok(())
    }
}

/// All-day rows carry no times, so they order ahead of timed rows on the same date.
fn clear_all_day_times(row: &mut EventRow) {
    if row.all_day {
        row.start_time = None;
        row.end_time = None;
    }
}
