//! User-facing calendar interactions: the edit dialog, validation before
//! submit, drag-rescheduling and time-grid layout.
//!
//! The dialog is an explicit state machine:
//!
//! ```text
//! Closed --open_create/open_edit--> Open { mode, draft, error: None }
//! Open   --submit ok / close------> Closed
//! Open   --submit fails-----------> Open { .., error: Some(_) }
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::EventCollection;
use crate::config::LayoutConfig;
use crate::error::{SciCloudError, SciCloudResult};
use crate::event::{Category, Event, EventId, TimeSlot};
use crate::repository::{EventPatch, NewEvent};
use crate::time::TimeOfDay;
use crate::validation::{FieldError, validate_draft};

const DEFAULT_START_MINUTES: i64 = 9 * 60;
const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Event fields while a dialog is open. Missing values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub all_day: bool,
    pub category: Category,
    pub color: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

impl EventDraft {
    /// A blank draft on `date`, starting at `start` (09:00 if not given) and
    /// ending one hour later. The end wraps past midnight: `23:30` gives `00:30`.
    pub fn starting_at(date: NaiveDate, start: Option<TimeOfDay>) -> Self {
        let start = start.unwrap_or(TimeOfDay::from_minutes(DEFAULT_START_MINUTES));
        EventDraft {
            date: Some(date),
            start_time: Some(start),
            end_time: Some(start.add_minutes(DEFAULT_DURATION_MINUTES)),
            ..Self::default()
        }
    }

    pub fn slot(&self) -> Option<TimeSlot> {
        TimeSlot::from_parts(self.date?, self.all_day, self.start_time, self.end_time)
    }

    /// Map to the repository's create shape.
    pub fn to_new_event(&self) -> SciCloudResult<NewEvent> {
        let event_date = self.date.ok_or_else(|| {
            SciCloudError::ValidationFailed(validate_draft(self, &[], None))
        })?;

        Ok(NewEvent {
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            event_date,
            start_time: self.timed(self.start_time),
            end_time: self.timed(self.end_time),
            all_day: self.all_day,
            category: self.category,
            color: non_empty(&self.color),
            location: non_empty(&self.location),
            attendees: (!self.attendees.is_empty()).then(|| self.attendees.clone()),
        })
    }

    /// Map to a patch that overwrites every editable field.
    pub fn to_patch(&self) -> SciCloudResult<EventPatch> {
        let new = self.to_new_event()?;
        Ok(EventPatch {
            title: Some(new.title),
            description: Some(new.description),
            event_date: Some(new.event_date),
            start_time: Some(new.start_time),
            end_time: Some(new.end_time),
            all_day: Some(new.all_day),
            category: Some(new.category),
            color: Some(new.color),
            location: Some(new.location),
            attendees: Some(new.attendees),
        })
    }

    fn timed(&self, time: Option<TimeOfDay>) -> Option<TimeOfDay> {
        if self.all_day { None } else { time }
    }
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        EventDraft {
            title: event.title.clone(),
            description: event.description.clone(),
            date: Some(event.date),
            start_time: event.start_time,
            end_time: event.end_time,
            all_day: event.all_day,
            category: event.category,
            color: event.color.clone(),
            location: event.location.clone(),
            attendees: event.attendees.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "eventId", rename_all = "camelCase")]
pub enum DialogMode {
    Create,
    Edit(EventId),
}

/// Error attached to an open dialog after a failed submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogError {
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl From<&SciCloudError> for DialogError {
    fn from(err: &SciCloudError) -> Self {
        DialogError {
            message: err.to_string(),
            fields: err.field_errors().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DialogState {
    #[default]
    Closed,
    Open {
        mode: DialogMode,
        draft: EventDraft,
        error: Option<DialogError>,
    },
}

impl DialogState {
    pub fn open_create(date: NaiveDate, start: Option<TimeOfDay>) -> Self {
        DialogState::Open {
            mode: DialogMode::Create,
            draft: EventDraft::starting_at(date, start),
            error: None,
        }
    }

    pub fn open_edit(event: &Event) -> Self {
        DialogState::Open {
            mode: DialogMode::Edit(event.id.clone()),
            draft: EventDraft::from(event),
            error: None,
        }
    }

    pub fn close(self) -> Self {
        DialogState::Closed
    }

    /// Attach a submit error; a closed dialog stays closed.
    pub fn fail(self, err: &SciCloudError) -> Self {
        match self {
            DialogState::Open { mode, draft, .. } => DialogState::Open {
                mode,
                draft,
                error: Some(DialogError::from(err)),
            },
            DialogState::Closed => DialogState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DialogState::Open { .. })
    }

    pub fn mode(&self) -> Option<&DialogMode> {
        match self {
            DialogState::Open { mode, .. } => Some(mode),
            DialogState::Closed => None,
        }
    }

    pub fn draft(&self) -> Option<&EventDraft> {
        match self {
            DialogState::Open { draft, .. } => Some(draft),
            DialogState::Closed => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EventDraft> {
        match self {
            DialogState::Open { draft, .. } => Some(draft),
            DialogState::Closed => None,
        }
    }

    pub fn error(&self) -> Option<&DialogError> {
        match self {
            DialogState::Open { error, .. } => error.as_ref(),
            DialogState::Closed => None,
        }
    }
}

/// Position of an event in the time grid, in rem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Layout {
    AllDay { height: f32 },
    Timed { top: f32, height: f32 },
}

pub struct InteractionController {
    collection: Arc<EventCollection>,
    layout: LayoutConfig,
    dialog: DialogState,
    dragging: Option<EventId>,
}

impl InteractionController {
    pub fn new(collection: Arc<EventCollection>, layout: LayoutConfig) -> Self {
        InteractionController {
            collection,
            layout,
            dialog: DialogState::Closed,
            dragging: None,
        }
    }

    pub fn collection(&self) -> &Arc<EventCollection> {
        &self.collection
    }

    // DIALOG:

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    /// Open a create dialog; the date defaults to the collection's current date.
    pub fn open_create_dialog(&mut self, date: Option<NaiveDate>, time: Option<TimeOfDay>) {
        let date = date.unwrap_or_else(|| self.collection.current_date());
        self.dialog = DialogState::open_create(date, time);
    }

    pub fn open_edit_dialog(&mut self, event: &Event) {
        self.collection.select(Some(event.id.clone()));
        self.dialog = DialogState::open_edit(event);
    }

    pub fn close_dialog(&mut self) {
        self.dialog = std::mem::take(&mut self.dialog).close();
    }

    pub fn draft_mut(&mut self) -> Option<&mut EventDraft> {
        self.dialog.draft_mut()
    }

    fn fail_dialog(&mut self, err: &SciCloudError) {
        self.dialog = std::mem::take(&mut self.dialog).fail(err);
    }

    // VALIDATION:

    /// Field errors for `draft`, checking overlap against the cached events
    /// on the draft's date except `exclude`.
    pub fn validate(&self, draft: &EventDraft, exclude: Option<&EventId>) -> Vec<FieldError> {
        let existing = draft
            .date
            .map(|d| self.collection.events_on(d))
            .unwrap_or_default();
        validate_draft(draft, &existing, exclude)
    }

    // SUBMIT:

    /// Validate the open draft and create or update depending on the mode.
    pub async fn submit(&mut self) -> SciCloudResult<Event> {
        let (mode, draft) = match &self.dialog {
            DialogState::Open { mode, draft, .. } => (mode.clone(), draft.clone()),
            DialogState::Closed => {
                return Err(SciCloudError::Unknown("No dialog is open".into()));
            }
        };

        let exclude = match &mode {
            DialogMode::Create => None,
            DialogMode::Edit(id) => Some(id),
        };
        let errors = self.validate(&draft, exclude);
        if !errors.is_empty() {
            let err = SciCloudError::ValidationFailed(errors);
            self.fail_dialog(&err);
            return Err(err);
        }

        match mode {
            DialogMode::Create => self.create_from_draft(&draft).await,
            DialogMode::Edit(id) => self.update_from_draft(&id, &draft).await,
        }
    }

    /// Create from a draft. Closes the dialog on success, keeps it open with
    /// the error attached on failure.
    pub async fn create_from_draft(&mut self, draft: &EventDraft) -> SciCloudResult<Event> {
        let result = match draft.to_new_event() {
            Ok(data) => self.collection.create(data).await,
            Err(e) => Err(e),
        };
        self.finish_submit(result)
    }

    pub async fn update_from_draft(&mut self, id: &EventId, draft: &EventDraft) -> SciCloudResult<Event> {
        let result = match draft.to_patch() {
            Ok(patch) => self.collection.update(id, patch).await,
            Err(e) => Err(e),
        };
        self.finish_submit(result)
    }

    fn finish_submit(&mut self, result: SciCloudResult<Event>) -> SciCloudResult<Event> {
        match &result {
            Ok(_) => self.close_dialog(),
            Err(e) => self.fail_dialog(e),
        }
        result
    }

    // DRAG AND DROP:

    pub fn begin_drag(&mut self, id: EventId) {
        self.dragging = Some(id);
    }

    pub fn dragging(&self) -> Option<&EventId> {
        self.dragging.as_ref()
    }

    /// Move a cached event to `new_date` at `new_start`, keeping its duration.
    /// The new end wraps past midnight like the create dialog's default.
    pub async fn handle_drop(
        &mut self,
        id: &EventId,
        new_date: NaiveDate,
        new_start: TimeOfDay,
    ) -> SciCloudResult<Event> {
        let result = self.drop_event(id, new_date, new_start).await;
        self.dragging = None;
        result
    }

    async fn drop_event(
        &self,
        id: &EventId,
        new_date: NaiveDate,
        new_start: TimeOfDay,
    ) -> SciCloudResult<Event> {
        let event = self
            .collection
            .find(id)
            .ok_or_else(|| SciCloudError::NotFound(id.to_string()))?;

        let mut patch = EventPatch {
            event_date: Some(new_date),
            ..EventPatch::default()
        };

        if let Some(duration) = event.duration_minutes() {
            patch.start_time = Some(Some(new_start));
            patch.end_time = Some(Some(new_start.add_minutes(duration)));
        }

        debug!(id = %id, date = %new_date, start = %new_start, "rescheduling dropped event");
        self.collection.update(id, patch).await
    }

    // LAYOUT:

    pub fn compute_layout(&self, event: &Event) -> Layout {
        compute_layout(event, &self.layout)
    }
}

/// `top = start_hours * hour_height`, `height = max(duration_hours * hour_height, min_height)`.
pub fn compute_layout(event: &Event, layout: &LayoutConfig) -> Layout {
    match (event.slot(), event.duration_minutes()) {
        (Some(TimeSlot::Timed { start, .. }), Some(duration)) => {
            let top = start.minutes() as f32 / 60.0 * layout.hour_height;
            let height = (duration as f32 / 60.0 * layout.hour_height).max(layout.min_height);
            Layout::Timed { top, height }
        }
        _ => Layout::AllDay {
            height: layout.all_day_height,
        },
    }
}
