//! Event validation.
//!
//! Time ordering is checked at two boundaries: [`check_time_range`] guards the
//! repository, [`validate_draft`] runs before a dialog submits. Both rest on
//! [`is_valid_interval`].

use std::fmt;

use serde::Serialize;

use crate::controller::EventDraft;
use crate::error::{SciCloudError, SciCloudResult};
use crate::event::{Event, EventId};
use crate::time::TimeOfDay;

/// `start < end` on the minute-of-day scale.
pub fn is_valid_interval(start: TimeOfDay, end: TimeOfDay) -> bool {
    start.minutes() < end.minutes()
}

/// Repository-level invariant: a timed event needs `start < end`.
pub fn check_time_range(
    all_day: bool,
    start: Option<TimeOfDay>,
    end: Option<TimeOfDay>,
) -> SciCloudResult<()> {
    if all_day {
        return Ok(());
    }
    match (start, end) {
        (Some(s), Some(e)) if is_valid_interval(s, e) => Ok(()),
        _ => Err(SciCloudError::InvalidTimeRange {
            start: display_time(start),
            end: display_time(end),
        }),
    }
}

fn display_time(time: Option<TimeOfDay>) -> String {
    time.map(|t| t.to_string()).unwrap_or_else(|| "--:--".into())
}

/// Draft fields that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Date,
    StartTime,
    EndTime,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Date => "date",
            Field::StartTime => "start time",
            Field::EndTime => "end time",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Issue {
    Required,
    EndNotAfterStart,
    Overlaps { event_id: EventId, title: String },
}

/// A field-attributed validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    #[serde(flatten)]
    pub issue: Issue,
}

impl FieldError {
    fn new(field: Field, issue: Issue) -> Self {
        FieldError { field, issue }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.issue {
            Issue::Required => write!(f, "{} is required", self.field),
            Issue::EndNotAfterStart => write!(f, "end time must be after start time"),
            Issue::Overlaps { title, .. } => write!(f, "overlaps with '{}'", title),
        }
    }
}

/// Collect every error in a draft, in field order.
///
/// `existing` are the events the draft is checked against for overlap;
/// `exclude` is skipped (the event being edited).
pub fn validate_draft(
    draft: &EventDraft,
    existing: &[Event],
    exclude: Option<&EventId>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if draft.title.trim().is_empty() {
        errors.push(FieldError::new(Field::Title, Issue::Required));
    }
    if draft.date.is_none() {
        errors.push(FieldError::new(Field::Date, Issue::Required));
    }

    if !draft.all_day {
        if draft.start_time.is_none() {
            errors.push(FieldError::new(Field::StartTime, Issue::Required));
        }
        if draft.end_time.is_none() {
            errors.push(FieldError::new(Field::EndTime, Issue::Required));
        }
        if let (Some(start), Some(end)) = (draft.start_time, draft.end_time) {
            if !is_valid_interval(start, end) {
                errors.push(FieldError::new(Field::EndTime, Issue::EndNotAfterStart));
            }
        }
    }

    if let Some(slot) = draft.slot() {
        let conflict = existing
            .iter()
            .filter(|e| Some(&e.id) != exclude)
            .find(|e| e.slot().is_some_and(|other| slot.conflicts_with(&other)));

        if let Some(conflict) = conflict {
            errors.push(FieldError::new(
                Field::StartTime,
                Issue::Overlaps {
                    event_id: conflict.id.clone(),
                    title: conflict.title.clone(),
                },
            ));
        }
    }

    errors
}
