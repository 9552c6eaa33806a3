//! Calendar event types.
//!
//! [`Event`] is the view-model handed to callers. The persisted row shape
//! lives in [`crate::store`]; the repository converts between the two.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::TimeOfDay;

/// Store-assigned event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated identity that owns a set of events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        OwnerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event category. Only affects presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Maintenance,
    Experiment,
    Training,
    Meeting,
    #[default]
    Custom,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Maintenance,
        Category::Experiment,
        Category::Training,
        Category::Meeting,
        Category::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Maintenance => "maintenance",
            Category::Experiment => "experiment",
            Category::Training => "training",
            Category::Meeting => "meeting",
            Category::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Maintenance => "Maintenance",
            Category::Experiment => "Experiment",
            Category::Training => "Training",
            Category::Meeting => "Meeting",
            Category::Custom => "Custom",
        }
    }

    /// Default display color, used when an event has no color override.
    pub fn default_color(self) -> &'static str {
        match self {
            Category::Maintenance => "#f59e0b",
            Category::Experiment => "#3b82f6",
            Category::Training => "#10b981",
            Category::Meeting => "#8b5cf6",
            Category::Custom => "#6b7280",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'. Expected one of: maintenance, experiment, training, meeting, custom",
                    s
                )
            })
    }
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Meaningful only when `all_day` is false
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub all_day: bool,
    pub category: Category,
    /// Overrides the category color
    pub color: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

impl Event {
    /// Time slot occupied by this event, if its time fields are usable.
    pub fn slot(&self) -> Option<TimeSlot> {
        TimeSlot::from_parts(self.date, self.all_day, self.start_time, self.end_time)
    }

    /// Minutes between start and end (None for all-day or incomplete events).
    pub fn duration_minutes(&self) -> Option<i64> {
        if self.all_day {
            return None;
        }
        let (start, end) = (self.start_time?, self.end_time?);
        Some(end.minutes() as i64 - start.minutes() as i64)
    }

    pub fn display_color(&self) -> &str {
        self.color
            .as_deref()
            .unwrap_or_else(|| self.category.default_color())
    }

    /// Sort key used everywhere events are listed: date, then start time.
    /// All-day events sort before timed events on the same date.
    pub fn sort_key(&self) -> (NaiveDate, Option<TimeOfDay>) {
        let start = if self.all_day { None } else { self.start_time };
        (self.date, start)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// The part of a day an event occupies, used for conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    AllDay(NaiveDate),
    Timed {
        date: NaiveDate,
        start: TimeOfDay,
        end: TimeOfDay,
    },
}

impl TimeSlot {
    pub fn from_parts(
        date: NaiveDate,
        all_day: bool,
        start: Option<TimeOfDay>,
        end: Option<TimeOfDay>,
    ) -> Option<Self> {
        if all_day {
            return Some(TimeSlot::AllDay(date));
        }
        Some(TimeSlot::Timed {
            date,
            start: start?,
            end: end?,
        })
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            TimeSlot::AllDay(date) => *date,
            TimeSlot::Timed { date, .. } => *date,
        }
    }

    /// Half-open intervals `[s1,e1)` and `[s2,e2)` conflict iff `s1 < e2 && s2 < e1`.
    /// Two all-day slots on one date always conflict; all-day never conflicts with timed.
    pub fn conflicts_with(&self, other: &TimeSlot) -> bool {
        if self.date() != other.date() {
            return false;
        }
        match (self, other) {
            (TimeSlot::AllDay(_), TimeSlot::AllDay(_)) => true,
            (
                TimeSlot::Timed { start: s1, end: e1, .. },
                TimeSlot::Timed { start: s2, end: e2, .. },
            ) => s1.minutes() < e2.minutes() && s2.minutes() < e1.minutes(),
            _ => false,
        }
    }
}
