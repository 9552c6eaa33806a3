//! Core library for the scicloud lab calendar.
//!
//! Three layers sit on top of an [`store::EventStore`]:
//! - [`EventRepository`] for owner-scoped persistence
//! - [`EventCollection`] for the cached, view-windowed set of events
//! - [`InteractionController`] for dialogs, drag-rescheduling and layout

pub mod collection;
pub mod config;
pub mod controller;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod identity;
pub mod in_flight;
pub mod repository;
pub mod store;
pub mod time;
pub mod validation;

pub use collection::{EventCollection, LoadOutcome, RefreshTask};
pub use config::{LayoutConfig, SciCloudConfig};
pub use controller::{DialogMode, DialogState, EventDraft, InteractionController, Layout};
pub use date_range::{CalendarView, Clock, DateRange};
pub use error::{SciCloudError, SciCloudResult};
pub use event::{Category, Event, EventId, OwnerId, TimeSlot};
pub use identity::{IdentityProvider, Session, StaticIdentity};
pub use repository::{EventFilter, EventPatch, EventRepository, NewEvent};
pub use time::TimeOfDay;
