use std::sync::Arc;

use chrono::NaiveDate;
use scicloud_core::store::EventStore;
use scicloud_core::{
    CalendarView, Clock, EventCollection, EventRepository, InteractionController, LayoutConfig,
    OwnerId, SciCloudError, SciCloudResult, StaticIdentity,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn EventStore>,
    clock: Clock,
    pub layout: LayoutConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, clock: Clock, layout: LayoutConfig) -> Self {
        AppState {
            store,
            clock,
            layout,
        }
    }

    /// Repository scoped to the requesting owner.
    pub fn repository(&self, owner: OwnerId) -> EventRepository {
        EventRepository::new(self.store.clone(), Arc::new(StaticIdentity::new(Some(owner))))
    }

    /// Controller over a day view of `date` (today if none), so drafts on
    /// that date are checked for overlap.
    pub async fn controller(
        &self,
        owner: OwnerId,
        date: Option<NaiveDate>,
    ) -> SciCloudResult<InteractionController> {
        let mut collection =
            EventCollection::new(self.repository(owner), self.clock.clone(), CalendarView::Day);
        if let Some(date) = date {
            collection = collection.with_current_date(date);
        }

        collection.initialize().await?;
        if let Some(message) = collection.last_error() {
            return Err(SciCloudError::Unknown(message));
        }

        Ok(InteractionController::new(Arc::new(collection), self.layout))
    }
}
