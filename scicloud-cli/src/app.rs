//! Wiring from config to repository, collection and controller.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use scicloud_core::store::FileStore;
use scicloud_core::{
    CalendarView, EventCollection, EventId, EventRepository, InteractionController, OwnerId,
    SciCloudConfig, SciCloudError, StaticIdentity,
};
use tracing::debug;

pub struct App {
    pub config: SciCloudConfig,
    pub repository: EventRepository,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = SciCloudConfig::load()?;
        let store = FileStore::open(&config.data_path())?;
        debug!(store = %store.path().display(), owner = ?config.owner, "loaded config");
        let identity = StaticIdentity::new(config.owner.clone().map(OwnerId::new));

        Ok(App {
            repository: EventRepository::new(Arc::new(store), Arc::new(identity)),
            config,
        })
    }

    /// An initialized collection for `view` anchored at `date` (or today).
    pub async fn collection(
        &self,
        view: CalendarView,
        date: Option<NaiveDate>,
    ) -> Result<Arc<EventCollection>> {
        let mut collection = EventCollection::new(self.repository.clone(), self.config.clock()?, view)
            .with_upcoming_limit(self.config.upcoming_limit);
        if let Some(date) = date {
            collection = collection.with_current_date(date);
        }

        collection.initialize().await.map_err(|e| match e {
            SciCloudError::NotAuthenticated => anyhow!(
                "{}\n\nSet your identity with:\n  scicloud config set-owner <id>",
                SciCloudError::NotAuthenticated
            ),
            other => other.into(),
        })?;
        if let Some(message) = collection.last_error() {
            anyhow::bail!(message);
        }

        Ok(Arc::new(collection))
    }

    /// A controller whose cache holds the events on `date`, so drafts on that
    /// date are checked for overlap.
    pub async fn controller(&self, date: NaiveDate) -> Result<InteractionController> {
        let collection = self.collection(CalendarView::Day, Some(date)).await?;
        Ok(InteractionController::new(collection, self.config.layout))
    }

    /// Resolve a full or unambiguous leading part of an event id.
    pub async fn resolve_id(&self, id: &str) -> Result<EventId> {
        let exact = EventId::new(id);
        if self.repository.get_event(&exact).await?.is_some() {
            return Ok(exact);
        }

        let matches: Vec<EventId> = self
            .repository
            .list_events(&Default::default())
            .await?
            .into_iter()
            .map(|e| e.id)
            .filter(|candidate| candidate.as_str().starts_with(id))
            .collect();

        match matches.as_slice() {
            [only] => Ok(only.clone()),
            [] => anyhow::bail!("Event not found: {}", id),
            _ => anyhow::bail!("Event id '{}' is ambiguous ({} matches)", id, matches.len()),
        }
    }
}
