//! In-memory cache of the events in the current view window.
//!
//! [`EventCollection`] loads one window at a time (a day for day view, the
//! surrounding month for week view), patches its cache in place after every
//! mutation, and derives grouped views from the cache without fetching.
//!
//! Error policy: mutations record the error message and return the error;
//! window loads record it and keep the previous cache. An authentication
//! failure during a load resets all state instead.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Days, NaiveDate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::date_range::{CalendarView, Clock, DateRange};
use crate::error::{SciCloudError, SciCloudResult};
use crate::event::{Category, Event, EventId};
use crate::in_flight::InFlight;
use crate::repository::{EventFilter, EventPatch, EventRepository, NewEvent};

const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// What a window load did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Cache replaced with this many events
    Loaded(usize),
    /// Another load was already in flight
    Skipped,
    /// Load failed; the previous cache was kept (or reset on auth failure)
    Failed(String),
}

#[derive(Debug)]
struct CollectionState {
    events: Vec<Event>,
    current_date: NaiveDate,
    current_view: CalendarView,
    selected: Option<EventId>,
    error: Option<String>,
    initialized: bool,
}

impl CollectionState {
    fn new(current_date: NaiveDate, current_view: CalendarView) -> Self {
        CollectionState {
            events: Vec::new(),
            current_date,
            current_view,
            selected: None,
            error: None,
            initialized: false,
        }
    }

    fn sort(&mut self) {
        self.events.sort_by_key(Event::sort_key);
    }
}

pub struct EventCollection {
    repository: EventRepository,
    clock: Clock,
    state: Mutex<CollectionState>,
    loading: InFlight,
    mutating: InFlight,
    upcoming_limit: usize,
}

impl EventCollection {
    pub fn new(repository: EventRepository, clock: Clock, view: CalendarView) -> Self {
        let today = clock.today();
        EventCollection {
            repository,
            clock,
            state: Mutex::new(CollectionState::new(today, view)),
            loading: InFlight::new(),
            mutating: InFlight::new(),
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }

    /// Anchor the window somewhere other than today before initializing.
    pub fn with_current_date(self, date: NaiveDate) -> Self {
        self.state().current_date = date;
        self
    }

    pub fn with_upcoming_limit(mut self, limit: usize) -> Self {
        self.upcoming_limit = limit;
        self
    }

    fn state(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn repository(&self) -> &EventRepository {
        &self.repository
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // LIFECYCLE:

    /// Load the first window. Fails fast without a session; later calls are no-ops.
    pub async fn initialize(&self) -> SciCloudResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let owner = self.repository.owner()?;
        self.state().initialized = true;
        info!(owner = %owner, "initializing event collection");

        self.load_window(false).await;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Drop cached events, selection and error (sign-out).
    pub fn reset(&self) {
        let mut state = self.state();
        let today = self.clock.today();
        let view = state.current_view;
        *state = CollectionState::new(today, view);
    }

    /// Refetch the window for the current date and view.
    ///
    /// Dropped if a load is already in flight, unless `force_reload`.
    #[tracing::instrument(skip(self))]
    pub async fn load_window(&self, force_reload: bool) -> LoadOutcome {
        let _guard = if force_reload {
            self.loading.begin()
        } else {
            match self.loading.try_begin() {
                Some(guard) => guard,
                None => {
                    debug!("window load already in flight");
                    return LoadOutcome::Skipped;
                }
            }
        };

        let range = self.load_range();
        let filter = EventFilter::range(range.from, range.to);

        match self.repository.list_events(&filter).await {
            Ok(events) => {
                let count = events.len();
                let mut state = self.state();
                state.events = events;
                state.sort();
                state.error = None;
                debug!(from = %range.from, to = %range.to, count, "loaded window");
                LoadOutcome::Loaded(count)
            }
            Err(SciCloudError::NotAuthenticated) => {
                warn!("session lost during window load, resetting");
                self.reset();
                LoadOutcome::Failed(SciCloudError::NotAuthenticated.to_string())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "window load failed, keeping cached events");
                self.state().error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_active()
    }

    /// Resolve once no window load is in flight.
    pub async fn wait_for_load(&self) {
        self.loading.wait_idle().await
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating.is_active()
    }

    /// Resolve once no create/update/delete is in flight.
    pub async fn wait_for_mutations(&self) {
        self.mutating.wait_idle().await
    }

    // NAVIGATION:

    pub fn current_date(&self) -> NaiveDate {
        self.state().current_date
    }

    pub fn current_view(&self) -> CalendarView {
        self.state().current_view
    }

    /// Range fetched for the current view.
    pub fn load_range(&self) -> DateRange {
        let state = self.state();
        state.current_view.load_range(state.current_date)
    }

    /// Range shown for the current view.
    pub fn visible_range(&self) -> DateRange {
        let state = self.state();
        state.current_view.visible_range(state.current_date)
    }

    /// Switch view; reloads only if the view changed.
    pub async fn set_view(&self, view: CalendarView) -> Option<LoadOutcome> {
        {
            let mut state = self.state();
            if state.current_view == view {
                return None;
            }
            state.current_view = view;
        }
        Some(self.load_window(false).await)
    }

    /// Move the anchor date; reloads only if the date changed.
    pub async fn set_current_date(&self, date: NaiveDate) -> Option<LoadOutcome> {
        {
            let mut state = self.state();
            if state.current_date == date {
                return None;
            }
            state.current_date = date;
        }
        Some(self.load_window(false).await)
    }

    pub async fn go_to_today(&self) -> Option<LoadOutcome> {
        self.set_current_date(self.clock.today()).await
    }

    pub async fn go_to_previous(&self) -> Option<LoadOutcome> {
        let (date, view) = (self.current_date(), self.current_view());
        let target = date
            .checked_sub_days(Days::new(view.step_days()))
            .unwrap_or(date);
        self.set_current_date(target).await
    }

    pub async fn go_to_next(&self) -> Option<LoadOutcome> {
        let (date, view) = (self.current_date(), self.current_view());
        let target = date
            .checked_add_days(Days::new(view.step_days()))
            .unwrap_or(date);
        self.set_current_date(target).await
    }

    // MUTATIONS:

    fn record_error(&self, err: &SciCloudError) {
        self.state().error = Some(err.to_string());
    }

    /// Create through the repository, then append and re-sort the cache.
    pub async fn create(&self, data: NewEvent) -> SciCloudResult<Event> {
        let _guard = self.mutating.begin();

        match self.repository.create_event(data).await {
            Ok(event) => {
                let mut state = self.state();
                state.events.push(event.clone());
                state.sort();
                state.error = None;
                Ok(event)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Update through the repository, then replace and re-sort the cached copy.
    pub async fn update(&self, id: &EventId, patch: EventPatch) -> SciCloudResult<Event> {
        let _guard = self.mutating.begin();

        match self.repository.update_event(id, patch).await {
            Ok(event) => {
                let mut state = self.state();
                if let Some(slot) = state.events.iter_mut().find(|e| &e.id == id) {
                    *slot = event.clone();
                }
                state.sort();
                state.error = None;
                Ok(event)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Delete through the repository, then remove the cached copy.
    pub async fn delete(&self, id: &EventId) -> SciCloudResult<()> {
        let _guard = self.mutating.begin();

        match self.repository.delete_event(id).await {
            Ok(()) => {
                let mut state = self.state();
                if let Some(index) = state.events.iter().position(|e| &e.id == id) {
                    state.events.remove(index);
                }
                if state.selected.as_ref() == Some(id) {
                    state.selected = None;
                }
                state.error = None;
                Ok(())
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    // SELECTION + ERROR:

    pub fn select(&self, id: Option<EventId>) {
        self.state().selected = id;
    }

    /// The selected event, if it is still cached.
    pub fn selected(&self) -> Option<Event> {
        let state = self.state();
        let id = state.selected.as_ref()?;
        state.events.iter().find(|e| &e.id == id).cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // DERIVED VIEWS:

    /// Every cached event, ordered by date then start time.
    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn len(&self) -> usize {
        self.state().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().events.is_empty()
    }

    pub fn find(&self, id: &EventId) -> Option<Event> {
        self.state().events.iter().find(|e| &e.id == id).cloned()
    }

    /// Cached events on one date.
    pub fn events_on(&self, date: NaiveDate) -> Vec<Event> {
        self.state()
            .events
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect()
    }

    /// Cached events inside the visible range of the current view.
    pub fn events_in_view(&self) -> Vec<Event> {
        let state = self.state();
        let range = state.current_view.visible_range(state.current_date);
        state
            .events
            .iter()
            .filter(|e| range.contains(e.date))
            .cloned()
            .collect()
    }

    pub fn by_date(&self) -> BTreeMap<NaiveDate, Vec<Event>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
        for event in self.state().events.iter() {
            grouped.entry(event.date).or_default().push(event.clone());
        }
        grouped
    }

    /// Grouped by category; every category has an entry, even if empty.
    pub fn by_category(&self) -> BTreeMap<Category, Vec<Event>> {
        let mut grouped: BTreeMap<Category, Vec<Event>> =
            Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();
        for event in self.state().events.iter() {
            grouped.entry(event.category).or_default().push(event.clone());
        }
        grouped
    }

    /// The first few cached events dated today or later.
    pub fn upcoming(&self) -> Vec<Event> {
        let today = self.clock.today();
        let mut upcoming: Vec<Event> = self
            .state()
            .events
            .iter()
            .filter(|e| e.date >= today)
            .cloned()
            .collect();
        upcoming.sort_by_key(Event::sort_key);
        upcoming.truncate(self.upcoming_limit);
        upcoming
    }

    // BACKGROUND REFRESH:

    /// Reload the window every `every`, skipping ticks while a load is in flight.
    pub fn spawn_refresh(self: &Arc<Self>, every: Duration) -> RefreshTask {
        let (stop, mut stopped) = watch::channel(false);
        let collection = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the initial load already happened.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {
                        let collection = Arc::clone(&collection);
                        tokio::spawn(async move {
                            collection.load_window(false).await;
                        });
                    }
                }
            }
            debug!("refresh task stopped");
        });

        RefreshTask { stop, handle }
    }
}

/// Periodic window reload owned by a mounted view.
///
/// Stopping (or dropping) ends further ticks; a load already started runs
/// to completion.
#[derive(Debug)]
pub struct RefreshTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Session, StaticIdentity};
    use crate::repository::tests::{date, new_event, repo_for};
    use crate::store::{EventRecord, EventRow, EventStore, MemoryStore, Query, StoreError, StoreResult};
    use crate::event::OwnerId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store that can be switched into failing every call.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> StoreResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn select(&self, query: &Query) -> StoreResult<Vec<EventRecord>> {
            self.check()?;
            self.inner.select(query).await
        }
        async fn insert(&self, row: EventRow) -> StoreResult<EventRecord> {
            self.check()?;
            self.inner.insert(row).await
        }
        async fn update(&self, id: &str, owner: &str, row: EventRow) -> StoreResult<Option<EventRecord>> {
            self.check()?;
            self.inner.update(id, owner, row).await
        }
        async fn delete(&self, id: &str, owner: &str) -> StoreResult<bool> {
            self.check()?;
            self.inner.delete(id, owner).await
        }
    }

    fn collection(store: &Arc<MemoryStore>, today: &str, view: CalendarView) -> EventCollection {
        EventCollection::new(repo_for(store, "ada"), Clock::fixed(date(today)), view)
    }

    async fn seed(store: &Arc<MemoryStore>, events: &[(&str, &str, &str, &str, Category)]) {
        let repo = repo_for(store, "ada");
        for (title, d, start, end, category) in events {
            repo.create_event(new_event(title, d, start, end, *category))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_initialize_requires_session() {
        let store: Arc<dyn EventStore> = Arc::new(MemoryStore::new());
        let repo = EventRepository::new(store, Arc::new(StaticIdentity::anonymous()));
        let collection = EventCollection::new(repo, Clock::fixed(date("2024-07-10")), CalendarView::Week);

        assert!(matches!(
            collection.initialize().await,
            Err(SciCloudError::NotAuthenticated)
        ));
        assert!(!collection.is_initialized());
    }

    #[tokio::test]
    async fn test_week_view_loads_whole_month() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("June", "2024-06-30", "09:00", "10:00", Category::Meeting),
                ("Early", "2024-07-01", "09:00", "10:00", Category::Meeting),
                ("Late", "2024-07-31", "09:00", "10:00", Category::Meeting),
                ("August", "2024-08-01", "09:00", "10:00", Category::Meeting),
            ],
        )
        .await;

        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        let titles: Vec<String> = collection.events().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Early", "Late"]);
        // Visible week of 2024-07-10 is 07-08..07-14
        assert!(collection.events_in_view().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let collection = collection(&store, "2024-07-10", CalendarView::Day);
        collection.initialize().await.unwrap();

        seed(&store, &[("Late add", "2024-07-10", "09:00", "10:00", Category::Custom)]).await;
        collection.initialize().await.unwrap();
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn test_navigation_moves_by_view_step() {
        let store = Arc::new(MemoryStore::new());
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        collection.go_to_next().await;
        assert_eq!(collection.current_date(), date("2024-07-17"));

        collection.set_view(CalendarView::Day).await;
        collection.go_to_previous().await;
        assert_eq!(collection.current_date(), date("2024-07-16"));

        collection.go_to_today().await;
        assert_eq!(collection.current_date(), date("2024-07-10"));
    }

    #[tokio::test]
    async fn test_unchanged_window_does_not_reload() {
        let store = Arc::new(MemoryStore::new());
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        assert_eq!(collection.set_view(CalendarView::Week).await, None);
        assert_eq!(collection.set_current_date(date("2024-07-10")).await, None);
        assert_eq!(collection.go_to_today().await, None);
        assert_eq!(
            collection.set_current_date(date("2024-07-11")).await,
            Some(LoadOutcome::Loaded(0))
        );
    }

    #[tokio::test]
    async fn test_load_is_skipped_while_in_flight() {
        let store = Arc::new(MemoryStore::new());
        let collection = collection(&store, "2024-07-10", CalendarView::Week);

        let guard = collection.loading.try_begin().unwrap();
        assert!(collection.is_loading());
        assert_eq!(collection.load_window(false).await, LoadOutcome::Skipped);
        assert_eq!(collection.load_window(true).await, LoadOutcome::Loaded(0));
        drop(guard);

        assert!(!collection.is_loading());
        collection.wait_for_load().await;
    }

    #[tokio::test]
    async fn test_mutations_patch_cache() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[("Existing", "2024-07-10", "13:00", "14:00", Category::Meeting)]).await;
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();
        assert_eq!(collection.len(), 1);

        let created = collection
            .create(new_event("Earlier", "2024-07-10", "09:00", "10:00", Category::Training))
            .await
            .unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.events()[0].id, created.id);

        let patch = EventPatch {
            title: Some("Renamed".into()),
            ..EventPatch::default()
        };
        collection.update(&created.id, patch).await.unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.find(&created.id).unwrap().title, "Renamed");

        collection.select(Some(created.id.clone()));
        collection.delete(&created.id).await.unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.selected(), None);
        assert!(!collection.is_mutating());
    }

    #[tokio::test]
    async fn test_update_keeps_cache_sorted() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("A", "2024-07-10", "09:00", "10:00", Category::Meeting),
                ("B", "2024-07-10", "13:00", "14:00", Category::Meeting),
            ],
        )
        .await;
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        let a = collection.events()[0].id.clone();
        let patch = EventPatch {
            start_time: Some(Some("15:00".parse().unwrap())),
            end_time: Some(Some("16:00".parse().unwrap())),
            ..EventPatch::default()
        };
        collection.update(&a, patch).await.unwrap();

        let titles: Vec<String> = collection.events().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["B", "A"]);
        let on_day: Vec<String> = collection.by_date()[&date("2024-07-10")]
            .iter()
            .map(|e| e.title.clone())
            .collect();
        assert_eq!(on_day, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_cache_matches_repository_order_with_all_day() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[("Timed", "2024-07-10", "09:00", "10:00", Category::Meeting)]).await;
        let mut all_day = new_event("All day", "2024-07-10", "13:00", "14:00", Category::Maintenance);
        all_day.all_day = true;
        repo_for(&store, "ada").create_event(all_day).await.unwrap();

        let collection = collection(&store, "2024-07-10", CalendarView::Day);
        collection.initialize().await.unwrap();

        let listed = repo_for(&store, "ada")
            .list_events(&EventFilter::range(date("2024-07-10"), date("2024-07-10")))
            .await
            .unwrap();
        assert_eq!(collection.events(), listed);
        assert_eq!(listed[0].title, "All day");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_cache() {
        let store = Arc::new(FlakyStore::default());
        let repo = EventRepository::new(store.clone(), Arc::new(StaticIdentity::owner("ada")));
        repo.create_event(new_event("Mine", "2024-07-10", "09:00", "10:00", Category::Custom))
            .await
            .unwrap();

        let collection = EventCollection::new(repo, Clock::fixed(date("2024-07-10")), CalendarView::Week);
        collection.initialize().await.unwrap();
        assert_eq!(collection.len(), 1);

        store.set_failing(true);
        let outcome = collection.load_window(true).await;

        assert_eq!(outcome, LoadOutcome::Failed("connection reset".into()));
        assert_eq!(collection.last_error().as_deref(), Some("connection reset"));
        assert_eq!(collection.len(), 1);
        assert!(collection.is_initialized());

        store.set_failing(false);
        assert_eq!(collection.load_window(false).await, LoadOutcome::Loaded(1));
        assert_eq!(collection.last_error(), None);
    }

    #[tokio::test]
    async fn test_failed_mutation_records_error_and_propagates() {
        let store = Arc::new(MemoryStore::new());
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        let err = collection
            .create(new_event("Backwards", "2024-07-10", "10:00", "09:00", Category::Meeting))
            .await
            .unwrap_err();
        assert!(matches!(err, SciCloudError::InvalidTimeRange { .. }));
        assert!(collection.last_error().unwrap().contains("Invalid time range"));
        assert!(collection.is_empty());

        let missing = EventId::new("missing");
        assert!(matches!(
            collection.delete(&missing).await,
            Err(SciCloudError::NotFound(_))
        ));
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn test_grouped_views() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                ("B", "2024-07-11", "09:00", "10:00", Category::Meeting),
                ("A", "2024-07-10", "09:00", "10:00", Category::Meeting),
                ("C", "2024-07-11", "11:00", "12:00", Category::Experiment),
            ],
        )
        .await;
        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        let by_date = collection.by_date();
        assert_eq!(by_date.len(), 2);
        assert_eq!(by_date[&date("2024-07-11")].len(), 2);

        let by_category = collection.by_category();
        assert_eq!(by_category.len(), 5);
        assert_eq!(by_category[&Category::Meeting].len(), 2);
        assert!(by_category[&Category::Training].is_empty());
    }

    #[tokio::test]
    async fn test_upcoming_is_capped_and_starts_today() {
        let store = Arc::new(MemoryStore::new());
        let mut events = vec![("Past", "2024-07-09", "09:00", "10:00", Category::Custom)];
        let days = ["2024-07-16", "2024-07-15", "2024-07-14", "2024-07-13", "2024-07-12", "2024-07-11", "2024-07-10"];
        for d in days {
            events.push(("Future", d, "09:00", "10:00", Category::Custom));
        }
        seed(&store, &events).await;

        let collection = collection(&store, "2024-07-10", CalendarView::Week);
        collection.initialize().await.unwrap();

        let upcoming = collection.upcoming();
        let dates: Vec<NaiveDate> = upcoming.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                date("2024-07-10"),
                date("2024-07-11"),
                date("2024-07-12"),
                date("2024-07-13"),
                date("2024-07-14")
            ]
        );
    }

    #[tokio::test]
    async fn test_auth_loss_during_load_resets_state() {
        let store: Arc<dyn EventStore> = Arc::new(MemoryStore::new());
        let session = Arc::new(Session::new());
        session.sign_in(OwnerId::new("ada"));
        let repo = EventRepository::new(store, session.clone());
        repo.create_event(new_event("Mine", "2024-07-10", "09:00", "10:00", Category::Custom))
            .await
            .unwrap();

        let collection = EventCollection::new(repo, Clock::fixed(date("2024-07-10")), CalendarView::Week);
        collection.initialize().await.unwrap();
        collection.select(collection.events().first().map(|e| e.id.clone()));
        assert_eq!(collection.len(), 1);

        session.sign_out();
        let outcome = collection.load_window(false).await;

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(collection.is_empty());
        assert_eq!(collection.selected(), None);
        assert!(!collection.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_reloads_until_stopped() {
        let store = Arc::new(MemoryStore::new());
        let collection = Arc::new(collection(&store, "2024-07-10", CalendarView::Week));
        collection.initialize().await.unwrap();

        let task = collection.spawn_refresh(Duration::from_secs(300));
        seed(&store, &[("Added elsewhere", "2024-07-10", "09:00", "10:00", Category::Custom)]).await;

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(collection.len(), 1);

        task.stop();
        seed(&store, &[("After stop", "2024-07-11", "09:00", "10:00", Category::Custom)]).await;
        tokio::time::sleep(Duration::from_secs(1200)).await;
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_tick_is_dropped_while_loading() {
        let store = Arc::new(MemoryStore::new());
        let collection = Arc::new(collection(&store, "2024-07-10", CalendarView::Week));
        collection.initialize().await.unwrap();

        let _task = collection.spawn_refresh(Duration::from_secs(300));
        let guard = collection.loading.try_begin().unwrap();
        seed(&store, &[("Added elsewhere", "2024-07-10", "09:00", "10:00", Category::Custom)]).await;

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(collection.is_empty());

        drop(guard);
        tokio::time::sleep(Duration::from_secs(300)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(collection.len(), 1);
    }
}
