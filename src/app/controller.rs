// src/app/controller.rs
//! One controller per media kind. User actions mutate state and record a
//! [`ChangeEvent`]; [`CatalogController::flush`] then reacts to the pending
//! events in a fixed order: the displayed list is recomputed at most once and
//! each touched store key is written at most once.

use tracing::{debug, info, warn};

use super::catalog::{self, CatalogSource};
use super::error::{CatalogError, StoreError};
use super::filters::{apply_filters, FilterState};
use super::library::Library;
use super::store::KeyValueStore;
use super::types::{CatalogItem, Collection, FetchRequest, MediaKind};

const MAX_NOTICES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    CatalogReplaced,
    FilterChanged,
    FavoritesChanged,
    RatingsChanged,
    CommentLogChanged,
}

pub struct CatalogController {
    kind: MediaKind,
    store: Box<dyn KeyValueStore>,

    // catalog
    items: Vec<CatalogItem>,
    displayed: Vec<CatalogItem>,
    filter: FilterState,
    collection: Collection,

    // user data
    library: Library,

    // fetch bookkeeping
    generation: u64,
    in_flight: Option<FetchRequest>,

    pending: Vec<ChangeEvent>,
    notices: Vec<String>,
}

impl CatalogController {
    /// Restore the persisted favorites, ratings and comment log for `kind`.
    /// Unreadable values fall back to empty and are reported as notices.
    pub fn mount(kind: MediaKind, store: Box<dyn KeyValueStore>) -> Self {
        let (library, problems) = Library::load(&*store, kind.as_str());
        let mut ctl = Self {
            kind,
            store,
            items: Vec::new(),
            displayed: Vec::new(),
            filter: FilterState::default(),
            collection: Collection::Popular,
            library,
            generation: 0,
            in_flight: None,
            pending: Vec::new(),
            notices: Vec::new(),
        };
        for problem in problems {
            ctl.push_notice(format!("Saved {} data reset: {problem}", kind.label()));
        }
        info!(
            "{}: restored {} favorite(s), {} rating(s)",
            kind.label(),
            ctl.library.favorites.len(),
            ctl.library.ratings.len()
        );
        ctl
    }

    // ---- read side ----
    pub const fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn displayed(&self) -> &[CatalogItem] {
        &self.displayed
    }

    pub const fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub const fn collection(&self) -> Collection {
        self.collection
    }

    pub const fn library(&self) -> &Library {
        &self.library
    }

    pub fn item(&self, id: u64) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn is_favorite(&self, id: u64) -> bool {
        self.library.favorites.is_favorite(id)
    }

    pub fn average_rating(&self, id: u64) -> Option<f32> {
        self.library.ratings.average_rating(id)
    }

    /// Displayed items that are favorites, in displayed order.
    pub fn favorites_view(&self) -> Vec<&CatalogItem> {
        self.displayed
            .iter()
            .filter(|i| self.library.favorites.is_favorite(i.id))
            .collect()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn dismiss_notices(&mut self) {
        self.notices.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&FetchRequest> {
        self.in_flight.as_ref()
    }

    // ---- fetch lifecycle ----
    /// Register a new request and return its generation. Any result carrying
    /// an older generation will be discarded when it arrives.
    pub fn begin_fetch(&mut self, request: FetchRequest) -> u64 {
        self.generation += 1;
        debug!(
            "{}: fetch #{} {}",
            self.kind.label(),
            self.generation,
            request.describe()
        );
        self.in_flight = Some(request);
        self.generation
    }

    /// Apply a finished fetch. Returns true when the result was used.
    pub fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<CatalogItem>, CatalogError>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "{}: dropping stale fetch #{generation} (latest #{})",
                self.kind.label(),
                self.generation
            );
            return false;
        }
        let request = self.in_flight.take();
        match result {
            Ok(items) => {
                info!(
                    "{}: {} item(s) from {}",
                    self.kind.label(),
                    items.len(),
                    request.as_ref().map_or_else(String::new, FetchRequest::describe)
                );
                // The highlighted list follows what is shown, not what was asked for.
                if let Some(FetchRequest::Collection(c)) = &request {
                    self.collection = *c;
                }
                self.items = items;
                self.displayed = self.items.clone();
                self.pending.push(ChangeEvent::CatalogReplaced);
                self.flush();
                true
            }
            Err(err) => {
                warn!("{}: fetch failed: {err}", self.kind.label());
                let what = request.as_ref().map_or_else(|| "fetch".into(), FetchRequest::describe);
                self.push_notice(format!("Could not load {what}: {err}"));
                false
            }
        }
    }

    /// Blocking fetch of a named list; used off the UI thread and in tests.
    pub fn fetch_collection(
        &mut self,
        source: &dyn CatalogSource,
        collection: Collection,
        page_cap: u32,
    ) -> bool {
        let generation = self.begin_fetch(FetchRequest::Collection(collection));
        let result = catalog::fetch_collection(source, self.kind, collection, page_cap);
        self.apply_fetch(generation, result)
    }

    /// Blocking search. An empty query issues no request.
    pub fn search(&mut self, source: &dyn CatalogSource, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        let generation = self.begin_fetch(FetchRequest::Search(query.to_string()));
        let result = catalog::search(source, self.kind, query);
        self.apply_fetch(generation, result)
    }

    // ---- filters ----
    pub fn set_title_filter(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.filter.title_query != value {
            self.filter.title_query = value;
            self.pending.push(ChangeEvent::FilterChanged);
        }
        self.flush();
    }

    pub fn set_year_filter(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.filter.year_query != value {
            self.filter.year_query = value;
            self.pending.push(ChangeEvent::FilterChanged);
        }
        self.flush();
    }

    pub fn set_rating_filter(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.filter.min_rating != value {
            self.filter.min_rating = value;
            self.pending.push(ChangeEvent::FilterChanged);
        }
        self.flush();
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        if self.filter != filter {
            self.filter = filter;
            self.pending.push(ChangeEvent::FilterChanged);
        }
        self.flush();
    }

    // ---- favorites ----
    pub fn add_favorite(&mut self, id: u64) {
        if self.library.add_favorite(id) {
            self.pending.push(ChangeEvent::FavoritesChanged);
            self.pending.push(ChangeEvent::RatingsChanged);
        }
        self.flush();
    }

    pub fn remove_favorite(&mut self, id: u64) {
        if self.library.remove_favorite(id) {
            self.pending.push(ChangeEvent::FavoritesChanged);
        }
        self.flush();
    }

    pub fn toggle_favorite(&mut self, id: u64) {
        if self.is_favorite(id) {
            self.remove_favorite(id);
        } else {
            self.add_favorite(id);
        }
    }

    pub fn clear_favorites(&mut self) {
        if self.library.clear_favorites() {
            self.pending.push(ChangeEvent::FavoritesChanged);
        }
        self.flush();
    }

    // ---- ratings & comments ----
    pub fn add_rating(&mut self, id: u64, rating: f32, comment: String) {
        self.library.ratings.add_rating(id, rating, comment);
        self.pending.push(ChangeEvent::RatingsChanged);
        self.flush();
    }

    pub fn set_rating(&mut self, id: u64, rating: f32) {
        let comment = self.library.ratings.comment(id).to_string();
        self.add_rating(id, rating, comment);
    }

    pub fn set_comment(&mut self, id: u64, text: String) {
        let rating = self.library.ratings.rating(id);
        self.add_rating(id, rating, text);
    }

    pub fn submit_comment(&mut self, id: u64) {
        self.library.submit_comment(id);
        self.pending.push(ChangeEvent::CommentLogChanged);
        self.pending.push(ChangeEvent::RatingsChanged);
        self.flush();
    }

    pub fn delete_rating_and_comment(&mut self, id: u64) {
        if self.library.delete_rating_and_comment(id) {
            self.pending.push(ChangeEvent::RatingsChanged);
            self.pending.push(ChangeEvent::CommentLogChanged);
        }
        self.flush();
    }

    // ---- reactions ----
    /// React to everything recorded since the last flush.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        let has = |e: ChangeEvent| events.contains(&e);

        if has(ChangeEvent::CatalogReplaced) || has(ChangeEvent::FilterChanged) {
            self.displayed = apply_filters(&self.items, &self.filter);
        }

        let scope = self.kind.as_str();
        let mut failures: Vec<StoreError> = Vec::new();
        if has(ChangeEvent::FavoritesChanged) {
            if let Err(e) = self.library.save_favorites(&mut *self.store, scope) {
                failures.push(e);
            }
        }
        if has(ChangeEvent::RatingsChanged) {
            if let Err(e) = self.library.save_ratings(&mut *self.store, scope) {
                failures.push(e);
            }
        }
        if has(ChangeEvent::CommentLogChanged) {
            if let Err(e) = self.library.save_comment_log(&mut *self.store, scope) {
                failures.push(e);
            }
        }
        for err in failures {
            warn!("{}: persisting failed: {err}", self.kind.label());
            self.push_notice(format!("Could not save {} data: {err}", self.kind.label()));
        }
    }

    /// Queue a message for the top bar; the oldest is dropped past the limit.
    pub fn push_notice(&mut self, msg: String) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(msg);
    }
}
