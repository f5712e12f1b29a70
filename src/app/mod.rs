// src/app/mod.rs: two catalog controllers (movies, shows) + background fetches + poster cache

// ---- Standard lib imports ----
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---- Crates ----
use eframe::egui as eg;
use tracing::{info, warn};

// ---- Local modules ----
pub mod cache;
pub mod catalog;
pub mod controller;
mod detail;
pub mod error;
pub mod fetch;
pub mod filters;
pub mod gfx;
pub mod library;
pub mod posters;
pub mod prefs;
pub mod store;
pub mod types;
mod ui;

use crate::config::AppConfig;
use catalog::{CatalogSource, OfflineSource, TmdbClient};
use controller::CatalogController;
use fetch::FetchWorker;
use posters::PosterBoard;
use prefs::UiPrefs;
use store::{KeyValueStore, MemoryStore, SqliteStore};
use types::{FetchRequest, MediaKind};

// ---- Tunables ----
const MAX_FETCH_PER_FRAME: usize = 8;
const MAX_UPLOADS_PER_FRAME: usize = 4;
const BUSY_REPAINT: Duration = Duration::from_millis(100);

pub struct FlixApp {
    cfg: AppConfig,

    // one controller per tab
    movies: CatalogController,
    shows: CatalogController,
    active: MediaKind,

    // tabs whose first list has been requested
    started: HashSet<MediaKind>,
    boot_prefs: UiPrefs,

    // background work
    fetcher: FetchWorker,
    posters: PosterBoard,

    // ui state
    selected: Option<u64>,
    search_query: String,
    poster_width_ui: f32,

    // prefs autosave
    prefs_path: PathBuf,
    prefs_dirty: bool,
    prefs_last_write: Instant,
}

fn open_store(path: &Path, notices: &mut Vec<String>) -> Box<dyn KeyValueStore> {
    match SqliteStore::open(path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("store {} unavailable: {e}", path.display());
            notices.push(format!(
                "Store {} unavailable ({e}); changes will not be kept.",
                path.display()
            ));
            Box::new(MemoryStore::default())
        }
    }
}

impl FlixApp {
    pub fn new(cfg: AppConfig) -> Self {
        let mut startup_notices = Vec::new();

        let mut movies = CatalogController::mount(
            MediaKind::Movie,
            open_store(&cfg.store_path, &mut startup_notices),
        );
        let mut shows = CatalogController::mount(
            MediaKind::Show,
            open_store(&cfg.store_path, &mut startup_notices),
        );

        let source: Arc<dyn CatalogSource> = match TmdbClient::new(&cfg) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!("catalog client unavailable: {e}");
                startup_notices.push(format!("Catalog offline: {e}"));
                Arc::new(OfflineSource(e))
            }
        };
        let fetcher = FetchWorker::new(source, cfg.top_rated_page_cap);
        let posters = PosterBoard::new(cache::PosterCache::open(&cfg.cache_dir), cfg.poster_workers);

        let prefs_path = cfg.prefs_path();
        let boot_prefs = prefs::load_prefs(&prefs_path);
        movies.set_filter(boot_prefs.movie.filter.clone());
        shows.set_filter(boot_prefs.show.filter.clone());

        // Both tabs show the same startup problems.
        for msg in startup_notices {
            movies.push_notice(msg.clone());
            shows.push_notice(msg);
        }

        info!(
            "flix ready (store {}, cache {})",
            cfg.store_path.display(),
            cfg.cache_dir.display()
        );

        Self {
            active: boot_prefs.active,
            poster_width_ui: boot_prefs.poster_width,
            cfg,
            movies,
            shows,
            started: HashSet::new(),
            boot_prefs,
            fetcher,
            posters,
            selected: None,
            search_query: String::new(),
            prefs_path,
            prefs_dirty: false,
            prefs_last_write: Instant::now(),
        }
    }

    pub(crate) const fn ctl(&self, kind: MediaKind) -> &CatalogController {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Show => &self.shows,
        }
    }

    pub(crate) fn ctl_mut(&mut self, kind: MediaKind) -> &mut CatalogController {
        match kind {
            MediaKind::Movie => &mut self.movies,
            MediaKind::Show => &mut self.shows,
        }
    }

    /// Register the request with the controller and run it in the background.
    pub(crate) fn request_fetch(&mut self, kind: MediaKind, request: FetchRequest) {
        let generation = self.ctl_mut(kind).begin_fetch(request.clone());
        self.fetcher.spawn(kind, generation, request);
    }

    /// Search the active tab. Blank queries are ignored.
    pub(crate) fn submit_search(&mut self) {
        let query = self.search_query.trim().to_string();
        if query.is_empty() {
            return;
        }
        self.request_fetch(self.active, FetchRequest::Search(query));
    }

    pub(crate) fn switch_kind(&mut self, kind: MediaKind) {
        if self.active == kind {
            return;
        }
        self.active = kind;
        self.selected = None;
        self.search_query.clear();
        self.mark_dirty();
    }

    /// First visit of a tab loads the list it was showing last time.
    fn ensure_started(&mut self, kind: MediaKind) {
        if self.started.insert(kind) {
            let collection = self.boot_prefs.kind(kind).collection;
            self.request_fetch(kind, FetchRequest::Collection(collection));
        }
    }

    fn poll_fetches(&mut self) -> usize {
        let msgs = self.fetcher.poll(MAX_FETCH_PER_FRAME);
        let n = msgs.len();
        for msg in msgs {
            // an applied list may change the saved collection
            if self.ctl_mut(msg.kind).apply_fetch(msg.generation, msg.result) {
                self.mark_dirty();
            }
        }
        n
    }

    pub(crate) fn poster_url(&self, poster_path: &str) -> Option<String> {
        self.cfg.poster_url(poster_path)
    }
}

// ========== App impl ==========
impl eframe::App for FlixApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        self.ensure_started(self.active);
        let fetched = self.poll_fetches();
        let arrived = self.posters.poll();

        eg::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.ui_render_topbar(ui);
        });

        if self.selected.is_some() {
            self.ui_render_detail_panel(ctx);
        }

        eg::CentralPanel::default().show(ctx, |ui| {
            self.ui_render_favorites_strip(ui, ctx);
            ui.separator();
            self.ui_render_grid(ui, ctx);
        });

        self.maybe_save_prefs();

        let busy = self.ctl(self.active).is_loading()
            || self.posters.pending() > 0
            || self.prefs_dirty
            || fetched > 0
            || arrived > 0;
        if busy {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}
