// src/app/posters.rs
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui::{self as eg, TextureHandle};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use super::cache::{self, PosterCache};
use super::types::{PosterDone, PosterState};

const RESIZE_MAX_W: u32 = 342;
const RESIZE_QUALITY: u8 = 80;
const MAX_DONE_PER_FRAME: usize = 12;
/// Uploaded textures kept alive; a grid screen needs far fewer.
const MAX_TEXTURES: usize = 240;

struct PosterSlot {
    state: PosterState,
    path: Option<PathBuf>,
    tex: Option<TextureHandle>,
    last_used: u64,
}

struct PosterJob {
    key: String,
    url: String,
}

/// Poster downloads and textures, keyed by the cache key of the image URL.
/// Workers start on the first download that misses the disk cache.
pub struct PosterBoard {
    cache: PosterCache,
    worker_count: usize,
    slots: HashMap<String, PosterSlot>,
    tick: u64,
    work_tx: Option<Sender<PosterJob>>,
    done_tx: Sender<PosterDone>,
    done_rx: Receiver<PosterDone>,
}

impl PosterBoard {
    pub fn new(cache: PosterCache, worker_count: usize) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            cache,
            worker_count: worker_count.max(1),
            slots: HashMap::new(),
            tick: 0,
            work_tx: None,
            done_tx,
            done_rx,
        }
    }

    /// Make sure the poster for `url` is on disk or on its way there.
    pub fn request(&mut self, url: &str) {
        let key = cache::url_to_cache_key(url);
        if self.slots.contains_key(&key) {
            return;
        }
        if let Some(path) = self.cache.find(&key) {
            self.slots.insert(
                key,
                PosterSlot {
                    state: PosterState::Cached,
                    path: Some(path),
                    tex: None,
                    last_used: 0,
                },
            );
            return;
        }

        let state = match self.ensure_workers() {
            Some(tx) => {
                let job = PosterJob {
                    key: key.clone(),
                    url: url.to_string(),
                };
                if tx.send(job).is_ok() {
                    PosterState::Pending
                } else {
                    PosterState::Failed
                }
            }
            None => PosterState::Failed,
        };
        self.slots.insert(
            key,
            PosterSlot {
                state,
                path: None,
                tex: None,
                last_used: 0,
            },
        );
    }

    pub fn state(&self, url: &str) -> Option<PosterState> {
        self.slots
            .get(&cache::url_to_cache_key(url))
            .map(|s| s.state)
    }

    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|s| s.state == PosterState::Pending)
            .count()
    }

    /// Fold finished downloads into the slots. Returns how many arrived.
    pub fn poll(&mut self) -> usize {
        let mut drained = 0usize;
        while drained < MAX_DONE_PER_FRAME {
            match self.done_rx.try_recv() {
                Ok(msg) => {
                    drained += 1;
                    let Some(slot) = self.slots.get_mut(&msg.key) else {
                        continue;
                    };
                    match msg.result {
                        Ok(path) => {
                            slot.path = Some(path);
                            slot.state = PosterState::Cached; // uploaded lazily during paint
                        }
                        Err(e) => {
                            debug!("poster {} failed: {e}", msg.key);
                            slot.state = PosterState::Failed;
                        }
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    /// Texture for `url`, requesting it first if needed. A cached file is
    /// uploaded only while `uploads_left` allows; each upload spends one.
    pub fn texture(
        &mut self,
        ctx: &eg::Context,
        url: &str,
        uploads_left: &mut usize,
    ) -> Option<TextureHandle> {
        self.request(url);
        self.tick += 1;
        let key = cache::url_to_cache_key(url);
        let slot = self.slots.get_mut(&key)?;
        slot.last_used = self.tick;

        let mut uploaded = false;
        if slot.state == PosterState::Cached && *uploads_left > 0 {
            if let Some(path) = slot.path.as_deref() {
                *uploads_left -= 1;
                match super::gfx::load_texture_from_path(ctx, path, &key) {
                    Ok(tex) => {
                        slot.tex = Some(tex);
                        slot.state = PosterState::Ready;
                        uploaded = true;
                    }
                    Err(e) => {
                        warn!("poster upload failed for {}: {e}", path.display());
                        slot.state = PosterState::Failed;
                    }
                }
            }
        }
        let tex = slot.tex.clone();
        if uploaded {
            self.release_stale_textures();
        }
        tex
    }

    pub fn textures_alive(&self) -> usize {
        self.slots.values().filter(|s| s.tex.is_some()).count()
    }

    /// Drop the least recently drawn textures past [`MAX_TEXTURES`]. Their
    /// files stay cached, so the slot goes back to `Cached`.
    fn release_stale_textures(&mut self) {
        let alive = self.textures_alive();
        if alive <= MAX_TEXTURES {
            return;
        }
        let mut by_age: Vec<(u64, String)> = self
            .slots
            .iter()
            .filter(|(_, s)| s.tex.is_some())
            .map(|(k, s)| (s.last_used, k.clone()))
            .collect();
        by_age.sort_unstable();
        for (_, key) in by_age.into_iter().take(alive - MAX_TEXTURES) {
            if let Some(slot) = self.slots.get_mut(&key) {
                slot.tex = None;
                slot.state = PosterState::Cached;
            }
        }
        debug!("released {} poster texture(s)", alive - MAX_TEXTURES);
    }

    fn ensure_workers(&mut self) -> Option<Sender<PosterJob>> {
        if let Some(tx) = &self.work_tx {
            return Some(tx.clone());
        }

        let client = match Client::builder()
            .user_agent("flix/posters")
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/avif,image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build()
        {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!("poster http client build failed: {e}");
                return None;
            }
        };

        let (work_tx, work_rx) = mpsc::channel::<PosterJob>();
        let work_rx = Arc::new(Mutex::new(work_rx));
        let dir = self.cache.dir().to_path_buf();

        for _ in 0..self.worker_count {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = self.done_tx.clone();
            let client = Arc::clone(&client);
            let dir = dir.clone();

            std::thread::spawn(move || loop {
                let job = {
                    let Ok(rx) = work_rx.lock() else {
                        break;
                    };
                    rx.recv()
                };
                let Ok(PosterJob { key, url }) = job else {
                    break;
                };
                let result = cache::download_and_store_resized_with_client(
                    &client,
                    &dir,
                    &url,
                    &key,
                    RESIZE_MAX_W,
                    RESIZE_QUALITY,
                );
                if done_tx.send(PosterDone { key, result }).is_err() {
                    break;
                }
            });
        }
        debug!("started {} poster worker(s)", self.worker_count);

        self.work_tx = Some(work_tx.clone());
        Some(work_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn cached_file_needs_no_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PosterCache::open(dir.path());
        let url = "https://image.tmdb.org/t/p/w342/abc.jpg";
        let key = cache::url_to_cache_key(url);
        std::fs::write(cache.dir().join(format!("{key}.jpg")), b"jpeg").unwrap();

        let mut board = PosterBoard::new(cache, 2);
        board.request(url);
        assert_eq!(board.state(url), Some(PosterState::Cached));
        assert_eq!(board.pending(), 0);
        assert!(board.work_tx.is_none());
    }

    #[test]
    fn uploaded_textures_stay_capped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PosterCache::open(dir.path());
        let urls: Vec<String> = (0..MAX_TEXTURES + 20)
            .map(|i| format!("https://image.tmdb.org/t/p/w342/{i}.jpg"))
            .collect();
        for url in &urls {
            let key = cache::url_to_cache_key(url);
            image::RgbaImage::new(2, 3)
                .save(cache.dir().join(format!("{key}.png")))
                .unwrap();
        }

        let ctx = eg::Context::default();
        let mut board = PosterBoard::new(cache, 1);
        let mut uploads_left = usize::MAX;
        for url in &urls {
            assert!(board.texture(&ctx, url, &mut uploads_left).is_some());
        }
        assert_eq!(board.textures_alive(), MAX_TEXTURES);
        assert_eq!(board.state(&urls[0]), Some(PosterState::Cached));
        assert_eq!(board.state(&urls[urls.len() - 1]), Some(PosterState::Ready));

        // A released poster comes back from disk on the next draw.
        assert!(board.texture(&ctx, &urls[0], &mut uploads_left).is_some());
        assert_eq!(board.textures_alive(), MAX_TEXTURES);
        assert_eq!(board.state(&urls[0]), Some(PosterState::Ready));
    }

    #[test]
    fn unreachable_poster_ends_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = PosterBoard::new(PosterCache::open(dir.path()), 1);
        let url = "http://127.0.0.1:9/missing.jpg";
        board.request(url);
        board.request(url);
        assert_eq!(board.state(url), Some(PosterState::Pending));
        assert_eq!(board.pending(), 1);

        let deadline = Instant::now() + Duration::from_secs(30);
        while board.pending() > 0 && Instant::now() < deadline {
            board.poll();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(board.state(url), Some(PosterState::Failed));
    }
}
