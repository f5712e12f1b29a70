// src/app/prefs.rs
use std::path::Path;
use std::time::{Duration, Instant};
use std::{fs, io};

use tracing::warn;

use super::filters::FilterState;
use super::types::{Collection, MediaKind};

pub const POSTER_WIDTH_RANGE: std::ops::RangeInclusive<f32> = 120.0..=220.0;
const DEFAULT_POSTER_WIDTH: f32 = 150.0;

/// Per-tab state restored on the next launch.
#[derive(Clone, Debug, PartialEq)]
pub struct KindPrefs {
    pub collection: Collection,
    pub filter: FilterState,
}

impl Default for KindPrefs {
    fn default() -> Self {
        Self {
            collection: Collection::Popular,
            filter: FilterState::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UiPrefs {
    pub active: MediaKind,
    pub movie: KindPrefs,
    pub show: KindPrefs,
    pub poster_width: f32,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            active: MediaKind::Movie,
            movie: KindPrefs::default(),
            show: KindPrefs::default(),
            poster_width: DEFAULT_POSTER_WIDTH,
        }
    }
}

impl UiPrefs {
    pub const fn kind(&self, kind: MediaKind) -> &KindPrefs {
        match kind {
            MediaKind::Movie => &self.movie,
            MediaKind::Show => &self.show,
        }
    }

    pub fn kind_mut(&mut self, kind: MediaKind) -> &mut KindPrefs {
        match kind {
            MediaKind::Movie => &mut self.movie,
            MediaKind::Show => &mut self.show,
        }
    }
}

/// Parse `key=value` lines; unknown keys and bad values keep their defaults.
/// Filter values are kept verbatim since surrounding spaces change what
/// they match.
pub fn parse_prefs(txt: &str) -> UiPrefs {
    let mut prefs = UiPrefs::default();
    for line in txt.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((k, raw)) = line.split_once('=') else {
            continue;
        };
        let k = k.trim();
        let v = raw.trim();

        if k == "active" {
            if let Some(kind) = MediaKind::from_str(v) {
                prefs.active = kind;
            }
            continue;
        }
        if k == "poster_w" {
            if let Some(n) = v.parse::<f32>().ok().filter(|n| n.is_finite()) {
                prefs.poster_width = n.clamp(*POSTER_WIDTH_RANGE.start(), *POSTER_WIDTH_RANGE.end());
            }
            continue;
        }

        let Some((scope, field)) = k.split_once('.') else {
            continue;
        };
        let Some(kind) = MediaKind::from_str(scope) else {
            continue;
        };
        let kp = prefs.kind_mut(kind);
        match field {
            "collection" => {
                if let Some(c) = Collection::from_str(v) {
                    kp.collection = c;
                }
            }
            "title" => kp.filter.title_query = raw.to_string(),
            "year" => kp.filter.year_query = raw.to_string(),
            "min_rating" => kp.filter.min_rating = raw.to_string(),
            _ => {}
        }
    }
    prefs
}

fn one_line(s: &str) -> String {
    s.replace(['\n', '\r'], " ")
}

pub fn render_prefs(prefs: &UiPrefs) -> String {
    let mut txt = String::from("# flix ui prefs\n");
    txt.push_str(&format!("active={}\n", prefs.active.as_str()));
    txt.push_str(&format!("poster_w={:.1}\n", prefs.poster_width));
    for kind in MediaKind::ALL {
        let kp = prefs.kind(kind);
        let scope = kind.as_str();
        txt.push_str(&format!("{scope}.collection={}\n", kp.collection.as_str()));
        txt.push_str(&format!("{scope}.title={}\n", one_line(&kp.filter.title_query)));
        txt.push_str(&format!("{scope}.year={}\n", one_line(&kp.filter.year_query)));
        txt.push_str(&format!("{scope}.min_rating={}\n", one_line(&kp.filter.min_rating)));
    }
    txt
}

pub fn load_prefs(path: &Path) -> UiPrefs {
    match fs::read_to_string(path) {
        Ok(txt) => parse_prefs(&txt),
        Err(e) if e.kind() == io::ErrorKind::NotFound => UiPrefs::default(),
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            UiPrefs::default()
        }
    }
}

pub fn save_prefs(path: &Path, prefs: &UiPrefs) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_prefs(prefs))
}

impl crate::app::FlixApp {
    // ---- tiny flags ----
    #[allow(clippy::missing_const_for_fn)]
    pub(crate) fn mark_dirty(&mut self) {
        self.prefs_dirty = true;
    }

    pub(crate) fn maybe_save_prefs(&mut self) {
        // debounce a bit to avoid writing every frame
        if self.prefs_dirty && self.prefs_last_write.elapsed() >= Duration::from_millis(300) {
            let prefs = self.snapshot_prefs();
            if let Err(e) = save_prefs(&self.prefs_path, &prefs) {
                warn!("could not save ui prefs: {e}");
            }
            self.prefs_dirty = false;
            self.prefs_last_write = Instant::now();
        }
    }

    pub(crate) fn snapshot_prefs(&self) -> UiPrefs {
        let kind_prefs = |kind: MediaKind| {
            let ctl = self.ctl(kind);
            KindPrefs {
                collection: ctl.collection(),
                filter: ctl.filter().clone(),
            }
        };
        UiPrefs {
            active: self.active,
            movie: kind_prefs(MediaKind::Movie),
            show: kind_prefs(MediaKind::Show),
            poster_width: self.poster_width_ui,
        }
    }
}
