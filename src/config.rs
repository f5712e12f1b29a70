use std::{env, fs, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_POSTER_SIZE: &str = "w342";
pub const DEFAULT_STORE_PATH: &str = "db/flix_store.db";
pub const DEFAULT_CACHE_DIR: &str = ".flix_cache";
/// TMDB refuses pages above 500 on every list endpoint.
pub const DEFAULT_TOP_RATED_PAGE_CAP: u32 = 500;
pub const DEFAULT_POSTER_WORKERS: usize = 8;

const API_KEY_ENV_VARS: [&str; 2] = ["FLIX_TMDB_API_KEY", "TMDB_API_KEY"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub tmdb_api_key: Option<String>,
    pub api_base_url: String,
    pub image_base_url: String,
    pub poster_size: String,
    pub store_path: PathBuf,
    pub cache_dir: PathBuf,
    pub top_rated_page_cap: u32,
    pub poster_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            poster_size: DEFAULT_POSTER_SIZE.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            top_rated_page_cap: DEFAULT_TOP_RATED_PAGE_CAP,
            poster_workers: DEFAULT_POSTER_WORKERS,
        }
    }
}

impl AppConfig {
    /// Full poster URL for a TMDB `poster_path` (which carries its own leading slash).
    pub fn poster_url(&self, poster_path: &str) -> Option<String> {
        let path = poster_path.trim();
        if path.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}{}",
            self.image_base_url.trim_end_matches('/'),
            self.poster_size,
            path
        ))
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.cache_dir.join("ui_prefs.txt")
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    tmdb_api_key: Option<String>,
    api_base_url: Option<String>,
    image_base_url: Option<String>,
    poster_size: Option<String>,
    store_path: Option<String>,
    cache_dir: Option<String>,
    top_rated_page_cap: Option<u32>,
    poster_workers: Option<usize>,
}

pub fn load_config() -> AppConfig {
    let cfg_path = PathBuf::from("config.json");
    let raw = match fs::read_to_string(&cfg_path) {
        Ok(raw) => {
            info!("Loaded config from {}", cfg_path.display());
            Some(raw)
        }
        Err(_) => {
            info!("No config.json found; using defaults");
            None
        }
    };

    let mut cfg = raw.as_deref().map(parse_config).unwrap_or_default();

    for var in API_KEY_ENV_VARS {
        if let Some(key) = env::var(var).ok().filter(|k| !k.trim().is_empty()) {
            info!("Using TMDB API key from {var}");
            cfg.tmdb_api_key = Some(key);
            break;
        }
    }

    if cfg.tmdb_api_key.is_none() {
        warn!("No TMDB API key configured; catalog requests will fail.");
    }

    cfg
}

/// Merge a `config.json` body over the defaults. Bad JSON yields the defaults.
pub fn parse_config(raw: &str) -> AppConfig {
    let mut cfg = AppConfig::default();

    let parsed = match serde_json::from_str::<RawConfig>(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("Failed to parse config.json ({}). Using defaults.", err);
            return cfg;
        }
    };

    if let Some(key) = parsed.tmdb_api_key.filter(|k| !k.trim().is_empty()) {
        cfg.tmdb_api_key = Some(key.trim().to_string());
    }
    if let Some(url) = parsed.api_base_url {
        cfg.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = parsed.image_base_url {
        cfg.image_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(size) = parsed.poster_size.filter(|s| !s.trim().is_empty()) {
        cfg.poster_size = size;
    }
    if let Some(path) = parsed.store_path {
        cfg.store_path = PathBuf::from(path);
    }
    if let Some(dir) = parsed.cache_dir {
        cfg.cache_dir = PathBuf::from(dir);
    }
    if let Some(cap) = parsed.top_rated_page_cap {
        if cap == 0 {
            warn!("top_rated_page_cap must be at least 1; keeping {}", cfg.top_rated_page_cap);
        } else {
            cfg.top_rated_page_cap = cap;
        }
    }
    if let Some(n) = parsed.poster_workers {
        cfg.poster_workers = n.clamp(1, 32);
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_keeps_defaults() {
        assert_eq!(parse_config("{}"), AppConfig::default());
    }

    #[test]
    fn broken_json_falls_back_to_defaults() {
        assert_eq!(parse_config("{ not json"), AppConfig::default());
    }

    #[test]
    fn merges_fields_over_defaults() {
        let cfg = parse_config(
            r#"{
                "tmdb_api_key": " abc123 ",
                "api_base_url": "http://localhost:9000/3/",
                "top_rated_page_cap": 3,
                "poster_workers": 99,
                "cache_dir": "/tmp/flix"
            }"#,
        );
        assert_eq!(cfg.tmdb_api_key.as_deref(), Some("abc123"));
        assert_eq!(cfg.api_base_url, "http://localhost:9000/3");
        assert_eq!(cfg.top_rated_page_cap, 3);
        assert_eq!(cfg.poster_workers, 32);
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/flix"));
        assert_eq!(cfg.poster_size, DEFAULT_POSTER_SIZE);
    }

    #[test]
    fn unknown_key_names_and_zero_cap_are_ignored() {
        let cfg = parse_config(r#"{ "api_key": "k", "top_rated_page_cap": 0 }"#);
        assert_eq!(cfg.tmdb_api_key, None);
        assert_eq!(cfg.top_rated_page_cap, DEFAULT_TOP_RATED_PAGE_CAP);
    }

    #[test]
    fn poster_url_joins_size_and_path() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.poster_url("/abc.jpg").as_deref(),
            Some("https://image.tmdb.org/t/p/w342/abc.jpg")
        );
        assert_eq!(cfg.poster_url("  "), None);
    }
}
