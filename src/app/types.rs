// src/app/types.rs
use serde::Deserialize;
use std::path::PathBuf;

use super::error::CatalogError;

// ---- catalog shape ----
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub const ALL: [Self; 2] = [Self::Movie, Self::Show];

    /// Storage scope and prefs value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "tv",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "movie" | "movies" => Some(Self::Movie),
            "tv" | "show" | "shows" => Some(Self::Show),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movies",
            Self::Show => "Shows",
        }
    }

    pub const fn collection_path(self, collection: Collection) -> &'static str {
        match (self, collection) {
            (Self::Movie, Collection::Popular) => "/movie/popular",
            (Self::Movie, Collection::Recent) => "/movie/now_playing",
            (Self::Movie, Collection::TopRated) => "/movie/top_rated",
            (Self::Show, Collection::Popular) => "/tv/popular",
            (Self::Show, Collection::Recent) => "/tv/on_the_air",
            (Self::Show, Collection::TopRated) => "/tv/top_rated",
        }
    }

    pub const fn search_path(self) -> &'static str {
        match self {
            Self::Movie => "/search/movie",
            Self::Show => "/search/tv",
        }
    }

    /// Map a raw API record onto the shared item shape. Movies carry
    /// `title`/`release_date`/`runtime`, shows `name`/`first_air_date`/
    /// `number_of_seasons`; either spelling is accepted as a fallback.
    /// Records without an id are dropped.
    pub fn normalize(self, raw: RawItem) -> Option<CatalogItem> {
        let id = raw.id?;
        let (title, date) = match self {
            Self::Movie => (
                raw.title.or(raw.name),
                raw.release_date.or(raw.first_air_date),
            ),
            Self::Show => (
                raw.name.or(raw.title),
                raw.first_air_date.or(raw.release_date),
            ),
        };
        let (runtime_minutes, season_count) = match self {
            Self::Movie => (raw.runtime, None),
            Self::Show => (None, raw.number_of_seasons),
        };
        Some(CatalogItem {
            id,
            title: title.unwrap_or_default(),
            poster_path: raw.poster_path.unwrap_or_default(),
            overview: raw.overview.unwrap_or_default(),
            release_date: date.unwrap_or_default(),
            rating_average: raw.vote_average.unwrap_or_default(),
            runtime_minutes,
            season_count,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Popular,
    Recent,
    TopRated,
}

impl Collection {
    pub const ALL: [Self; 3] = [Self::Popular, Self::Recent, Self::TopRated];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Recent => "recent",
            Self::TopRated => "top_rated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "popular" => Some(Self::Popular),
            "recent" => Some(Self::Recent),
            "top_rated" | "rated" => Some(Self::TopRated),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Popular => "Popular",
            Self::Recent => "Recent",
            Self::TopRated => "Top rated",
        }
    }

    /// Top rated walks every page; the other lists stop after page 1.
    pub const fn walks_all_pages(self) -> bool {
        matches!(self, Self::TopRated)
    }
}

// ---- core record ----
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub poster_path: String,
    pub overview: String,
    pub release_date: String,
    pub rating_average: f64,
    pub runtime_minutes: Option<u32>,
    pub season_count: Option<u32>,
}

impl CatalogItem {
    pub fn year(&self) -> Option<i32> {
        self.release_date.get(..4)?.parse().ok()
    }
}

// ---- wire format ----
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub runtime: Option<u32>,
    pub number_of_seasons: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPage {
    pub results: Vec<RawItem>,
    pub total_pages: Option<u32>,
}

// ---- cross-thread messages ----
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchRequest {
    Collection(Collection),
    Search(String),
}

impl FetchRequest {
    pub fn describe(&self) -> String {
        match self {
            Self::Collection(c) => c.label().to_string(),
            Self::Search(q) => format!("search \"{q}\""),
        }
    }
}

#[derive(Debug)]
pub struct FetchMsg {
    pub kind: MediaKind,
    pub generation: u64,
    pub request: FetchRequest,
    pub result: Result<Vec<CatalogItem>, CatalogError>,
}

pub struct PosterDone {
    pub key: String,
    pub result: Result<PathBuf, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PosterState {
    Pending, // queued or downloading
    Cached,  // file present on disk (ready to upload)
    Ready,   // texture uploaded
    Failed,  // permanent failure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_show_fields() {
        let raw: RawItem = serde_json::from_str(
            r#"{"id": 7, "name": "Dark", "first_air_date": "2017-12-01",
                "vote_average": 8.4, "number_of_seasons": 3, "poster_path": null}"#,
        )
        .unwrap();
        let item = MediaKind::Show.normalize(raw).unwrap();
        assert_eq!(item.title, "Dark");
        assert_eq!(item.release_date, "2017-12-01");
        assert_eq!(item.season_count, Some(3));
        assert_eq!(item.runtime_minutes, None);
        assert_eq!(item.poster_path, "");
        assert_eq!(item.year(), Some(2017));
    }

    #[test]
    fn tolerates_missing_fields_but_needs_an_id() {
        let raw: RawItem = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        let item = MediaKind::Movie.normalize(raw).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.rating_average, 0.0);
        assert_eq!(item.year(), None);

        let raw: RawItem = serde_json::from_str(r#"{"title": "No id"}"#).unwrap();
        assert!(MediaKind::Movie.normalize(raw).is_none());
    }

    #[test]
    fn page_without_results_decodes_empty() {
        let page: RawPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn endpoints_per_kind() {
        assert_eq!(
            MediaKind::Show.collection_path(Collection::Recent),
            "/tv/on_the_air"
        );
        assert_eq!(
            MediaKind::Movie.collection_path(Collection::Recent),
            "/movie/now_playing"
        );
        assert_eq!(MediaKind::from_str("tv"), Some(MediaKind::Show));
        assert_eq!(Collection::from_str("rated"), Some(Collection::TopRated));
    }
}
