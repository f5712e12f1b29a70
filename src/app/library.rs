// src/app/library.rs
//! Favorites, per-item ratings with a live comment, and the log of submitted
//! comments. All three are plain in-memory values; the controller decides
//! when they are written to the [`KeyValueStore`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::error::StoreError;
use super::store::KeyValueStore;

pub const FAVORITES_KEY: &str = "favorites";
pub const RATINGS_KEY: &str = "ratings";
pub const COMMENTS_KEY: &str = "comments";
pub const COMMENT_LOG_KEY: &str = "displayedComments";

pub const MAX_RATING: f32 = 5.0;

/// Snap to the nearest half star inside 0..=5. NaN becomes 0.
pub fn snap_rating(r: f32) -> f32 {
    if r.is_nan() {
        return 0.0;
    }
    ((r * 2.0).round() / 2.0).clamp(0.0, MAX_RATING)
}

// ---- favorites ----
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Favorites {
    ids: Vec<u64>,
}

impl Favorites {
    /// Keeps the first occurrence of each id.
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut out = Self::default();
        for id in ids {
            out.add(id);
        }
        out
    }

    pub fn is_favorite(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Appends `id`; false if it was already present.
    pub fn add(&mut self, id: u64) -> bool {
        if self.is_favorite(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&x| x != id);
        self.ids.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let had_any = !self.ids.is_empty();
        self.ids.clear();
        had_any
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---- ratings + live comment ----
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatingRecord {
    pub rating: f32,
    /// Text currently being edited; moves to the comment log on submit.
    pub comment: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ratings {
    records: BTreeMap<u64, RatingRecord>,
}

impl Ratings {
    pub fn get(&self, id: u64) -> Option<&RatingRecord> {
        self.records.get(&id)
    }

    pub fn rating(&self, id: u64) -> f32 {
        self.records.get(&id).map_or(0.0, |r| r.rating)
    }

    pub fn comment(&self, id: u64) -> &str {
        self.records.get(&id).map_or("", |r| r.comment.as_str())
    }

    /// Overwrites both fields at once.
    pub fn add_rating(&mut self, id: u64, rating: f32, comment: String) {
        self.records.insert(
            id,
            RatingRecord {
                rating: snap_rating(rating),
                comment,
            },
        );
    }

    pub fn set_rating(&mut self, id: u64, rating: f32) {
        let comment = self.comment(id).to_string();
        self.add_rating(id, rating, comment);
    }

    pub fn set_comment(&mut self, id: u64, text: String) {
        let rating = self.rating(id);
        self.add_rating(id, rating, text);
    }

    /// Hand back the live comment and leave it empty. Absent records stay absent.
    pub fn take_comment(&mut self, id: u64) -> String {
        self.records
            .get_mut(&id)
            .map(|r| std::mem::take(&mut r.comment))
            .unwrap_or_default()
    }

    pub fn remove(&mut self, id: u64) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Mean of every rating stored under `id`. There is one value per id, so
    /// this is that value, or `None` when the id has no record.
    pub fn average_rating(&self, id: u64) -> Option<f32> {
        let (total, count) = self
            .records
            .iter()
            .filter(|(key, _)| **key == id)
            .fold((0.0f32, 0usize), |(t, c), (_, r)| (t + r.rating, c + 1));
        (count > 0).then(|| total / count as f32)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn rating_map(&self) -> BTreeMap<u64, f32> {
        self.records.iter().map(|(&id, r)| (id, r.rating)).collect()
    }

    fn comment_map(&self) -> BTreeMap<u64, String> {
        self.records
            .iter()
            .map(|(&id, r)| (id, r.comment.clone()))
            .collect()
    }

    fn from_maps(ratings: BTreeMap<u64, f32>, comments: BTreeMap<u64, String>) -> Self {
        let mut out = Self::default();
        for (id, rating) in ratings {
            out.records.insert(
                id,
                RatingRecord {
                    rating: snap_rating(rating),
                    comment: String::new(),
                },
            );
        }
        for (id, comment) in comments {
            out.records.entry(id).or_default().comment = comment;
        }
        out
    }
}

// ---- submitted comments ----
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentLog {
    entries: BTreeMap<u64, Vec<String>>,
}

impl CommentLog {
    pub fn entries(&self, id: u64) -> &[String] {
        self.entries.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Insertion-ordered, never deduplicated.
    pub fn append(&mut self, id: u64, text: String) {
        self.entries.entry(id).or_default().push(text);
    }

    pub fn remove(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---- the three together ----
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    pub favorites: Favorites,
    pub ratings: Ratings,
    pub comment_log: CommentLog,
}

impl Library {
    /// Favorite `id` and start it at zero stars with an empty comment.
    /// Already-favorited ids are left exactly as they are.
    pub fn add_favorite(&mut self, id: u64) -> bool {
        if !self.favorites.add(id) {
            return false;
        }
        self.ratings.add_rating(id, 0.0, String::new());
        true
    }

    /// Un-favorite only; the rating record stays until explicitly deleted.
    pub fn remove_favorite(&mut self, id: u64) -> bool {
        self.favorites.remove(id)
    }

    pub fn clear_favorites(&mut self) -> bool {
        self.favorites.clear()
    }

    /// Move the live comment into the log (even when it is empty) and clear it.
    pub fn submit_comment(&mut self, id: u64) {
        let text = self.ratings.take_comment(id);
        self.comment_log.append(id, text);
    }

    /// Drop the rating, the live comment and the comment log for `id`.
    pub fn delete_rating_and_comment(&mut self, id: u64) -> bool {
        let had_rating = self.ratings.remove(id);
        let had_log = self.comment_log.remove(id);
        had_rating || had_log
    }

    /// Read every store key for `scope`. A key that is missing, unreadable or
    /// malformed yields the empty value for that store only; the problems are
    /// returned so the caller can surface them.
    pub fn load(store: &dyn KeyValueStore, scope: &str) -> (Self, Vec<StoreError>) {
        let mut problems = Vec::new();
        let favorite_ids: Vec<u64> = load_json(store, scope, FAVORITES_KEY, &mut problems);
        let ratings: BTreeMap<u64, f32> = load_json(store, scope, RATINGS_KEY, &mut problems);
        let comments: BTreeMap<u64, String> = load_json(store, scope, COMMENTS_KEY, &mut problems);
        let log: BTreeMap<u64, Vec<String>> =
            load_json(store, scope, COMMENT_LOG_KEY, &mut problems);

        let library = Self {
            favorites: Favorites::from_ids(favorite_ids),
            ratings: Ratings::from_maps(ratings, comments),
            comment_log: CommentLog { entries: log },
        };
        (library, problems)
    }

    pub fn save_favorites(&self, store: &mut dyn KeyValueStore, scope: &str) -> Result<(), StoreError> {
        save_json(store, scope, FAVORITES_KEY, &self.favorites.ids)
    }

    pub fn save_ratings(&self, store: &mut dyn KeyValueStore, scope: &str) -> Result<(), StoreError> {
        save_json(store, scope, RATINGS_KEY, &self.ratings.rating_map())?;
        save_json(store, scope, COMMENTS_KEY, &self.ratings.comment_map())
    }

    pub fn save_comment_log(&self, store: &mut dyn KeyValueStore, scope: &str) -> Result<(), StoreError> {
        save_json(store, scope, COMMENT_LOG_KEY, &self.comment_log.entries)
    }
}

fn load_json<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    scope: &str,
    key: &str,
    problems: &mut Vec<StoreError>,
) -> T {
    let raw = match store.get(scope, key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!("{scope}/{key}: {err}; starting empty");
            problems.push(err);
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("{scope}/{key}: unreadable value ({err}); starting empty");
            problems.push(StoreError::Decode {
                key: format!("{scope}/{key}"),
                message: err.to_string(),
            });
            T::default()
        }
    }
}

fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    scope: &str,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value).map_err(|e| StoreError::Backend(e.to_string()))?;
    store.set(scope, key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::{MemoryStore, SqliteStore};

    #[test]
    fn add_then_remove_keeps_the_rating() {
        let mut lib = Library::default();
        assert!(lib.add_favorite(12));
        lib.ratings.set_rating(12, 4.0);
        assert!(lib.remove_favorite(12));
        assert!(!lib.favorites.is_favorite(12));
        assert_eq!(lib.ratings.rating(12), 4.0);
    }

    #[test]
    fn adding_twice_does_not_reset_rating() {
        let mut lib = Library::default();
        lib.add_favorite(5);
        lib.ratings.add_rating(5, 3.5, "ok".into());
        assert!(!lib.add_favorite(5));
        assert_eq!(lib.favorites.ids(), &[5]);
        assert_eq!(
            lib.ratings.get(5),
            Some(&RatingRecord {
                rating: 3.5,
                comment: "ok".into()
            })
        );
    }

    #[test]
    fn adding_initializes_empty_record() {
        let mut lib = Library::default();
        lib.add_favorite(8);
        assert_eq!(lib.ratings.get(8), Some(&RatingRecord::default()));
    }

    #[test]
    fn single_field_updates_keep_the_other() {
        let mut r = Ratings::default();
        r.set_comment(1, "draft".into());
        r.set_rating(1, 2.5);
        assert_eq!(r.comment(1), "draft");
        r.set_comment(1, "final".into());
        assert_eq!(r.rating(1), 2.5);
    }

    #[test]
    fn ratings_snap_to_half_steps() {
        assert_eq!(snap_rating(3.3), 3.5);
        assert_eq!(snap_rating(3.2), 3.0);
        assert_eq!(snap_rating(9.0), 5.0);
        assert_eq!(snap_rating(-1.0), 0.0);
        assert_eq!(snap_rating(f32::NAN), 0.0);
    }

    #[test]
    fn submit_moves_comment_into_log() {
        let mut lib = Library::default();
        lib.add_favorite(3);
        lib.ratings.set_comment(3, "Great movie".into());
        lib.submit_comment(3);
        assert_eq!(lib.comment_log.entries(3), ["Great movie".to_string()]);
        assert_eq!(lib.ratings.comment(3), "");

        // Submitting again with the cleared field logs an empty entry.
        lib.submit_comment(3);
        assert_eq!(
            lib.comment_log.entries(3),
            ["Great movie".to_string(), String::new()]
        );
    }

    #[test]
    fn submit_without_record_does_not_create_one() {
        let mut lib = Library::default();
        lib.submit_comment(77);
        assert!(lib.ratings.get(77).is_none());
        assert_eq!(lib.comment_log.entries(77).len(), 1);
    }

    #[test]
    fn delete_only_touches_one_id() {
        let mut lib = Library::default();
        for id in [1, 2] {
            lib.add_favorite(id);
            lib.ratings.add_rating(id, 4.0, format!("c{id}"));
            lib.submit_comment(id);
        }
        assert!(lib.delete_rating_and_comment(1));
        assert!(lib.ratings.get(1).is_none());
        assert!(lib.comment_log.entries(1).is_empty());
        assert!(lib.favorites.is_favorite(1));
        assert_eq!(lib.ratings.rating(2), 4.0);
        assert_eq!(lib.comment_log.entries(2), ["c2".to_string()]);
        assert!(!lib.delete_rating_and_comment(1));
    }

    #[test]
    fn average_is_the_single_value_or_none() {
        let mut r = Ratings::default();
        assert_eq!(r.average_rating(4), None);
        r.set_rating(4, 3.5);
        r.set_rating(5, 1.0);
        assert_eq!(r.average_rating(4), Some(3.5));
    }

    #[test]
    fn favorites_dedupe_on_load_order() {
        let f = Favorites::from_ids([3, 1, 3, 2, 1]);
        assert_eq!(f.ids(), &[3, 1, 2]);
    }

    fn scenario() -> Library {
        let mut lib = Library::default();
        lib.add_favorite(12);
        lib.add_favorite(45);
        lib.ratings.remove(45);
        lib.ratings.add_rating(12, 3.5, "Great movie".into());
        lib.submit_comment(12);
        lib
    }

    fn save_all(lib: &Library, store: &mut dyn KeyValueStore) {
        lib.save_favorites(store, "movie").unwrap();
        lib.save_ratings(store, "movie").unwrap();
        lib.save_comment_log(store, "movie").unwrap();
    }

    #[test]
    fn round_trip_through_memory_store() {
        let lib = scenario();
        let mut store = MemoryStore::default();
        save_all(&lib, &mut store);

        assert_eq!(
            store.get("movie", FAVORITES_KEY).unwrap().as_deref(),
            Some("[12,45]")
        );
        assert_eq!(
            store.get("movie", RATINGS_KEY).unwrap().as_deref(),
            Some(r#"{"12":3.5}"#)
        );
        assert_eq!(
            store.get("movie", COMMENT_LOG_KEY).unwrap().as_deref(),
            Some(r#"{"12":["Great movie"]}"#)
        );

        let (loaded, problems) = Library::load(&store, "movie");
        assert!(problems.is_empty());
        assert_eq!(loaded, lib);
    }

    #[test]
    fn round_trip_through_sqlite_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let lib = scenario();
        {
            let mut store = SqliteStore::open(&path).unwrap();
            save_all(&lib, &mut store);
        }
        let store = SqliteStore::open(&path).unwrap();
        let (loaded, problems) = Library::load(&store, "movie");
        assert!(problems.is_empty());
        assert_eq!(loaded, lib);

        let (other, _) = Library::load(&store, "tv");
        assert_eq!(other, Library::default());
    }

    #[test]
    fn loads_values_written_by_the_web_client() {
        let mut store = MemoryStore::default();
        store.set("movie", FAVORITES_KEY, "[12,45]").unwrap();
        store.set("movie", RATINGS_KEY, r#"{"12":3.5}"#).unwrap();
        store
            .set("movie", COMMENT_LOG_KEY, r#"{"12":["Great movie"]}"#)
            .unwrap();

        let (lib, problems) = Library::load(&store, "movie");
        assert!(problems.is_empty());
        assert_eq!(lib.favorites.ids(), &[12, 45]);
        assert_eq!(lib.ratings.rating(12), 3.5);
        assert_eq!(lib.ratings.comment(12), "");
        assert_eq!(lib.comment_log.entries(12), ["Great movie".to_string()]);
    }

    #[test]
    fn malformed_value_only_resets_its_own_store() {
        let mut store = MemoryStore::default();
        store.set("movie", FAVORITES_KEY, "not json").unwrap();
        store.set("movie", RATINGS_KEY, r#"{"7":4}"#).unwrap();
        store.set("movie", COMMENT_LOG_KEY, r#"{"7":"oops"}"#).unwrap();

        let (lib, problems) = Library::load(&store, "movie");
        assert_eq!(problems.len(), 2);
        assert!(problems
            .iter()
            .all(|p| matches!(p, StoreError::Decode { .. })));
        assert!(lib.favorites.is_empty());
        assert!(lib.comment_log.is_empty());
        assert_eq!(lib.ratings.rating(7), 4.0);
    }
}
