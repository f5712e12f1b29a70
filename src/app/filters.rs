// src/app/filters.rs
use super::types::CatalogItem;

/// The three free-text filter inputs, kept as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub title_query: String,
    pub year_query: String,
    pub min_rating: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.title_query.is_empty() && self.year_query.is_empty() && self.min_rating.is_empty()
    }

    /// An item passes when every non-empty predicate passes.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.title_matches(item) && self.year_matches(item) && self.rating_matches(item)
    }

    fn title_matches(&self, item: &CatalogItem) -> bool {
        self.title_query.is_empty()
            || item
                .title
                .to_lowercase()
                .contains(&self.title_query.to_lowercase())
    }

    fn year_matches(&self, item: &CatalogItem) -> bool {
        self.year_query.is_empty() || item.release_date.starts_with(&self.year_query)
    }

    fn rating_matches(&self, item: &CatalogItem) -> bool {
        parse_rating_threshold(&self.min_rating).is_none_or(|min| item.rating_average >= min)
    }
}

/// Order-preserving subset of `items` that passes `filter`.
pub fn apply_filters(items: &[CatalogItem], filter: &FilterState) -> Vec<CatalogItem> {
    items.iter().filter(|i| filter.matches(i)).cloned().collect()
}

/// Read the longest leading decimal number, exponent included, the way a
/// browser's `parseFloat` does (`"7.5+"` → 7.5, `"1e3"` → 1000). Empty or
/// non-numeric input means "no constraint".
pub fn parse_rating_threshold(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits = bytes[exp_end..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 {
            end = exp_end + digits;
        }
    }
    s[..end].trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::catalog::tests::item;

    fn sample() -> Vec<CatalogItem> {
        vec![
            item(1, "The Godfather", "1972-03-14", 8.7),
            item(2, "Spirited Away", "2001-07-20", 8.5),
            item(3, "The Dark Knight", "2008-07-16", 8.5),
            item(4, "Godzilla", "2014-05-14", 6.3),
            item(5, "Untitled", "", 0.0),
        ]
    }

    fn ids(items: &[CatalogItem]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn empty_filter_returns_input_unchanged() {
        let items = sample();
        assert_eq!(apply_filters(&items, &FilterState::default()), items);
    }

    #[test]
    fn title_is_case_insensitive_substring() {
        let f = FilterState {
            title_query: "GOD".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&sample(), &f)), vec![1, 4]);
    }

    #[test]
    fn year_is_verbatim_prefix() {
        let f = FilterState {
            year_query: "200".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&sample(), &f)), vec![2, 3]);

        let f = FilterState {
            year_query: "2001-07".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&sample(), &f)), vec![2]);
    }

    #[test]
    fn rating_is_inclusive_minimum() {
        let f = FilterState {
            min_rating: "8.5".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&sample(), &f)), vec![1, 2, 3]);
    }

    #[test]
    fn non_numeric_rating_never_filters() {
        let f = FilterState {
            min_rating: "great".into(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&sample(), &f).len(), 5);
    }

    #[test]
    fn predicates_combine_with_and() {
        let f = FilterState {
            title_query: "the".into(),
            year_query: "19".into(),
            min_rating: "8".into(),
        };
        assert_eq!(ids(&apply_filters(&sample(), &f)), vec![1]);
    }

    #[test]
    fn filtering_is_idempotent_and_keeps_order() {
        let filters = [
            FilterState::default(),
            FilterState {
                title_query: "a".into(),
                ..Default::default()
            },
            FilterState {
                year_query: "20".into(),
                min_rating: "6".into(),
                ..Default::default()
            },
        ];
        let items = sample();
        for f in &filters {
            let once = apply_filters(&items, f);
            assert_eq!(apply_filters(&once, f), once);
            let positions: Vec<usize> = once
                .iter()
                .map(|i| items.iter().position(|x| x.id == i.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn threshold_parsing_follows_leading_number() {
        assert_eq!(parse_rating_threshold(""), None);
        assert_eq!(parse_rating_threshold("abc"), None);
        assert_eq!(parse_rating_threshold("."), None);
        assert_eq!(parse_rating_threshold("7"), Some(7.0));
        assert_eq!(parse_rating_threshold(" 7.5+"), Some(7.5));
        assert_eq!(parse_rating_threshold("6."), Some(6.0));
        assert_eq!(parse_rating_threshold("-1"), Some(-1.0));
        assert_eq!(parse_rating_threshold("1.2.3"), Some(1.2));
    }

    #[test]
    fn threshold_parsing_reads_exponents() {
        assert_eq!(parse_rating_threshold("1e3"), Some(1000.0));
        assert_eq!(parse_rating_threshold("7.5E-1"), Some(0.75));
        assert_eq!(parse_rating_threshold("6.e1"), Some(60.0));
        assert_eq!(parse_rating_threshold("2e+1x"), Some(20.0));
        assert_eq!(parse_rating_threshold("8e"), Some(8.0));
        assert_eq!(parse_rating_threshold("8e-"), Some(8.0));
    }
}
