//! Free-text matching for the feed `query` filter.
//!
//! A field matches when it contains the query as a case-insensitive substring
//! or when its trigram similarity with the query reaches [`SIMILARITY_FLOOR`].
//! Either strategy alone is enough.

use std::collections::HashSet;

use crate::models::ContentItem;

/// Minimum trigram similarity for a fuzzy match
pub const SIMILARITY_FLOOR: f64 = 0.1;

/// Trigram set of `text`, built like Postgres `pg_trgm`: lowercase words of
/// alphanumeric characters, each padded with two leading and one trailing blank.
fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let mut grams = HashSet::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            grams.insert([window[0], window[1], window[2]]);
        }
    }

    grams
}

/// Jaccard similarity of the trigram sets of `a` and `b`, in `[0, 1]`.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;

    shared as f64 / union as f64
}

fn field_matches(field: &str, needle_lower: &str, query: &str) -> bool {
    field.to_lowercase().contains(needle_lower)
        || trigram_similarity(field, query) >= SIMILARITY_FLOOR
}

/// Whether `item` matches `query` in its title, summary, content, location or tags.
/// A blank query matches everything.
pub fn matches_query(item: &ContentItem, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();

    [
        Some(item.title.as_str()),
        Some(item.summary.as_str()),
        Some(item.content.as_str()),
        item.location_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(item.tags.iter().map(String::as_str))
    .any(|field| field_matches(field, &needle, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicationState;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(title: &str, tags: &[&str]) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: title.to_string(),
            summary: String::new(),
            content: String::new(),
            location_name: None,
            latitude: None,
            longitude: None,
            status: PublicationState::Published,
            is_approved: true,
            category: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
            like_count: 0,
            read_count: 0,
        }
    }

    #[test]
    fn test_identical_strings_have_similarity_one() {
        assert!((trigram_similarity("Galata", "galata") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_strings_have_low_similarity() {
        assert!(trigram_similarity("cappadocia", "xyz") < SIMILARITY_FLOOR);
        assert_eq!(trigram_similarity("", "anything"), 0.0);
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let post = item("Sunset over the Bosphorus", &[]);
        assert!(matches_query(&post, "bosphorus"));
    }

    #[test]
    fn test_fuzzy_match_catches_typos() {
        let post = item("Cappadocia balloons", &[]);
        // not a substring, but shares most trigrams
        assert!(matches_query(&post, "capadocia"));
    }

    #[test]
    fn test_tags_are_searched() {
        let post = item("Day trip", &["street-food"]);
        assert!(matches_query(&post, "street-food"));
        assert!(!matches_query(&post, "zzzz"));
    }

    #[test]
    fn test_blank_query_matches_everything() {
        assert!(matches_query(&item("anything", &[]), "   "));
    }
}
