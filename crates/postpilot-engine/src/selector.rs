//! Anti-repetition topic selection.
//!
//! Chooses the next content theme while avoiding themes used in the most
//! recent posts, preferring historically under-used topics.

use postpilot_db::{RecentPostRow, TopicRow};

/// How many recent posts feed the usage statistics.
pub(crate) const RECENT_WINDOW: usize = 10;
/// How many of the newest posts form the exclusion set.
const EXCLUSION_WINDOW: usize = 3;

/// Select the next topic given the user's topics and their most recent
/// posts (newest first, topic names resolved).
///
/// Topics named in the [`EXCLUSION_WINDOW`] newest posts are excluded
/// unless that would empty the pool. Among the candidates, the least-used
/// topic over the [`RECENT_WINDOW`] wins; the sort is stable, so ties keep
/// the catalogue's original order.
///
/// Matching is by topic *name*; the catalogue enforces per-user name
/// uniqueness so this is unambiguous.
///
/// Returns `None` only when `topics` is empty.
#[must_use]
pub fn select_topic<'a>(topics: &'a [TopicRow], recent: &[RecentPostRow]) -> Option<&'a TopicRow> {
    if topics.is_empty() {
        return None;
    }

    let recent = &recent[..recent.len().min(RECENT_WINDOW)];

    let usage_count = |name: &str| -> usize {
        recent
            .iter()
            .filter(|p| p.topic_name.as_deref() == Some(name))
            .count()
    };

    let recently_used: Vec<&str> = recent
        .iter()
        .take(EXCLUSION_WINDOW)
        .filter_map(|p| p.topic_name.as_deref())
        .collect();

    let mut candidates: Vec<&TopicRow> = topics
        .iter()
        .filter(|t| !recently_used.contains(&t.name.as_str()))
        .collect();
    if candidates.is_empty() {
        candidates = topics.iter().collect();
    }

    candidates.sort_by_key(|t| usage_count(&t.name));
    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn topic(id: i64, name: &str) -> TopicRow {
        TopicRow {
            id,
            user_id: Uuid::nil(),
            name: name.to_string(),
            description: None,
            keywords: vec![],
            tone: "casual".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Newest first: index 0 is the most recent post.
    fn recent(names: &[&str]) -> Vec<RecentPostRow> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| RecentPostRow {
                id: i64::try_from(i).unwrap(),
                topic_name: Some((*name).to_string()),
                created_at: Utc::now() - Duration::minutes(i64::try_from(i).unwrap()),
            })
            .collect()
    }

    #[test]
    fn avoids_topics_from_the_three_newest_posts() {
        let topics = vec![topic(1, "A"), topic(2, "B"), topic(3, "C"), topic(4, "D")];
        // The 3 newest posts used A, B, C (in any order): D must win.
        for order in [["A", "B", "C"], ["C", "A", "B"], ["B", "C", "A"]] {
            let selected = select_topic(&topics, &recent(&order)).unwrap();
            assert_eq!(selected.name, "D", "recent order {order:?}");
        }
    }

    #[test]
    fn falls_back_to_all_topics_when_every_topic_is_recent() {
        let topics = vec![topic(1, "A"), topic(2, "B"), topic(3, "C")];
        // All three topics used in the last 3 posts; A was also used twice
        // in the older window, so the least-used of the full pool wins.
        let history = recent(&["A", "B", "C", "A"]);
        let selected = select_topic(&topics, &history).unwrap();
        assert_eq!(selected.name, "B");
    }

    #[test]
    fn prefers_least_used_candidate() {
        let topics = vec![topic(1, "A"), topic(2, "B"), topic(3, "C"), topic(4, "D")];
        // Newest 3 are A, B, A; candidates C and D. C appears twice in the
        // older history, D never — D wins.
        let history = recent(&["A", "B", "A", "C", "C"]);
        let selected = select_topic(&topics, &history).unwrap();
        assert_eq!(selected.name, "D");
    }

    #[test]
    fn ties_keep_catalogue_order() {
        let topics = vec![topic(1, "C"), topic(2, "D"), topic(3, "E")];
        // No usage at all: C, D, E all tie at zero; first in catalogue wins.
        let selected = select_topic(&topics, &[]).unwrap();
        assert_eq!(selected.name, "C");
    }

    #[test]
    fn single_topic_is_always_selected() {
        let topics = vec![topic(1, "A")];
        let selected = select_topic(&topics, &recent(&["A", "A", "A"])).unwrap();
        assert_eq!(selected.name, "A");
    }

    #[test]
    fn empty_catalogue_yields_none() {
        assert!(select_topic(&[], &recent(&["A"])).is_none());
    }

    #[test]
    fn deleted_topics_are_ignored_in_history() {
        let topics = vec![topic(1, "A"), topic(2, "B")];
        let mut history = recent(&["A", "B"]);
        // A post whose topic was deleted resolves to no name.
        history.insert(
            0,
            RecentPostRow {
                id: 99,
                topic_name: None,
                created_at: Utc::now(),
            },
        );
        // Newest 3: None, A, B — both topics excluded, fall back to all;
        // both used once, so catalogue order decides.
        let selected = select_topic(&topics, &history).unwrap();
        assert_eq!(selected.name, "A");
    }

    #[test]
    fn usage_counts_only_cover_the_recent_window() {
        let topics = vec![topic(1, "A"), topic(2, "B")];
        // 13 posts: newest 3 use neither A nor B directly... build: newest
        // 3 use "X" (not in catalogue), then 10 older posts all use A.
        // Only 7 of those A-posts fall inside the 10-post window.
        let names: Vec<&str> = std::iter::repeat("X")
            .take(3)
            .chain(std::iter::repeat("A").take(10))
            .collect();
        let selected = select_topic(&topics, &recent(&names)).unwrap();
        assert_eq!(selected.name, "B");
    }
}
