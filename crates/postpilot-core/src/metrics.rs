//! Content-shape metrics and the performance score.
//!
//! These feed the analytics rows written at generation time and the
//! engagement-weighted score used by the learning loop to rank posts.

use std::sync::OnceLock;

use regex::Regex;

/// Shape metrics of a single piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMetrics {
    pub word_count: i32,
    pub sentence_count: i32,
    pub emoji_count: i32,
    pub hashtag_count: i32,
}

fn emoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Pictographs, transport, supplemental symbols, misc symbols and
        // dingbats. Intentionally excludes digits and '#', which carry the
        // Unicode Emoji property but are not emoji in post copy.
        Regex::new(r"[\x{1F300}-\x{1FAFF}\x{2600}-\x{27BF}\x{2190}-\x{21FF}\x{2B00}-\x{2BFF}]")
            .expect("emoji regex is valid")
    })
}

/// Compute shape metrics for `content` with its attached hashtag list.
///
/// Sentences are maximal non-empty runs between `.`, `!`, or `?`
/// terminators; content with no terminator counts as one sentence.
#[must_use]
pub fn content_metrics(content: &str, hashtags: &[String]) -> ContentMetrics {
    let word_count = i32::try_from(content.split_whitespace().count()).unwrap_or(i32::MAX);

    let sentence_count = content
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let sentence_count = i32::try_from(sentence_count.max(usize::from(word_count > 0)))
        .unwrap_or(i32::MAX);

    let emoji_count =
        i32::try_from(emoji_regex().find_iter(content).count()).unwrap_or(i32::MAX);
    let hashtag_count = i32::try_from(hashtags.len()).unwrap_or(i32::MAX);

    ContentMetrics {
        word_count,
        sentence_count,
        emoji_count,
        hashtag_count,
    }
}

/// Engagement-weighted performance score.
///
/// Shares signal the strongest endorsement, comments the next, likes the
/// weakest; impressions contribute marginally so reach alone cannot beat
/// interaction.
#[must_use]
pub fn performance_score(likes: i32, comments: i32, shares: i32, impressions: i32) -> f64 {
    f64::from(likes) + 2.0 * f64::from(comments) + 3.0 * f64::from(shares)
        + f64::from(impressions) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn counts_words_and_sentences() {
        let m = content_metrics("Ship early. Ship often! Why not?", &[]);
        assert_eq!(m.word_count, 6);
        assert_eq!(m.sentence_count, 3);
    }

    #[test]
    fn unterminated_content_is_one_sentence() {
        let m = content_metrics("no terminator here", &[]);
        assert_eq!(m.sentence_count, 1);
    }

    #[test]
    fn empty_content_has_zero_metrics() {
        let m = content_metrics("", &[]);
        assert_eq!(m.word_count, 0);
        assert_eq!(m.sentence_count, 0);
        assert_eq!(m.emoji_count, 0);
    }

    #[test]
    fn counts_emoji_but_not_hash_signs() {
        let m = content_metrics("Launch day 🚀🎉 #launch", &[]);
        assert_eq!(m.emoji_count, 2);
    }

    #[test]
    fn hashtag_count_comes_from_the_list() {
        let m = content_metrics("text", &tags(&["#a", "#b", "#c"]));
        assert_eq!(m.hashtag_count, 3);
    }

    #[test]
    fn score_weights_shares_over_comments_over_likes() {
        assert!(performance_score(0, 0, 1, 0) > performance_score(0, 1, 0, 0));
        assert!(performance_score(0, 1, 0, 0) > performance_score(1, 0, 0, 0));
    }

    #[test]
    fn score_is_the_documented_weighted_sum() {
        let score = performance_score(10, 5, 2, 300);
        assert!((score - (10.0 + 10.0 + 6.0 + 3.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn impressions_alone_barely_move_the_score() {
        assert!(performance_score(1, 0, 0, 0) > performance_score(0, 0, 0, 99));
    }
}
