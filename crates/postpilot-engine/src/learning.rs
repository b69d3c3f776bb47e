//! Learning loop: derive per-user style preferences from analytics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use postpilot_db::AnalyticsRow;

use crate::error::EngineError;
use crate::outcome::LearningOutcome;

/// How many of the newest analytics records each run samples.
const LEARNING_SAMPLE_SIZE: i64 = 50;
/// Minimum records before any preference is derived.
const MIN_ANALYTICS: usize = 3;

/// One hashtag's aggregate performance, serialised into the preferences
/// row's JSONB `top_hashtags` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagStat {
    pub tag: String,
    pub avg_engagement: f64,
    pub times_used: i32,
}

/// Style preferences derived from one analytics sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedPreferences {
    pub optimal_content_length: i32,
    pub best_performing_tone: String,
    pub top_hashtags: Vec<HashtagStat>,
    pub avg_sentence_length: f64,
    pub avg_emoji_count: f64,
    /// Size of the top-performer subset the shape averages came from.
    pub top_performers: usize,
}

/// Derive preferences from an analytics sample (newest first).
///
/// Returns `None` below [`MIN_ANALYTICS`] records. Otherwise the sample is
/// ranked by performance score and the top 30 percent (at least one) drive
/// the shape preferences: content length, tone, sentence length, and emoji
/// count. Hashtag statistics average over the whole sample so rarely-used
/// tags on top posts do not dominate.
///
/// Ties are broken deterministically: equal scores keep the sample's
/// recency order, and an equally-scoring tone keeps the first one seen.
#[must_use]
pub fn derive_preferences(sample: &[AnalyticsRow]) -> Option<LearnedPreferences> {
    if sample.len() < MIN_ANALYTICS {
        return None;
    }

    let mut ranked: Vec<&AnalyticsRow> = sample.iter().collect();
    ranked.sort_by(|a, b| b.performance_score.total_cmp(&a.performance_score));

    let top_n = (ranked.len() * 3 / 10).max(1);
    let top = &ranked[..top_n];

    #[allow(clippy::cast_precision_loss)]
    let mean = |f: &dyn Fn(&AnalyticsRow) -> f64| -> f64 {
        top.iter().map(|r| f(r)).sum::<f64>() / top.len() as f64
    };

    #[allow(clippy::cast_possible_truncation)]
    let optimal_content_length =
        (mean(&|r| f64::from(r.word_count)).round() as i32).max(1);

    // Insertion-ordered accumulation keeps tone tie-breaks stable.
    let mut tone_scores: Vec<(String, f64)> = Vec::new();
    for row in top {
        match tone_scores.iter_mut().find(|(t, _)| *t == row.tone) {
            Some((_, score)) => *score += row.performance_score,
            None => tone_scores.push((row.tone.clone(), row.performance_score)),
        }
    }
    let best_performing_tone = tone_scores
        .iter()
        .fold(None::<&(String, f64)>, |best, entry| match best {
            Some(b) if entry.1 <= b.1 => best,
            _ => Some(entry),
        })
        .map(|(tone, _)| tone.clone())?;

    // Hashtags are averaged over the whole sample, insertion-ordered.
    let mut tag_totals: Vec<(String, f64, i32)> = Vec::new();
    for row in sample {
        let row_engagement = row.performance_score;
        for tag in &row.hashtags {
            match tag_totals.iter_mut().find(|(t, _, _)| t == tag) {
                Some((_, sum, count)) => {
                    *sum += row_engagement;
                    *count += 1;
                }
                None => tag_totals.push((tag.clone(), row_engagement, 1)),
            }
        }
    }
    let mut top_hashtags: Vec<HashtagStat> = tag_totals
        .into_iter()
        .map(|(tag, sum, count)| HashtagStat {
            tag,
            avg_engagement: sum / f64::from(count),
            times_used: count,
        })
        .collect();
    top_hashtags.sort_by(|a, b| b.avg_engagement.total_cmp(&a.avg_engagement));
    top_hashtags.truncate(10);

    let avg_sentence_length =
        mean(&|r| f64::from(r.word_count) / f64::from(r.sentence_count.max(1)));
    let avg_emoji_count = mean(&|r| f64::from(r.emoji_count));

    Some(LearnedPreferences {
        optimal_content_length,
        best_performing_tone,
        top_hashtags,
        avg_sentence_length,
        avg_emoji_count,
        top_performers: top_n,
    })
}

/// Run the learning loop for one user as of `now`.
///
/// Samples the newest [`LEARNING_SAMPLE_SIZE`] analytics records,
/// derives preferences, and overwrites the user's preferences row. Below
/// the record minimum the row is left untouched and
/// [`LearningOutcome::InsufficientData`] is returned.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if a query or the upsert fails.
pub async fn run_learning(
    pool: &PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<LearningOutcome, EngineError> {
    let sample = postpilot_db::list_recent_analytics(pool, user_id, LEARNING_SAMPLE_SIZE).await?;
    let analyzed = sample.len();

    let Some(prefs) = derive_preferences(&sample) else {
        tracing::debug!(%user_id, analyzed, "not enough analytics to learn from");
        return Ok(LearningOutcome::InsufficientData { analyzed });
    };

    let top_hashtags = serde_json::to_value(&prefs.top_hashtags)
        .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));

    postpilot_db::upsert_user_preferences(
        pool,
        user_id,
        prefs.optimal_content_length,
        &prefs.best_performing_tone,
        &top_hashtags,
        prefs.avg_sentence_length,
        prefs.avg_emoji_count,
        now,
        i32::try_from(analyzed).unwrap_or(i32::MAX),
    )
    .await?;

    tracing::info!(
        %user_id,
        analyzed,
        top_performers = prefs.top_performers,
        tone = %prefs.best_performing_tone,
        "preferences updated"
    );
    Ok(LearningOutcome::Updated {
        analyzed,
        top_performers: prefs.top_performers,
    })
}
