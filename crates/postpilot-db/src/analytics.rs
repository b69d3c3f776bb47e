//! Database operations for the `post_analytics` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `post_analytics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalyticsRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Uuid,
    pub word_count: i32,
    pub sentence_count: i32,
    pub emoji_count: i32,
    pub hashtag_count: i32,
    pub hashtags: Vec<String>,
    pub tone: String,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub impressions: i32,
    pub performance_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Fields of a new analytics record emitted at generation time.
///
/// Engagement counters start at zero; the engagement sync fills them in
/// after publication.
#[derive(Debug, Clone)]
pub struct NewPostAnalytics {
    pub post_id: i64,
    pub user_id: Uuid,
    pub word_count: i32,
    pub sentence_count: i32,
    pub emoji_count: i32,
    pub hashtag_count: i32,
    pub hashtags: Vec<String>,
    pub tone: String,
}

/// Insert an analytics record for a freshly generated post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post_analytics(
    pool: &PgPool,
    analytics: &NewPostAnalytics,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO post_analytics \
             (post_id, user_id, word_count, sentence_count, emoji_count, \
              hashtag_count, hashtags, tone) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(analytics.post_id)
    .bind(analytics.user_id)
    .bind(analytics.word_count)
    .bind(analytics.sentence_count)
    .bind(analytics.emoji_count)
    .bind(analytics.hashtag_count)
    .bind(&analytics.hashtags)
    .bind(&analytics.tone)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Write fresh engagement counters and the recomputed performance score
/// onto a post's analytics record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_analytics_engagement(
    pool: &PgPool,
    post_id: i64,
    likes: i32,
    comments: i32,
    shares: i32,
    impressions: i32,
    performance_score: f64,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE post_analytics \
         SET likes = $2, comments = $3, shares = $4, impressions = $5, \
             performance_score = $6 \
         WHERE post_id = $1",
    )
    .bind(post_id)
    .bind(likes)
    .bind(comments)
    .bind(shares)
    .bind(impressions)
    .bind(performance_score)
    .execute(pool)
    .await?;

    Ok(())
}

/// The user's most recent analytics records, newest first.
///
/// The learning loop samples from here; `limit` caps the window it
/// considers.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_analytics(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<AnalyticsRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalyticsRow>(
        "SELECT id, post_id, user_id, word_count, sentence_count, emoji_count, \
                hashtag_count, hashtags, tone, likes, comments, shares, impressions, \
                performance_score, created_at \
         FROM post_analytics \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Users with analytics whose preferences have not been re-derived since
/// `cutoff` (or ever).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_users_due_learning(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Uuid>, DbError> {
    let users = sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT a.user_id \
         FROM post_analytics a \
         LEFT JOIN user_preferences p ON p.user_id = a.user_id \
         WHERE p.last_analyzed IS NULL OR p.last_analyzed < $1 \
         ORDER BY a.user_id",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(users)
}
