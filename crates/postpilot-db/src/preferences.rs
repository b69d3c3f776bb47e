//! Database operations for the `user_preferences` table.
//!
//! Read by the generation orchestrator, written only by the learning loop.
//! Rows are created lazily: a user without one gets the column defaults.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `user_preferences` table.
///
/// `top_hashtags` is a JSONB array of
/// `{"tag": .., "avg_engagement": .., "times_used": ..}` objects.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserPreferencesRow {
    pub id: i64,
    pub user_id: Uuid,
    pub optimal_content_length: i32,
    pub best_performing_tone: String,
    pub top_hashtags: Value,
    pub avg_sentence_length: f64,
    pub avg_emoji_count: f64,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub total_posts_analyzed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch a user's learned preferences, if any have been derived yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_preferences(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserPreferencesRow>, DbError> {
    let row = sqlx::query_as::<_, UserPreferencesRow>(
        "SELECT id, user_id, optimal_content_length, best_performing_tone, \
                top_hashtags, avg_sentence_length, avg_emoji_count, \
                last_analyzed, total_posts_analyzed, created_at, updated_at \
         FROM user_preferences \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Overwrite (or create) a user's learned preferences.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_user_preferences(
    pool: &PgPool,
    user_id: Uuid,
    optimal_content_length: i32,
    best_performing_tone: &str,
    top_hashtags: &Value,
    avg_sentence_length: f64,
    avg_emoji_count: f64,
    last_analyzed: DateTime<Utc>,
    total_posts_analyzed: i32,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO user_preferences \
             (user_id, optimal_content_length, best_performing_tone, top_hashtags, \
              avg_sentence_length, avg_emoji_count, last_analyzed, total_posts_analyzed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (user_id) DO UPDATE SET \
             optimal_content_length = EXCLUDED.optimal_content_length, \
             best_performing_tone = EXCLUDED.best_performing_tone, \
             top_hashtags = EXCLUDED.top_hashtags, \
             avg_sentence_length = EXCLUDED.avg_sentence_length, \
             avg_emoji_count = EXCLUDED.avg_emoji_count, \
             last_analyzed = EXCLUDED.last_analyzed, \
             total_posts_analyzed = EXCLUDED.total_posts_analyzed, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(optimal_content_length)
    .bind(best_performing_tone)
    .bind(top_hashtags)
    .bind(avg_sentence_length)
    .bind(avg_emoji_count)
    .bind(last_analyzed)
    .bind(total_posts_analyzed)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
