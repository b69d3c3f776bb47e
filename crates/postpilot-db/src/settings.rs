//! Database operations for the `automation_settings` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `automation_settings` table.
///
/// `publish_times` is an ordered list of `HH:MM` slot strings. The quota
/// resolver repairs its length to match the subscribed daily quota before
/// any orchestration runs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AutomationSettingsRow {
    pub id: i64,
    pub user_id: Uuid,
    pub posts_per_day: i32,
    pub enabled: bool,
    pub content_creation_time: String,
    pub publish_times: Vec<String>,
    pub last_generation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch a user's automation settings, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_settings(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<AutomationSettingsRow>, DbError> {
    let row = sqlx::query_as::<_, AutomationSettingsRow>(
        "SELECT id, user_id, posts_per_day, enabled, content_creation_time, \
                publish_times, last_generation_date, created_at, updated_at \
         FROM automation_settings \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List all settings rows with automation enabled, oldest first.
///
/// The content tick walks this list sequentially each run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enabled_settings(pool: &PgPool) -> Result<Vec<AutomationSettingsRow>, DbError> {
    let rows = sqlx::query_as::<_, AutomationSettingsRow>(
        "SELECT id, user_id, posts_per_day, enabled, content_creation_time, \
                publish_times, last_generation_date, created_at, updated_at \
         FROM automation_settings \
         WHERE enabled \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Persist a repaired publish-time list.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user has no settings row, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_publish_times(
    pool: &PgPool,
    user_id: Uuid,
    publish_times: &[String],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE automation_settings \
         SET publish_times = $2, updated_at = NOW() \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(publish_times)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stamp the date of the last fully completed generation batch.
///
/// Written only after every remaining slot of the day has been produced.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the user has no settings row, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_last_generation_date(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE automation_settings \
         SET last_generation_date = $2, updated_at = NOW() \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(date)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Create or replace a user's automation settings.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_settings(
    pool: &PgPool,
    user_id: Uuid,
    posts_per_day: i32,
    enabled: bool,
    content_creation_time: &str,
    publish_times: &[String],
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO automation_settings \
             (user_id, posts_per_day, enabled, content_creation_time, publish_times) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_id) DO UPDATE SET \
             posts_per_day = EXCLUDED.posts_per_day, \
             enabled = EXCLUDED.enabled, \
             content_creation_time = EXCLUDED.content_creation_time, \
             publish_times = EXCLUDED.publish_times, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(posts_per_day)
    .bind(enabled)
    .bind(content_creation_time)
    .bind(publish_times)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
