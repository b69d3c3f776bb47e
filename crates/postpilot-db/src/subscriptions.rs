//! Database operations for the `subscriptions` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: i64,
    pub user_id: Uuid,
    pub posts_per_day: i32,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch the user's active, unexpired subscription as of `today`.
///
/// Entitlement source of truth: `posts_per_day` from this row always
/// overrides the advisory value stored on automation settings. Returns
/// `None` when the user has no subscription with `status = 'active'`
/// whose `end_date` has not passed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_active_subscription(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Option<SubscriptionRow>, DbError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(
        "SELECT id, user_id, posts_per_day, status, start_date, end_date, \
                created_at, updated_at \
         FROM subscriptions \
         WHERE user_id = $1 AND status = 'active' AND end_date >= $2 \
         ORDER BY end_date DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(today)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a subscription row and return its generated id.
///
/// Used by operator tooling; subscription lifecycle transitions (admin
/// verification, expiry) belong to the external billing system.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_subscription(
    pool: &PgPool,
    user_id: Uuid,
    posts_per_day: i32,
    status: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO subscriptions (user_id, posts_per_day, status, start_date, end_date) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id",
    )
    .bind(user_id)
    .bind(posts_per_day)
    .bind(status)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
