//! Database operations for the `generated_posts` table.
//!
//! Posts are created only by the generation orchestrator and transition
//! exactly once, `generated → published` or `generated → failed`, by the
//! publish dispatcher. The status updates here guard on
//! `status = 'generated'` so a terminal row can never be rewritten even if
//! a caller bypasses the [`postpilot_core::PostStatus`] state machine.

use chrono::{DateTime, NaiveDate, Utc};
use postpilot_core::PostStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `generated_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeneratedPostRow {
    pub id: i64,
    pub user_id: Uuid,
    pub topic_id: Option<i64>,
    pub content: String,
    pub image_url: Option<String>,
    pub hashtags: Vec<String>,
    pub scheduled_publish_time: String,
    pub status: String,
    pub created_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
    pub external_post_id: Option<String>,
    pub external_post_url: Option<String>,
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub impressions: i32,
}

/// Fields of a new post produced by the generation orchestrator.
#[derive(Debug, Clone)]
pub struct NewGeneratedPost {
    pub user_id: Uuid,
    pub topic_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub hashtags: Vec<String>,
    pub scheduled_publish_time: String,
    pub created_date: NaiveDate,
}

/// A recent post with its topic name resolved, for anti-repetition
/// selection. `topic_name` is `None` when the topic was deleted since.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentPostRow {
    pub id: i64,
    pub topic_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

const POST_COLUMNS: &str = "id, user_id, topic_id, content, image_url, hashtags, \
     scheduled_publish_time, status, created_date, created_at, posted_at, \
     external_post_id, external_post_url, likes, comments, shares, impressions";

/// Insert a freshly generated post (`status = 'generated'`) and return its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_generated_post(
    pool: &PgPool,
    post: &NewGeneratedPost,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO generated_posts \
             (user_id, topic_id, content, image_url, hashtags, \
              scheduled_publish_time, status, created_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(post.user_id)
    .bind(post.topic_id)
    .bind(&post.content)
    .bind(&post.image_url)
    .bind(&post.hashtags)
    .bind(&post.scheduled_publish_time)
    .bind(PostStatus::Generated.as_str())
    .bind(post.created_date)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Count the user's posts in the `date` bucket, regardless of status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_posts_created_on(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM generated_posts WHERE user_id = $1 AND created_date = $2",
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Slot times already booked by the user's posts in the `date` bucket.
///
/// Feeds the set-difference slot recomputation that makes generation
/// retry-safe after a partial batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_slot_times_used_on(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<String>, DbError> {
    let times = sqlx::query_scalar::<_, String>(
        "SELECT scheduled_publish_time FROM generated_posts \
         WHERE user_id = $1 AND created_date = $2 \
         ORDER BY scheduled_publish_time",
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(times)
}

/// The user's most recent posts, newest first, with topic names resolved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_posts_with_topic(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<RecentPostRow>, DbError> {
    let rows = sqlx::query_as::<_, RecentPostRow>(
        "SELECT p.id, t.name AS topic_name, p.created_at \
         FROM generated_posts p \
         LEFT JOIN topics t ON t.id = p.topic_id \
         WHERE p.user_id = $1 \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All posts still `generated` in the `date` bucket, across all users,
/// ordered by slot time then id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_generated_for_date(
    pool: &PgPool,
    date: NaiveDate,
) -> Result<Vec<GeneratedPostRow>, DbError> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM generated_posts \
         WHERE status = $1 AND created_date = $2 \
         ORDER BY scheduled_publish_time, id"
    );
    let rows = sqlx::query_as::<_, GeneratedPostRow>(&sql)
        .bind(PostStatus::Generated.as_str())
        .bind(date)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Posts published since `since`, for the engagement sync.
///
/// Rows can lack an external post id if an outside writer cleared it;
/// the sync skips those rather than this query hiding them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recently_published(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<GeneratedPostRow>, DbError> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM generated_posts \
         WHERE status = $1 AND posted_at >= $2 \
         ORDER BY posted_at DESC"
    );
    let rows = sqlx::query_as::<_, GeneratedPostRow>(&sql)
        .bind(PostStatus::Published.as_str())
        .bind(since)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Transition a post to `published`, recording the external id/url and
/// publish time.
///
/// The `status = 'generated'` guard makes terminal states immutable at
/// the SQL level; returns [`DbError::NotFound`] if the post was already
/// terminal (or does not exist).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] or [`DbError::Sqlx`].
pub async fn mark_post_published(
    pool: &PgPool,
    post_id: i64,
    external_post_id: &str,
    external_post_url: &str,
    posted_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE generated_posts \
         SET status = $5, external_post_id = $2, external_post_url = $3, \
             posted_at = $4 \
         WHERE id = $1 AND status = $6",
    )
    .bind(post_id)
    .bind(external_post_id)
    .bind(external_post_url)
    .bind(posted_at)
    .bind(PostStatus::Published.as_str())
    .bind(PostStatus::Generated.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Transition a post to `failed`. Same terminal-state guard as
/// [`mark_post_published`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] or [`DbError::Sqlx`].
pub async fn mark_post_failed(pool: &PgPool, post_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE generated_posts SET status = $2 WHERE id = $1 AND status = $3",
    )
    .bind(post_id)
    .bind(PostStatus::Failed.as_str())
    .bind(PostStatus::Generated.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replace a post's image URL after a successful asset-host upload.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_post_image_url(
    pool: &PgPool,
    post_id: i64,
    image_url: &str,
) -> Result<(), DbError> {
    sqlx::query("UPDATE generated_posts SET image_url = $2 WHERE id = $1")
        .bind(post_id)
        .bind(image_url)
        .execute(pool)
        .await?;

    Ok(())
}

/// Write the latest engagement counters onto a post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_post_engagement(
    pool: &PgPool,
    post_id: i64,
    likes: i32,
    comments: i32,
    shares: i32,
    impressions: i32,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE generated_posts \
         SET likes = $2, comments = $3, shares = $4, impressions = $5 \
         WHERE id = $1",
    )
    .bind(post_id)
    .bind(likes)
    .bind(comments)
    .bind(shares)
    .bind(impressions)
    .execute(pool)
    .await?;

    Ok(())
}
