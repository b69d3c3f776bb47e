use postpilot_core::topics_file::TopicsFile;
use sqlx::PgPool;

use crate::DbError;

/// Upsert topics from a seed file into the database.
///
/// Returns the number of topics processed (inserted or updated). All
/// upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_topics(pool: &PgPool, topics_file: &TopicsFile) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for user in &topics_file.users {
        for topic in &user.topics {
            sqlx::query(
                "INSERT INTO topics (user_id, name, description, keywords, tone) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (user_id, name) DO UPDATE SET \
                     description = EXCLUDED.description, \
                     keywords = EXCLUDED.keywords, \
                     tone = EXCLUDED.tone, \
                     updated_at = NOW()",
            )
            .bind(user.user_id)
            .bind(&topic.name)
            .bind(&topic.description)
            .bind(&topic.keywords)
            .bind(&topic.tone)
            .execute(&mut *tx)
            .await?;

            count += 1;
        }
    }

    tx.commit().await?;
    Ok(count)
}
