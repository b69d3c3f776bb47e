//! Database operations for the `social_accounts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `social_accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SocialAccountRow {
    pub id: i64,
    pub user_id: Uuid,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialAccountRow {
    /// Whether the stored token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Fetch the user's connected publishing account, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_social_account(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<SocialAccountRow>, DbError> {
    let row = sqlx::query_as::<_, SocialAccountRow>(
        "SELECT id, user_id, access_token, expires_at, created_at, updated_at \
         FROM social_accounts \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Store or replace the user's publishing-account credentials.
///
/// Token refresh is driven by the external account-linking flow; the core
/// only reads, except through this operator entry point.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_social_account(
    pool: &PgPool,
    user_id: Uuid,
    access_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO social_accounts (user_id, access_token, expires_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id) DO UPDATE SET \
             access_token = EXCLUDED.access_token, \
             expires_at = EXCLUDED.expires_at, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(access_token)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn account(expires_at: DateTime<Utc>) -> SocialAccountRow {
        SocialAccountRow {
            id: 1,
            user_id: Uuid::new_v4(),
            access_token: "token".to_string(),
            expires_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(account(now).is_expired(now));
        assert!(account(now - chrono::Duration::seconds(1)).is_expired(now));
        assert!(!account(now + chrono::Duration::seconds(1)).is_expired(now));
    }
}
