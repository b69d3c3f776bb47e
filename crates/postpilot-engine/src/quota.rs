//! Quota resolution: entitlement plus publish-slot repair.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use postpilot_core::slots::repair_publish_times;
use postpilot_db::AutomationSettingsRow;

use crate::error::EngineError;

/// A user's effective daily quota with a repaired slot list.
#[derive(Debug, Clone)]
pub struct ResolvedQuota {
    /// Effective daily post count, always taken from the subscription —
    /// the settings row's own `posts_per_day` is advisory UI state.
    pub posts_per_day: usize,
    /// Publish times, guaranteed to have exactly `posts_per_day` entries.
    pub publish_times: Vec<String>,
    pub settings: AutomationSettingsRow,
}

/// Resolve a user's daily quota and slot list as of `today`.
///
/// Returns `None` (a no-op for the caller) when the user has no active
/// unexpired subscription, no settings row, or automation disabled. When
/// the configured `publish_times` length disagrees with the subscribed
/// quota, the list is repaired (truncated or padded from the fallback
/// sequence) and the correction persisted before returning, so the
/// invariant `len(publish_times) == quota` holds for every caller.
/// Idempotent and safe to call every tick.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if any query fails.
pub async fn resolve_quota(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Option<ResolvedQuota>, EngineError> {
    let Some(subscription) = postpilot_db::get_active_subscription(pool, user_id, today).await?
    else {
        return Ok(None);
    };

    let Some(settings) = postpilot_db::get_settings(pool, user_id).await? else {
        return Ok(None);
    };
    if !settings.enabled {
        return Ok(None);
    }

    let posts_per_day = usize::try_from(subscription.posts_per_day).unwrap_or(0).max(1);

    let publish_times = match repair_publish_times(&settings.publish_times, posts_per_day) {
        Some(repaired) => {
            tracing::info!(
                %user_id,
                configured = settings.publish_times.len(),
                quota = posts_per_day,
                "repairing publish-time list to match subscribed quota"
            );
            postpilot_db::update_publish_times(pool, user_id, &repaired).await?;
            repaired
        }
        None => settings.publish_times.clone(),
    };

    Ok(Some(ResolvedQuota {
        posts_per_day,
        publish_times,
        settings,
    }))
}
