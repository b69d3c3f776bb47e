//! Engagement sync for recently published posts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postpilot_core::metrics::performance_score;
use postpilot_db::SocialAccountRow;
use postpilot_social::SocialClient;

use crate::error::EngineError;
use crate::outcome::EngagementReport;

/// Refresh engagement counters for posts published in the lookback window.
///
/// For each `published` post with an external id since `now -
/// lookback_days`, fetches the platform's current counters and writes
/// them onto the post and its analytics record, recomputing the
/// performance score. Posts without metrics yet (platform 404) or without
/// a usable account are skipped, not failed; their next sync retries.
///
/// Per-post errors are logged and counted as skips so one bad post never
/// stalls the pass.
///
/// # Errors
///
/// Returns [`EngineError::Db`] only if the initial scan fails.
pub async fn run_engagement_sync(
    pool: &PgPool,
    social: &SocialClient,
    lookback_days: i64,
    now: DateTime<Utc>,
) -> Result<EngagementReport, EngineError> {
    let since = now - chrono::Duration::days(lookback_days);
    let posts = postpilot_db::list_recently_published(pool, since).await?;

    let mut report = EngagementReport::default();
    let mut accounts: HashMap<Uuid, Option<SocialAccountRow>> = HashMap::new();

    for post in posts {
        report.scanned += 1;

        let Some(external_id) = post.external_post_id.as_deref() else {
            report.skipped += 1;
            continue;
        };

        let account = match accounts.get(&post.user_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = match postpilot_db::get_social_account(pool, post.user_id).await {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::error!(post_id = post.id, user_id = %post.user_id, error = %e,
                            "account lookup failed during engagement sync");
                        report.skipped += 1;
                        continue;
                    }
                };
                accounts.insert(post.user_id, fetched.clone());
                fetched
            }
        };

        let Some(account) = account.filter(|a| !a.is_expired(now)) else {
            tracing::debug!(post_id = post.id, user_id = %post.user_id,
                "no usable account; skipping engagement fetch");
            report.skipped += 1;
            continue;
        };

        let engagement = match social
            .fetch_engagement(&account.access_token, external_id)
            .await
        {
            Ok(Some(e)) => e,
            Ok(None) => {
                // Metrics not available yet; normal right after publish.
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(post_id = post.id, external_id, error = %e,
                    "engagement fetch failed");
                report.skipped += 1;
                continue;
            }
        };

        let score = performance_score(
            engagement.likes,
            engagement.comments,
            engagement.shares,
            engagement.impressions,
        );

        let persist = async {
            postpilot_db::update_post_engagement(
                pool,
                post.id,
                engagement.likes,
                engagement.comments,
                engagement.shares,
                engagement.impressions,
            )
            .await?;
            postpilot_db::update_analytics_engagement(
                pool,
                post.id,
                engagement.likes,
                engagement.comments,
                engagement.shares,
                engagement.impressions,
                score,
            )
            .await
        };

        match persist.await {
            Ok(()) => report.updated += 1,
            Err(e) => {
                tracing::error!(post_id = post.id, error = %e,
                    "could not persist engagement counters");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        updated = report.updated,
        skipped = report.skipped,
        "engagement sync complete"
    );
    Ok(report)
}
