//! Catch-up publish dispatch.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postpilot_core::slots::is_due;
use postpilot_db::SocialAccountRow;
use postpilot_social::SocialClient;

use crate::error::EngineError;
use crate::outcome::DispatchReport;

/// Publish every post in today's bucket whose slot time has passed.
///
/// Scans `status = 'generated'` rows for `today` across all owners and
/// publishes the ones whose `scheduled_publish_time` is at or before
/// `now_hhmm`, in slot order. Catch-up semantics: a post missed by a
/// stalled tick is picked up by the next tick rather than dropped.
///
/// Each post transitions exactly once. Successful publishes go to
/// `published` with the platform's id and permalink; a publish error, a
/// missing account, or an expired token goes to `failed`. Per-post
/// failures are logged and counted, never propagated, so one owner's bad
/// token cannot block another owner's due posts.
///
/// # Errors
///
/// Returns [`EngineError::Db`] only if the initial due-post scan fails.
pub async fn run_publish_tick(
    pool: &PgPool,
    social: &SocialClient,
    today: NaiveDate,
    now_hhmm: &str,
    now: DateTime<Utc>,
) -> Result<DispatchReport, EngineError> {
    let pending = postpilot_db::list_generated_for_date(pool, today).await?;

    let mut report = DispatchReport::default();
    // One account lookup per owner per tick, not per post.
    let mut accounts: HashMap<Uuid, Option<SocialAccountRow>> = HashMap::new();

    for post in pending {
        if !is_due(&post.scheduled_publish_time, now_hhmm) {
            continue;
        }
        report.due += 1;

        let account = match accounts.get(&post.user_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = match postpilot_db::get_social_account(pool, post.user_id).await {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::error!(post_id = post.id, user_id = %post.user_id, error = %e,
                            "account lookup failed; leaving post for the next tick");
                        continue;
                    }
                };
                accounts.insert(post.user_id, fetched.clone());
                fetched
            }
        };

        let usable = match &account {
            None => {
                tracing::warn!(post_id = post.id, user_id = %post.user_id,
                    "no publishing account; failing due post");
                None
            }
            Some(a) if a.is_expired(now) => {
                tracing::warn!(post_id = post.id, user_id = %post.user_id,
                    "publishing account expired; failing due post");
                None
            }
            Some(a) => Some(a),
        };

        let Some(account) = usable else {
            fail_post(pool, post.id, &mut report).await;
            continue;
        };

        match social
            .publish(
                &account.access_token,
                &post.content,
                post.image_url.as_deref(),
                &post.hashtags,
            )
            .await
        {
            Ok(published) => {
                match postpilot_db::mark_post_published(
                    pool,
                    post.id,
                    &published.id,
                    &published.permalink,
                    now,
                )
                .await
                {
                    Ok(()) => {
                        report.published += 1;
                        tracing::info!(post_id = post.id, user_id = %post.user_id,
                            external_id = %published.id, "post published");
                    }
                    Err(e) => {
                        // Published upstream but the row would not move;
                        // most likely a concurrent tick got there first.
                        tracing::error!(post_id = post.id, error = %e,
                            "published but could not record the transition");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(post_id = post.id, user_id = %post.user_id, error = %e,
                    "publish failed; marking post failed");
                fail_post(pool, post.id, &mut report).await;
            }
        }
    }

    tracing::info!(
        due = report.due,
        published = report.published,
        failed = report.failed,
        "publish tick complete"
    );
    Ok(report)
}

async fn fail_post(pool: &PgPool, post_id: i64, report: &mut DispatchReport) {
    match postpilot_db::mark_post_failed(pool, post_id).await {
        Ok(()) => report.failed += 1,
        Err(e) => {
            tracing::error!(post_id, error = %e, "could not mark post failed");
        }
    }
}
