//! Daily batch generation for one owner.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postpilot_core::metrics::content_metrics;
use postpilot_core::slots::remaining_slots;
use postpilot_db::{NewGeneratedPost, NewPostAnalytics, TopicRow, UserPreferencesRow};
use postpilot_producer::{
    AssetHostClient, GenerationRequest, Pacer, ProducerClient, TopicSpec,
};

use crate::error::EngineError;
use crate::outcome::{GenerationOutcome, SkipReason};
use crate::quota::resolve_quota;
use crate::selector::{select_topic, RECENT_WINDOW};

/// External collaborators and policy for a generation cycle.
pub struct GenerationDeps<'a> {
    pub producer: &'a ProducerClient,
    /// Absent when no asset host is configured; producer URLs are then
    /// stored as-is.
    pub assets: Option<&'a AssetHostClient>,
    pub pacer: &'a Pacer,
    /// Per-slot failure isolation; see `run_generation_cycle`.
    pub isolate_slot_failures: bool,
}

/// Generate the remainder of today's batch for one owner.
///
/// Precondition checks run in order, each a fast-fail no-op: active
/// subscription, settings enabled, quota/slot reconciliation, daily count
/// under quota. The slots to produce are the *set difference* between the
/// configured publish times and the times already booked today, so a rerun
/// after a partial batch picks up exactly the missing slots and the
/// operation is eventually idempotent.
///
/// Missing hard preconditions — no connected, unexpired publishing account
/// or an empty topic catalogue — are errors, not skips.
///
/// With `isolate_slot_failures` unset (the default), the first slot
/// failure aborts the rest of the batch and the error propagates;
/// already-created posts are kept and the next tick retries the rest.
/// When set, each slot failure is logged and the remaining slots still
/// run, yielding a `Partial` outcome.
///
/// `last_generation_date` is stamped only once every configured slot for
/// `today` has a post.
///
/// # Errors
///
/// [`EngineError::NoPublishingAccount`] / [`EngineError::AccountExpired`] /
/// [`EngineError::NoTopics`] on hard preconditions, otherwise the first
/// producer or database error of the batch (default mode only).
pub async fn run_generation_cycle(
    pool: &PgPool,
    deps: &GenerationDeps<'_>,
    user_id: Uuid,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<GenerationOutcome, EngineError> {
    let Some(quota) = resolve_quota(pool, user_id, today).await? else {
        // Distinguishing the two skip causes needs a second settings read;
        // the report only cares that nothing was generated and why not at
        // a coarse level.
        let skipped = match postpilot_db::get_settings(pool, user_id).await? {
            Some(s) if !s.enabled => SkipReason::AutomationDisabled,
            _ => SkipReason::NoActiveSubscription,
        };
        return Ok(GenerationOutcome::Skipped { reason: skipped });
    };

    let created_today = postpilot_db::count_posts_created_on(pool, user_id, today).await?;
    if usize::try_from(created_today).unwrap_or(usize::MAX) >= quota.posts_per_day {
        return Ok(GenerationOutcome::Skipped {
            reason: SkipReason::QuotaMet,
        });
    }

    let used = postpilot_db::list_slot_times_used_on(pool, user_id, today).await?;
    let slots = remaining_slots(&quota.publish_times, &used);
    if slots.is_empty() {
        // Quota not met but every configured slot is booked; nothing to do.
        return Ok(GenerationOutcome::Skipped {
            reason: SkipReason::QuotaMet,
        });
    }

    // Hard preconditions: generating content that can never publish, or
    // without any theme to draw from, is a configuration error.
    match postpilot_db::get_social_account(pool, user_id).await? {
        None => return Err(EngineError::NoPublishingAccount { user_id }),
        Some(account) if account.is_expired(now) => {
            return Err(EngineError::AccountExpired { user_id });
        }
        Some(_) => {}
    }

    let topics = postpilot_db::list_topics(pool, user_id).await?;
    if topics.is_empty() {
        return Err(EngineError::NoTopics { user_id });
    }

    let preferences = postpilot_db::get_user_preferences(pool, user_id).await?;

    let total = slots.len();
    let mut created = 0usize;
    let mut failed = 0usize;

    for slot in &slots {
        deps.pacer.wait().await;

        match produce_slot(pool, deps, user_id, today, &topics, preferences.as_ref(), slot).await {
            Ok(()) => created += 1,
            Err(e) if deps.isolate_slot_failures => {
                tracing::warn!(%user_id, slot, error = %e, "slot generation failed; continuing batch");
                failed += 1;
            }
            Err(e) => {
                tracing::warn!(
                    %user_id,
                    slot,
                    created,
                    remaining = total - created,
                    error = %e,
                    "slot generation failed; aborting batch, next tick retries the missing slots"
                );
                return Err(e);
            }
        }
    }

    if failed > 0 {
        return Ok(GenerationOutcome::Partial { created, failed });
    }

    postpilot_db::set_last_generation_date(pool, user_id, today).await?;
    tracing::info!(%user_id, created, "generation batch complete");
    Ok(GenerationOutcome::Completed { created })
}

/// Produce a single slot: pick a topic, generate content, persist the post,
/// best-effort re-host the image, and emit the analytics record.
async fn produce_slot(
    pool: &PgPool,
    deps: &GenerationDeps<'_>,
    user_id: Uuid,
    today: NaiveDate,
    topics: &[TopicRow],
    preferences: Option<&UserPreferencesRow>,
    slot: &str,
) -> Result<(), EngineError> {
    let recent = postpilot_db::list_recent_posts_with_topic(
        pool,
        user_id,
        i64::try_from(RECENT_WINDOW).unwrap_or(10),
    )
    .await?;
    let topic = select_topic(topics, &recent).ok_or(EngineError::NoTopics { user_id })?;

    let (tone, target_length, target_emoji_count) = match preferences {
        Some(p) => {
            #[allow(clippy::cast_possible_truncation)]
            let emoji_target = (p.avg_emoji_count.round() as i32).max(0);
            (p.best_performing_tone.clone(), p.optimal_content_length, emoji_target)
        }
        None => (topic.tone.clone(), 100, 1),
    };

    let generated = deps
        .producer
        .generate(&GenerationRequest {
            user_id,
            topic: TopicSpec {
                name: topic.name.clone(),
                description: topic.description.clone(),
                keywords: topic.keywords.clone(),
                tone: topic.tone.clone(),
            },
            tone: tone.clone(),
            target_length,
            target_emoji_count,
        })
        .await?;

    let post_id = postpilot_db::insert_generated_post(
        pool,
        &NewGeneratedPost {
            user_id,
            topic_id: topic.id,
            content: generated.content.clone(),
            image_url: generated.image_url.clone(),
            hashtags: generated.hashtags.clone(),
            scheduled_publish_time: slot.to_string(),
            created_date: today,
        },
    )
    .await?;

    // Best effort: a failed upload keeps the producer's original URL.
    if let (Some(assets), Some(source_url)) = (deps.assets, generated.image_url.as_deref()) {
        match assets.upload(source_url, post_id).await {
            Ok(hosted_url) => {
                postpilot_db::update_post_image_url(pool, post_id, &hosted_url).await?;
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "asset upload failed; keeping producer URL");
            }
        }
    }

    let shape = content_metrics(&generated.content, &generated.hashtags);
    postpilot_db::insert_post_analytics(
        pool,
        &NewPostAnalytics {
            post_id,
            user_id,
            word_count: shape.word_count,
            sentence_count: shape.sentence_count,
            emoji_count: shape.emoji_count,
            hashtag_count: shape.hashtag_count,
            hashtags: generated.hashtags,
            tone,
        },
    )
    .await?;

    tracing::debug!(%user_id, post_id, slot, topic = %topic.name, "slot generated");
    Ok(())
}
