//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! three recurring cadences: content (generation plus a publish pass),
//! engagement sync, and the learning loop. Each cadence holds its own
//! busy guard so a slow tick is skipped by the next firing instead of
//! overlapping with it; the two re-entrancy hazards are duplicate batch
//! generation and double-publishing a due post.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use postpilot_core::slots::is_due;
use postpilot_core::AppConfig;
use postpilot_db::AutomationSettingsRow;
use postpilot_engine::{run_generation_cycle, run_publish_tick, GenerationDeps};
use postpilot_producer::{AssetHostClient, Pacer, ProducerClient};
use postpilot_social::SocialClient;

use crate::reports::{
    ContentTickReport, EngagementTickReport, LearningTickReport, OwnerGeneration,
    OwnerLearning, TickReports,
};

/// Shared HTTP collaborators, built once at startup.
pub struct Clients {
    pub producer: ProducerClient,
    pub assets: Option<AssetHostClient>,
    pub social: SocialClient,
    pub pacer: Pacer,
}

impl Clients {
    /// Construct all upstream clients from config.
    ///
    /// # Errors
    ///
    /// Returns an error for an unparseable base URL.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let producer = ProducerClient::new(
            &config.producer_base_url,
            config.producer_timeout_secs,
            config.producer_max_retries,
            config.producer_retry_backoff_base_secs,
        )?;
        let assets = config
            .asset_host_base_url
            .as_deref()
            .map(|url| AssetHostClient::new(url, config.producer_timeout_secs))
            .transpose()?;
        let social = SocialClient::new(&config.social_base_url, config.social_timeout_secs)?;
        let pacer = Pacer::per_minute(config.producer_requests_per_minute);
        Ok(Self {
            producer,
            assets,
            social,
            pacer,
        })
    }
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    clients: Arc<Clients>,
    reports: TickReports,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_content_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&clients),
        reports.clone(),
    )
    .await?;
    register_engagement_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&clients),
        reports.clone(),
    )
    .await?;
    register_learning_job(&scheduler, pool, Arc::clone(&config), reports).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the content cadence: per-owner batch generation for owners
/// whose creation time has passed, followed by one catch-up publish pass.
async fn register_content_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    clients: Arc<Clients>,
    reports: TickReports,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let busy = Arc::new(Mutex::new(()));

    let cron = config.content_cron.clone();
    let job_config = Arc::clone(&config);
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&job_config);
        let clients = Arc::clone(&clients);
        let reports = reports.clone();
        let busy = Arc::clone(&busy);

        Box::pin(async move {
            let Ok(_guard) = busy.try_lock() else {
                tracing::warn!("scheduler: content tick still running; skipping this firing");
                return;
            };
            tracing::info!("scheduler: starting content tick");
            run_content_tick(&pool, &config, &clients, &reports).await;
            tracing::info!("scheduler: content tick complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered content job");
    Ok(())
}

/// Whether an owner's batch should run on this tick.
///
/// Only the configured creation time gates the run. A same-day
/// `last_generation_date` stamp does not suppress it: the orchestrator's
/// post count already turns a completed batch into a cheap no-op, and it
/// refills an externally deleted post the same day rather than tomorrow.
fn owner_is_due(row: &AutomationSettingsRow, now_hhmm: &str) -> bool {
    is_due(&row.content_creation_time, now_hhmm)
}

/// One content tick: generation for every eligible owner, then dispatch.
async fn run_content_tick(
    pool: &PgPool,
    config: &AppConfig,
    clients: &Clients,
    reports: &TickReports,
) {
    let now_local = chrono::Local::now();
    let today = now_local.date_naive();
    let now_hhmm = postpilot_core::slots::hhmm(now_local.time());
    let now = Utc::now();

    let settings = match postpilot_db::list_enabled_settings(pool).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: content tick failed to list owners");
            return;
        }
    };

    let deps = GenerationDeps {
        producer: &clients.producer,
        assets: clients.assets.as_ref(),
        pacer: &clients.pacer,
        isolate_slot_failures: config.generation_isolate_slot_failures,
    };

    let mut owners = Vec::new();
    for row in &settings {
        if !owner_is_due(row, &now_hhmm) {
            continue;
        }

        match run_generation_cycle(pool, &deps, row.user_id, today, now).await {
            Ok(outcome) => owners.push(OwnerGeneration {
                user_id: row.user_id,
                outcome: Some(outcome),
                error: None,
            }),
            Err(e) => {
                tracing::error!(user_id = %row.user_id, error = %e,
                    "scheduler: generation failed for owner");
                owners.push(OwnerGeneration {
                    user_id: row.user_id,
                    outcome: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let dispatch = match run_publish_tick(pool, &clients.social, today, &now_hhmm, Utc::now()).await
    {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: publish pass failed");
            None
        }
    };

    reports
        .record_content(ContentTickReport {
            at: now,
            owners,
            dispatch,
        })
        .await;
}

/// Register the engagement-sync cadence.
async fn register_engagement_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    clients: Arc<Clients>,
    reports: TickReports,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let busy = Arc::new(Mutex::new(()));

    let cron = config.engagement_cron.clone();
    let job_config = Arc::clone(&config);
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&job_config);
        let clients = Arc::clone(&clients);
        let reports = reports.clone();
        let busy = Arc::clone(&busy);

        Box::pin(async move {
            let Ok(_guard) = busy.try_lock() else {
                tracing::warn!("scheduler: engagement sync still running; skipping this firing");
                return;
            };
            let now = Utc::now();
            match postpilot_engine::run_engagement_sync(
                &pool,
                &clients.social,
                config.engagement_lookback_days,
                now,
            )
            .await
            {
                Ok(report) => {
                    reports
                        .record_engagement(EngagementTickReport { at: now, report })
                        .await;
                }
                Err(e) => tracing::error!(error = %e, "scheduler: engagement sync failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered engagement job");
    Ok(())
}

/// Register the learning cadence: re-derive preferences for users whose
/// analytics are newer than their last analysis.
async fn register_learning_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    reports: TickReports,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let busy = Arc::new(Mutex::new(()));

    let cron = config.learning_cron.clone();
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let reports = reports.clone();
        let busy = Arc::clone(&busy);

        Box::pin(async move {
            let Ok(_guard) = busy.try_lock() else {
                tracing::warn!("scheduler: learning run still running; skipping this firing");
                return;
            };
            tracing::info!("scheduler: starting learning run");
            run_learning_tick(&pool, &reports).await;
            tracing::info!("scheduler: learning run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered learning job");
    Ok(())
}

async fn run_learning_tick(pool: &PgPool, reports: &TickReports) {
    let now = Utc::now();
    // Re-analyse anyone with analytics newer than an hour-old snapshot.
    let cutoff = now - chrono::Duration::hours(1);

    let users: Vec<Uuid> = match postpilot_db::list_users_due_learning(pool, cutoff).await {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: learning run failed to list users");
            return;
        }
    };

    if users.is_empty() {
        tracing::debug!("scheduler: no users due for learning");
    }

    let mut owners = Vec::new();
    for user_id in users {
        match postpilot_engine::run_learning(pool, user_id, now).await {
            Ok(outcome) => owners.push(OwnerLearning {
                user_id,
                outcome: Some(outcome),
                error: None,
            }),
            Err(e) => {
                tracing::error!(%user_id, error = %e, "scheduler: learning failed for user");
                owners.push(OwnerLearning {
                    user_id,
                    outcome: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    reports
        .record_learning(LearningTickReport { at: now, owners })
        .await;
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn settings_row(creation_time: &str, last_generation_date: Option<NaiveDate>) -> AutomationSettingsRow {
        AutomationSettingsRow {
            id: 1,
            user_id: Uuid::new_v4(),
            posts_per_day: 2,
            enabled: true,
            content_creation_time: creation_time.to_string(),
            publish_times: vec!["09:00".to_string(), "15:00".to_string()],
            last_generation_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_is_due_once_creation_time_passes() {
        let row = settings_row("08:30", None);
        assert!(!owner_is_due(&row, "08:29"));
        assert!(owner_is_due(&row, "08:30"));
        assert!(owner_is_due(&row, "23:59"));
    }

    #[test]
    fn same_day_stamp_does_not_suppress_the_run() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let row = settings_row("08:30", Some(today));
        assert!(owner_is_due(&row, "10:00"));
    }
}
