use chrono::Utc;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use postpilot_engine::GenerationDeps;
use postpilot_producer::{AssetHostClient, Pacer, ProducerClient};
use postpilot_social::SocialClient;

#[derive(Debug, Parser)]
#[command(name = "postpilot-cli")]
#[command(about = "PostPilot operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the topics file and upsert its catalogues into the database.
    Seed,
    /// Run one generation cycle for a single user, as of now.
    Generate {
        #[arg(long)]
        user: Uuid,
    },
    /// Run one catch-up publish pass over today's due posts.
    Dispatch,
    /// Run one engagement-sync pass.
    Engage,
    /// Re-derive learned preferences for a single user.
    Learn {
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = postpilot_core::load_app_config()?;
    let pool_config = postpilot_db::PoolConfig::from_app_config(&config);
    let pool = postpilot_db::connect_pool(&config.database_url, pool_config).await?;
    postpilot_db::run_migrations(&pool).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Seed => {
            let topics = postpilot_core::topics_file::load_topics(&config.topics_path)?;
            let count = postpilot_db::seed_topics(&pool, &topics).await?;
            println!("seeded {count} topics from {}", config.topics_path.display());
        }
        Commands::Generate { user } => {
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
            let pacer = Pacer::per_minute(config.producer_requests_per_minute);
            let deps = GenerationDeps {
                producer: &producer,
                assets: assets.as_ref(),
                pacer: &pacer,
                isolate_slot_failures: config.generation_isolate_slot_failures,
            };

            let now_local = chrono::Local::now();
            let outcome = postpilot_engine::run_generation_cycle(
                &pool,
                &deps,
                user,
                now_local.date_naive(),
                Utc::now(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Dispatch => {
            let social = SocialClient::new(&config.social_base_url, config.social_timeout_secs)?;
            let now_local = chrono::Local::now();
            let report = postpilot_engine::run_publish_tick(
                &pool,
                &social,
                now_local.date_naive(),
                &postpilot_core::slots::hhmm(now_local.time()),
                Utc::now(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Engage => {
            let social = SocialClient::new(&config.social_base_url, config.social_timeout_secs)?;
            let report = postpilot_engine::run_engagement_sync(
                &pool,
                &social,
                config.engagement_lookback_days,
                Utc::now(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Learn { user } => {
            let outcome = postpilot_engine::run_learning(&pool, user, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
