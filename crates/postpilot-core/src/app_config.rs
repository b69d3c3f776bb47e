use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub topics_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the content generation service.
    pub producer_base_url: String,
    pub producer_timeout_secs: u64,
    pub producer_max_retries: u32,
    pub producer_retry_backoff_base_secs: u64,
    /// Rate limit of the content generation service; paces slot production
    /// within a batch.
    pub producer_requests_per_minute: u32,
    /// Base URL of the asset host; when unset, producer image URLs are
    /// stored as-is.
    pub asset_host_base_url: Option<String>,
    pub social_base_url: String,
    pub social_timeout_secs: u64,
    /// How far back the engagement sync looks for published posts, in days.
    pub engagement_lookback_days: i64,
    /// When true, a slot failure during generation is logged and the batch
    /// continues; when false, the batch aborts and the next tick retries
    /// the missing slots.
    pub generation_isolate_slot_failures: bool,
    pub content_cron: String,
    pub engagement_cron: String,
    pub learning_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("topics_path", &self.topics_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("producer_base_url", &self.producer_base_url)
            .field("producer_timeout_secs", &self.producer_timeout_secs)
            .field("producer_max_retries", &self.producer_max_retries)
            .field(
                "producer_retry_backoff_base_secs",
                &self.producer_retry_backoff_base_secs,
            )
            .field(
                "producer_requests_per_minute",
                &self.producer_requests_per_minute,
            )
            .field("asset_host_base_url", &self.asset_host_base_url)
            .field("social_base_url", &self.social_base_url)
            .field("social_timeout_secs", &self.social_timeout_secs)
            .field("engagement_lookback_days", &self.engagement_lookback_days)
            .field(
                "generation_isolate_slot_failures",
                &self.generation_isolate_slot_failures,
            )
            .field("content_cron", &self.content_cron)
            .field("engagement_cron", &self.engagement_cron)
            .field("learning_cron", &self.learning_cron)
            .finish()
    }
}
