//! Last-tick reports shared between the scheduler and the status API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use postpilot_engine::{
    DispatchReport, EngagementReport, GenerationOutcome, LearningOutcome,
};

/// One owner's generation result within a content tick.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerGeneration {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GenerationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentTickReport {
    pub at: DateTime<Utc>,
    pub owners: Vec<OwnerGeneration>,
    pub dispatch: Option<DispatchReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementTickReport {
    pub at: DateTime<Utc>,
    pub report: EngagementReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerLearning {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<LearningOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearningTickReport {
    pub at: DateTime<Utc>,
    pub owners: Vec<OwnerLearning>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportsSnapshot {
    pub content: Option<ContentTickReport>,
    pub engagement: Option<EngagementTickReport>,
    pub learning: Option<LearningTickReport>,
}

/// Shared handle: the scheduler writes after every tick, `/status` reads.
#[derive(Debug, Clone, Default)]
pub struct TickReports {
    inner: Arc<RwLock<ReportsSnapshot>>,
}

impl TickReports {
    pub async fn record_content(&self, report: ContentTickReport) {
        self.inner.write().await.content = Some(report);
    }

    pub async fn record_engagement(&self, report: EngagementTickReport) {
        self.inner.write().await.engagement = Some(report);
    }

    pub async fn record_learning(&self, report: LearningTickReport) {
        self.inner.write().await.learning = Some(report);
    }

    pub async fn snapshot(&self) -> ReportsSnapshot {
        self.inner.read().await.clone()
    }
}
