//! Structured per-owner tick outcomes.
//!
//! Multi-owner loops collect these instead of swallowing failures, and the
//! scheduler aggregates them into the tick report exposed on `/status`.

use serde::Serialize;

/// Why a generation cycle did nothing. None of these are errors; they are
/// the expected steady state for most owners on most ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoActiveSubscription,
    AutomationDisabled,
    QuotaMet,
}

/// Result of one owner's generation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum GenerationOutcome {
    Skipped { reason: SkipReason },
    Completed { created: usize },
    /// Only produced in isolate-slot-failures mode: some slots were
    /// created, others failed and will be retried next tick.
    Partial { created: usize, failed: usize },
}

/// Aggregate result of one publish tick across all owners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub due: usize,
    pub published: usize,
    pub failed: usize,
}

/// Aggregate result of one engagement-sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementReport {
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Result of one owner's learning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LearningOutcome {
    /// Fewer than the minimum analytics records existed; preferences were
    /// left untouched.
    InsufficientData { analyzed: usize },
    Updated { analyzed: usize, top_performers: usize },
}
