//! Orchestration core: quota resolution, topic selection, batch
//! generation, due-post dispatch, engagement sync, and the learning loop.
//!
//! Every entry point takes `today`/`now` as explicit arguments; the
//! scheduler is the only place that reads the wall clock, so tests drive
//! these functions with fixed dates and never sleep.

mod dispatch;
mod engagement;
mod error;
mod generation;
mod learning;
mod outcome;
mod quota;
mod selector;

pub use dispatch::run_publish_tick;
pub use engagement::run_engagement_sync;
pub use error::EngineError;
pub use generation::{run_generation_cycle, GenerationDeps};
pub use learning::{derive_preferences, run_learning, HashtagStat, LearnedPreferences};
pub use outcome::{
    DispatchReport, EngagementReport, GenerationOutcome, LearningOutcome, SkipReason,
};
pub use quota::{resolve_quota, ResolvedQuota};
pub use selector::select_topic;
