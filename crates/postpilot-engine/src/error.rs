use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by engine operations.
///
/// Missing-precondition variants (`NoPublishingAccount`, `AccountExpired`,
/// `NoTopics`) are hard stops for the owner's current cycle: unlike a
/// skip, they indicate configuration the user must fix, and the scheduler
/// logs them as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] postpilot_db::DbError),

    #[error(transparent)]
    Producer(#[from] postpilot_producer::ProducerError),

    #[error(transparent)]
    Social(#[from] postpilot_social::SocialError),

    #[error("user {user_id} has no connected publishing account")]
    NoPublishingAccount { user_id: Uuid },

    #[error("publishing account for user {user_id} has expired")]
    AccountExpired { user_id: Uuid },

    #[error("user {user_id} has no topics configured")]
    NoTopics { user_id: Uuid },
}
