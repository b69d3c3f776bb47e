use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a generated post.
///
/// The only legal transitions are `Generated → Published` and
/// `Generated → Failed`. Both `Published` and `Failed` are terminal; a
/// failed post is never retried by the dispatcher and recovery is an
/// external concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Generated,
    Published,
    Failed,
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("unknown post status: {0}")]
    Unknown(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: PostStatus, to: PostStatus },
}

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Generated => "generated",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Published | PostStatus::Failed)
    }

    /// Validate a transition to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::InvalidTransition`] if `self` is terminal or
    /// the transition is a self-loop.
    pub fn transition(self, to: PostStatus) -> Result<PostStatus, StatusError> {
        if self == PostStatus::Generated && to.is_terminal() {
            Ok(to)
        } else {
            Err(StatusError::InvalidTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(PostStatus::Generated),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            other => Err(StatusError::Unknown(other.to_string())),
        }
    }
}
