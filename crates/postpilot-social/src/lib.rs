//! HTTP client for the social platform.
//!
//! Two operations: publishing a post on behalf of a connected account, and
//! reading back its engagement counters. Publish errors are terminal for
//! the post being dispatched — the dispatcher marks it `failed` and never
//! retries — so this client does no retrying of its own.

mod client;
mod error;

pub use client::{Engagement, PublishedPost, SocialClient};
pub use error::SocialError;
