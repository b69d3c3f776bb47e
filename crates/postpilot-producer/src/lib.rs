//! Client for the content generation service and the asset host.
//!
//! The producer turns a topic plus learned style parameters into post copy,
//! an image URL, and hashtags. Transient failures (429, 5xx, network) are
//! retried with exponential backoff; the [`Pacer`] spaces calls within one
//! generation batch to respect the service's rate limit.

mod client;
mod error;
mod pacing;
mod retry;

pub use client::{
    AssetHostClient, GeneratedContent, GenerationRequest, ProducerClient, TopicSpec,
};
pub use error::ProducerError;
pub use pacing::Pacer;
