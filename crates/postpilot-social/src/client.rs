use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::SocialError;

/// Result of a successful publish call.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishedPost {
    pub id: String,
    pub permalink: String,
}

/// Engagement counters for a published post.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Engagement {
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub impressions: i32,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    content: &'a str,
    image_url: Option<&'a str>,
    hashtags: &'a [String],
}

/// Client for the social platform's posting API.
///
/// Use [`SocialClient::new`] with the configured base URL; tests point it
/// at a wiremock server.
pub struct SocialClient {
    client: Client,
    base_url: Url,
}

impl SocialClient {
    /// Creates a social platform client.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::InvalidBaseUrl`] for an unparseable base URL,
    /// or [`SocialError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SocialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postpilot/0.1 (content-automation)")
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| SocialError::InvalidBaseUrl(normalised))?;
        Ok(Self { client, base_url })
    }

    /// Publishes a post on behalf of `access_token`'s account.
    ///
    /// # Errors
    ///
    /// - [`SocialError::AuthRejected`] on 401/403 (expired or revoked token).
    /// - [`SocialError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`SocialError::Http`] on network failure.
    /// - [`SocialError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn publish(
        &self,
        access_token: &str,
        content: &str,
        image_url: Option<&str>,
        hashtags: &[String],
    ) -> Result<PublishedPost, SocialError> {
        let url = self
            .base_url
            .join("v1/posts")
            .map_err(|_| SocialError::InvalidBaseUrl(self.base_url.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&PublishRequest {
                content,
                image_url,
                hashtags,
            })
            .send()
            .await?;
        let response = Self::check_status(response)?;
        let body = response.text().await?;

        serde_json::from_str::<PublishedPost>(&body).map_err(|e| SocialError::Deserialize {
            context: "publish".to_string(),
            source: e,
        })
    }

    /// Fetches current engagement counters for an external post id.
    ///
    /// Returns `Ok(None)` when the platform has no metrics for the post
    /// (HTTP 404) — callers treat that as "nothing to update", not a
    /// failure.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`SocialClient::publish`].
    pub async fn fetch_engagement(
        &self,
        access_token: &str,
        external_post_id: &str,
    ) -> Result<Option<Engagement>, SocialError> {
        let url = self
            .base_url
            .join(&format!("v1/posts/{external_post_id}/metrics"))
            .map_err(|_| SocialError::InvalidBaseUrl(self.base_url.to_string()))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response)?;
        let body = response.text().await?;

        let engagement =
            serde_json::from_str::<Engagement>(&body).map_err(|e| SocialError::Deserialize {
                context: format!("fetch_engagement(id={external_post_id})"),
                source: e,
            })?;
        Ok(Some(engagement))
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SocialError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SocialError::AuthRejected {
                status: status.as_u16(),
            });
        }
        Err(SocialError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
