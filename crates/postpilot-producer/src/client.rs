use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProducerError;
use crate::retry::retry_with_backoff;

/// Topic reference data sent to the producer.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSpec {
    pub name: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub tone: String,
}

/// One content generation request.
///
/// `tone`, `target_length`, and `target_emoji_count` carry the learned
/// preferences; the producer treats them as style hints.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub user_id: Uuid,
    pub topic: TopicSpec,
    pub tone: String,
    pub target_length: i32,
    pub target_emoji_count: i32,
}

/// Producer output for one slot.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedContent {
    pub content: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AssetUploadRequest<'a> {
    source_url: &'a str,
    post_id: i64,
}

#[derive(Debug, Deserialize)]
struct AssetUploadResponse {
    hosted_url: String,
}

fn parse_base_url(base_url: &str) -> Result<Url, ProducerError> {
    // Normalise: exactly one trailing slash so join() appends rather than
    // replacing the last path segment.
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|_| ProducerError::InvalidBaseUrl(base_url.to_string()))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProducerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        return Err(ProducerError::RateLimited { retry_after_secs });
    }
    if status.is_server_error() {
        return Err(ProducerError::Upstream {
            status: status.as_u16(),
        });
    }
    Err(ProducerError::UnexpectedStatus {
        status: status.as_u16(),
        url: response.url().to_string(),
    })
}

/// HTTP client for the content generation service.
///
/// Use [`ProducerClient::new`] with the configured base URL; tests point it
/// at a wiremock server. Transient errors (429, 5xx, network) are retried
/// with exponential backoff up to `max_retries` additional attempts.
pub struct ProducerClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ProducerClient {
    /// Creates a producer client with configured timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::InvalidBaseUrl`] for an unparseable base
    /// URL, or [`ProducerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ProducerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postpilot/0.1 (content-automation)")
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Generates content, an image URL, and hashtags for one slot.
    ///
    /// # Errors
    ///
    /// - [`ProducerError::RateLimited`] / [`ProducerError::Upstream`] /
    ///   [`ProducerError::Http`] after all retries are exhausted.
    /// - [`ProducerError::UnexpectedStatus`] for other non-2xx statuses
    ///   (not retried).
    /// - [`ProducerError::Deserialize`] if the body does not match the
    ///   expected shape (not retried).
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, ProducerError> {
        let url = self
            .base_url
            .join("v1/generate")
            .map_err(|_| ProducerError::InvalidBaseUrl(self.base_url.to_string()))?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            let response = self.client.post(url.clone()).json(request).send().await?;
            let response = check_status(response).await?;
            let body = response.text().await?;
            serde_json::from_str::<GeneratedContent>(&body).map_err(|e| {
                ProducerError::Deserialize {
                    context: format!("generate(topic={})", request.topic.name),
                    source: e,
                }
            })
        })
        .await
    }
}

/// HTTP client for the asset host.
///
/// Uploads are best-effort at the call site: the orchestrator keeps the
/// producer's original image URL when an upload fails.
pub struct AssetHostClient {
    client: Client,
    base_url: Url,
}

impl AssetHostClient {
    /// Creates an asset-host client.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::InvalidBaseUrl`] or [`ProducerError::Http`].
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ProducerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postpilot/0.1 (content-automation)")
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Re-hosts `source_url` and returns the hosted URL.
    ///
    /// # Errors
    ///
    /// Returns a [`ProducerError`] on any HTTP, status, or parse failure;
    /// callers log and keep the original URL.
    pub async fn upload(&self, source_url: &str, post_id: i64) -> Result<String, ProducerError> {
        let url = self
            .base_url
            .join("v1/assets")
            .map_err(|_| ProducerError::InvalidBaseUrl(self.base_url.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(&AssetUploadRequest { source_url, post_id })
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        let parsed: AssetUploadResponse =
            serde_json::from_str(&body).map_err(|e| ProducerError::Deserialize {
                context: format!("upload(post_id={post_id})"),
                source: e,
            })?;

        Ok(parsed.hosted_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_exactly_one_trailing_slash() {
        let url = parse_base_url("http://producer.example").unwrap();
        assert_eq!(url.as_str(), "http://producer.example/");
        let url = parse_base_url("http://producer.example///").unwrap();
        assert_eq!(url.as_str(), "http://producer.example/");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ProducerError::InvalidBaseUrl(_))
        ));
    }
}
