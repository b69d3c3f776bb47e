use thiserror::Error;

/// Errors returned by the producer and asset-host clients.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; the service has asked us to back off.
    #[error("producer rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP 5xx; transient upstream failure.
    #[error("producer upstream error: HTTP {status}")]
    Upstream { status: u16 },

    /// Any other non-2xx status; retrying won't fix it.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL is not a valid URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
