//! Integration tests for the producer and asset-host clients.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postpilot_producer::{
    AssetHostClient, GenerationRequest, ProducerClient, ProducerError, TopicSpec,
};

/// Builds a `ProducerClient` suitable for tests: 5-second timeout, no retries.
fn test_client(base_url: &str) -> ProducerClient {
    ProducerClient::new(base_url, 5, 0, 0).expect("failed to build test ProducerClient")
}

fn test_client_with_retries(base_url: &str, max_retries: u32) -> ProducerClient {
    ProducerClient::new(base_url, 5, max_retries, 0).expect("failed to build test ProducerClient")
}

fn test_request() -> GenerationRequest {
    GenerationRequest {
        user_id: Uuid::new_v4(),
        topic: TopicSpec {
            name: "Coffee".to_string(),
            description: Some("single-origin roasts".to_string()),
            keywords: vec!["espresso".to_string()],
            tone: "casual".to_string(),
        },
        tone: "casual".to_string(),
        target_length: 120,
        target_emoji_count: 1,
    }
}

fn generated_body() -> serde_json::Value {
    json!({
        "content": "Fresh roast is in. Come try it!",
        "image_url": "https://cdn.producer.example/roast.png",
        "hashtags": ["#coffee", "#espresso"]
    })
}

#[tokio::test]
async fn generate_returns_parsed_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .and(body_partial_json(json!({"tone": "casual", "target_length": 120})))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let content = client.generate(&test_request()).await.unwrap();

    assert_eq!(content.content, "Fresh roast is in. Come try it!");
    assert_eq!(
        content.image_url.as_deref(),
        Some("https://cdn.producer.example/roast.png")
    );
    assert_eq!(content.hashtags, vec!["#coffee", "#espresso"]);
}

#[tokio::test]
async fn generate_defaults_missing_hashtags_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": "Plain text.", "image_url": null})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let content = client.generate(&test_request()).await.unwrap();
    assert!(content.hashtags.is_empty());
    assert!(content.image_url.is_none());
}

#[tokio::test]
async fn generate_retries_a_503_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server.uri(), 2);
    let content = client.generate(&test_request()).await.unwrap();
    assert_eq!(content.hashtags.len(), 2);
}

#[tokio::test]
async fn generate_surfaces_rate_limiting_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server.uri(), 1);
    let result = client.generate(&test_request()).await;
    assert!(
        matches!(result, Err(ProducerError::RateLimited { retry_after_secs: 17 })),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn generate_does_not_retry_a_400() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_retries(&server.uri(), 3);
    let result = client.generate(&test_request()).await;
    assert!(
        matches!(result, Err(ProducerError::UnexpectedStatus { status: 400, .. })),
        "expected UnexpectedStatus(400), got: {result:?}"
    );
}

#[tokio::test]
async fn generate_rejects_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.generate(&test_request()).await;
    assert!(
        matches!(result, Err(ProducerError::Deserialize { .. })),
        "expected Deserialize error, got: {result:?}"
    );
}

#[tokio::test]
async fn asset_upload_returns_hosted_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/assets"))
        .and(body_partial_json(json!({"post_id": 7})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"hosted_url": "https://assets.example/p/7.png"})),
        )
        .mount(&server)
        .await;

    let client = AssetHostClient::new(&server.uri(), 5).unwrap();
    let hosted = client
        .upload("https://cdn.producer.example/roast.png", 7)
        .await
        .unwrap();
    assert_eq!(hosted, "https://assets.example/p/7.png");
}

#[tokio::test]
async fn asset_upload_failure_is_an_error_for_the_caller_to_swallow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/assets"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AssetHostClient::new(&server.uri(), 5).unwrap();
    let result = client.upload("https://cdn.producer.example/roast.png", 7).await;
    assert!(matches!(result, Err(ProducerError::Upstream { status: 500 })));
}

#[tokio::test]
async fn clients_send_a_descriptive_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .and(header("user-agent", "postpilot/0.1 (content-automation)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.generate(&test_request()).await.unwrap();
}
