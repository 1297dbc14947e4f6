// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use nlprs::config::settings::UltraSafeSettings;
use nlprs::domain::models::task::TaskType;
use nlprs::domain::services::nlp_service::NlpService;
use nlprs::infrastructure::nlp::ultrasafe_client::UltraSafeClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, max_retries: u32) -> UltraSafeClient {
    UltraSafeClient::new(&UltraSafeSettings {
        api_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout: 5,
        max_retries,
    })
    .expect("client should build")
}

#[tokio::test]
async fn test_classify_posts_text_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(
            json!({"text": "hello", "categories": ["news", "sports"]}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"category": "news", "confidence": 0.92})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let result = client
        .process(
            TaskType::Classification,
            "hello",
            &json!({"categories": ["news", "sports"]}),
        )
        .await
        .unwrap();

    assert_eq!(result["category"], "news");
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "short"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let result = client
        .process(TaskType::Summarization, "a long text", &json!({"max_length": 20}))
        .await
        .unwrap();

    assert_eq!(result["summary"], "short");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-sentiment"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unsupported language"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client
        .process(TaskType::SentimentAnalysis, "text", &json!({}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("422"));
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/extract-entities"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let err = client
        .process(TaskType::EntityExtraction, "text", &json!({}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("503"));
}
