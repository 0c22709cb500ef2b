// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider and captioner against a mock Chat Completions server.

use spectre_config::model::{CaptionerConfig, ProviderConfig};
use spectre_core::{ImageCaptioner, ModelProvider, ModelRequest};
use spectre_openai::{OpenAiCaptioner, OpenAiProvider};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
    }))
}

fn provider_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".into()),
        model: "gpt-test".into(),
        timeout_secs: 5,
        max_retries: 0,
    }
}

#[tokio::test]
async fn provider_returns_first_choice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-test"})))
        .respond_with(reply("sure thing"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::from_config(&provider_config(&server)).unwrap();
    let request = ModelRequest {
        prompt: "say something".into(),
        ..ModelRequest::default()
    };
    assert_eq!(provider.invoke(request).await.unwrap(), "sure thing");
}

#[tokio::test]
async fn provider_rejects_empty_choice_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::from_config(&provider_config(&server)).unwrap();
    assert!(provider.invoke(ModelRequest::default()).await.is_err());
}

#[tokio::test]
async fn captioner_inlines_local_image_and_trims_caption() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("  a small orange cat \n"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cat.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let config = CaptionerConfig {
        enabled: true,
        model: "vision-test".into(),
        ..CaptionerConfig::default()
    };
    let captioner = OpenAiCaptioner::from_config(&config, &provider_config(&server)).unwrap();
    let caption = captioner.caption(&image.display().to_string()).await.unwrap();
    assert_eq!(caption.as_deref(), Some("a small orange cat"));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let url = body["messages"][1]["content"][0]["image_url"]["url"].as_str().unwrap();
    assert!(url.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn captioner_skips_unreadable_image_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("never"))
        .expect(0)
        .mount(&server)
        .await;

    let captioner =
        OpenAiCaptioner::from_config(&CaptionerConfig::default(), &provider_config(&server))
            .unwrap();
    assert_eq!(captioner.caption("/missing/image.png").await.unwrap(), None);
}
