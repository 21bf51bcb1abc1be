mod common;

use chat_relay::completion::CompletionClient;
use chat_relay::error::RelayError;
use chat_relay::protocol::openai_chat::ChatMessage;
use common::{completion_json, llm_config, spawn_upstream, MockReply, Recorder};
use serde_json::json;

fn messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("be brief"),
        ChatMessage::user("say hello"),
    ]
}

#[tokio::test]
async fn test_streaming_completion_forwards_fragments() {
    let recorder = Recorder::default();
    let base_url = spawn_upstream(
        MockReply::Stream(vec![
            ": OPENROUTER PROCESSING\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"  Hel\"}}]}\n\nda",
            "ta: {\"choices\":[{\"index\":0,\"delta\":{\"con",
            "tent\":\"lo!\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" ignored\"}}]}\n\n",
        ]),
        recorder.clone(),
    )
    .await;
    let client = CompletionClient::new(llm_config(base_url, true));

    let mut seen = Vec::new();
    let mut sink = |fragment: &str| seen.push(fragment.to_string());
    let answer = client
        .complete(&messages(), Some(&mut sink))
        .await
        .expect("streaming completion");

    assert_eq!(answer, "Hello!");
    assert_eq!(seen, vec!["Hel", "lo!"]);

    let bodies = recorder.bodies();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["stream"], json!(true));
    assert_eq!(body["model"], json!("llama-3.1-8b-instant"));
    assert_eq!(body["max_tokens"], json!(400));
    assert_eq!(body["temperature"].as_f64(), Some(0.0));
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "be brief"},
            {"role": "user", "content": "say hello"}
        ])
    );
}

#[tokio::test]
async fn test_stream_without_terminal_returns_accumulated_text() {
    let base_url = spawn_upstream(
        MockReply::Stream(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"cut\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" short\"}}]}",
        ]),
        Recorder::default(),
    )
    .await;
    let client = CompletionClient::new(llm_config(base_url, true));

    let mut count = 0usize;
    let mut sink = |_: &str| count += 1;
    let answer = client
        .complete(&messages(), Some(&mut sink))
        .await
        .expect("truncated stream is not an error");
    assert_eq!(answer, "cut short");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_non_streaming_answer_is_trimmed_and_forwarded_whole() {
    let recorder = Recorder::default();
    let base_url = spawn_upstream(
        MockReply::Json(completion_json("\n  Hello there.  \n")),
        recorder.clone(),
    )
    .await;
    let client = CompletionClient::new(llm_config(base_url, false));

    let mut seen = Vec::new();
    let mut sink = |fragment: &str| seen.push(fragment.to_string());
    let answer = client
        .complete(&messages(), Some(&mut sink))
        .await
        .expect("non-streaming completion");

    assert_eq!(answer, "Hello there.");
    assert_eq!(seen, vec!["Hello there."]);
    assert_eq!(recorder.bodies()[0]["stream"], json!(false));
}

#[tokio::test]
async fn test_no_sink_never_requests_a_stream() {
    let recorder = Recorder::default();
    let base_url = spawn_upstream(MockReply::Json(completion_json("pong")), recorder.clone()).await;
    let client = CompletionClient::new(llm_config(base_url, true));

    let answer = client.complete(&messages(), None).await.expect("completion");
    assert_eq!(answer, "pong");
    assert_eq!(recorder.bodies()[0]["stream"], json!(false));
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let recorder = Recorder::default();
    let base_url = spawn_upstream(
        MockReply::Status(429, "{\"error\":{\"message\":\"rate limited\"}}"),
        recorder.clone(),
    )
    .await;
    let client = CompletionClient::new(llm_config(base_url, true));

    let mut seen = Vec::new();
    let mut sink = |fragment: &str| seen.push(fragment.to_string());
    let err = client
        .complete(&messages(), Some(&mut sink))
        .await
        .expect_err("429 must fail");
    match err {
        RelayError::Upstream { status, message } => {
            assert_eq!(status, 429);
            assert!(message.contains("rate limited"), "message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(seen.is_empty());
    assert_eq!(recorder.count(), 1, "no retry after a failed status");
}

#[tokio::test]
async fn test_empty_choices_is_fatal_without_streaming() {
    let base_url = spawn_upstream(
        MockReply::Json(json!({"id": "x", "choices": []})),
        Recorder::default(),
    )
    .await;
    let client = CompletionClient::new(llm_config(base_url, false));

    let err = client
        .complete(&messages(), None)
        .await
        .expect_err("empty choices must fail");
    assert!(matches!(err, RelayError::EmptyChoices));
}

#[tokio::test]
async fn test_authorization_header_only_with_api_key() {
    let recorder = Recorder::default();
    let base_url = spawn_upstream(MockReply::Json(completion_json("ok")), recorder.clone()).await;

    let with_key = CompletionClient::new(llm_config(base_url.clone(), false));
    with_key.complete(&messages(), None).await.expect("keyed call");

    let mut settings = llm_config(base_url, false);
    settings.api_key = None;
    let without_key = CompletionClient::new(settings);
    without_key
        .complete(&messages(), None)
        .await
        .expect("anonymous call");

    let headers = recorder.headers();
    assert_eq!(headers.len(), 2);
    assert_eq!(
        headers[0]
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer upstream-secret")
    );
    assert!(headers[1].get("authorization").is_none());
    assert_eq!(
        headers[1]
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = CompletionClient::new(llm_config(format!("http://{addr}/v1"), false));
    let err = client
        .complete(&messages(), None)
        .await
        .expect_err("closed port must fail");
    assert!(matches!(err, RelayError::Transport(_)));
}
