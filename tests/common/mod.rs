#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use chat_relay::config::{AppConfig, LlmConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Requests seen by a mock upstream, in arrival order.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Recorder {
    pub fn bodies(&self) -> Vec<Value> {
        self.seen.lock().iter().map(|(_, body)| body.clone()).collect()
    }

    pub fn headers(&self) -> Vec<HeaderMap> {
        self.seen.lock().iter().map(|(headers, _)| headers.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

/// What the mock upstream answers with.
#[derive(Clone)]
pub enum MockReply {
    /// SSE body delivered in exactly these chunks.
    Stream(Vec<&'static str>),
    /// Single JSON completion object.
    Json(Value),
    /// Error status with a text body.
    Status(u16, &'static str),
}

pub fn sse_chunk(content: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":content},"finish_reason":null}]})
    )
}

pub fn completion_json(content: &str) -> Value {
    json!({
        "id": "chatcmpl_mock",
        "object": "chat.completion",
        "created": 1_727_000_000_u64,
        "model": "llama-3.1-8b-instant",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    })
}

fn render(reply: MockReply) -> Response {
    match reply {
        MockReply::Stream(chunks) => {
            let body = Body::from_stream(futures_util::stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<Bytes, std::io::Error>(Bytes::from_static(chunk.as_bytes()))),
            ));
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/event-stream")],
                body,
            )
                .into_response()
        }
        MockReply::Json(value) => Json(value).into_response(),
        MockReply::Status(status, text) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            text,
        )
            .into_response(),
    }
}

/// Start a mock `/v1/chat/completions` upstream and return its base URL.
pub async fn spawn_upstream(reply: MockReply, recorder: Recorder) -> String {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let reply = reply.clone();
            let recorder = recorder.clone();
            async move {
                recorder.seen.lock().push((headers, body));
                render(reply)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1")
}

pub fn llm_config(base_url: String, streaming: bool) -> LlmConfig {
    LlmConfig {
        base_url,
        api_key: Some("upstream-secret".to_string()),
        streaming,
        ..LlmConfig::default()
    }
}

pub fn app_config(base_url: String, streaming: bool) -> AppConfig {
    AppConfig {
        llm: llm_config(base_url, streaming),
        ..AppConfig::default()
    }
}
