use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::RelayError;
use crate::state::AppState;

/// Inbound `/chat` body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub inquiry: String,
}

enum ChatEvent {
    Fragment(Bytes),
    Failed(RelayError),
}

/// Handle `POST /chat`: answer the inquiry, streaming fragments as plain
/// text while they arrive.
///
/// The response status is decided by the first event of the flow: an error
/// before any fragment becomes an error response, anything else a `200`
/// stream. An error after streaming started aborts the body.
pub async fn handler(state: Arc<AppState>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return RelayError::InvalidRequest(format!("expected {{\"inquiry\": string}}: {err}"))
                .into_response();
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(run_flow(state, request.inquiry, tx));

    match rx.recv().await {
        None => text_response(Body::empty()),
        Some(ChatEvent::Failed(err)) => err.into_response(),
        Some(ChatEvent::Fragment(first)) => {
            let rest = futures_util::stream::unfold(rx, |mut rx| async move {
                let item = match rx.recv().await? {
                    ChatEvent::Fragment(bytes) => Ok(bytes),
                    ChatEvent::Failed(err) => Err(io::Error::other(err.to_string())),
                };
                Some((item, rx))
            });
            let stream = futures_util::stream::once(async move { Ok::<Bytes, io::Error>(first) })
                .chain(rest);
            text_response(Body::from_stream(stream))
        }
    }
}

/// The flow outlives a disconnected caller: sends into a closed channel are
/// dropped and the answer still lands in history.
async fn run_flow(state: Arc<AppState>, inquiry: String, tx: mpsc::UnboundedSender<ChatEvent>) {
    let mut sink = |fragment: &str| {
        let _ = tx.send(ChatEvent::Fragment(Bytes::copy_from_slice(fragment.as_bytes())));
    };
    if let Err(err) = state.reply(&inquiry, Some(&mut sink)).await {
        let _ = tx.send(ChatEvent::Failed(err));
    }
}

fn text_response(body: Body) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
