use crate::config::LlmConfig;
use crate::error::RelayError;
use crate::protocol::openai_chat::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::stream::{accumulate_byte_stream, FragmentSink};
use crate::transport::HttpTransport;

const ERROR_BODY_EXCERPT_CHARS: usize = 512;

/// Issues one chat-completion call per answer, streaming or not.
pub struct CompletionClient {
    transport: HttpTransport,
    settings: LlmConfig,
    url: String,
}

impl CompletionClient {
    #[must_use]
    pub fn new(settings: LlmConfig) -> Self {
        Self::with_transport(settings, HttpTransport::new())
    }

    #[must_use]
    pub fn with_transport(settings: LlmConfig, transport: HttpTransport) -> Self {
        let url = settings.completions_url();
        Self {
            transport,
            settings,
            url,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &LlmConfig {
        &self.settings
    }

    /// Whether a call with the given sink presence would stream.
    #[must_use]
    pub fn will_stream(&self, has_sink: bool) -> bool {
        self.settings.streaming && has_sink
    }

    /// Run one completion and return the final answer text.
    ///
    /// With a sink and streaming enabled, fragments are forwarded as they are
    /// decoded. Otherwise the single response is trimmed and, if a sink was
    /// given anyway, forwarded to it whole.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Upstream`] on a non-2xx status (no retry).
    /// - [`RelayError::Transport`] when sending, reading, or decoding the
    ///   non-streaming body fails.
    /// - [`RelayError::EmptyChoices`] when a non-streaming response has no
    ///   choices.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        sink: Option<&mut dyn FragmentSink>,
    ) -> Result<String, RelayError> {
        let stream = self.will_stream(sink.is_some());
        let request = ChatCompletionRequest {
            messages,
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|err| RelayError::Internal(format!("failed to encode request: {err}")))?;

        tracing::debug!(
            model = %self.settings.model,
            stream,
            messages = messages.len(),
            "sending completion request"
        );
        let response = self
            .transport
            .post_json(&self.url, self.settings.api_key.as_deref(), body.into())
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %excerpt(&detail), "upstream rejected completion");
            return Err(upstream_error(status, &detail));
        }

        if stream {
            return accumulate_byte_stream(response.bytes_stream(), sink).await;
        }

        let bytes = response.bytes().await?;
        let answer = extract_answer(&bytes)?;
        if let Some(sink) = sink {
            sink.accept(&answer);
        }
        Ok(answer)
    }
}

fn excerpt(detail: &str) -> &str {
    match detail.char_indices().nth(ERROR_BODY_EXCERPT_CHARS) {
        Some((idx, _)) => &detail[..idx],
        None => detail,
    }
}

fn upstream_error(status: http::StatusCode, detail: &str) -> RelayError {
    let reason = status.canonical_reason().unwrap_or("");
    let detail = excerpt(detail.trim());
    let message = if detail.is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {detail}")
    };
    RelayError::Upstream {
        status: status.as_u16(),
        message,
    }
}

/// Extract the trimmed content of the first choice of a non-streaming
/// completion body.
///
/// A `null` or absent content field is an empty answer; zero choices is
/// an error.
///
/// # Errors
///
/// Returns [`RelayError::Transport`] when the body is not a completion
/// object and [`RelayError::EmptyChoices`] when `choices` is empty.
pub fn extract_answer(body: &[u8]) -> Result<String, RelayError> {
    let parsed: ChatCompletionResponse = serde_json::from_slice(body)
        .map_err(|err| RelayError::Transport(format!("invalid completion body: {err}")))?;
    let first = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(RelayError::EmptyChoices)?;
    Ok(first
        .message
        .content
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string())
}
