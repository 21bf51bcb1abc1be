pub mod history;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::completion::CompletionClient;
use crate::config::AppConfig;
use crate::context::ContextAssembler;
use crate::error::RelayError;
use crate::observability::{log_exchange, log_inquiry};
use crate::stream::FragmentSink;
use crate::transport::HttpTransport;

pub use history::{History, Turn};

/// Result of one resolved inquiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub inquiry: String,
    pub answer: String,
    pub duration_ms: u64,
}

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub completion: CompletionClient,
    pub assembler: ContextAssembler,
    pub history: History,
    request_seq: AtomicU64,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, transport: HttpTransport) -> Self {
        let completion = CompletionClient::with_transport(config.llm.clone(), transport);
        let assembler = ContextAssembler::new(
            config.features.system_prompt.as_str(),
            config.features.history_window,
        );
        Self {
            config,
            completion,
            assembler,
            history: History::new(),
            request_seq: AtomicU64::new(1),
        }
    }

    pub fn next_request_seq(&self) -> u64 {
        self.request_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Answer one inquiry in the context of the recent conversation.
    ///
    /// History is read when the flow starts and appended to only after the
    /// answer has fully resolved. A failed completion leaves it untouched.
    ///
    /// # Errors
    ///
    /// Propagates every [`RelayError`] from the completion call.
    pub async fn reply(
        &self,
        inquiry: &str,
        sink: Option<&mut dyn FragmentSink>,
    ) -> Result<Exchange, RelayError> {
        let seq = self.next_request_seq();
        log_inquiry(seq, inquiry);

        let recent = self.history.recent_snapshot(self.assembler.window());
        let messages = self.assembler.assemble(&recent, inquiry);

        let start = Instant::now();
        let answer = self
            .completion
            .complete(&messages, sink)
            .await
            .inspect_err(|err| tracing::warn!(seq, error = %err, "completion failed"))?;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        log_exchange(seq, &answer, duration_ms);
        self.history
            .append(Turn::new(inquiry, answer.as_str(), duration_ms));

        Ok(Exchange {
            inquiry: inquiry.to_string(),
            answer,
            duration_ms,
        })
    }
}
