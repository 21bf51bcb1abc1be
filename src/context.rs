use crate::protocol::openai_chat::ChatMessage;
use crate::state::history::Turn;

/// Number of past turns included in each request by default.
pub const DEFAULT_HISTORY_WINDOW: usize = 4;

/// Builds the message list for one completion: system instruction, the
/// most recent turns in their original order, then the new inquiry.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    system_prompt: String,
    window: usize,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, window: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window,
        }
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Assemble `1 + 2 * min(history.len(), window) + 1` messages.
    #[must_use]
    pub fn assemble(&self, history: &[Turn], inquiry: &str) -> Vec<ChatMessage> {
        let recent = &history[history.len().saturating_sub(self.window)..];
        let mut messages = Vec::with_capacity(2 + recent.len() * 2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        for turn in recent {
            messages.push(ChatMessage::user(turn.inquiry.as_str()));
            messages.push(ChatMessage::assistant(turn.answer.as_str()));
        }
        messages.push(ChatMessage::user(inquiry));
        messages
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SYSTEM_PROMPT, DEFAULT_HISTORY_WINDOW)
    }
}
