use crate::protocol::openai_chat::ChatCompletionChunk;

/// Prefix of a data event line.
pub const DATA_PREFIX: &str = "data: ";
/// Line that ends an upstream stream.
pub const TERMINAL_LINE: &str = "data: [DONE]";

/// Classification of one candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Protocol comment (`:` prefix). Never carries content.
    Comment,
    /// `data: [DONE]`.
    Terminal,
    /// Decoded data event; `None` when the delta has no content field.
    Fragment(Option<String>),
    /// Data line whose JSON ended early, usually because the rest has not
    /// arrived yet.
    Incomplete,
    /// Data line whose JSON is complete but unusable: bad syntax, missing
    /// `choices`/`delta`, or an empty `choices` array.
    Malformed,
    /// Anything else: blank lines, `event:`/`id:` fields, unknown noise.
    Ignore,
}

/// Decode a single line of an upstream completion stream.
///
/// Never fails: JSON problems are reported as [`LineEvent::Incomplete`] or
/// [`LineEvent::Malformed`] so the stream keeps going.
#[must_use]
pub fn decode_line(line: &str) -> LineEvent {
    if line.starts_with(':') {
        return LineEvent::Comment;
    }
    if line == TERMINAL_LINE {
        return LineEvent::Terminal;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineEvent::Ignore;
    };

    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => match chunk.choices.into_iter().next() {
            Some(choice) => LineEvent::Fragment(choice.delta.content),
            None => LineEvent::Malformed,
        },
        Err(err) if err.is_eof() => LineEvent::Incomplete,
        Err(err) => {
            tracing::debug!(error = %err, "skipping malformed data event");
            LineEvent::Malformed
        }
    }
}
