use super::decoder::{decode_line, LineEvent};
use super::framer::LineFramer;

/// Receives each content increment as soon as it is decoded.
pub trait FragmentSink: Send {
    fn accept(&mut self, fragment: &str);
}

impl<F> FragmentSink for F
where
    F: FnMut(&str) + Send,
{
    fn accept(&mut self, fragment: &str) {
        self(fragment);
    }
}

/// Progress of one streamed completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// Waiting for the next block on a line boundary.
    Reading,
    /// Waiting for the next block with an unfinished line held as carry.
    LinePending,
    /// Terminal marker seen; further input is never read.
    Done,
}

/// Reassembles a complete answer from a streamed completion body while
/// forwarding every non-empty content increment to an optional sink.
///
/// Leading whitespace is stripped from the answer: while nothing has been
/// accumulated yet, a fragment is trimmed at the start before it is counted
/// and forwarded. Once the answer is non-empty, fragments pass through
/// verbatim.
pub struct StreamAccumulator<'s> {
    framer: LineFramer,
    answer: String,
    state: AccumulatorState,
    fragments: usize,
    sink: Option<&'s mut dyn FragmentSink>,
}

impl<'s> StreamAccumulator<'s> {
    #[must_use]
    pub fn new(sink: Option<&'s mut dyn FragmentSink>) -> Self {
        Self {
            framer: LineFramer::new(),
            answer: String::new(),
            state: AccumulatorState::Reading,
            fragments: 0,
            sink,
        }
    }

    #[must_use]
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Number of fragments forwarded so far.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Process one block of upstream text.
    ///
    /// Returns the state after the block. Once [`AccumulatorState::Done`]
    /// is reached, the rest of the block and every later block is ignored.
    pub fn feed(&mut self, block: &str) -> AccumulatorState {
        if self.state == AccumulatorState::Done {
            return self.state;
        }

        let mut pending = None;
        for line in self.framer.split(block) {
            match decode_line(&line.text) {
                LineEvent::Terminal => {
                    self.state = AccumulatorState::Done;
                    return self.state;
                }
                LineEvent::Comment => {}
                LineEvent::Fragment(content) => {
                    if let Some(content) = content {
                        self.push_fragment(&content);
                    }
                }
                LineEvent::Incomplete | LineEvent::Malformed | LineEvent::Ignore
                    if !line.terminated =>
                {
                    pending = Some(line.into_owned());
                }
                LineEvent::Incomplete => {
                    tracing::debug!("dropping truncated data event");
                }
                LineEvent::Malformed | LineEvent::Ignore => {}
            }
        }

        self.state = match pending.filter(|line| !line.is_empty()) {
            Some(line) => {
                self.framer.hold(line);
                AccumulatorState::LinePending
            }
            None => AccumulatorState::Reading,
        };
        self.state
    }

    /// End of input: decode any held line once more and return the answer.
    #[must_use]
    pub fn finish(mut self) -> String {
        if self.state != AccumulatorState::Done {
            if let Some(line) = self.framer.take_carry() {
                if let LineEvent::Fragment(Some(content)) = decode_line(line.trim_end_matches('\r'))
                {
                    self.push_fragment(&content);
                }
            }
            self.state = AccumulatorState::Done;
        }
        self.answer
    }

    fn push_fragment(&mut self, content: &str) {
        let text = if self.answer.is_empty() {
            content.trim_start()
        } else {
            content
        };
        if text.is_empty() {
            return;
        }
        self.answer.push_str(text);
        self.fragments += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink.accept(text);
        }
    }
}
