pub mod accumulator;
pub mod decoder;
pub mod framer;

pub use accumulator::{AccumulatorState, FragmentSink, StreamAccumulator};
pub use decoder::{decode_line, LineEvent, DATA_PREFIX, TERMINAL_LINE};
pub use framer::{CandidateLine, LineFramer};

use std::fmt;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::error::RelayError;

/// Incremental UTF-8 decoding of network chunks.
///
/// A multi-byte sequence split across two reads is held back until the
/// rest arrives. Invalid sequences become U+FFFD instead of failing.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    remainder: Vec<u8>,
}

impl Utf8ChunkDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (after any held-back prefix) as possible.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.remainder);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            self.remainder.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back at end of input.
    pub fn finish(&mut self) -> String {
        let remainder = std::mem::take(&mut self.remainder);
        String::from_utf8_lossy(&remainder).into_owned()
    }
}

/// Drive a [`StreamAccumulator`] over an upstream body.
///
/// Reads stop as soon as the terminal marker is seen. End of input without a
/// terminal marker is not an error: whatever accumulated is returned.
///
/// # Errors
///
/// Returns [`RelayError::Transport`] when reading the body fails.
pub async fn accumulate_byte_stream<S, E>(
    byte_stream: S,
    sink: Option<&mut dyn FragmentSink>,
) -> Result<String, RelayError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
{
    let mut byte_stream = std::pin::pin!(byte_stream);
    let mut accumulator = StreamAccumulator::new(sink);
    let mut utf8 = Utf8ChunkDecoder::new();

    while accumulator.state() != AccumulatorState::Done {
        let Some(chunk) = byte_stream.next().await else {
            let tail = utf8.finish();
            if !tail.is_empty() {
                accumulator.feed(&tail);
            }
            break;
        };
        let bytes =
            chunk.map_err(|err| RelayError::Transport(format!("stream read error: {err}")))?;
        let text = utf8.decode(&bytes);
        accumulator.feed(&text);
    }

    let fragments = accumulator.fragment_count();
    let answer = accumulator.finish();
    tracing::debug!(fragments, chars = answer.len(), "upstream stream finished");
    Ok(answer)
}
