//! Line framing across network read boundaries.
//!
//! Upstream bodies arrive in arbitrary blocks. A block is split on `\n`;
//! every piece but the last is a complete line, the last piece is whatever
//! the upstream has sent of the next line so far. The unfinished text held
//! back from the previous block (the carry) is prefixed onto the first piece
//! of the next block only.
use std::borrow::Cow;

use memchr::memchr;

/// One candidate line produced from a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine<'a> {
    pub text: Cow<'a, str>,
    /// `false` only for the final piece of a block: the upstream has not
    /// finished this line yet.
    pub terminated: bool,
}

impl CandidateLine<'_> {
    #[must_use]
    pub fn into_owned(self) -> String {
        self.text.into_owned()
    }
}

/// Holds the carry between blocks.
#[derive(Debug, Default)]
pub struct LineFramer {
    carry: String,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `block` into candidate lines, consuming the current carry.
    ///
    /// The carry is empty afterwards; the caller decides what (if anything)
    /// to [`hold`](Self::hold) for the next block.
    pub fn split<'b>(&mut self, block: &'b str) -> Lines<'b> {
        Lines {
            prefix: std::mem::take(&mut self.carry),
            rest: Some(block),
        }
    }

    /// Keep `line` as the carry for the next block.
    pub fn hold(&mut self, line: String) {
        self.carry = line;
    }

    pub fn clear(&mut self) {
        self.carry.clear();
    }

    #[must_use]
    pub fn carry(&self) -> &str {
        &self.carry
    }

    #[must_use]
    pub fn has_carry(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Take the carry out, leaving the framer empty.
    pub fn take_carry(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.carry))
        }
    }
}

/// Iterator over the candidate lines of one block.
#[derive(Debug)]
pub struct Lines<'b> {
    prefix: String,
    rest: Option<&'b str>,
}

impl<'b> Iterator for Lines<'b> {
    type Item = CandidateLine<'b>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        let (piece, terminated) = match memchr(b'\n', rest.as_bytes()) {
            Some(pos) => {
                self.rest = Some(&rest[pos + 1..]);
                let piece = &rest[..pos];
                (piece.strip_suffix('\r').unwrap_or(piece), true)
            }
            None => {
                self.rest = None;
                (rest, false)
            }
        };

        let text = if self.prefix.is_empty() {
            Cow::Borrowed(piece)
        } else {
            let mut joined = std::mem::take(&mut self.prefix);
            joined.push_str(piece);
            if terminated {
                if let Some(stripped) = joined.strip_suffix('\r') {
                    let len = stripped.len();
                    joined.truncate(len);
                }
            }
            Cow::Owned(joined)
        };

        Some(CandidateLine { text, terminated })
    }
}
