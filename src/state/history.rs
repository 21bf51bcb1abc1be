use parking_lot::Mutex;

/// One completed exchange. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub inquiry: String,
    pub answer: String,
    pub duration_ms: u64,
}

impl Turn {
    #[must_use]
    pub fn new(inquiry: impl Into<String>, answer: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            inquiry: inquiry.into(),
            answer: answer.into(),
            duration_ms,
        }
    }
}

/// Append-only conversation log shared by all request flows.
///
/// Every operation takes the lock once, so appends never tear. Flows are
/// not serialized against each other: two requests in flight both read
/// their snapshot at start and append at end, so neither sees the other's
/// turn.
#[derive(Debug, Default)]
pub struct History {
    turns: Mutex<Vec<Turn>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, turn: Turn) {
        self.turns.lock().push(turn);
    }

    /// Copy of the last `n` turns, oldest first.
    #[must_use]
    pub fn recent_snapshot(&self, n: usize) -> Vec<Turn> {
        let turns = self.turns.lock();
        let start = turns.len().saturating_sub(n);
        turns[start..].to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.lock().is_empty()
    }
}
