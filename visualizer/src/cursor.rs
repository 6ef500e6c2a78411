//! Bounded cursor over an execution trace.
//!
//! A cursor over a trace of length `N` lives in `[-1, N]`:
//!
//! ```text
//! Unstarted (-1) → AtStep(0) → … → AtStep(N-1) → Finished (N)
//! ```
//!
//! Out-of-range navigation is clamped, never an error.

use serde::{Deserialize, Serialize};
use shared_types::{CursorPosition, StepProgress, TraceKind};

/// Where `reset()` and a freshly attached request trace start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPosition {
    /// Pre-transition display (index -1)
    #[default]
    Unstarted,
    /// First transition (index 0)
    FirstStep,
}

impl ResetPosition {
    pub fn index(self) -> i64 {
        match self {
            Self::Unstarted => -1,
            Self::FirstStep => 0,
        }
    }
}

/// Result of a forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    /// The cursor was already finished; autoplay must stop.
    AlreadyFinished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    index: i64,
    len: usize,
    reset_to: ResetPosition,
}

impl Cursor {
    /// Create an unstarted cursor over a trace of `len` steps.
    pub fn new(len: usize, reset_to: ResetPosition) -> Self {
        Self {
            index: -1,
            len,
            reset_to,
        }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn end(&self) -> i64 {
        self.len as i64
    }

    pub fn position(&self) -> CursorPosition {
        if self.index < 0 {
            CursorPosition::Unstarted
        } else if self.index >= self.end() {
            CursorPosition::Finished
        } else {
            CursorPosition::AtStep {
                index: self.index as usize,
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.end()
    }

    pub fn can_next(&self) -> bool {
        self.index < self.end()
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    pub fn next(&mut self) -> Advance {
        if self.can_next() {
            self.index += 1;
            Advance::Moved
        } else {
            Advance::AlreadyFinished
        }
    }

    /// Step back one transition. Returns whether the cursor moved.
    pub fn prev(&mut self) -> bool {
        if self.can_prev() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.seek(self.reset_to.index());
    }

    pub fn seek(&mut self, index: i64) {
        self.index = index.clamp(-1, self.end());
    }

    /// Counter shown next to the controls.
    ///
    /// DFA playback counts the finished slot as an extra step; PDA playback
    /// counts operations only.
    pub fn progress(&self, kind: TraceKind) -> StepProgress {
        let total = match kind {
            TraceKind::Dfa => self.len + 1,
            TraceKind::Pda => self.len,
        };
        StepProgress {
            current: (self.index + 1).min(total as i64),
            total,
        }
    }
}
