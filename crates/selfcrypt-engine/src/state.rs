//! Per-call encryption state machine
//!
//! ```text
//! Idle -> Classifying -> Planning -> Processing(i)* -> Finalizing -> Done
//!   \____________________\__________\_________________\__________-> Failed
//! ```
//!
//! `Processing(i)` repeats once per stored chunk; `i` is the chunk index that
//! just completed, in completion order. Done and Failed are terminal.

use selfcrypt_core::SelfCryptError;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Classifying,
    Planning,
    Processing(usize),
    Finalizing,
    Done,
    Failed,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: EngineState) -> bool {
        use EngineState::*;
        match (self, next) {
            (s, Failed) => !s.is_terminal(),
            (Idle, Classifying) => true,
            (Classifying, Planning) => true,
            (Planning, Processing(_)) | (Processing(_), Processing(_)) => true,
            (Processing(_), Finalizing) => true,
            (Finalizing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Classifying => write!(f, "classifying"),
            Self::Planning => write!(f, "planning"),
            Self::Processing(i) => write!(f, "processing({i})"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks and logs the state of one engine call.
#[derive(Debug)]
pub struct StateTracker {
    op: &'static str,
    state: EngineState,
    history: Vec<EngineState>,
}

impl StateTracker {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            state: EngineState::Idle,
            history: vec![EngineState::Idle],
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[EngineState] {
        &self.history
    }

    pub fn advance(&mut self, next: EngineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        debug!(op = self.op, from = %self.state, to = %next, "state transition");
        self.state = next;
        self.history.push(next);
    }

    pub fn fail(&mut self, err: &SelfCryptError) {
        warn!(op = self.op, at = %self.state, kind = err.kind(), error = %err, "operation failed");
        if !self.state.is_terminal() {
            self.state = EngineState::Failed;
            self.history.push(EngineState::Failed);
        }
    }
}
