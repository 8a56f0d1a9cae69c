//! Single-flight turn state machine.
//!
//! While a response stream is in flight, a second chat submission must be
//! rejected, not queued. Rather than a busy flag scattered across handlers,
//! the guard is an explicit state machine: `Idle → Streaming → Finalizing → Idle`.

use crate::error::Error;

/// The lifecycle of a streaming turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn in flight; submissions are accepted.
    Idle,
    /// The backend stream is being consumed.
    Streaming,
    /// End-of-stream reached; the finalized message is being committed.
    Finalizing,
}

/// Guard enforcing at most one in-progress streaming turn per conversation.
#[derive(Debug)]
pub struct TurnGuard {
    state: TurnState,
}

impl TurnGuard {
    pub fn new() -> Self {
        Self {
            state: TurnState::Idle,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Attempt to start a new turn. Fails with [`Error::Busy`] unless Idle.
    pub fn begin(&mut self) -> Result<(), Error> {
        match self.state {
            TurnState::Idle => {
                self.state = TurnState::Streaming;
                Ok(())
            }
            TurnState::Streaming | TurnState::Finalizing => Err(Error::Busy),
        }
    }

    /// End-of-stream reached; move to the commit phase.
    pub fn finalize(&mut self) {
        debug_assert_eq!(self.state, TurnState::Streaming);
        self.state = TurnState::Finalizing;
    }

    /// Release the guard back to Idle. Called after the commit completes,
    /// and on every failure path so an error never wedges the conversation.
    pub fn complete(&mut self) {
        self.state = TurnState::Idle;
    }
}

impl Default for TurnGuard {
    fn default() -> Self {
        Self::new()
    }
}
