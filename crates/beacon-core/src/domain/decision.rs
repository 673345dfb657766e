//! Decision model: what the resolver does after an attempt.

use std::time::Duration;

/// The next action after recording an attempt outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Re-issue the same strategy after a delay.
    Retry { delay: Duration, reason: String },

    /// Give up on the current strategy and start the next one.
    NextStrategy { reason: String },

    /// The attempt delivered; stop.
    Complete,

    /// No strategy is left.
    Exhausted { reason: String },
}

impl Decision {
    /// Whether resolution stops after this decision.
    pub fn is_final(&self) -> bool {
        matches!(self, Decision::Complete | Decision::Exhausted { .. })
    }
}
