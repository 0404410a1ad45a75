//! Phase flag and diagnostic snapshot types.
//!
//! The phase is the single turn indicator shared by every worker: it decides
//! which role may proceed. Exactly one value is current at any instant, and
//! only the gate's transition paths may change it.

use std::fmt;

/// The current access mode governing which role may proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Readers are admitted; any number may be active at once.
    Read,
    /// Writers take turns; at most one holds the exclusion token.
    Write,
}

impl Phase {
    /// Returns the phase the gate hands the turn to after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Read => Self::Write,
            Self::Write => Self::Read,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// A consistent snapshot of the gate's shared state.
///
/// All three fields are captured under the same lock acquisition, so the
/// snapshot never shows an impossible combination (e.g. a held token during
/// `Read` phase).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateSnapshot {
    /// The phase that was current when the snapshot was taken.
    pub phase: Phase,
    /// Readers inside their read section at snapshot time.
    pub active_readers: u32,
    /// Whether a writer held the exclusion token at snapshot time.
    pub writer_holds_token: bool,
}

impl GateSnapshot {
    /// Returns `true` if no reader is active and no writer holds the token.
    ///
    /// This is the only state in which shutdown is legal.
    #[must_use]
    pub const fn is_quiescent(&self) -> bool {
        self.active_readers == 0 && !self.writer_holds_token
    }
}
