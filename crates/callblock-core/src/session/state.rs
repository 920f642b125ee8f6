//! Call session states.
//!
//! A session moves through one call at a time:
//!
//! ```text
//! Idle ──Ring──▶ AwaitingCid ──RecordReady──▶ Deciding ──Decided──▶ Blocking ──HangUpFinished──▶ Idle
//!                                                                └─▶ Allowing ──Allowed─────────▶ Idle
//! ```
//!
//! Any state moves to `Failed` on an I/O failure; `Failed` is left only by
//! an explicit reset.

/// Phase of the call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for a ring.
    #[default]
    Idle,
    /// A ring arrived; collecting caller-ID data.
    AwaitingCid,
    /// A record is ready; evaluating the blacklist.
    Deciding,
    /// Hanging up on a blacklisted caller.
    Blocking,
    /// Letting the call ring through.
    Allowing,
    /// The channel failed; the daemon must reconnect.
    Failed,
}

/// Input driving a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new call rang.
    Ring,
    /// The caller-ID record is complete (or finished by fallback).
    RecordReady,
    /// The blacklist decided.
    Decided {
        /// Whether the call is to be rejected.
        blocked: bool,
    },
    /// The hang-up sequence finished, acknowledged or not.
    HangUpFinished,
    /// The allowed call has been handed back to the line.
    Allowed,
    /// The channel failed.
    IoFailure,
}

impl SessionState {
    /// Returns the state after `trigger`.
    ///
    /// Triggers that do not apply to the current state leave it unchanged.
    #[must_use]
    pub const fn on(self, trigger: Trigger) -> Self {
        match (self, trigger) {
            (_, Trigger::IoFailure) | (Self::Failed, _) => Self::Failed,
            (Self::Idle, Trigger::Ring) => Self::AwaitingCid,
            (Self::AwaitingCid, Trigger::RecordReady) => Self::Deciding,
            (Self::Deciding, Trigger::Decided { blocked: true }) => Self::Blocking,
            (Self::Deciding, Trigger::Decided { blocked: false }) => Self::Allowing,
            (Self::Blocking, Trigger::HangUpFinished) | (Self::Allowing, Trigger::Allowed) => {
                Self::Idle
            }
            (state, _) => state,
        }
    }

    /// Returns true while no call is in progress.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true after an I/O failure.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCid => "awaiting_cid",
            Self::Deciding => "deciding",
            Self::Blocking => "blocking",
            Self::Allowing => "allowing",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
