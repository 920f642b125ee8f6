//! Call session controller.
//!
//! Drives one call at a time from ring to decision: collect the caller-ID
//! record, consult the blacklist, hang up or let it ring. The controller
//! never retries I/O; fatal driver errors move the session to
//! [`SessionState::Failed`] and are handed to the caller.

use std::time::Duration;

use callblock_modem::{CallerIdRecord, ModemChannel, ModemDriver};
use tracing::{debug, info, warn};

use super::state::{SessionState, Trigger};
use crate::blacklist::{Blacklist, BlockRule};
use crate::error::{Error, Result};
use crate::events::{DaemonEvent, EventSink};

/// Session timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Longest single wait for a ring before `run_once` returns.
    pub idle_poll: Duration,
    /// Probe the modem after this much silence.
    pub keepalive: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_secs(1),
            keepalive: Some(Duration::from_secs(300)),
        }
    }
}

/// Result of one handled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call was let through.
    Allowed(CallerIdRecord),
    /// The call was hung up on.
    Blocked {
        /// Caller-ID data of the call.
        record: CallerIdRecord,
        /// The rule that matched.
        rule: BlockRule,
        /// Whether the modem confirmed the hang-up.
        acknowledged: bool,
    },
}

impl CallOutcome {
    /// Returns the caller-ID record of the call.
    #[must_use]
    pub const fn record(&self) -> &CallerIdRecord {
        match self {
            Self::Allowed(record) | Self::Blocked { record, .. } => record,
        }
    }

    /// Returns true if the call was blocked.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// The per-connection call session.
#[derive(Debug, Default)]
pub struct CallSession {
    state: SessionState,
    options: SessionOptions,
}

impl CallSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: SessionState::Idle,
            options,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the session to `Idle` after a failure.
    pub fn reset(&mut self) {
        if !self.state.is_idle() {
            debug!(from = %self.state, "session reset");
        }
        self.state = SessionState::Idle;
    }

    /// Waits for one call and handles it end to end.
    ///
    /// Returns `Ok(None)` if no call started within the idle poll interval
    /// and `Ok(Some(outcome))` once a call has been decided and the session
    /// is back at `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionFailed`] if the session has not been reset
    /// since a failure, or the fatal modem error that moved it to `Failed`.
    pub async fn run_once<C, S>(
        &mut self,
        driver: &mut ModemDriver<C>,
        blacklist: &Blacklist,
        sink: &mut S,
    ) -> Result<Option<CallOutcome>>
    where
        C: ModemChannel,
        S: EventSink,
    {
        if self.state.is_failed() {
            return Err(Error::SessionFailed);
        }

        let result = self.handle_call(driver, blacklist, sink).await;
        if let Err(e) = &result {
            warn!(state = %self.state, error = %e, "session failed");
            self.advance(Trigger::IoFailure);
        }
        result
    }

    async fn handle_call<C, S>(
        &mut self,
        driver: &mut ModemDriver<C>,
        blacklist: &Blacklist,
        sink: &mut S,
    ) -> Result<Option<CallOutcome>>
    where
        C: ModemChannel,
        S: EventSink,
    {
        if let Some(interval) = self.options.keepalive
            && driver.quiet_for() >= interval
        {
            debug!("modem quiet, probing");
            driver.probe().await?;
        }

        if !driver.wait_for_ring(self.options.idle_poll).await? {
            return Ok(None);
        }
        self.advance(Trigger::Ring);

        let record = driver.collect_caller_id().await?;
        self.advance(Trigger::RecordReady);
        debug!(%record, "caller-ID received");

        let verdict = blacklist.evaluate(&record);
        self.advance(Trigger::Decided {
            blocked: verdict.blocked,
        });

        let Some(rule) = verdict.matched_rule else {
            sink.emit(DaemonEvent::CallAllowed {
                record: record.clone(),
            });
            self.advance(Trigger::Allowed);
            return Ok(Some(CallOutcome::Allowed(record)));
        };

        info!(rule = %rule.display_label(), number = %record.number, "hanging up");
        let acknowledged = driver.hang_up().await?.is_ok();
        sink.emit(DaemonEvent::CallBlocked {
            record: record.clone(),
            rule: rule.clone(),
        });
        if !acknowledged {
            sink.emit(DaemonEvent::HangUpUnacknowledged {
                record: record.clone(),
            });
        }
        self.advance(Trigger::HangUpFinished);

        driver.rearm().await?;

        Ok(Some(CallOutcome::Blocked {
            record,
            rule,
            acknowledged,
        }))
    }

    fn advance(&mut self, trigger: Trigger) {
        let next = self.state.on(trigger);
        if next != self.state {
            debug!(from = %self.state, to = %next, ?trigger, "session transition");
        }
        self.state = next;
    }
}
