//! Modem protocol driver.
//!
//! Translates between the AT command/response vocabulary and the
//! [`CallerIdRecord`]s the rest of the system consumes. The driver owns its
//! channel; dropping the driver releases the device.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::ModemChannel;
use super::config::DriverTimeouts;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{Dialect, Notification, parse_line};
use crate::types::{CallerIdAccumulator, CallerIdRecord};

/// Maximum lines examined while waiting for a final result code.
const MAX_ACK_LINES: usize = 10;

/// Outcome of waiting for a command's final result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The modem answered `OK`.
    Ok,
    /// The modem answered `ERROR`.
    Rejected,
    /// No result code arrived before the deadline.
    Missing,
}

impl Acknowledgement {
    /// Returns true if the modem answered `OK`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// AT-command driver for a caller-ID capable modem.
#[derive(Debug)]
pub struct ModemDriver<C> {
    channel: C,
    dialect: Dialect,
    timeouts: DriverTimeouts,
    pending: VecDeque<Notification>,
    last_ring: Option<Instant>,
    ring_pending: bool,
    last_activity: Instant,
}

impl<C: ModemChannel> ModemDriver<C> {
    /// Creates a driver over an open channel.
    pub fn new(channel: C, dialect: Dialect, timeouts: DriverTimeouts) -> Self {
        Self {
            channel,
            dialect,
            timeouts,
            pending: VecDeque::new(),
            last_ring: None,
            ring_pending: false,
            last_activity: Instant::now(),
        }
    }

    /// Returns how long the modem has been silent.
    pub fn quiet_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Resets the modem and arms caller-ID reporting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitFailed`] if either command is not acknowledged
    /// within the retry budget, or a fatal channel error.
    pub async fn initialize(&mut self) -> Result<()> {
        self.command_with_retries(&Command::Reset).await?;
        let enable = Command::EnableCallerId {
            command: self.dialect.enable_command.clone(),
        };
        self.command_with_retries(&enable).await?;
        info!(dialect = %self.dialect.name, "modem initialized, caller-ID armed");
        Ok(())
    }

    /// Re-arms caller-ID reporting after a hang-up, if the dialect asks for it.
    ///
    /// # Errors
    ///
    /// Same as [`ModemDriver::initialize`].
    pub async fn rearm(&mut self) -> Result<()> {
        if self.dialect.rearm_after_hangup {
            self.initialize().await?;
        }
        Ok(())
    }

    /// Checks that the modem still answers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unacknowledged`] if `AT` goes unanswered for the whole
    /// retry budget.
    pub async fn probe(&mut self) -> Result<()> {
        match self.command_with_retries(&Command::Attention).await {
            Err(Error::InitFailed { command, .. }) => Err(Error::Unacknowledged { command }),
            other => other,
        }
    }

    /// Waits up to `wait` for the start of a call.
    ///
    /// Returns `Ok(true)` on a ring indication (or on caller-ID data for
    /// dialects that send it before the first ring) and `Ok(false)` if the
    /// line stayed quiet. Rings arriving within the ring gap of the previous
    /// ring belong to a call that was already handled and are skipped.
    ///
    /// # Errors
    ///
    /// Returns fatal channel errors only.
    pub async fn wait_for_ring(&mut self, wait: Duration) -> Result<bool> {
        let deadline = Instant::now() + wait;
        loop {
            let Some(notification) = self.next_until(deadline).await? else {
                return Ok(false);
            };
            match notification {
                Notification::Ring => {
                    let continuation = self.is_continuation_ring();
                    self.mark_ring();
                    if continuation {
                        debug!("ring belongs to the previous call, ignoring");
                        continue;
                    }
                    debug!("ring indication");
                    self.ring_pending = false;
                    return Ok(true);
                }
                Notification::Field(field) if self.dialect.data_before_ring => {
                    debug!("caller-ID data ahead of ring, treating as call start");
                    // The rings that follow belong to this call.
                    self.mark_ring();
                    self.ring_pending = true;
                    self.pending.push_front(Notification::Field(field));
                    return Ok(true);
                }
                Notification::Field(field) => {
                    debug!(?field, "caller-ID data outside a call, ignoring");
                }
                other => trace!(?other, "idle line ignored"),
            }
        }
    }

    /// Collects caller-ID data for the current call.
    ///
    /// Completes when both number and name were observed, or falls back when
    /// a second ring arrives or the caller-ID timeout expires; slots never
    /// observed are marked as not sent. Always yields exactly one record.
    ///
    /// # Errors
    ///
    /// Returns fatal channel errors only.
    pub async fn collect_caller_id(&mut self) -> Result<CallerIdRecord> {
        let received_at = Local::now().naive_local();
        let deadline = Instant::now() + self.timeouts.caller_id;
        let mut accumulator = CallerIdAccumulator::Empty;

        loop {
            if let CallerIdAccumulator::Complete(record) = accumulator {
                self.ring_pending = false;
                return Ok(record);
            }

            let Some(notification) = self.next_until(deadline).await? else {
                debug!(
                    partial = !accumulator.is_empty(),
                    "caller-ID collection timed out"
                );
                self.ring_pending = false;
                return Ok(accumulator.finish(received_at));
            };

            match notification {
                Notification::Field(field) => {
                    accumulator = accumulator.advance(field, received_at);
                }
                Notification::Ring if self.ring_pending => {
                    self.mark_ring();
                    self.ring_pending = false;
                    trace!("first ring of a call announced by caller-ID data");
                }
                Notification::Ring => {
                    self.mark_ring();
                    debug!(
                        partial = !accumulator.is_empty(),
                        "second ring before caller-ID completed"
                    );
                    return Ok(accumulator.finish(received_at));
                }
                other => trace!(?other, "ignored while collecting caller-ID"),
            }
        }
    }

    /// Terminates the current call: off-hook, then on-hook.
    ///
    /// A missing acknowledgement is not an error; the line may already have
    /// dropped. Notifications queued during the aborted call are discarded.
    ///
    /// # Errors
    ///
    /// Returns fatal channel errors only.
    pub async fn hang_up(&mut self) -> Result<Acknowledgement> {
        let off_hook = self.send(&Command::OffHook).await?;
        if !off_hook.is_ok() {
            warn!(ack = ?off_hook, "off-hook not acknowledged");
        }
        let on_hook = self.send(&Command::OnHook).await?;
        if !on_hook.is_ok() {
            warn!(ack = ?on_hook, "hang-up not acknowledged");
        }
        self.pending.clear();

        Ok(if off_hook.is_ok() { on_hook } else { off_hook })
    }

    /// Resets the modem before the channel is released. Best effort.
    pub async fn shutdown(mut self) {
        match self.send(&Command::Reset).await {
            Ok(Acknowledgement::Ok) => debug!("modem reset on shutdown"),
            Ok(ack) => debug!(?ack, "modem reset on shutdown not acknowledged"),
            Err(e) => debug!(error = %e, "modem reset on shutdown failed"),
        }
    }

    /// Sends a command and waits for its final result code.
    ///
    /// Call notifications arriving meanwhile are queued for the session.
    ///
    /// # Errors
    ///
    /// Returns fatal channel errors only.
    pub async fn send(&mut self, command: &Command) -> Result<Acknowledgement> {
        self.channel.write(&command.serialize()).await?;
        self.await_ack(command).await
    }

    async fn command_with_retries(&mut self, command: &Command) -> Result<()> {
        let attempts = self.timeouts.init_attempts;
        for attempt in 1..=attempts {
            let ack = self.send(command).await?;
            if ack.is_ok() {
                return Ok(());
            }
            warn!(%command, attempt, attempts, ?ack, "command not acknowledged");
        }
        Err(Error::init_failed(command.to_string(), attempts))
    }

    async fn await_ack(&mut self, command: &Command) -> Result<Acknowledgement> {
        let deadline = Instant::now() + self.timeouts.ack;
        for _ in 0..MAX_ACK_LINES {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let line = match self.channel.read_line(remaining).await {
                Ok(line) => line,
                Err(e) if e.is_timeout() => break,
                Err(Error::MalformedNotification(detail)) => {
                    warn!(%detail, "skipping malformed line");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.last_activity = Instant::now();

            if command.is_echo(&line) {
                continue;
            }
            match parse_line(&line, &self.dialect) {
                Ok(Notification::Ok) => return Ok(Acknowledgement::Ok),
                Ok(Notification::Error) => return Ok(Acknowledgement::Rejected),
                Ok(notification) if notification.is_call_activity() => {
                    debug!(?notification, "queued call notification");
                    self.pending.push_back(notification);
                }
                Ok(other) => trace!(?other, "ignored while awaiting acknowledgement"),
                Err(e) => warn!(error = %e, "skipping malformed line"),
            }
        }
        debug!(%command, "no acknowledgement");
        Ok(Acknowledgement::Missing)
    }

    /// Returns the next queued or received notification, or `None` once
    /// `deadline` passes. Malformed lines are logged and skipped.
    async fn next_until(&mut self, deadline: Instant) -> Result<Option<Notification>> {
        if let Some(notification) = self.pending.pop_front() {
            return Ok(Some(notification));
        }
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let line = match self.channel.read_line(remaining).await {
                Ok(line) => line,
                Err(e) if e.is_timeout() => return Ok(None),
                Err(Error::MalformedNotification(detail)) => {
                    warn!(%detail, "skipping malformed line");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.last_activity = Instant::now();

            match parse_line(&line, &self.dialect) {
                Ok(notification) => return Ok(Some(notification)),
                Err(e) => warn!(error = %e, "skipping malformed line"),
            }
        }
    }

    fn is_continuation_ring(&self) -> bool {
        self.last_ring
            .is_some_and(|at| at.elapsed() < self.timeouts.ring_gap)
    }

    fn mark_ring(&mut self) {
        self.last_ring = Some(Instant::now());
    }
}
