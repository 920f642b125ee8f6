//! Daemon events.
//!
//! The core reports what it does as discrete [`DaemonEvent`]s. Where they go
//! is up to the [`EventSink`]; [`TracingSink`] turns them into structured
//! `tracing` events.

use std::time::Duration;

use callblock_modem::CallerIdRecord;
use tracing::{info, warn};

use crate::blacklist::BlockRule;

/// Something the daemon did or observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// A call was let through.
    CallAllowed {
        /// Caller-ID data of the call.
        record: CallerIdRecord,
    },
    /// A call was hung up on.
    CallBlocked {
        /// Caller-ID data of the call.
        record: CallerIdRecord,
        /// The rule that matched.
        rule: BlockRule,
    },
    /// The modem did not confirm the hang-up; the line may already have
    /// dropped.
    HangUpUnacknowledged {
        /// Caller-ID data of the call.
        record: CallerIdRecord,
    },
    /// The device failed and the connection is being torn down.
    DeviceError {
        /// Short error kind, e.g. `init_failed`.
        kind: &'static str,
        /// Human-readable detail.
        detail: String,
    },
    /// A reconnect is scheduled.
    Reconnecting {
        /// Consecutive failed attempts so far.
        attempt: u32,
        /// Delay before the next attempt.
        delay: Duration,
    },
}

/// Receives daemon events.
pub trait EventSink {
    /// Handles one event.
    fn emit(&mut self, event: DaemonEvent);
}

/// Collects events in memory.
impl EventSink for Vec<DaemonEvent> {
    fn emit(&mut self, event: DaemonEvent) {
        self.push(event);
    }
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::CallAllowed { record } => info!(
                event = "call_allowed",
                number = %record.number,
                name = %record.name,
                anonymous = record.is_anonymous(),
                at = %record.timestamp,
                "call allowed"
            ),
            DaemonEvent::CallBlocked { record, rule } => info!(
                event = "call_blocked",
                number = %record.number,
                name = %record.name,
                anonymous = record.is_anonymous(),
                at = %record.timestamp,
                rule = %rule.display_label(),
                "call blocked"
            ),
            DaemonEvent::HangUpUnacknowledged { record } => warn!(
                event = "hang_up_unacknowledged",
                number = %record.number,
                "modem did not confirm hang-up"
            ),
            DaemonEvent::DeviceError { kind, detail } => warn!(
                event = "device_error",
                kind,
                %detail,
                "device error"
            ),
            DaemonEvent::Reconnecting { attempt, delay } => info!(
                event = "reconnecting",
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callblock_modem::CallerValue;
    use chrono::NaiveDateTime;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<DaemonEvent> = Vec::new();
        let record = CallerIdRecord::new(
            NaiveDateTime::default(),
            CallerValue::from_raw("5550100"),
            CallerValue::from_raw("PAT"),
        );
        sink.emit(DaemonEvent::CallAllowed { record });
        sink.emit(DaemonEvent::Reconnecting {
            attempt: 1,
            delay: Duration::from_secs(1),
        });
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_tracing_sink_accepts_every_event() {
        let mut sink = TracingSink;
        let record = CallerIdRecord::new(
            NaiveDateTime::default(),
            CallerValue::from_raw("5551234567"),
            CallerValue::from_raw("SCAM CALLER"),
        );
        sink.emit(DaemonEvent::CallBlocked {
            record: record.clone(),
            rule: BlockRule::number("555*", "area"),
        });
        sink.emit(DaemonEvent::HangUpUnacknowledged { record });
        sink.emit(DaemonEvent::DeviceError {
            kind: "closed",
            detail: "Device closed the connection".to_string(),
        });
    }
}
