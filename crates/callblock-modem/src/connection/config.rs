//! Device and timing configuration.

use std::time::Duration;

/// Serial parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => Self::None,
            Parity::Odd => Self::Odd,
            Parity::Even => Self::Even,
        }
    }
}

/// Serial flow control setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FlowControl {
    /// No flow control.
    None,
    /// XON/XOFF.
    Software,
    /// RTS/CTS. **Recommended for voice modems.**
    #[default]
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => Self::None,
            FlowControl::Software => Self::Software,
            FlowControl::Hardware => Self::Hardware,
        }
    }
}

/// Serial device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Device node, e.g. `/dev/ttyACM0`.
    pub path: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Parity.
    pub parity: Parity,
    /// Use two stop bits instead of one.
    pub two_stop_bits: bool,
    /// Flow control.
    pub flow_control: FlowControl,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new("/dev/ttyACM0")
    }
}

impl DeviceConfig {
    /// Creates a configuration for 1200 baud 8N1 with hardware flow control.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: 1200,
            parity: Parity::None,
            two_stop_bits: false,
            flow_control: FlowControl::Hardware,
        }
    }
}

/// Timeouts and retry budget used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimeouts {
    /// How long to wait for `OK`/`ERROR` after a command.
    pub ack: Duration,
    /// How long to wait for caller-ID data after a ring.
    pub caller_id: Duration,
    /// Rings closer together than this belong to the same call.
    pub ring_gap: Duration,
    /// Attempts per initialization command before giving up.
    pub init_attempts: u32,
}

impl Default for DriverTimeouts {
    fn default() -> Self {
        Self {
            ack: Duration::from_secs(2),
            caller_id: Duration::from_secs(6),
            ring_gap: Duration::from_secs(8),
            init_attempts: 3,
        }
    }
}

impl DriverTimeouts {
    /// Creates a timeouts builder starting from the defaults.
    #[must_use]
    pub fn builder() -> DriverTimeoutsBuilder {
        DriverTimeoutsBuilder::default()
    }
}

/// Builder for [`DriverTimeouts`].
#[derive(Debug, Clone, Default)]
pub struct DriverTimeoutsBuilder {
    inner: DriverTimeouts,
}

impl DriverTimeoutsBuilder {
    /// Sets the acknowledgement timeout.
    #[must_use]
    pub const fn ack(mut self, timeout: Duration) -> Self {
        self.inner.ack = timeout;
        self
    }

    /// Sets the caller-ID collection timeout.
    #[must_use]
    pub const fn caller_id(mut self, timeout: Duration) -> Self {
        self.inner.caller_id = timeout;
        self
    }

    /// Sets the ring gap.
    #[must_use]
    pub const fn ring_gap(mut self, gap: Duration) -> Self {
        self.inner.ring_gap = gap;
        self
    }

    /// Sets the number of attempts per initialization command.
    #[must_use]
    pub const fn init_attempts(mut self, attempts: u32) -> Self {
        self.inner.init_attempts = attempts;
        self
    }

    /// Builds the timeouts. At least one attempt is always made.
    #[must_use]
    pub const fn build(self) -> DriverTimeouts {
        let mut timeouts = self.inner;
        if timeouts.init_attempts == 0 {
            timeouts.init_attempts = 1;
        }
        timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_defaults() {
        let config = DeviceConfig::new("/dev/ttyUSB0");
        assert_eq!(config.path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 1200);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::Hardware);
        assert!(!config.two_stop_bits);
    }

    #[test]
    fn test_timeouts_builder() {
        let timeouts = DriverTimeouts::builder()
            .ack(Duration::from_millis(500))
            .init_attempts(5)
            .build();
        assert_eq!(timeouts.ack, Duration::from_millis(500));
        assert_eq!(timeouts.init_attempts, 5);
        assert_eq!(timeouts.caller_id, DriverTimeouts::default().caller_id);
    }

    #[test]
    fn test_timeouts_builder_minimum_attempts() {
        let timeouts = DriverTimeouts::builder().init_attempts(0).build();
        assert_eq!(timeouts.init_attempts, 1);
    }
}
