//! Connection management: serial channel, device configuration and the
//! protocol driver.

mod config;
mod driver;
mod stream;

pub use config::{DeviceConfig, DriverTimeouts, DriverTimeoutsBuilder, FlowControl, Parity};
pub use driver::{Acknowledgement, ModemDriver};
pub use stream::{ModemStream, open};

use std::future::Future;
use std::time::Duration;

use tokio_serial::SerialStream;

use crate::error::Result;

/// Line-oriented channel to a modem.
///
/// Implemented by [`ModemStream`] for real devices; tests substitute scripted
/// channels.
pub trait ModemChannel {
    /// Reads the next non-empty line, waiting at most `wait`.
    fn read_line(&mut self, wait: Duration) -> impl Future<Output = Result<String>>;

    /// Writes raw bytes to the modem.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>>;
}

/// Acquires fresh channels for each connection cycle.
pub trait Connector {
    /// Channel type produced by this connector.
    type Channel: ModemChannel;

    /// Opens a new channel to the device.
    fn connect(&mut self) -> impl Future<Output = Result<Self::Channel>>;

    /// Describes the device for logs.
    fn describe(&self) -> String;
}

/// Opens the configured serial device.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    device: DeviceConfig,
}

impl SerialConnector {
    /// Creates a connector for the given device.
    #[must_use]
    pub const fn new(device: DeviceConfig) -> Self {
        Self { device }
    }
}

impl Connector for SerialConnector {
    type Channel = ModemStream<SerialStream>;

    async fn connect(&mut self) -> Result<Self::Channel> {
        open(&self.device)
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.device.path, self.device.baud_rate)
    }
}
