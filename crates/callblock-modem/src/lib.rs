//! # callblock-modem
//!
//! Serial channel and AT-command driver for caller-ID capable voice modems.
//!
//! ## Features
//!
//! - **Line-oriented serial channel**: CR/LF framing with bounded, cancel-safe
//!   reads
//! - **Initialization with retries**: reset and caller-ID arming, escalating
//!   with [`Error::InitFailed`] when the modem stays silent
//! - **Caller-ID decoding**: tagged `DATE`/`TIME`/`NMBR`/`NAME` lines folded
//!   into one [`CallerIdRecord`] per call
//! - **Pluggable dialects**: command set, tag vocabulary and sentinels as data
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use callblock_modem::{DeviceConfig, Dialect, DriverTimeouts, ModemDriver};
//! use callblock_modem::connection::open;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> callblock_modem::Result<()> {
//!     let stream = open(&DeviceConfig::new("/dev/ttyACM0"))?;
//!     let mut driver = ModemDriver::new(stream, Dialect::standard(), DriverTimeouts::default());
//!     driver.initialize().await?;
//!
//!     loop {
//!         if driver.wait_for_ring(Duration::from_secs(60)).await? {
//!             let record = driver.collect_caller_id().await?;
//!             println!("{record}");
//!         }
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: AT command builders
//! - [`connection`]: Serial channel and protocol driver
//! - [`parser`]: Line classification and dialects
//! - [`types`]: Caller-ID records and the accumulator

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::Command;
pub use connection::{
    Acknowledgement, Connector, DeviceConfig, DriverTimeouts, FlowControl, ModemChannel,
    ModemDriver, ModemStream, Parity, SerialConnector,
};
pub use error::{Error, Result};
pub use parser::{Dialect, Notification};
pub use types::{CallerIdAccumulator, CallerIdField, CallerIdRecord, CallerValue, UnavailableReason};
