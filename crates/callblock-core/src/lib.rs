//! # callblock-core
//!
//! Call blocking logic on top of [`callblock_modem`].
//!
//! ## Features
//!
//! - **Blacklist**: ordered rules on number, name or either, with exact,
//!   prefix, substring and glob patterns plus the reserved `@unavailable`
//!   pattern
//! - **Call session**: explicit state machine taking each call from ring to
//!   hang-up or hand-off
//! - **Daemon loop**: device acquisition, reconnect with exponential backoff,
//!   graceful shutdown and rule reload between calls
//! - **Configuration**: JSON file with validation
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use callblock_core::{Config, Daemon, DaemonOptions, TracingSink};
//! use callblock_modem::SerialConnector;
//! use tokio::sync::watch;
//!
//! let config = Config::load(&Config::default_path()).await?;
//! config.validate().map_err(callblock_core::Error::Validation)?;
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//! let (_rules_tx, rules_rx) = watch::channel(Arc::new(config.blacklist()));
//!
//! let mut daemon = Daemon::new(
//!     SerialConnector::new(config.device.clone()),
//!     DaemonOptions::from_config(&config)?,
//!     TracingSink,
//!     shutdown_rx,
//!     rules_rx,
//! );
//! daemon.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod blacklist;
pub mod config;
pub mod daemon;
pub mod error;
pub mod events;
pub mod session;

pub use blacklist::{Blacklist, BlockRule, Glob, MatchField, Pattern, Verdict, evaluate};
pub use config::{Config, ValidationError};
pub use daemon::{Backoff, Daemon, DaemonOptions};
pub use error::{Error, Result};
pub use events::{DaemonEvent, EventSink, TracingSink};
pub use session::{CallOutcome, CallSession, SessionOptions, SessionState, Trigger};
