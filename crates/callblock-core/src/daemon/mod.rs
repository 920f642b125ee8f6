//! The daemon loop.
//!
//! Acquires the device, initializes the modem and runs the call session
//! until shutdown. Any failure tears the connection down; the loop waits an
//! exponentially growing delay and starts over with a fresh channel.
//!
//! Shutdown requests and rule reloads arrive on `watch` channels and are
//! only acted upon while no call is in progress.

mod backoff;

pub use backoff::Backoff;

use std::sync::Arc;
use std::time::Duration;

use callblock_modem::{Connector, Dialect, DriverTimeouts, ModemDriver};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::blacklist::Blacklist;
use crate::config::{BackoffSettings, Config};
use crate::error::{Error, Result};
use crate::events::{DaemonEvent, EventSink};
use crate::session::{CallSession, SessionOptions};

/// Everything the daemon needs besides its channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonOptions {
    /// Modem dialect.
    pub dialect: Dialect,
    /// Driver timing.
    pub timeouts: DriverTimeouts,
    /// Session timing.
    pub session: SessionOptions,
    /// Reconnect backoff.
    pub backoff: BackoffSettings,
}

impl DaemonOptions {
    /// Derives daemon options from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown dialect preset.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            dialect: config.modem_dialect()?,
            timeouts: config.driver_timeouts(),
            session: SessionOptions {
                idle_poll: config.timeouts.idle_poll,
                keepalive: config.timeouts.keepalive_interval(),
            },
            backoff: config.backoff,
        })
    }
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::standard(),
            timeouts: DriverTimeouts::default(),
            session: SessionOptions::default(),
            backoff: BackoffSettings::default(),
        }
    }
}

/// Connection supervisor.
#[derive(Debug)]
pub struct Daemon<K, S> {
    connector: K,
    options: DaemonOptions,
    sink: S,
    shutdown: watch::Receiver<bool>,
    rules: watch::Receiver<Arc<Blacklist>>,
}

impl<K, S> Daemon<K, S>
where
    K: Connector,
    S: EventSink,
{
    /// Creates a daemon.
    ///
    /// `shutdown` turns `true` to request a graceful stop; `rules` carries
    /// the current rule snapshot.
    pub const fn new(
        connector: K,
        options: DaemonOptions,
        sink: S,
        shutdown: watch::Receiver<bool>,
        rules: watch::Receiver<Arc<Blacklist>>,
    ) -> Self {
        Self {
            connector,
            options,
            sink,
            shutdown,
            rules,
        }
    }

    /// Returns the event sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the daemon and returns the event sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once `max_attempts` consecutive
    /// connection cycles failed.
    pub async fn run(&mut self) -> Result<()> {
        let settings = self.options.backoff;
        let mut backoff = Backoff::new(settings.initial, settings.max);
        let mut failures: u32 = 0;

        info!(device = %self.connector.describe(), "call blocker starting");
        loop {
            if self.shutdown_requested() {
                info!("shutdown requested");
                return Ok(());
            }

            let error = match self.serve(&mut backoff, &mut failures).await {
                Ok(()) => {
                    info!("call blocker stopped");
                    return Ok(());
                }
                Err(e) => e,
            };

            self.sink.emit(DaemonEvent::DeviceError {
                kind: error.kind(),
                detail: error.to_string(),
            });

            failures = failures.saturating_add(1);
            if let Some(max) = settings.max_attempts
                && failures >= max
            {
                return Err(Error::RetriesExhausted { attempts: failures });
            }

            let delay = backoff.next_delay();
            self.sink.emit(DaemonEvent::Reconnecting {
                attempt: failures,
                delay,
            });
            self.pause(delay).await;
        }
    }

    /// One connection cycle. Returns `Ok(())` only on shutdown.
    async fn serve(&mut self, backoff: &mut Backoff, failures: &mut u32) -> Result<()> {
        let channel = self.connector.connect().await?;
        let mut driver = ModemDriver::new(
            channel,
            self.options.dialect.clone(),
            self.options.timeouts,
        );
        driver.initialize().await?;
        backoff.reset();
        *failures = 0;

        let mut rules = Arc::clone(&self.rules.borrow_and_update());
        info!(rules = rules.len(), "waiting for calls");
        let mut session = CallSession::new(self.options.session);

        loop {
            if self.shutdown_requested() {
                driver.shutdown().await;
                return Ok(());
            }
            if self.rules.has_changed().unwrap_or(false) {
                rules = Arc::clone(&self.rules.borrow_and_update());
                info!(rules = rules.len(), "rules reloaded");
            }

            if let Some(outcome) = session.run_once(&mut driver, &rules, &mut self.sink).await? {
                debug!(blocked = outcome.is_blocked(), "call handled");
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleeps for `delay`, waking early on a shutdown request.
    async fn pause(&mut self, delay: Duration) {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        tokio::select! {
            () = &mut sleep => {}
            changed = self.shutdown.changed() => {
                if changed.is_err() {
                    sleep.await;
                }
            }
        }
    }
}
