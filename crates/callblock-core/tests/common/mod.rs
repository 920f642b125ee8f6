//! Scripted modem channels for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use callblock_core::DaemonEvent;
use callblock_modem::{Connector, Error, ModemChannel, Result};
use tokio::sync::watch;

/// One scripted behavior of the modem.
#[derive(Debug, Clone)]
pub enum Step {
    /// The modem sends a line.
    Line(String),
    /// The modem stays silent for this long.
    Silence(Duration),
    /// The next read gets nothing before its deadline.
    NoReply,
    /// The device disappears.
    Close,
}

/// Builds a `Step::Line`.
pub fn line(text: &str) -> Step {
    Step::Line(text.to_string())
}

/// Lines of one incoming call with full caller-ID data.
pub fn call(number: &str, name: &str) -> Vec<Step> {
    vec![
        line("RING"),
        line("DATE = 0321"),
        line("TIME = 1405"),
        line(&format!("NMBR = {number}")),
        line(&format!("NAME = {name}")),
    ]
}

/// Replies to the reset and caller-ID enable commands.
pub fn init_ok() -> Vec<Step> {
    vec![line("OK"), line("OK")]
}

/// Commands written to a channel, shared with the test.
pub type WriteLog = Arc<Mutex<Vec<String>>>;

/// A channel replaying a fixed script and recording every write.
#[derive(Debug)]
pub struct ScriptedChannel {
    script: VecDeque<Step>,
    written: WriteLog,
}

impl ScriptedChannel {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            written: WriteLog::default(),
        }
    }

    /// Handle to the commands written so far.
    pub fn log(&self) -> WriteLog {
        Arc::clone(&self.written)
    }
}

impl ModemChannel for ScriptedChannel {
    async fn read_line(&mut self, wait: Duration) -> Result<String> {
        loop {
            match self.script.pop_front() {
                Some(Step::Line(text)) => return Ok(text),
                Some(Step::Silence(quiet)) if quiet > wait => {
                    tokio::time::sleep(wait).await;
                    self.script.push_front(Step::Silence(quiet - wait));
                    return Err(Error::Timeout(wait));
                }
                Some(Step::Silence(quiet)) => tokio::time::sleep(quiet).await,
                Some(Step::NoReply) => {
                    tokio::time::sleep(wait).await;
                    return Err(Error::Timeout(wait));
                }
                Some(Step::Close) | None => return Err(Error::Closed),
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).trim_end().to_string();
        self.written.lock().unwrap().push(text);
        Ok(())
    }
}

/// Hands out scripted channels, one per connection attempt.
///
/// `None` entries fail to open. Once the list is used up the connector
/// requests shutdown and fails every further attempt.
#[derive(Debug)]
pub struct ScriptedConnector {
    channels: VecDeque<Option<ScriptedChannel>>,
    shutdown: Option<watch::Sender<bool>>,
    pub attempts: u32,
}

impl ScriptedConnector {
    pub fn new(channels: impl IntoIterator<Item = Option<ScriptedChannel>>) -> Self {
        Self {
            channels: channels.into_iter().collect(),
            shutdown: None,
            attempts: 0,
        }
    }

    /// Requests shutdown through `sender` once the script is used up.
    pub fn shutdown_when_done(mut self, sender: watch::Sender<bool>) -> Self {
        self.shutdown = Some(sender);
        self
    }
}

impl Connector for ScriptedConnector {
    type Channel = ScriptedChannel;

    async fn connect(&mut self) -> Result<ScriptedChannel> {
        self.attempts += 1;
        match self.channels.pop_front() {
            Some(Some(channel)) => Ok(channel),
            Some(None) => Err(Error::Io(io::Error::from(io::ErrorKind::NotFound))),
            None => {
                if let Some(sender) = &self.shutdown {
                    let _ = sender.send(true);
                }
                Err(Error::Io(io::Error::from(io::ErrorKind::NotFound)))
            }
        }
    }

    fn describe(&self) -> String {
        "scripted modem".to_string()
    }
}

/// Event kinds in order, for compact assertions.
pub fn kinds(events: &[DaemonEvent]) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            DaemonEvent::CallAllowed { .. } => "allowed".to_string(),
            DaemonEvent::CallBlocked { .. } => "blocked".to_string(),
            DaemonEvent::HangUpUnacknowledged { .. } => "unacknowledged".to_string(),
            DaemonEvent::DeviceError { kind, .. } => format!("error:{kind}"),
            DaemonEvent::Reconnecting { attempt, delay } => {
                format!("reconnect:{attempt}:{}s", delay.as_secs())
            }
        })
        .collect()
}
