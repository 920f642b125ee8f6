//! Daemon loop behavior: reconnects, backoff, shutdown and rule reloads.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use callblock_core::config::BackoffSettings;
use callblock_core::{
    Blacklist, BlockRule, Daemon, DaemonEvent, DaemonOptions, Error, SessionOptions,
};
use common::{ScriptedChannel, ScriptedConnector, Step, call, init_ok, kinds, line};
use tokio::sync::watch;

fn options(max_attempts: Option<u32>) -> DaemonOptions {
    DaemonOptions {
        session: SessionOptions {
            idle_poll: Duration::from_secs(1),
            keepalive: None,
        },
        backoff: BackoffSettings {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            max_attempts,
        },
        ..DaemonOptions::default()
    }
}

fn rules(blacklist: Blacklist) -> (watch::Sender<Arc<Blacklist>>, watch::Receiver<Arc<Blacklist>>) {
    watch::channel(Arc::new(blacklist))
}

#[tokio::test(start_paused = true)]
async fn init_failure_backs_off_and_reconnects() {
    let silent = ScriptedChannel::new([Step::NoReply, Step::NoReply, Step::NoReply]);

    let mut steps = init_ok();
    steps.extend(call("5551234567", "SCAM CALLER"));
    steps.extend([line("OK"), line("OK"), line("OK"), line("OK")]);
    let working = ScriptedChannel::new(steps);
    let written = working.log();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let connector =
        ScriptedConnector::new([Some(silent), Some(working)]).shutdown_when_done(shutdown_tx);
    let (_rules_tx, rules_rx) = rules(Blacklist::new(vec![BlockRule::number("555*", "area")]));

    let mut daemon = Daemon::new(
        connector,
        options(None),
        Vec::<DaemonEvent>::new(),
        shutdown_rx,
        rules_rx,
    );
    daemon.run().await.unwrap();

    assert_eq!(
        kinds(daemon.sink()),
        [
            "error:init_failed",
            "reconnect:1:1s",
            "blocked",
            "error:closed",
            // Backoff starts over after a successful initialization.
            "reconnect:1:1s",
            "error:io_error",
            "reconnect:2:2s",
        ]
    );
    assert_eq!(
        *written.lock().unwrap(),
        ["ATZ", "AT+VCID=1", "ATH1", "ATH0", "ATZ", "AT+VCID=1"]
    );
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let connector = ScriptedConnector::new([None, None, None, None]);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (_rules_tx, rules_rx) = rules(Blacklist::default());

    let mut daemon = Daemon::new(
        connector,
        options(Some(3)),
        Vec::<DaemonEvent>::new(),
        shutdown_rx,
        rules_rx,
    );
    let err = daemon.run().await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 3 }));
    assert_eq!(
        kinds(daemon.sink()),
        [
            "error:io_error",
            "reconnect:1:1s",
            "error:io_error",
            "reconnect:2:2s",
            "error:io_error",
        ]
    );
}

#[tokio::test]
async fn shutdown_before_start_never_opens_the_device() {
    let connector = ScriptedConnector::new([Some(ScriptedChannel::new(init_ok()))]);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (_rules_tx, rules_rx) = rules(Blacklist::default());
    shutdown_tx.send(true).unwrap();

    let mut daemon = Daemon::new(
        connector,
        options(None),
        Vec::<DaemonEvent>::new(),
        shutdown_rx,
        rules_rx,
    );
    daemon.run().await.unwrap();
    assert!(daemon.sink().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_at_idle_resets_the_modem() {
    let mut steps = init_ok();
    steps.push(Step::Silence(Duration::from_secs(3600)));
    let channel = ScriptedChannel::new(steps);
    let written = channel.log();

    let connector = ScriptedConnector::new([Some(channel)]);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (_rules_tx, rules_rx) = rules(Blacklist::default());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown_tx.send(true).unwrap();
    });

    let mut daemon = Daemon::new(
        connector,
        options(None),
        Vec::<DaemonEvent>::new(),
        shutdown_rx,
        rules_rx,
    );
    daemon.run().await.unwrap();

    assert!(daemon.sink().is_empty());
    assert_eq!(*written.lock().unwrap(), ["ATZ", "AT+VCID=1", "ATZ"]);
}

#[tokio::test(start_paused = true)]
async fn reloaded_rules_apply_to_the_next_call() {
    let mut steps = init_ok();
    steps.extend(call("5551234567", "SCAM CALLER"));
    steps.push(Step::Silence(Duration::from_secs(20)));
    steps.extend(call("5551234567", "SCAM CALLER"));
    steps.extend([line("OK"), line("OK"), line("OK"), line("OK")]);
    let channel = ScriptedChannel::new(steps);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let connector = ScriptedConnector::new([Some(channel)]).shutdown_when_done(shutdown_tx);
    let (rules_tx, rules_rx) = rules(Blacklist::default());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let updated = Blacklist::new(vec![BlockRule::number("555*", "area")]);
        rules_tx.send(Arc::new(updated)).unwrap();
        // Keep the sender alive until the daemon is done.
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });

    let mut daemon = Daemon::new(
        connector,
        options(None),
        Vec::<DaemonEvent>::new(),
        shutdown_rx,
        rules_rx,
    );
    daemon.run().await.unwrap();

    let events = daemon.into_sink();
    let calls: Vec<String> = kinds(&events)
        .into_iter()
        .filter(|kind| kind == "allowed" || kind == "blocked")
        .collect();
    assert_eq!(calls, ["allowed", "blocked"]);
}
