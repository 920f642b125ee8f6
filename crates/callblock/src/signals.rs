//! Process signal handling.
//!
//! Runs as its own task and talks to the daemon only through `watch`
//! channels: SIGINT/SIGTERM flip the shutdown flag, SIGHUP publishes a fresh
//! rule snapshot read from the configuration file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use callblock_core::{Blacklist, Config};
use tokio::sync::watch;
use tracing::{info, warn};

/// Waits for signals until a stop is requested.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
pub async fn listen(
    config_path: PathBuf,
    shutdown: watch::Sender<bool>,
    rules: watch::Sender<Arc<Blacklist>>,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT, shutting down after the current call");
                break;
            }
            _ = terminate.recv() => {
                info!("received SIGTERM, shutting down after the current call");
                break;
            }
            _ = hangup.recv() => {
                info!("received SIGHUP, reloading rules");
                reload(&config_path, &rules).await;
            }
        }
    }

    shutdown.send_replace(true);
    Ok(())
}

/// Waits for Ctrl-C. Rule reload needs SIGHUP and is unix only.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
#[cfg(not(unix))]
pub async fn listen(
    _config_path: PathBuf,
    shutdown: watch::Sender<bool>,
    _rules: watch::Sender<Arc<Blacklist>>,
) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down after the current call");
    shutdown.send_replace(true);
    Ok(())
}

/// Re-reads the rules. A broken file keeps the current rules in force.
async fn reload(path: &Path, rules: &watch::Sender<Arc<Blacklist>>) {
    match Config::load_rules(path).await {
        Ok(blacklist) => {
            info!(
                rules = blacklist.len(),
                "rules reloaded, effective from the next call"
            );
            rules.send_replace(Arc::new(blacklist));
        }
        Err(e) => warn!(error = %e, "reload failed, keeping current rules"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use callblock_core::BlockRule;

    #[tokio::test]
    async fn test_reload_failure_keeps_rules() {
        let current = Arc::new(Blacklist::new(vec![BlockRule::number("555*", "area")]));
        let (tx, rx) = watch::channel(Arc::clone(&current));

        reload(Path::new("/nonexistent/callblock.json"), &tx).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(**rx.borrow(), *current);
    }

    #[tokio::test]
    async fn test_reload_publishes_new_rules() {
        let path = std::env::temp_dir().join(format!(
            "callblock-reload-test-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, r#"{ "numbers": ["800"], "names": ["WIRELESS"] }"#)
            .await
            .unwrap();
        let (tx, rx) = watch::channel(Arc::new(Blacklist::default()));

        reload(&path, &tx).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_reload_ignores_device_left_to_command_line() {
        let path = std::env::temp_dir().join(format!(
            "callblock-reload-device-test-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, r#"{ "device": { "path": "" }, "numbers": ["900"] }"#)
            .await
            .unwrap();
        let (tx, rx) = watch::channel(Arc::new(Blacklist::default()));

        reload(&path, &tx).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 1);
    }
}
