//! callblock - caller-ID call blocking daemon.

mod cli;
mod signals;

use std::sync::Arc;

use anyhow::Context;
use callblock_core::{Config, Daemon, DaemonOptions, TracingSink};
use callblock_modem::SerialConnector;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, DEFAULT_LOG_FILTER};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if let Some(device) = cli.device {
        config.device.path = device;
    }
    config
        .validate()
        .map_err(callblock_core::Error::Validation)
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;

    let blacklist = config.blacklist();
    if cli.check {
        println!(
            "{}: ok ({} rules, device {}, dialect {})",
            config_path.display(),
            blacklist.len(),
            config.device.path,
            config.dialect
        );
        return Ok(());
    }

    let options = DaemonOptions::from_config(&config)?;
    info!(
        config = %config_path.display(),
        device = %config.device.path,
        dialect = %config.dialect,
        rules = blacklist.len(),
        "configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (rules_tx, rules_rx) = watch::channel(Arc::new(blacklist));

    tokio::spawn(async move {
        if let Err(e) = signals::listen(config_path, shutdown_tx, rules_tx).await {
            error!(error = %e, "signal handling unavailable");
        }
    });

    let mut daemon = Daemon::new(
        SerialConnector::new(config.device),
        options,
        TracingSink,
        shutdown_rx,
        rules_rx,
    );
    daemon.run().await?;
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = level.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        EnvFilter::new,
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
