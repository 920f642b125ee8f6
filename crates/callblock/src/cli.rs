//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "callblock=info,callblock_core=info,callblock_modem=info";

/// Caller-ID call blocking daemon.
///
/// Watches a voice modem for incoming calls and hangs up on callers that
/// match the configured blacklist. SIGHUP reloads the rules; SIGINT and
/// SIGTERM stop the daemon between calls.
#[derive(Parser, Debug)]
#[command(name = "callblock", version, about)]
pub struct Cli {
    /// Configuration file (default: /etc/callblock/config.json, then the
    /// per-user config directory).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serial device, overriding the configuration file.
    #[arg(short, long, value_name = "DEV")]
    pub device: Option<String>,

    /// Log filter, e.g. `debug` or `callblock_modem=trace`. Overrides
    /// `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["callblock"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.device.is_none());
        assert!(!cli.check);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "callblock",
            "-c",
            "/tmp/callblock.json",
            "-d",
            "/dev/ttyUSB1",
            "--log-level",
            "debug",
            "--check",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/callblock.json")));
        assert_eq!(cli.device.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.check);
    }
}
