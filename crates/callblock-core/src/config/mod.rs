//! Daemon configuration.
//!
//! The configuration is a JSON document. Every section is optional and falls
//! back to defaults suited to a 1200 baud caller-ID modem on `/dev/ttyACM0`:
//!
//! ```json
//! {
//!   "device": { "path": "/dev/ttyACM0", "baud_rate": 1200 },
//!   "dialect": "standard",
//!   "timeouts": { "ack_ms": 2000, "caller_id_ms": 6000 },
//!   "backoff": { "initial_ms": 1000, "max_ms": 60000 },
//!   "rules": [
//!     { "pattern": "555*", "field": "number", "label": "area 555" },
//!     { "pattern": "@unavailable", "label": "anonymous" }
//!   ],
//!   "numbers": ["8005550100"],
//!   "names": ["WIRELESS"]
//! }
//! ```

mod validation;

pub use validation::{ValidationError, ValidationResult, validate_config, validate_rules};

use std::path::{Path, PathBuf};
use std::time::Duration;

use callblock_modem::{DeviceConfig, Dialect, DriverTimeouts};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blacklist::{Blacklist, BlockRule};
use crate::error::{Error, Result};

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/callblock/config.json";

/// Complete daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device settings.
    pub device: DeviceConfig,
    /// Modem dialect, by preset name or inline.
    pub dialect: DialectSetting,
    /// Driver and session timing.
    pub timeouts: TimeoutSettings,
    /// Reconnect backoff.
    pub backoff: BackoffSettings,
    /// Ordered block rules.
    pub rules: Vec<BlockRule>,
    /// Number prefixes to block, evaluated after `rules`.
    pub numbers: Vec<String>,
    /// Name fragments to block, evaluated after `rules` and `numbers`.
    pub names: Vec<String>,
}

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file does not exist, [`Error::Io`] if
    /// it cannot be read and [`Error::Serde`] if it is not valid.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!(
            path = %path.display(),
            rules = config.rules.len() + config.numbers.len() + config.names.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Loads a configuration file for its rules only.
    ///
    /// Device, dialect and timing sections are parsed but not validated, so
    /// settings overridden on the command line at startup do not get in the
    /// way of a reload.
    ///
    /// # Errors
    ///
    /// As [`Config::load`], plus [`Error::Validation`] listing every rule
    /// problem.
    pub async fn load_rules(path: &Path) -> Result<Blacklist> {
        let config = Self::load(path).await?;
        validate_rules(&config).map_err(Error::Validation)?;
        Ok(config.blacklist())
    }

    /// Returns the default configuration path.
    ///
    /// Prefers the system-wide file; otherwise the per-user config directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return system;
        }
        dirs::config_dir()
            .map_or(system, |dir| dir.join("callblock").join("config.json"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns every problem found.
    pub fn validate(&self) -> ValidationResult {
        validate_config(self)
    }

    /// Builds the rule snapshot: explicit rules first, then the plain
    /// number and name lists.
    #[must_use]
    pub fn blacklist(&self) -> Blacklist {
        let mut blacklist = Blacklist::new(self.rules.clone());
        blacklist.extend(Blacklist::from_lists(&self.numbers, &self.names));
        blacklist
    }

    /// Resolves the modem dialect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown preset.
    pub fn modem_dialect(&self) -> Result<Dialect> {
        self.dialect
            .resolve()
            .ok_or_else(|| Error::Config(format!("unknown dialect {}", self.dialect)))
    }

    /// Driver timing derived from the timeout settings.
    #[must_use]
    pub fn driver_timeouts(&self) -> DriverTimeouts {
        DriverTimeouts::builder()
            .ack(self.timeouts.ack)
            .caller_id(self.timeouts.caller_id)
            .ring_gap(self.timeouts.ring_gap)
            .init_attempts(self.timeouts.init_attempts)
            .build()
    }
}

/// Dialect given either as a preset name or as a full definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialectSetting {
    /// Built-in preset (`standard`, `rockwell`).
    Preset(String),
    /// Inline definition.
    Custom(Dialect),
}

impl DialectSetting {
    /// Resolves to a concrete dialect, or `None` for an unknown preset.
    #[must_use]
    pub fn resolve(&self) -> Option<Dialect> {
        match self {
            Self::Preset(name) => Dialect::preset(name),
            Self::Custom(dialect) => Some(dialect.clone()),
        }
    }
}

impl Default for DialectSetting {
    fn default() -> Self {
        Self::Preset("standard".to_string())
    }
}

impl std::fmt::Display for DialectSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preset(name) => f.write_str(name),
            Self::Custom(dialect) => write!(f, "{} (custom)", dialect.name),
        }
    }
}

/// Driver and session timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Wait for `OK`/`ERROR` after a command.
    #[serde(rename = "ack_ms", with = "millis")]
    pub ack: Duration,
    /// Wait for caller-ID data after a ring.
    #[serde(rename = "caller_id_ms", with = "millis")]
    pub caller_id: Duration,
    /// Rings closer than this belong to the same call.
    #[serde(rename = "ring_gap_ms", with = "millis")]
    pub ring_gap: Duration,
    /// Upper bound on one idle wait; shutdown and reloads are noticed at
    /// this granularity.
    #[serde(rename = "idle_poll_ms", with = "millis")]
    pub idle_poll: Duration,
    /// Probe the modem after this much silence. Zero disables probing.
    #[serde(rename = "keepalive_ms", with = "millis")]
    pub keepalive: Duration,
    /// Attempts per initialization command.
    pub init_attempts: u32,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let driver = DriverTimeouts::default();
        Self {
            ack: driver.ack,
            caller_id: driver.caller_id,
            ring_gap: driver.ring_gap,
            idle_poll: Duration::from_secs(1),
            keepalive: Duration::from_secs(300),
            init_attempts: driver.init_attempts,
        }
    }
}

impl TimeoutSettings {
    /// Keepalive interval, if probing is enabled.
    #[must_use]
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (!self.keepalive.is_zero()).then_some(self.keepalive)
    }
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    /// First delay after a failure.
    #[serde(rename = "initial_ms", with = "millis")]
    pub initial: Duration,
    /// Cap on the delay.
    #[serde(rename = "max_ms", with = "millis")]
    pub max: Duration,
    /// Give up after this many consecutive failures. Unlimited when unset.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

/// Serializes a `Duration` as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blacklist::{MatchField, Pattern};
    use callblock_modem::FlowControl;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.device.path, "/dev/ttyACM0");
        assert_eq!(config.device.baud_rate, 1200);
        assert_eq!(config.device.flow_control, FlowControl::Hardware);
        assert_eq!(config.timeouts.ack, Duration::from_secs(2));
        assert_eq!(config.backoff.max, Duration::from_secs(60));
        assert!(config.blacklist().is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let config: Config = serde_json::from_str(
            r#"{
                "device": { "path": "/dev/ttyUSB0", "baud_rate": 9600, "parity": "even" },
                "dialect": "rockwell",
                "timeouts": { "ack_ms": 500, "caller_id_ms": 4000, "keepalive_ms": 0 },
                "backoff": { "initial_ms": 250, "max_ms": 8000, "max_attempts": 5 },
                "rules": [
                    { "pattern": "555*", "label": "area 555" },
                    { "pattern": "@unavailable", "field": "any" }
                ],
                "numbers": ["800"],
                "names": ["WIRELESS"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.device.path, "/dev/ttyUSB0");
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.modem_dialect().unwrap().enable_command, "AT#CID=1");
        assert_eq!(config.timeouts.ack, Duration::from_millis(500));
        assert_eq!(config.timeouts.ring_gap, Duration::from_secs(8));
        assert_eq!(config.timeouts.keepalive_interval(), None);
        assert_eq!(config.backoff.max_attempts, Some(5));

        let blacklist = config.blacklist();
        assert_eq!(blacklist.len(), 4);
        assert_eq!(blacklist.rules()[1].pattern, Pattern::Unavailable);
        assert_eq!(blacklist.rules()[1].field, MatchField::Any);
        assert_eq!(blacklist.rules()[3].field, MatchField::Name);

        let timeouts = config.driver_timeouts();
        assert_eq!(timeouts.caller_id, Duration::from_secs(4));
    }

    #[test]
    fn test_inline_dialect() {
        let config: Config = serde_json::from_str(
            r#"{ "dialect": { "name": "lab", "enable_command": "AT+CLIP=1", "ring_tokens": ["RING", "+CRING"] } }"#,
        )
        .unwrap();

        let dialect = config.modem_dialect().unwrap();
        assert_eq!(dialect.name, "lab");
        assert_eq!(dialect.enable_command, "AT+CLIP=1");
        assert_eq!(dialect.number_tags, Dialect::standard().number_tags);
    }

    #[test]
    fn test_unknown_preset() {
        let config: Config = serde_json::from_str(r#"{ "dialect": "nope" }"#).unwrap();
        assert!(matches!(config.modem_dialect(), Err(Error::Config(_))));
    }

    #[test]
    fn test_timeouts_roundtrip_as_millis() {
        let json = serde_json::to_value(TimeoutSettings::default()).unwrap();
        assert_eq!(json["ack_ms"], 2000);
        assert_eq!(json["idle_poll_ms"], 1000);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/callblock/config.json")).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    async fn load_rules_from(name: &str, contents: &str) -> Result<Blacklist> {
        let path = std::env::temp_dir().join(format!(
            "callblock-config-test-{name}-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, contents).await.unwrap();
        let result = Config::load_rules(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();
        result
    }

    #[tokio::test]
    async fn test_load_rules_ignores_device_settings() {
        let blacklist = load_rules_from(
            "no-device",
            r#"{ "device": { "path": "" }, "numbers": ["800"] }"#,
        )
        .await
        .unwrap();
        assert_eq!(blacklist.len(), 1);
    }

    #[tokio::test]
    async fn test_load_rules_reports_problems() {
        let result = load_rules_from("bad-rule", r#"{ "rules": [{ "pattern": "" }] }"#).await;

        let Err(Error::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(errors, vec![ValidationError::EmptyPattern(0)]);
    }
}
