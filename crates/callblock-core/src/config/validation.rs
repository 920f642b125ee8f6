//! Configuration validation.

use super::Config;

/// Validation error for daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Device path is empty.
    EmptyDevicePath,
    /// Baud rate is zero.
    ZeroBaudRate,
    /// Acknowledgement timeout is zero.
    ZeroAckTimeout,
    /// Caller-ID timeout is zero.
    ZeroCallerIdTimeout,
    /// Idle poll interval is zero.
    ZeroIdlePoll,
    /// Initialization attempts is zero.
    ZeroInitAttempts,
    /// Backoff delays are zero.
    ZeroBackoff,
    /// Initial backoff exceeds the cap.
    BackoffInverted,
    /// Maximum reconnect attempts is zero.
    ZeroMaxAttempts,
    /// Dialect preset name is not known.
    UnknownDialect,
    /// Dialect has no caller-ID enable command.
    EmptyEnableCommand,
    /// Rule at this position has an empty pattern.
    EmptyPattern(usize),
    /// Rule at this position has a glob that cannot be compiled.
    InvalidPattern(usize),
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyDevicePath => "Device path is required",
            Self::ZeroBaudRate => "Baud rate must be positive",
            Self::ZeroAckTimeout => "Acknowledgement timeout must be positive",
            Self::ZeroCallerIdTimeout => "Caller-ID timeout must be positive",
            Self::ZeroIdlePoll => "Idle poll interval must be positive",
            Self::ZeroInitAttempts => "At least one initialization attempt is required",
            Self::ZeroBackoff => "Backoff delays must be positive",
            Self::BackoffInverted => "Initial backoff must not exceed the maximum",
            Self::ZeroMaxAttempts => "Maximum reconnect attempts must be positive when set",
            Self::UnknownDialect => "Unknown modem dialect preset",
            Self::EmptyEnableCommand => "Dialect enable command is required",
            Self::EmptyPattern(_) => "Rule pattern is required",
            Self::InvalidPattern(_) => "Rule pattern is too complex",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyDevicePath => "device.path",
            Self::ZeroBaudRate => "device.baud_rate",
            Self::ZeroAckTimeout => "timeouts.ack_ms",
            Self::ZeroCallerIdTimeout => "timeouts.caller_id_ms",
            Self::ZeroIdlePoll => "timeouts.idle_poll_ms",
            Self::ZeroInitAttempts => "timeouts.init_attempts",
            Self::ZeroBackoff | Self::BackoffInverted => "backoff",
            Self::ZeroMaxAttempts => "backoff.max_attempts",
            Self::UnknownDialect | Self::EmptyEnableCommand => "dialect",
            Self::EmptyPattern(_) | Self::InvalidPattern(_) => "rules",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPattern(index) | Self::InvalidPattern(index) => {
                write!(f, "{} (rule #{})", self.message(), index + 1)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a configuration.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a daemon configuration.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();

    // Device
    if config.device.path.trim().is_empty() {
        errors.push(ValidationError::EmptyDevicePath);
    }
    if config.device.baud_rate == 0 {
        errors.push(ValidationError::ZeroBaudRate);
    }

    // Timeouts
    let timeouts = &config.timeouts;
    if timeouts.ack.is_zero() {
        errors.push(ValidationError::ZeroAckTimeout);
    }
    if timeouts.caller_id.is_zero() {
        errors.push(ValidationError::ZeroCallerIdTimeout);
    }
    if timeouts.idle_poll.is_zero() {
        errors.push(ValidationError::ZeroIdlePoll);
    }
    if timeouts.init_attempts == 0 {
        errors.push(ValidationError::ZeroInitAttempts);
    }

    // Backoff
    let backoff = &config.backoff;
    if backoff.initial.is_zero() || backoff.max.is_zero() {
        errors.push(ValidationError::ZeroBackoff);
    } else if backoff.initial > backoff.max {
        errors.push(ValidationError::BackoffInverted);
    }
    if backoff.max_attempts == Some(0) {
        errors.push(ValidationError::ZeroMaxAttempts);
    }

    // Dialect
    match config.dialect.resolve() {
        None => errors.push(ValidationError::UnknownDialect),
        Some(dialect) if dialect.enable_command.trim().is_empty() => {
            errors.push(ValidationError::EmptyEnableCommand);
        }
        Some(_) => {}
    }

    errors.extend(rule_errors(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates only the blacklist rules.
///
/// Used when rules are reloaded into a running daemon, whose device and
/// timing settings stay as they were at startup.
///
/// # Errors
///
/// Returns every rule problem found.
pub fn validate_rules(config: &Config) -> ValidationResult {
    let errors = rule_errors(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn rule_errors(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, rule) in config.rules.iter().enumerate() {
        if rule.pattern.is_empty() {
            errors.push(ValidationError::EmptyPattern(index));
        } else if !rule.pattern.is_valid() {
            errors.push(ValidationError::InvalidPattern(index));
        }
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blacklist::BlockRule;
    use crate::config::DialectSetting;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = Config::default();
        config.device.path = "  ".to_string();
        config.device.baud_rate = 0;
        config.timeouts.ack = Duration::ZERO;
        config.rules = vec![BlockRule::number("555*", "ok"), BlockRule::number("", "")];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyDevicePath,
                ValidationError::ZeroBaudRate,
                ValidationError::ZeroAckTimeout,
                ValidationError::EmptyPattern(1),
            ]
        );
        assert_eq!(errors[3].to_string(), "Rule pattern is required (rule #2)");
        assert_eq!(errors[3].field(), "rules");
    }

    #[test]
    fn test_validate_rules_ignores_device_settings() {
        let mut config = Config::default();
        config.device.path = String::new();
        assert!(validate_rules(&config).is_ok());

        config.rules = vec![BlockRule::name("", "")];
        assert_eq!(
            validate_rules(&config).unwrap_err(),
            vec![ValidationError::EmptyPattern(0)]
        );
    }

    #[test]
    fn test_backoff_inverted() {
        let mut config = Config::default();
        config.backoff.initial = Duration::from_secs(120);
        config.backoff.max = Duration::from_secs(60);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::BackoffInverted]);
    }

    #[test]
    fn test_unknown_dialect() {
        let config = Config {
            dialect: DialectSetting::Preset("hayes-9000".to_string()),
            ..Config::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnknownDialect]);
        assert_eq!(errors[0].field(), "dialect");
    }
}
