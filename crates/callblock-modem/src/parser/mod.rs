//! Modem response and notification parser.
//!
//! Every line the modem sends is either a final result code for the last
//! command (`OK`, `ERROR`), an unsolicited notification (`RING`, caller-ID
//! data) or noise. Caller-ID data lines use a tagged format:
//!
//! ```text
//! RING
//!
//! DATE = 0321
//! TIME = 1405
//! NMBR = 5551234567
//! NAME = SCAM CALLER
//!
//! RING
//! ```
//!
//! Spaces around `=` are optional and tags are matched case-insensitively.

mod dialect;

pub use dialect::Dialect;

use crate::error::{Error, Result};
use crate::types::CallerIdField;
use dialect::has_tag;

/// A classified modem line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Final result code `OK`.
    Ok,
    /// Final result code `ERROR`.
    Error,
    /// Ring indication.
    Ring,
    /// `NO CARRIER`, the line dropped.
    NoCarrier,
    /// A caller-ID data line.
    Field(CallerIdField),
    /// Anything else (echoes, banners, unknown tags).
    Unrecognized(String),
}

impl Notification {
    /// Returns true for unsolicited call notifications.
    #[must_use]
    pub const fn is_call_activity(&self) -> bool {
        matches!(self, Self::Ring | Self::Field(_))
    }
}

/// Parses one line using the given dialect.
///
/// # Errors
///
/// Returns [`Error::MalformedNotification`] if the line contains control
/// characters or a field separator without a tag.
pub fn parse_line(line: &str, dialect: &Dialect) -> Result<Notification> {
    let line = line.trim();

    if line.chars().any(|c| c.is_control() && c != '\t') {
        return Err(Error::MalformedNotification(line.escape_debug().to_string()));
    }

    match line.to_ascii_uppercase().as_str() {
        "OK" => return Ok(Notification::Ok),
        "ERROR" => return Ok(Notification::Error),
        "NO CARRIER" => return Ok(Notification::NoCarrier),
        _ => {}
    }

    if dialect.is_ring(line) {
        return Ok(Notification::Ring);
    }

    let Some((tag, value)) = line.split_once('=') else {
        return Ok(Notification::Unrecognized(line.to_string()));
    };

    let tag = tag.trim();
    if tag.is_empty() {
        return Err(Error::MalformedNotification(line.to_string()));
    }
    let value = value.trim();

    let field = if has_tag(&dialect.date_tags, tag) {
        CallerIdField::Date(value.to_string())
    } else if has_tag(&dialect.time_tags, tag) {
        CallerIdField::Time(value.to_string())
    } else if has_tag(&dialect.number_tags, tag) {
        CallerIdField::Number(dialect.caller_value(value))
    } else if has_tag(&dialect.name_tags, tag) {
        CallerIdField::Name(dialect.caller_value(value))
    } else {
        return Ok(Notification::Unrecognized(line.to_string()));
    };

    Ok(Notification::Field(field))
}
