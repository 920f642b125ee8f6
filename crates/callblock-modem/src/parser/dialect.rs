//! Modem caller-ID dialects.
//!
//! Voice modems differ in the command that arms caller-ID reporting, the tag
//! vocabulary of the data lines and the sentinels used for missing data.
//! A [`Dialect`] captures those differences as data so new modems can be
//! supported from configuration alone.

use crate::types::{CallerValue, UnavailableReason};

/// Notification grammar and command set of one modem family.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Dialect {
    /// Human-readable preset name.
    pub name: String,
    /// Command that enables formatted caller-ID reporting.
    pub enable_command: String,
    /// Lines that indicate a ring.
    pub ring_tokens: Vec<String>,
    /// Tags carrying the `MMDD` date.
    pub date_tags: Vec<String>,
    /// Tags carrying the `HHMM` time.
    pub time_tags: Vec<String>,
    /// Tags carrying the calling number.
    pub number_tags: Vec<String>,
    /// Tags carrying the calling name.
    pub name_tags: Vec<String>,
    /// Values meaning the caller withheld the field.
    pub withheld_markers: Vec<String>,
    /// Values meaning the network could not deliver the field.
    pub out_of_area_markers: Vec<String>,
    /// Caller-ID data may arrive before the first ring.
    pub data_before_ring: bool,
    /// Re-run initialization after hanging up on a blocked call.
    pub rearm_after_hangup: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::standard()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl Dialect {
    /// Conexant/US Robotics style modems (`AT+VCID=1`).
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            enable_command: "AT+VCID=1".to_string(),
            ring_tokens: strings(&["RING"]),
            date_tags: strings(&["DATE"]),
            time_tags: strings(&["TIME"]),
            number_tags: strings(&["NMBR", "DDN_NMBR"]),
            name_tags: strings(&["NAME"]),
            withheld_markers: strings(&["P", "PRIVATE"]),
            out_of_area_markers: strings(&["O", "OUT OF AREA", "UNAVAILABLE"]),
            data_before_ring: false,
            rearm_after_hangup: true,
        }
    }

    /// Rockwell chipsets (`AT#CID=1`).
    #[must_use]
    pub fn rockwell() -> Self {
        Self {
            name: "rockwell".to_string(),
            enable_command: "AT#CID=1".to_string(),
            ..Self::standard()
        }
    }

    /// Looks up a built-in preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" | "conexant" | "usr" => Some(Self::standard()),
            "rockwell" => Some(Self::rockwell()),
            _ => None,
        }
    }

    /// Returns true if `line` is a ring indication.
    #[must_use]
    pub fn is_ring(&self, line: &str) -> bool {
        let upper = line.trim().to_ascii_uppercase();
        self.ring_tokens.iter().any(|token| {
            let token = token.to_ascii_uppercase();
            upper == token
                || upper
                    .strip_prefix(&token)
                    .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
    }

    /// Maps a raw field value through the sentinel tables.
    #[must_use]
    pub fn caller_value(&self, raw: &str) -> CallerValue {
        let trimmed = raw.trim();
        if contains_marker(&self.withheld_markers, trimmed) {
            CallerValue::Unavailable(UnavailableReason::Withheld)
        } else if contains_marker(&self.out_of_area_markers, trimmed) {
            CallerValue::Unavailable(UnavailableReason::OutOfArea)
        } else {
            CallerValue::from_raw(trimmed)
        }
    }
}

fn contains_marker(markers: &[String], value: &str) -> bool {
    markers.iter().any(|m| m.eq_ignore_ascii_case(value))
}

pub(crate) fn has_tag(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}
