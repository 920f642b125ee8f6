//! Caller-ID record types.

use chrono::NaiveDateTime;

/// Why a caller-ID field carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnavailableReason {
    /// The caller blocked delivery ("P", private).
    Withheld,
    /// The network could not deliver it ("O", out of area).
    OutOfArea,
    /// The modem never reported the field, or reported it empty.
    NotSent,
}

impl UnavailableReason {
    /// Returns the lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Withheld => "withheld",
            Self::OutOfArea => "out_of_area",
            Self::NotSent => "not_sent",
        }
    }
}

/// Value of a caller-ID slot (number or name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CallerValue {
    /// Data delivered by the network.
    Known(String),
    /// Slot explicitly or implicitly empty.
    Unavailable(UnavailableReason),
}

impl CallerValue {
    /// Builds a value from raw text, mapping empty text to `NotSent`.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Unavailable(UnavailableReason::NotSent)
        } else {
            Self::Known(trimmed.to_string())
        }
    }

    /// Returns the delivered text, if any.
    #[must_use]
    pub fn known(&self) -> Option<&str> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    /// Returns true if no data was delivered.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl std::fmt::Display for CallerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(value) => f.write_str(value),
            Self::Unavailable(reason) => write!(f, "<{}>", reason.as_str()),
        }
    }
}

/// One caller-ID data line decoded by the dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdField {
    /// Month and day, `MMDD`.
    Date(String),
    /// Hour and minute, `HHMM`.
    Time(String),
    /// Calling number (already mapped through the sentinel table).
    Number(CallerValue),
    /// Calling name (already mapped through the sentinel table).
    Name(CallerValue),
}

/// Caller-ID data for one incoming call.
///
/// Produced once per ring cycle by the driver and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallerIdRecord {
    /// When the call arrived (modem clock when reported).
    pub timestamp: NaiveDateTime,
    /// Calling number.
    pub number: CallerValue,
    /// Calling name, upper-cased.
    pub name: CallerValue,
}

impl CallerIdRecord {
    /// Creates a record, normalizing the name to upper case.
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, number: CallerValue, name: CallerValue) -> Self {
        let name = match name {
            CallerValue::Known(value) => CallerValue::Known(value.to_uppercase()),
            unavailable @ CallerValue::Unavailable(_) => unavailable,
        };
        Self {
            timestamp,
            number,
            name,
        }
    }

    /// Returns true if neither number nor name was delivered.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.number.is_unavailable() && self.name.is_unavailable()
    }
}

impl std::fmt::Display for CallerIdRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "date={}, number={}, name={}",
            self.timestamp.format("%Y-%m-%dT%H:%M"),
            self.number,
            self.name
        )
    }
}
