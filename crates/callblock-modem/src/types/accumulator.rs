//! Caller-ID accumulation.
//!
//! Caller-ID data arrives as a burst of tagged lines between the first and
//! second ring. [`CallerIdAccumulator`] folds those lines into a single
//! [`CallerIdRecord`]; the record is complete once both the number and the
//! name slot have been observed, either with data or with a "no data"
//! sentinel.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::caller_id::{CallerIdField, CallerIdRecord, CallerValue, UnavailableReason};

/// Fields collected so far for a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCallerId {
    /// Raw `MMDD` value.
    pub date: Option<String>,
    /// Raw `HHMM` value.
    pub time: Option<String>,
    /// Number slot.
    pub number: Option<CallerValue>,
    /// Name slot.
    pub name: Option<CallerValue>,
}

impl PartialCallerId {
    fn apply(&mut self, field: CallerIdField) {
        match field {
            CallerIdField::Date(date) => self.date = Some(date),
            CallerIdField::Time(time) => self.time = Some(time),
            CallerIdField::Number(number) => self.number = Some(number),
            CallerIdField::Name(name) => self.name = Some(name),
        }
    }

    const fn is_complete(&self) -> bool {
        self.number.is_some() && self.name.is_some()
    }

    fn into_record(self, received_at: NaiveDateTime) -> CallerIdRecord {
        let timestamp =
            resolve_timestamp(self.date.as_deref(), self.time.as_deref(), received_at);
        let missing = || CallerValue::Unavailable(UnavailableReason::NotSent);
        CallerIdRecord::new(
            timestamp,
            self.number.unwrap_or_else(missing),
            self.name.unwrap_or_else(missing),
        )
    }
}

/// Fold state for one call's caller-ID data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CallerIdAccumulator {
    /// Nothing received yet.
    #[default]
    Empty,
    /// Some fields received, number or name still outstanding.
    Collecting(PartialCallerId),
    /// Both slots observed.
    Complete(CallerIdRecord),
}

impl CallerIdAccumulator {
    /// Advances the fold with one decoded field.
    ///
    /// Fields arriving after completion are ignored.
    #[must_use]
    pub fn advance(self, field: CallerIdField, received_at: NaiveDateTime) -> Self {
        let mut partial = match self {
            Self::Empty => PartialCallerId::default(),
            Self::Collecting(partial) => partial,
            complete @ Self::Complete(_) => return complete,
        };
        partial.apply(field);
        if partial.is_complete() {
            Self::Complete(partial.into_record(received_at))
        } else {
            Self::Collecting(partial)
        }
    }

    /// Returns the record if both slots have been observed.
    #[must_use]
    pub const fn record(&self) -> Option<&CallerIdRecord> {
        match self {
            Self::Complete(record) => Some(record),
            _ => None,
        }
    }

    /// Returns true if no field has been received.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Closes the fold, marking unobserved slots as not sent.
    ///
    /// Used when a second ring or the caller-ID timeout ends collection.
    #[must_use]
    pub fn finish(self, received_at: NaiveDateTime) -> CallerIdRecord {
        match self {
            Self::Empty => PartialCallerId::default().into_record(received_at),
            Self::Collecting(partial) => partial.into_record(received_at),
            Self::Complete(record) => record,
        }
    }
}

/// Builds the call timestamp from modem `MMDD`/`HHMM` fields.
///
/// The modem omits the year, so the year of `received_at` is used, stepping
/// back one year if that places the call more than a day in the future
/// (calls straddling New Year). Missing or invalid fields yield
/// `received_at`.
#[must_use]
pub fn resolve_timestamp(
    date: Option<&str>,
    time: Option<&str>,
    received_at: NaiveDateTime,
) -> NaiveDateTime {
    let (Some(date), Some(time)) = (date, time) else {
        return received_at;
    };
    let Some((month, day)) = split_pair(date) else {
        return received_at;
    };
    let Some((hour, minute)) = split_pair(time) else {
        return received_at;
    };
    let Some(clock) = NaiveTime::from_hms_opt(hour, minute, 0) else {
        return received_at;
    };

    let year = received_at.year();
    let Some(stamp) = NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(clock))
    else {
        return received_at;
    };

    if stamp > received_at + Duration::days(1) {
        NaiveDate::from_ymd_opt(year - 1, month, day)
            .map_or(received_at, |d| d.and_time(clock))
    } else {
        stamp
    }
}

/// Splits a four-digit `AABB` string into two numbers.
fn split_pair(value: &str) -> Option<(u32, u32)> {
    let value = value.trim();
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let high = value[..2].parse().ok()?;
    let low = value[2..].parse().ok()?;
    Some((high, low))
}
