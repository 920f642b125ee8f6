//! Core caller-ID types.

mod accumulator;
mod caller_id;

pub use accumulator::{CallerIdAccumulator, PartialCallerId, resolve_timestamp};
pub use caller_id::{CallerIdField, CallerIdRecord, CallerValue, UnavailableReason};
