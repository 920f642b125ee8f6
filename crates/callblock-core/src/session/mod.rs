//! Call session: state machine and controller.

mod controller;
mod state;

pub use controller::{CallOutcome, CallSession, SessionOptions};
pub use state::{SessionState, Trigger};
