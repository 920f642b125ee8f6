//! Caller blacklist: rule model and evaluation.

mod matcher;
mod model;

pub use matcher::{Blacklist, Verdict, evaluate};
pub use model::{BlockRule, Glob, MatchField, Pattern};
