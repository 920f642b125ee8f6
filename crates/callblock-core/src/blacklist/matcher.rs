//! Rule evaluation.

use callblock_modem::CallerIdRecord;
use serde::{Deserialize, Serialize};

use super::model::{BlockRule, MatchField, Pattern};

/// Decision for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the call should be rejected.
    pub blocked: bool,
    /// The first rule that matched, if any.
    pub matched_rule: Option<BlockRule>,
}

impl Verdict {
    /// A verdict letting the call through.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            blocked: false,
            matched_rule: None,
        }
    }

    /// A verdict rejecting the call because of `rule`.
    #[must_use]
    pub const fn block(rule: BlockRule) -> Self {
        Self {
            blocked: true,
            matched_rule: Some(rule),
        }
    }
}

/// Evaluates `record` against `rules` in order; the first match wins.
///
/// Pure: the same inputs always give the same verdict.
#[must_use]
pub fn evaluate(record: &CallerIdRecord, rules: &[BlockRule]) -> Verdict {
    rules
        .iter()
        .find(|rule| rule.matches(record))
        .map_or_else(Verdict::allow, |rule| Verdict::block(rule.clone()))
}

/// An immutable, ordered rule set.
///
/// Sessions hold a snapshot for the duration of a call; reloads publish a
/// new `Blacklist` rather than mutating the one in use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blacklist {
    rules: Vec<BlockRule>,
}

impl Blacklist {
    /// Creates a blacklist from ordered rules.
    #[must_use]
    pub const fn new(rules: Vec<BlockRule>) -> Self {
        Self { rules }
    }

    /// Builds rules from plain lists: numbers block by prefix, names block
    /// when they appear anywhere in the caller's name.
    #[must_use]
    pub fn from_lists<N, M>(numbers: N, names: M) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let numbers = numbers.into_iter().filter_map(|number| {
            let number = number.as_ref().trim();
            if number.is_empty() {
                return None;
            }
            Some(BlockRule::new(
                Pattern::Prefix(number.to_string()),
                MatchField::Number,
                format!("number {number}"),
            ))
        });
        let names = names.into_iter().filter_map(|name| {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return None;
            }
            Some(BlockRule::new(
                Pattern::Contains(name.to_string()),
                MatchField::Name,
                format!("name {name}"),
            ))
        });
        numbers.chain(names).collect()
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[BlockRule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates a record against this rule set.
    #[must_use]
    pub fn evaluate(&self, record: &CallerIdRecord) -> Verdict {
        evaluate(record, &self.rules)
    }
}

impl FromIterator<BlockRule> for Blacklist {
    fn from_iter<I: IntoIterator<Item = BlockRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Blacklist {
    type Item = BlockRule;
    type IntoIter = std::vec::IntoIter<BlockRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl Extend<BlockRule> for Blacklist {
    fn extend<I: IntoIterator<Item = BlockRule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}
