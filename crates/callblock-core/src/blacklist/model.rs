//! Blacklist data models.

use callblock_modem::{CallerIdRecord, CallerValue};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Which caller-ID field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    /// The calling number.
    #[default]
    Number,
    /// The calling name.
    Name,
    /// Either field.
    Any,
}

impl MatchField {
    /// Convert to configuration string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Name => "name",
            Self::Any => "any",
        }
    }
}

/// A compiled blacklist pattern.
///
/// Written in configuration as plain text:
/// - `5551234567` matches exactly
/// - `555*` matches anything starting with `555`
/// - `*WIRELESS*` matches anything containing `WIRELESS`
/// - `555?234` or `*SCAM*CO` are globs (`*` any run, `?` one character)
/// - `@unavailable` matches callers whose field was withheld or not sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Pattern {
    /// Field equals the text.
    Exact(String),
    /// Field starts with the text.
    Prefix(String),
    /// Field contains the text.
    Contains(String),
    /// Field matches the glob.
    Glob(Glob),
    /// Field carries no data.
    Unavailable,
}

impl Pattern {
    /// Reserved pattern text targeting unavailable callers.
    pub const UNAVAILABLE: &'static str = "@unavailable";

    /// Parses pattern text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        if text.eq_ignore_ascii_case(Self::UNAVAILABLE) {
            return Self::Unavailable;
        }
        if let Some(inner) = text.strip_prefix('*').and_then(|t| t.strip_suffix('*'))
            && !inner.is_empty()
            && !has_wildcard(inner)
        {
            return Self::Contains(inner.to_string());
        }
        if let Some(stem) = text.strip_suffix('*')
            && !has_wildcard(stem)
        {
            return Self::Prefix(stem.to_string());
        }
        if has_wildcard(text) {
            Self::Glob(Glob::new(text))
        } else {
            Self::Exact(text.to_string())
        }
    }

    /// Returns the pattern in configuration syntax.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Exact(text) => text.clone(),
            Self::Prefix(stem) => format!("{stem}*"),
            Self::Contains(text) => format!("*{text}*"),
            Self::Glob(glob) => glob.as_str().to_string(),
            Self::Unavailable => Self::UNAVAILABLE.to_string(),
        }
    }

    /// Returns true if the pattern text is empty (never matches).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Exact(text) | Self::Contains(text) if text.is_empty())
    }

    /// Returns false for a glob that could not be compiled.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match self {
            Self::Glob(glob) => glob.is_compiled(),
            _ => true,
        }
    }

    /// Matches a calling number.
    ///
    /// Non-digit characters are stripped from the number and from literal
    /// pattern text before comparing. A number without digits counts as
    /// unavailable.
    #[must_use]
    pub fn matches_number(&self, value: &CallerValue) -> bool {
        let digits = value.known().map(digits_only).filter(|d| !d.is_empty());
        let Some(digits) = digits else {
            return matches!(self, Self::Unavailable);
        };
        match self {
            Self::Exact(text) => {
                literal_digits(text).is_some_and(|p| !p.is_empty() && p == digits)
            }
            Self::Prefix(stem) => literal_digits(stem).is_some_and(|p| digits.starts_with(&p)),
            Self::Contains(text) => {
                literal_digits(text).is_some_and(|p| !p.is_empty() && digits.contains(&p))
            }
            Self::Glob(glob) => glob.matches_number(&digits),
            Self::Unavailable => false,
        }
    }

    /// Matches a calling name, ignoring case.
    #[must_use]
    pub fn matches_name(&self, value: &CallerValue) -> bool {
        let CallerValue::Known(name) = value else {
            return matches!(self, Self::Unavailable);
        };
        let name = name.to_uppercase();
        match self {
            Self::Exact(text) => !text.is_empty() && name == text.to_uppercase(),
            Self::Prefix(stem) => name.starts_with(&stem.to_uppercase()),
            Self::Contains(text) => !text.is_empty() && name.contains(&text.to_uppercase()),
            Self::Glob(glob) => glob.matches_name(&name),
            Self::Unavailable => false,
        }
    }
}

/// A `*`/`?` wildcard pattern compiled to anchored regular expressions.
///
/// Names match case-insensitively against the whole text. Numbers match
/// against the digits-and-wildcards form of the text; a glob containing
/// letters never matches a number.
#[derive(Debug, Clone)]
pub struct Glob {
    text: String,
    name: Option<Regex>,
    number: Option<Regex>,
}

impl Glob {
    /// Compiles glob text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let number = (!text.chars().any(char::is_alphabetic))
            .then(|| {
                text.chars()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '*' | '?'))
                    .collect::<String>()
            })
            .filter(|reduced| !reduced.is_empty())
            .and_then(|reduced| compile_glob(&reduced));

        Self {
            text: text.to_string(),
            name: compile_glob(text),
            number,
        }
    }

    /// The glob as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns false if the regex could not be built.
    #[must_use]
    pub const fn is_compiled(&self) -> bool {
        self.name.is_some()
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name.as_ref().is_some_and(|re| re.is_match(name))
    }

    fn matches_number(&self, digits: &str) -> bool {
        self.number.as_ref().is_some_and(|re| re.is_match(digits))
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Glob {}

/// Translates a glob into an anchored, case-insensitive regex.
fn compile_glob(glob: &str) -> Option<Regex> {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push('^');
    for c in glob.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            literal => source.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .ok()
}

impl From<String> for Pattern {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for Pattern {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.to_text()
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// One blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    /// What to match.
    pub pattern: Pattern,
    /// Which field to match against.
    #[serde(default)]
    pub field: MatchField,
    /// Human description for logs.
    #[serde(default)]
    pub label: String,
}

impl BlockRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(pattern: impl Into<Pattern>, field: MatchField, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            field,
            label: label.into(),
        }
    }

    /// Creates a rule on the calling number.
    #[must_use]
    pub fn number(pattern: &str, label: impl Into<String>) -> Self {
        Self::new(pattern, MatchField::Number, label)
    }

    /// Creates a rule on the calling name.
    #[must_use]
    pub fn name(pattern: &str, label: impl Into<String>) -> Self {
        Self::new(pattern, MatchField::Name, label)
    }

    /// Returns true if the record matches this rule.
    #[must_use]
    pub fn matches(&self, record: &CallerIdRecord) -> bool {
        match self.field {
            MatchField::Number => self.pattern.matches_number(&record.number),
            MatchField::Name => self.pattern.matches_name(&record.name),
            MatchField::Any => {
                self.pattern.matches_number(&record.number)
                    || self.pattern.matches_name(&record.name)
            }
        }
    }

    /// Label for logs, falling back to the pattern.
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.label.is_empty() {
            format!("{} {}", self.field.as_str(), self.pattern)
        } else {
            self.label.clone()
        }
    }
}

fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Digits of literal pattern text, or `None` if it is not a number pattern
/// (contains letters, or nothing numeric is left).
fn literal_digits(text: &str) -> Option<String> {
    if text.chars().any(char::is_alphabetic) {
        return None;
    }
    let digits = digits_only(text);
    (!digits.is_empty() || text.is_empty()).then_some(digits)
}
