//! Pattern matching against probe output.
//!
//! A [`Matcher`] is compiled once from the pattern, mode and case flag, then
//! evaluated against every probe's bytes. Output is treated as raw bytes:
//! command output and log files are not guaranteed to be valid UTF-8.

use std::fmt;

use regex::bytes::Regex;

use crate::config::{MatchMode, PollConfig};
use crate::error::Result;

/// A compiled pattern.
#[derive(Clone)]
pub enum Matcher {
    /// Substring containment.
    Literal {
        /// The substring to look for.
        needle: String,
        /// Whether both sides are lower-cased before comparing.
        case_insensitive: bool,
    },

    /// Regular expression over the whole output.
    Regex(CompiledRegex),
}

impl Matcher {
    /// Compile a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidPattern`](crate::WatchError::InvalidPattern)
    /// if `mode` is [`MatchMode::Regex`] and the pattern does not compile.
    pub fn compile(pattern: &str, mode: MatchMode, case_insensitive: bool) -> Result<Self> {
        match mode {
            MatchMode::Literal => Ok(Self::literal(pattern, case_insensitive)),
            MatchMode::Regex => Ok(Self::Regex(CompiledRegex::compile(
                pattern,
                case_insensitive,
            )?)),
        }
    }

    /// Compile the matcher described by a poll configuration.
    pub fn from_config(config: &PollConfig) -> Result<Self> {
        Self::compile(&config.pattern, config.match_mode, config.case_insensitive)
    }

    /// Create a literal matcher.
    #[must_use]
    pub fn literal(needle: impl Into<String>, case_insensitive: bool) -> Self {
        Self::Literal {
            needle: needle.into(),
            case_insensitive,
        }
    }

    /// Check whether `candidate` satisfies the pattern.
    #[must_use]
    pub fn evaluate(&self, candidate: &[u8]) -> bool {
        match self {
            Self::Literal {
                needle,
                case_insensitive: false,
            } => contains(candidate, needle.as_bytes()),
            Self::Literal {
                needle,
                case_insensitive: true,
            } => contains_ignore_case(candidate, needle),
            Self::Regex(r) => r.is_match(candidate),
        }
    }

    /// Get the pattern as a string for display purposes.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal { needle, .. } => needle,
            Self::Regex(r) => r.pattern(),
        }
    }

    /// Get the match mode.
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        match self {
            Self::Literal { .. } => MatchMode::Literal,
            Self::Regex(_) => MatchMode::Regex,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal {
                needle,
                case_insensitive,
            } => write!(f, "Literal({needle:?}, ignore_case={case_insensitive})"),
            Self::Regex(r) => write!(f, "Regex({:?})", r.pattern()),
        }
    }
}

/// Compile `pattern` and evaluate it against `candidate` in one step.
///
/// Prefer [`Matcher::compile`] when the same pattern is evaluated repeatedly.
pub fn matches(
    candidate: &[u8],
    pattern: &str,
    mode: MatchMode,
    case_insensitive: bool,
) -> Result<bool> {
    Ok(Matcher::compile(pattern, mode, case_insensitive)?.evaluate(candidate))
}

/// A compiled regular expression with its source pattern.
#[derive(Clone)]
pub struct CompiledRegex {
    pattern: String,
    regex: Regex,
}

impl CompiledRegex {
    /// Compile `pattern`, prefixing `(?i)` for case-insensitive matching.
    ///
    /// The inline flag keeps character classes such as `[A-Z]` meaningful,
    /// which lower-casing the subject would not.
    pub fn compile(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let regex = if case_insensitive {
            Regex::new(&format!("(?i){pattern}"))?
        } else {
            Regex::new(pattern)?
        };
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Get the source pattern, without any inline flags.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check for a match anywhere in `subject`.
    #[must_use]
    pub fn is_match(&self, subject: &[u8]) -> bool {
        self.regex.is_match(subject)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Unicode lower-casing when the output is UTF-8, ASCII lower-casing otherwise.
fn contains_ignore_case(haystack: &[u8], needle: &str) -> bool {
    match std::str::from_utf8(haystack) {
        Ok(text) => text.to_lowercase().contains(&needle.to_lowercase()),
        Err(_) => contains(
            &haystack.to_ascii_lowercase(),
            &needle.as_bytes().to_ascii_lowercase(),
        ),
    }
}
