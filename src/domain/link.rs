//! Link targets
//!
//! A link target is the anchor name a scene or page is addressed by.
//!
//! Format: lowercase ASCII letters, digits and single hyphens, e.g.
//! `the-cave`, `chapter-2`. No leading or trailing hyphen, no `--`.
//!
//! Targets are only ever produced by [`parse_link_target`]. Heading text goes
//! through [`derive_link_target`] and [`derive_link_target_leniently`] first:
//!
//! ```text
//! "The Cave!"  --derive-->  "the cave"  --lenient-->  "the-cave"  --parse-->  LinkTarget
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shortest accepted target, in characters
pub const MIN_LINK_TARGET_LEN: usize = 1;

/// Longest accepted target, in characters
pub const MAX_LINK_TARGET_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkTargetError {
    #[error("the link name is empty")]
    Empty,

    #[error("the link name '{candidate}' is shorter than {min} characters")]
    TooShort { candidate: String, min: usize },

    #[error("the link name '{candidate}' is longer than {max} characters")]
    TooLong { candidate: String, max: usize },

    #[error("the link name '{candidate}' contains '{found}' (only letters, digits and hyphens are allowed)")]
    InvalidCharacter { candidate: String, found: char },

    #[error("the link name '{0}' must not start or end with a hyphen")]
    DanglingHyphen(String),

    #[error("the link name '{0}' must not contain repeated hyphens")]
    RepeatedHyphen(String),
}

/// A validated, canonical anchor name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkTarget(String);

impl LinkTarget {
    /// Returns the target as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LinkTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for LinkTarget {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for LinkTarget {
    type Err = LinkTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_link_target(s)
    }
}

impl TryFrom<String> for LinkTarget {
    type Error = LinkTargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_link_target(&value)
    }
}

impl From<LinkTarget> for String {
    fn from(target: LinkTarget) -> Self {
        target.0
    }
}

/// Validates a candidate and returns its canonical (lowercase) form
pub fn parse_link_target(candidate: &str) -> Result<LinkTarget, LinkTargetError> {
    let candidate = candidate.trim().to_lowercase();

    if candidate.is_empty() {
        return Err(LinkTargetError::Empty);
    }

    if let Some(found) = candidate
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(LinkTargetError::InvalidCharacter { candidate, found });
    }

    // Charset is ASCII from here on, so byte length == char count
    if candidate.len() < MIN_LINK_TARGET_LEN {
        return Err(LinkTargetError::TooShort {
            candidate,
            min: MIN_LINK_TARGET_LEN,
        });
    }

    if candidate.len() > MAX_LINK_TARGET_LEN {
        return Err(LinkTargetError::TooLong {
            candidate,
            max: MAX_LINK_TARGET_LEN,
        });
    }

    if candidate.starts_with('-') || candidate.ends_with('-') {
        return Err(LinkTargetError::DanglingHyphen(candidate));
    }

    if candidate.contains("--") {
        return Err(LinkTargetError::RepeatedHyphen(candidate));
    }

    Ok(LinkTarget(candidate))
}

/// Computes a candidate name from free-form heading text
///
/// Lowercases and drops everything outside `[a-z0-9 ]`. Spaces survive so
/// that word boundaries can become hyphens in [`derive_link_target_leniently`].
/// Long headings are cut at the last word that still fits in
/// [`MAX_LINK_TARGET_LEN`] once hyphenated.
pub fn derive_link_target(heading_text: &str) -> String {
    let kept = heading_text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect::<String>();
    let kept = kept.trim();

    let hyphenated_len = kept.split_whitespace().map(str::len).sum::<usize>()
        + kept.split_whitespace().count().saturating_sub(1);
    if hyphenated_len <= MAX_LINK_TARGET_LEN {
        return kept.to_string();
    }

    let mut shortened = String::new();
    for word in kept.split_whitespace() {
        if shortened.is_empty() {
            // Only ASCII is left, so byte slicing is safe
            shortened.push_str(&word[..word.len().min(MAX_LINK_TARGET_LEN)]);
        } else if shortened.len() + 1 + word.len() <= MAX_LINK_TARGET_LEN {
            shortened.push(' ');
            shortened.push_str(word);
        } else {
            break;
        }
    }
    shortened
}

/// Collapses each run of whitespace into a single hyphen
pub fn derive_link_target_leniently(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Full derivation for a heading: explicit name if given, else the heading text
pub fn link_target_for_heading(
    text: &str,
    name: Option<&str>,
) -> Result<LinkTarget, LinkTargetError> {
    let candidate = match name {
        Some(name) => derive_link_target_leniently(name),
        None => derive_link_target_leniently(&derive_link_target(text)),
    };

    parse_link_target(&candidate)
}
