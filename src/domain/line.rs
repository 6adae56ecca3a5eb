//! Line classification
//!
//! Scene content is line oriented. Each line is exactly one of:
//!
//! | Line | Classified as |
//! |------|---------------|
//! | (blank) | `EmptyLine` |
//! | `#The Cave \| cave` | `HeaderNamed` |
//! | `#The Cave` | `HeaderAnonymous` |
//! | `[Go inside] -> cave` or `[Go inside](cave)` | `Link` |
//! | anything else | `Plaintext` |
//!
//! A link whose target does not parse, or a heading with no text, becomes an
//! `Error` line. The classifier has no memory: it never looks at
//! neighbouring lines or the scene.

use serde::Serialize;

use super::error::ErrorCode;
use super::link::{parse_link_target, LinkTarget};

/// Marks a heading line (may be repeated, `## Heading` is fine)
pub const HEADING_MARKER: char = '#';

/// Separates heading text from an explicit link name
pub const NAME_SEPARATOR: char = '|';

/// Arrow between a link's display text and its target
pub const LINK_ARROW: &str = "->";

/// One classified line of scene content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentLine {
    EmptyLine {
        line: usize,
    },
    HeaderNamed {
        line: usize,
        text: String,
        name: String,
    },
    HeaderAnonymous {
        line: usize,
        text: String,
    },
    Link {
        line: usize,
        text: String,
        link: LinkTarget,
    },
    Plaintext {
        line: usize,
        text: String,
    },
    Error {
        line: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
        message: String,
    },
}

impl ContentLine {
    /// Returns the 1-based source line number
    pub fn line_number(&self) -> usize {
        match self {
            ContentLine::EmptyLine { line }
            | ContentLine::HeaderNamed { line, .. }
            | ContentLine::HeaderAnonymous { line, .. }
            | ContentLine::Link { line, .. }
            | ContentLine::Plaintext { line, .. }
            | ContentLine::Error { line, .. } => *line,
        }
    }

    /// Returns a short label for the variant
    pub fn kind(&self) -> &'static str {
        match self {
            ContentLine::EmptyLine { .. } => "empty",
            ContentLine::HeaderNamed { .. } => "heading",
            ContentLine::HeaderAnonymous { .. } => "heading",
            ContentLine::Link { .. } => "link",
            ContentLine::Plaintext { .. } => "paragraph",
            ContentLine::Error { .. } => "error",
        }
    }
}

/// Classifies a single line of raw scene text
pub fn classify(line: &str, line_number: usize) -> ContentLine {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return ContentLine::EmptyLine { line: line_number };
    }

    if trimmed.starts_with(HEADING_MARKER) {
        let rest = trimmed.trim_start_matches(HEADING_MARKER);
        let (text, name) = match rest.split_once(NAME_SEPARATOR) {
            Some((text, name)) => (text.trim(), Some(name.trim())),
            None => (rest.trim(), None),
        };

        if text.is_empty() {
            return ContentLine::Error {
                line: line_number,
                code: None,
                message: "a heading needs some text after the '#'".to_string(),
            };
        }

        return match name {
            Some(name) => ContentLine::HeaderNamed {
                line: line_number,
                text: text.to_string(),
                name: name.to_string(),
            },
            None => ContentLine::HeaderAnonymous {
                line: line_number,
                text: text.to_string(),
            },
        };
    }

    if let Some((text, target)) = split_link(trimmed) {
        return match parse_link_target(target) {
            Ok(link) => ContentLine::Link {
                line: line_number,
                text: text.to_string(),
                link,
            },
            Err(e) => ContentLine::Error {
                line: line_number,
                code: Some(ErrorCode::MalformedLink),
                message: format!("the link \"{}\" is malformed: {}", text, e),
            },
        };
    }

    ContentLine::Plaintext {
        line: line_number,
        text: trimmed.to_string(),
    }
}

/// Classifies every line of a scene's content, numbering from 1
pub fn classify_all(content: &str) -> impl Iterator<Item = ContentLine> + '_ {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| classify(line, index + 1))
}

/// Splits `[text] -> target` or `[text](target)` into its two parts
fn split_link(line: &str) -> Option<(&str, &str)> {
    let (text, after) = line.strip_prefix('[')?.split_once(']')?;
    let after = after.trim_start();

    if let Some(target) = after.strip_prefix(LINK_ARROW) {
        return Some((text.trim(), target.trim()));
    }

    let target = after.strip_prefix('(')?.strip_suffix(')')?;
    Some((text.trim(), target.trim()))
}
