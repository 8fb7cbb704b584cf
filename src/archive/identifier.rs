//! Archive identifier module
//!
//! Identifiers come straight from the query string and end up in a file
//! name, so they are allow-listed before any path is built.

use super::error::ArchiveError;
use regex::Regex;
use std::fmt;

pub const DEFAULT_IDENTIFIER_PATTERN: &str = "^[0-9A-Za-z_-]{1,64}$";

/// Characters that are rejected no matter what the configured pattern allows
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '.', '\0', ':'];

/// Compiled allow-list for identifiers
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    /// Compile a pattern. The whole identifier must match, so the expression
    /// is always wrapped in anchors.
    pub fn new(expr: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&format!("^(?:{expr})$"))?,
        })
    }

    fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A validated archive identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw query value
    pub fn parse(raw: Option<&str>, pattern: &IdentifierPattern) -> Result<Self, ArchiveError> {
        let raw = match raw {
            Some(value) if !value.is_empty() => value,
            _ => return Err(ArchiveError::MissingIdentifier),
        };

        if raw.contains(FORBIDDEN_CHARS) || raw.chars().any(char::is_control) {
            return Err(ArchiveError::InvalidIdentifier(raw.to_string()));
        }

        if !pattern.is_match(raw) {
            return Err(ArchiveError::InvalidIdentifier(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
