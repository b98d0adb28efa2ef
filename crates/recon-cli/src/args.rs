//! Parsers for `KEY=VALUE` command line values.

use std::fmt;

/// A `KEY=VALUE` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
}

impl Assignment {
    /// Parse `KEY=VALUE`, splitting at the first `=`. Both sides are trimmed
    /// and must be non-empty.
    pub fn parse(input: &str) -> Result<Self, String> {
        let Some((key, value)) = input.split_once('=') else {
            return Err(format!("expected KEY=VALUE, got '{input}'"));
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(format!("missing column name before '=' in '{input}'"));
        }
        if value.is_empty() {
            return Err(format!("missing value after '=' in '{input}'"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
