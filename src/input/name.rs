//! Naming grammar shared by indexes, frames and input definitions.
//!
//! A valid name starts with a lowercase ASCII letter, continues with
//! lowercase letters, digits, `_` or `-`, and is at most 64 bytes long.

use std::sync::OnceLock;

use regex::Regex;

use super::errors::{InputDefinitionError, InputResult};

/// Maximum length of a name in bytes.
pub const MAX_NAME_LEN: usize = 64;

static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn name_pattern() -> &'static Regex {
    NAME_PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9_-]{0,63}$").expect("name pattern is a valid regex")
    })
}

/// Validates `name` against the naming grammar.
pub fn validate_name(name: &str) -> InputResult<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(InputDefinitionError::InvalidName {
            name: name.to_string(),
        })
    }
}
