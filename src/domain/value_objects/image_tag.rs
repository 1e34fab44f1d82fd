//! Image tag value object

use std::fmt;

use crate::error::{BerthError, BerthResult};

/// Maximum tag length
const MAX_LEN: usize = 128;

/// Name under which a built image is stored.
///
/// Lowercase letters, digits, `.`, `_` and `-`; starts with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageTag(String);

impl ImageTag {
    pub fn parse(raw: &str) -> BerthResult<Self> {
        let invalid = |message: &str| BerthError::InvalidTag {
            tag: raw.to_string(),
            message: message.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("tag is empty"));
        }
        if raw.len() > MAX_LEN {
            return Err(invalid("tag is longer than 128 characters"));
        }
        if !raw
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid("tag must start with a lowercase letter or digit"));
        }
        if !raw.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
        }) {
            return Err(invalid(
                "only lowercase letters, digits, '.', '_' and '-' are allowed",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Derive a tag from a build context directory name.
    pub fn from_context_name(name: &str) -> BerthResult<Self> {
        let sanitized: String = name
            .chars()
            .map(|c| {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let trimmed = sanitized.trim_start_matches(['.', '_', '-']);
        let candidate: String = trimmed.chars().take(MAX_LEN).collect();
        Self::parse(&candidate).map_err(|_| BerthError::InvalidTag {
            tag: name.to_string(),
            message: "cannot derive a tag from the context directory; pass --tag".to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
