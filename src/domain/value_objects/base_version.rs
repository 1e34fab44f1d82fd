//! Base runtime version identifier

use std::fmt;

/// Identifier of a published base runtime (e.g. `3.11`, `3.11.4-slim`).
///
/// Only the character set is validated here; whether the version resolves
/// is the base provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseVersion(String);

impl BaseVersion {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("base version is empty".to_string());
        }
        if raw == "." || raw == ".." {
            return Err(format!("'{}' is not a version", raw));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
        {
            return Err(format!("invalid character '{}' in base version '{}'", bad, raw));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_forms() {
        for raw in ["3.11", "3.11.4", "3.11-slim", "1.0+build.5", "latest"] {
            assert!(BaseVersion::parse(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn rejects_path_like_versions() {
        for raw in ["", "  ", ".", "..", "../3.11", "3.11/x", "a b"] {
            assert!(BaseVersion::parse(raw).is_err(), "{raw:?}");
        }
    }
}
