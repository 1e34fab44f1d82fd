//! Normalized package names
//!
//! `Requests`, `requests` and `REQUESTS` name the same package, as do
//! `typing_extensions` and `typing-extensions`.

use std::fmt;

/// A validated, normalized package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Validate and normalize a name as written in a manifest.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let bytes = raw.as_bytes();
        let valid_edge = |b: u8| b.is_ascii_alphanumeric();
        let valid_inner = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-');

        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) if valid_edge(*first) && valid_edge(*last) => {}
            (None, _) | (_, None) => return Err("empty package name".to_string()),
            _ => {
                return Err(format!(
                    "package name '{}' must start and end with a letter or digit",
                    raw
                ))
            }
        }
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii() || !valid_inner(*c as u8)) {
            return Err(format!(
                "invalid character '{}' in package name '{}'",
                bad, raw
            ));
        }

        Ok(Self(normalize(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for c in raw.chars() {
        if matches!(c, '.' | '_' | '-') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(PackageName::parse("Requests").unwrap().as_str(), "requests");
        assert_eq!(
            PackageName::parse("typing_extensions").unwrap(),
            PackageName::parse("Typing-Extensions").unwrap()
        );
        assert_eq!(PackageName::parse("zope..__interface").unwrap().as_str(), "zope-interface");
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(PackageName::parse("").is_err());
        assert!(PackageName::parse("-requests").is_err());
        assert!(PackageName::parse("requests.").is_err());
    }

    #[test]
    fn rejects_bad_characters() {
        let err = PackageName::parse("requests[socks]").unwrap_err();
        assert!(err.contains('['));
        assert!(PackageName::parse("pkg/evil").is_err());
        assert!(PackageName::parse("päckage").is_err());
    }
}
