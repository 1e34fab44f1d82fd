//! Build manifest entity
//!
//! An ordered list of dependency declarations, one per line:
//!
//! ```text
//! # comment
//! requests==2.31.0
//! aiohttp >=3.9, <4   # trailing comment
//! python-dotenv
//! ```
//!
//! The manifest is parsed here and handed to the installer as a whole; its
//! canonical form (sorted, merged) is what the dependency stage key hashes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::{PackageName, VersionReq};
use crate::error::{BerthError, BerthResult};

/// One dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: PackageName,
    raw_name: String,
    req: VersionReq,
    line: usize,
}

impl Requirement {
    pub fn new(name: PackageName, req: VersionReq) -> Self {
        Self {
            raw_name: name.as_str().to_string(),
            name,
            req,
            line: 0,
        }
    }

    /// Parse a single declaration (comments already stripped).
    pub fn parse(declaration: &str) -> Result<Self, String> {
        let declaration = declaration.trim();
        if declaration.starts_with('-') {
            return Err(format!(
                "installer options are not supported ('{}')",
                declaration
            ));
        }

        let split = declaration
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(declaration.len());
        let (raw_name, rest) = declaration.split_at(split);
        let rest = rest.trim();

        if rest.starts_with('[') {
            return Err(format!("extras are not supported ('{}')", declaration));
        }
        if rest.contains(';') {
            return Err(format!(
                "environment markers are not supported ('{}')",
                declaration
            ));
        }
        if rest.starts_with('@') {
            return Err(format!(
                "direct references are not supported ('{}')",
                declaration
            ));
        }

        let name = PackageName::parse(raw_name)?;
        let req: VersionReq = rest.parse()?;

        Ok(Self {
            name,
            raw_name: raw_name.to_string(),
            req,
            line: 0,
        })
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// Name exactly as written in the manifest
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn req(&self) -> &VersionReq {
        &self.req
    }

    /// 1-based manifest line (0 when not parsed from a file)
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.raw_name, self.req)
    }
}

/// Parsed build manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildManifest {
    source: PathBuf,
    entries: Vec<Requirement>,
}

impl BuildManifest {
    /// Parse manifest content; `source` is only used for error messages.
    pub fn parse(content: &str, source: &Path) -> BerthResult<Self> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let declaration = strip_comment(line).trim();
            if declaration.is_empty() {
                continue;
            }

            let mut requirement =
                Requirement::parse(declaration).map_err(|message| BerthError::ManifestParse {
                    file: source.to_path_buf(),
                    line: index + 1,
                    message,
                })?;
            requirement.line = index + 1;
            entries.push(requirement);
        }

        Ok(Self {
            source: source.to_path_buf(),
            entries,
        })
    }

    /// Read and parse a manifest file. A missing file is a parse error.
    pub fn load(path: &Path) -> BerthResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::ManifestParse {
            file: path.to_path_buf(),
            line: 0,
            message: match e.kind() {
                std::io::ErrorKind::NotFound => "file not found".to_string(),
                std::io::ErrorKind::InvalidData => "file is not valid UTF-8".to_string(),
                _ => e.to_string(),
            },
        })?;
        Self::parse(&content, path)
    }

    pub fn from_requirements(source: &Path, entries: Vec<Requirement>) -> Self {
        Self {
            source: source.to_path_buf(),
            entries,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Declarations in manifest order
    pub fn entries(&self) -> &[Requirement] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Requirements merged by normalized name (constraints intersect).
    pub fn merged(&self) -> BTreeMap<PackageName, VersionReq> {
        let mut merged: BTreeMap<PackageName, VersionReq> = BTreeMap::new();
        for entry in &self.entries {
            merged
                .entry(entry.name.clone())
                .or_default()
                .merge(&entry.req);
        }
        merged
    }

    /// Order-independent rendering used for cache keys.
    pub fn canonical(&self) -> String {
        self.merged()
            .iter()
            .map(|(name, req)| format!("{}{}\n", name, req))
            .collect()
    }
}

/// Cut a `#` comment that starts the line or follows whitespace.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}
