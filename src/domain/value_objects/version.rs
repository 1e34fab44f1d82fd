//! Package versions and version constraints
//!
//! Versions are dotted non-negative integers compared with zero padding,
//! so `2.31` and `2.31.0` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A release version such as `2.31.0`.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    pub fn new(segments: Vec<u64>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }

    /// Segments without trailing zeros (used for equality and hashing).
    fn significant(&self) -> &[u64] {
        let len = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.segments[..len]
    }

    /// True if the first `prefix.len()` segments equal `prefix` (zero padded).
    pub fn starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, seg)| self.segment(i) == *seg)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty version".to_string());
        }
        let segments = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    Err(format!("invalid version '{}'", s))
                } else {
                    part.parse::<u64>()
                        .map_err(|_| format!("invalid version '{}'", s))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Eq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Compatible => "~=",
        }
    }

    /// Longest operators first so `>=` wins over `>`.
    const PARSE_ORDER: [Operator; 7] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Ge,
        Operator::Le,
        Operator::Compatible,
        Operator::Gt,
        Operator::Lt,
    ];
}

/// A single version constraint such as `>=2.0` or `==2.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    op: Operator,
    version: Version,
    wildcard: bool,
}

impl Constraint {
    pub fn new(op: Operator, version: Version) -> Self {
        Self {
            op,
            version,
            wildcard: false,
        }
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `candidate` satisfies this constraint.
    pub fn matches(&self, candidate: &Version) -> bool {
        match (self.op, self.wildcard) {
            (Operator::Eq, true) => candidate.starts_with(self.version.segments()),
            (Operator::NotEq, true) => !candidate.starts_with(self.version.segments()),
            (Operator::Eq, false) => candidate == &self.version,
            (Operator::NotEq, false) => candidate != &self.version,
            (Operator::Ge, _) => candidate >= &self.version,
            (Operator::Le, _) => candidate <= &self.version,
            (Operator::Gt, _) => candidate > &self.version,
            (Operator::Lt, _) => candidate < &self.version,
            (Operator::Compatible, _) => {
                let segments = self.version.segments();
                let prefix = &segments[..segments.len().saturating_sub(1)];
                candidate >= &self.version && candidate.starts_with(prefix)
            }
        }
    }
}

impl FromStr for Constraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let op = Operator::PARSE_ORDER
            .into_iter()
            .find(|op| s.starts_with(op.as_str()))
            .ok_or_else(|| format!("missing comparison operator in '{}'", s))?;
        let rest = s[op.as_str().len()..].trim();

        let (rest, wildcard) = match rest.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (rest, false),
        };
        if wildcard && !matches!(op, Operator::Eq | Operator::NotEq) {
            return Err(format!(
                "wildcard versions are only allowed with == and != ('{}')",
                s
            ));
        }

        let version: Version = rest.parse()?;
        if op == Operator::Compatible && version.segments().len() < 2 {
            return Err(format!(
                "~= needs at least two version segments ('{}')",
                s
            ));
        }

        Ok(Self {
            op,
            version,
            wildcard,
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)?;
        if self.wildcard {
            f.write_str(".*")?;
        }
        Ok(())
    }
}

/// A conjunction of constraints; empty means "any version".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionReq {
    constraints: Vec<Constraint>,
}

impl VersionReq {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn from_constraints(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        let mut req = Self::default();
        for c in constraints {
            req.push(c);
        }
        req
    }

    /// Add a constraint, keeping the set sorted and free of duplicates.
    pub fn push(&mut self, constraint: Constraint) {
        let rendered = constraint.to_string();
        if self.constraints.iter().any(|c| c.to_string() == rendered) {
            return;
        }
        self.constraints.push(constraint);
        self.constraints.sort_by_key(|c| c.to_string());
    }

    /// Intersect with another requirement.
    pub fn merge(&mut self, other: &VersionReq) {
        for c in &other.constraints {
            self.push(c.clone());
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_any(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(candidate))
    }
}

impl FromStr for VersionReq {
    type Err = String;

    /// Parse a comma-separated list of constraints.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::any());
        }
        let constraints = s
            .split(',')
            .map(str::parse::<Constraint>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_constraints(constraints))
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}
