//! Dependency resolver
//!
//! Depth-first search over a `PackageIndex`:
//!
//! 1. Merge root requirements by normalized name.
//! 2. Take the first constrained package (by name) that has no version yet
//!    and try its satisfying versions, highest first.
//! 3. Add the requirements that version declares. If they exclude a version
//!    already chosen, try the next candidate; if no candidate works, go back
//!    to the previous choice.
//!
//! Candidates are visited in an order fixed by the merged constraint set, so
//! the outcome never depends on the order entries were written in.

use std::collections::BTreeMap;

use crate::domain::entities::{BuildManifest, InstalledSet};
use crate::domain::ports::PackageIndex;
use crate::domain::value_objects::{PackageName, Version, VersionReq};
use crate::error::{BerthError, BerthResult};

/// Upper bound on candidate versions tried before giving up
pub const MAX_ATTEMPTS: usize = 10_000;

/// Resolves a manifest to one version per package.
pub struct Resolver<'a, I: PackageIndex> {
    index: &'a I,
}

/// Partial assignment explored by the search
#[derive(Clone, Default)]
struct State {
    constraints: BTreeMap<PackageName, VersionReq>,
    /// Root entry responsible for each name, for error messages
    origin: BTreeMap<PackageName, String>,
    selected: BTreeMap<PackageName, Version>,
}

impl State {
    fn origin_of(&self, name: &PackageName) -> String {
        self.origin
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn next_open(&self) -> Option<(PackageName, VersionReq)> {
        self.constraints
            .iter()
            .find(|(name, _)| !self.selected.contains_key(*name))
            .map(|(name, req)| (name.clone(), req.clone()))
    }
}

enum Dead {
    /// This branch cannot be completed; siblings may still work
    Conflict(BerthError),
    /// Stop the whole search
    Abort(BerthError),
}

impl<'a, I: PackageIndex> Resolver<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    pub fn resolve(&self, manifest: &BuildManifest) -> BerthResult<InstalledSet> {
        let mut state = State {
            constraints: manifest.merged(),
            ..State::default()
        };
        for entry in manifest.entries() {
            state
                .origin
                .entry(entry.name().clone())
                .or_insert_with(|| entry.to_string());
        }

        let mut attempts = 0;
        match self.search(state, &mut attempts, manifest) {
            Ok(selected) => {
                tracing::debug!(
                    packages = selected.len(),
                    attempts,
                    "dependency resolution finished"
                );
                Ok(selected.into_iter().collect())
            }
            Err(Dead::Conflict(e)) | Err(Dead::Abort(e)) => Err(e),
        }
    }

    fn search(
        &self,
        state: State,
        attempts: &mut usize,
        manifest: &BuildManifest,
    ) -> Result<BTreeMap<PackageName, Version>, Dead> {
        let Some((name, req)) = state.next_open() else {
            return Ok(state.selected);
        };
        let fail = |reason: String| BerthError::DependencyResolution {
            entry: state.origin_of(&name),
            package: name.to_string(),
            reason,
        };

        let mut versions = self.index.versions(&name).map_err(Dead::Abort)?;
        if versions.is_empty() {
            return Err(Dead::Conflict(fail("no such package in index".to_string())));
        }
        versions.sort();

        let candidates: Vec<&Version> =
            versions.iter().rev().filter(|v| req.matches(v)).collect();
        if candidates.is_empty() {
            let available: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
            return Err(Dead::Conflict(fail(format!(
                "no version satisfies '{}' (available: {})",
                req,
                available.join(", ")
            ))));
        }

        let mut first_conflict = None;
        for version in candidates {
            *attempts += 1;
            if *attempts > MAX_ATTEMPTS {
                return Err(Dead::Abort(BerthError::DependencyResolution {
                    entry: manifest
                        .entries()
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    package: name.to_string(),
                    reason: format!("gave up after trying {} candidate versions", MAX_ATTEMPTS),
                }));
            }

            let outcome = self
                .choose(&state, &name, version)
                .and_then(|next| self.search(next, attempts, manifest));
            match outcome {
                Ok(selected) => return Ok(selected),
                Err(Dead::Conflict(e)) => {
                    tracing::trace!(package = %name, %version, error = %e, "backtracking");
                    first_conflict.get_or_insert(e);
                }
                Err(abort) => return Err(abort),
            }
        }

        Err(Dead::Conflict(first_conflict.unwrap_or_else(|| {
            fail("no candidate version could be installed".to_string())
        })))
    }

    /// Select `version` for `name` and add its requirements.
    fn choose(&self, state: &State, name: &PackageName, version: &Version) -> Result<State, Dead> {
        let mut next = state.clone();
        next.selected.insert(name.clone(), version.clone());
        let parent_origin = state.origin_of(name);

        for dep in self.index.requires(name, version).map_err(Dead::Abort)? {
            let merged = next.constraints.entry(dep.name().clone()).or_default();
            merged.merge(dep.req());
            next.origin
                .entry(dep.name().clone())
                .or_insert_with(|| parent_origin.clone());

            if let Some(chosen) = next.selected.get(dep.name()) {
                if !merged.matches(chosen) {
                    return Err(Dead::Conflict(BerthError::DependencyResolution {
                        entry: next.origin_of(dep.name()),
                        package: dep.name().to_string(),
                        reason: format!(
                            "{} {} requires '{}', but {} was selected",
                            name, version, dep, chosen
                        ),
                    }));
                }
            }
        }
        Ok(next)
    }
}
