//! Artifact placement rules
//!
//! Sources keep their context-relative path under the workdir:
//! `bot_main.py` lands at `/app/bot_main.py`, `pkg/` at `/app/pkg/...`.
//!
//! Walks of directory sources consult a [`ContextFilter`]: `.berthignore`
//! patterns (gitignore syntax, rooted at the build context) plus the
//! reserved files, which are never placed whatever the patterns say.

use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::domain::entities::RECIPE_FILE;
use crate::domain::services::map_into_rootfs;
use crate::error::{BerthError, BerthResult};

/// Exclusion file at the root of the build context.
pub const IGNORE_FILE: &str = ".berthignore";

const MAX_IGNORE_BYTES: usize = 64 * 1024;
const MAX_IGNORE_PATTERNS: usize = 1000;

/// Reject sources that are absolute or climb out of the context.
pub fn check_source(source: &Path, context: &Path) -> BerthResult<()> {
    let escapes = source.as_os_str().is_empty()
        || source
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(BerthError::ArtifactOutsideContext {
            path: source.to_path_buf(),
            context: context.to_path_buf(),
        });
    }
    Ok(())
}

/// Source path with `.` components removed.
pub fn normalize_source(source: &Path) -> PathBuf {
    source
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Host destination of a source inside the snapshot.
pub fn destination(rootfs: &Path, workdir: &Path, source: &Path) -> PathBuf {
    map_into_rootfs(rootfs, workdir).join(normalize_source(source))
}

/// Build-context files that directory walks never copy.
pub fn is_reserved(context_relative: &Path) -> bool {
    context_relative == Path::new(RECIPE_FILE) || context_relative == Path::new(IGNORE_FILE)
}

/// Decides which context entries a source walk leaves behind.
#[derive(Debug)]
pub struct ContextFilter {
    patterns: Gitignore,
}

impl ContextFilter {
    /// No `.berthignore`: only the reserved files are excluded.
    pub fn reserved_only() -> Self {
        Self {
            patterns: Gitignore::empty(),
        }
    }

    /// Compile the content of `<context>/.berthignore`.
    ///
    /// A bad pattern is a recipe error naming the ignore file and line.
    pub fn parse(context: &Path, content: &str) -> BerthResult<Self> {
        let file = context.join(IGNORE_FILE);
        let invalid = |message: String| BerthError::RecipeInvalid {
            file: file.clone(),
            message,
        };
        if content.len() > MAX_IGNORE_BYTES {
            return Err(invalid(format!(
                "{} bytes exceeds the {} byte limit",
                content.len(),
                MAX_IGNORE_BYTES
            )));
        }

        let mut builder = GitignoreBuilder::new(context);
        let mut count = 0;
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            count += 1;
            if count > MAX_IGNORE_PATTERNS {
                return Err(invalid(format!(
                    "more than {} patterns",
                    MAX_IGNORE_PATTERNS
                )));
            }
            builder
                .add_line(Some(file.clone()), line)
                .map_err(|e| invalid(format!("line {}: {}", index + 1, e)))?;
        }
        let patterns = builder.build().map_err(|e| invalid(e.to_string()))?;
        tracing::debug!(patterns = patterns.num_ignores(), "loaded {}", IGNORE_FILE);
        Ok(Self { patterns })
    }

    /// Whether a context-relative entry stays out of the image.
    pub fn excludes(&self, context_relative: &Path, is_dir: bool) -> bool {
        is_reserved(context_relative)
            || self
                .patterns
                .matched_path_or_any_parents(context_relative, is_dir)
                .is_ignore()
    }

    /// Skip rule for walking one source.
    ///
    /// Walks report paths relative to the source; the source's own
    /// context-relative prefix is put back before matching.
    pub fn for_source(&self, source: &Path) -> impl Fn(&Path, bool) -> bool + '_ {
        let prefix = normalize_source(source);
        move |rel, is_dir| self.excludes(&prefix.join(rel), is_dir)
    }
}
