//! Launch target resolution and environment composition
//!
//! Image paths (`/usr/bin`, `/app`) are mapped under the rootfs on the host.
//! Nothing here ever falls back to the host's own binaries.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::domain::entities::LaunchDirective;
use crate::domain::ports::FileSystem;
use crate::error::{BerthError, BerthResult};

/// Placeholder in image env values replaced by the host rootfs path
pub const ROOTFS_VAR: &str = "${ROOTFS}";

/// Map an absolute image path onto the host rootfs.
pub fn map_into_rootfs(rootfs: &Path, image_path: &Path) -> PathBuf {
    let mut mapped = rootfs.to_path_buf();
    for component in image_path.components() {
        if let Component::Normal(part) = component {
            mapped.push(part);
        }
    }
    mapped
}

/// Locations inside the rootfs where `directive.program()` may live.
pub fn target_candidates(
    rootfs: &Path,
    directive: &LaunchDirective,
    search_path: &[String],
) -> Vec<PathBuf> {
    let program = Path::new(directive.program());
    if program.components().any(|c| matches!(c, Component::ParentDir)) {
        return Vec::new();
    }

    if directive.program().contains('/') {
        let image_path = if program.has_root() {
            program.to_path_buf()
        } else {
            directive.workdir().join(program)
        };
        return vec![map_into_rootfs(rootfs, &image_path)];
    }

    search_path
        .iter()
        .map(|dir| map_into_rootfs(rootfs, Path::new(dir)).join(program))
        .collect()
}

/// Resolve the launch program to an executable file inside the rootfs.
pub fn resolve_target<F: FileSystem>(
    fs: &F,
    rootfs: &Path,
    directive: &LaunchDirective,
    search_path: &[String],
) -> BerthResult<PathBuf> {
    let candidates = target_candidates(rootfs, directive, search_path);
    candidates
        .iter()
        .find(|candidate| fs.is_executable_file(candidate))
        .cloned()
        .ok_or_else(|| BerthError::LaunchTargetMissing {
            program: directive.program().to_string(),
            searched: candidates,
        })
}

/// Environment of the launched process.
///
/// The supervisor's variables win; image defaults only fill gaps. `PATH` is
/// the image search path (mapped into the rootfs) followed by the
/// supervisor's `PATH`. Output is sorted by name.
pub fn compose_env<H>(
    host: H,
    image_env: &BTreeMap<String, String>,
    search_path: &[String],
    rootfs: &Path,
) -> Vec<(String, String)>
where
    H: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = host.into_iter().collect();
    let rootfs_str = rootfs.display().to_string();

    for (key, value) in image_env {
        env.entry(key.clone())
            .or_insert_with(|| value.replace(ROOTFS_VAR, &rootfs_str));
    }

    let mut dirs: Vec<PathBuf> = search_path
        .iter()
        .map(|dir| map_into_rootfs(rootfs, Path::new(dir)))
        .collect();
    let host_path = env.get("PATH").cloned().unwrap_or_default();
    dirs.extend(
        std::env::split_paths(&OsString::from(&host_path)).filter(|p| !p.as_os_str().is_empty()),
    );

    match std::env::join_paths(&dirs) {
        Ok(joined) => {
            env.insert("PATH".to_string(), joined.to_string_lossy().into_owned());
        }
        Err(err) => {
            tracing::warn!(error = %err, "image path not usable; keeping supervisor PATH");
        }
    }

    env.into_iter().collect()
}
