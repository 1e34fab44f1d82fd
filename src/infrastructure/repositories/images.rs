//! Filesystem Image Store
//!
//! ```text
//! <store>/images/<tag>/image.toml
//! <store>/images/<tag>/rootfs/...
//! <store>/images/<tag>.lock
//! ```
//!
//! Publishing assembles the image in `<store>/tmp` and swaps it into place
//! while holding an exclusive lock on the tag.

use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::entities::{RuntimeImage, IMAGE_FORMAT_VERSION};
use crate::domain::ports::{skip_none, FileSystem, ImageStore, StoredImage};
use crate::domain::value_objects::ImageTag;
use crate::error::{BerthError, BerthResult};
use crate::infrastructure::fs::LocalFs;

const METADATA_FILE: &str = "image.toml";

/// Image store rooted in the berth store.
pub struct FsImageStore {
    store: PathBuf,
    fs: LocalFs,
}

impl FsImageStore {
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            fs: LocalFs::new(),
        }
    }

    fn images_root(&self) -> PathBuf {
        self.store.join("images")
    }

    fn image_dir(&self, tag: &str) -> PathBuf {
        self.images_root().join(tag)
    }

    fn lock_path(&self, tag: &str) -> PathBuf {
        self.images_root().join(format!("{}.lock", tag))
    }

    fn tmp_dir(&self, prefix: &str) -> BerthResult<tempfile::TempDir> {
        let tmp_root = self.store.join("tmp");
        self.fs.create_dir_all(&tmp_root)?;
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&tmp_root)
            .map_err(|e| BerthError::store(&tmp_root, e))
    }

    fn load_dir(&self, tag: &str) -> BerthResult<StoredImage> {
        let dir = self.image_dir(tag);
        let path = dir.join(METADATA_FILE);
        if !self.fs.exists(&path) {
            return Err(BerthError::ImageNotFound {
                tag: tag.to_string(),
            });
        }

        let content = self.fs.read(&path)?;
        let metadata: RuntimeImage =
            toml::from_str(&content).map_err(|e| BerthError::store(&path, e))?;
        if metadata.version != IMAGE_FORMAT_VERSION {
            return Err(BerthError::store(
                &path,
                format!(
                    "unsupported image format version {} (expected {})",
                    metadata.version, IMAGE_FORMAT_VERSION
                ),
            ));
        }

        Ok(StoredImage {
            metadata,
            rootfs: dir.join("rootfs"),
        })
    }

    /// Replace the tag's image with `staged`. The previous image is moved
    /// aside first and moved back if the new one cannot take its place.
    fn swap_into_place(&self, tag: &str, staged: &Path) -> BerthResult<()> {
        let target = self.image_dir(tag);
        let graveyard = self.tmp_dir("old-")?;
        let previous = graveyard.path().join("image");
        let had_previous = target.exists();
        if had_previous {
            fs::rename(&target, &previous).map_err(|e| BerthError::store(&target, e))?;
        }
        if let Err(e) = fs::rename(staged, &target) {
            if had_previous {
                if let Err(restore) = fs::rename(&previous, &target) {
                    tracing::error!(
                        %tag,
                        error = %restore,
                        "could not restore previous image"
                    );
                }
            }
            return Err(BerthError::store(&target, e));
        }
        Ok(())
    }
}

impl ImageStore for FsImageStore {
    fn publish(&self, image: &RuntimeImage, rootfs: &Path) -> BerthResult<StoredImage> {
        let tag = ImageTag::parse(&image.tag)?;
        self.fs.create_dir_all(&self.images_root())?;

        let lock_path = self.lock_path(tag.as_str());
        let lock_file =
            fs::File::create(&lock_path).map_err(|e| BerthError::store(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| BerthError::store(&lock_path, e))?;

        let result = (|| {
            let staged = self.tmp_dir("image-")?;
            self.fs
                .copy_tree(rootfs, &staged.path().join("rootfs"), &skip_none)?;
            self.fs.write(
                &staged.path().join(METADATA_FILE),
                &toml::to_string_pretty(image)?,
            )?;
            self.swap_into_place(tag.as_str(), staged.path())?;
            self.load_dir(tag.as_str())
        })();

        if let Err(e) = lock_file.unlock() {
            tracing::warn!(
                lock = %lock_path.display(),
                error = %e,
                "could not release image lock"
            );
        }
        if result.is_ok() {
            tracing::info!(%tag, digest = image.digest.short(), "published image");
        }
        result
    }

    fn load(&self, tag: &ImageTag) -> BerthResult<StoredImage> {
        self.load_dir(tag.as_str())
    }

    fn list(&self) -> BerthResult<Vec<StoredImage>> {
        let entries = match fs::read_dir(self.images_root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BerthError::store(self.images_root(), e)),
        };

        let mut images = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let tag = entry.file_name().to_string_lossy().into_owned();
            match self.load_dir(&tag) {
                Ok(image) => images.push(image),
                Err(e) => tracing::warn!(%tag, error = %e, "skipping unreadable image"),
            }
        }
        images.sort_by(|a, b| a.metadata.tag.cmp(&b.metadata.tag));
        Ok(images)
    }
}
