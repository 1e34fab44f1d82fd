//! Image store port

use std::path::{Path, PathBuf};

use crate::domain::entities::RuntimeImage;
use crate::domain::value_objects::ImageTag;
use crate::error::BerthResult;

/// A tagged image as stored: metadata plus the rootfs location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub metadata: RuntimeImage,
    pub rootfs: PathBuf,
}

pub trait ImageStore {
    /// Publish `rootfs` under the image's tag, replacing any previous image.
    /// The tag only becomes visible once everything is in place.
    fn publish(&self, image: &RuntimeImage, rootfs: &Path) -> BerthResult<StoredImage>;

    /// `ImageNotFound` when the tag has no image.
    fn load(&self, tag: &ImageTag) -> BerthResult<StoredImage>;

    /// All images, sorted by tag.
    fn list(&self) -> BerthResult<Vec<StoredImage>>;
}
