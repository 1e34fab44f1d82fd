//! Cache Use Case
//!
//! Lists stage cache entries and prunes the ones no tagged image was built
//! from. Images own a copy of their rootfs, so pruning never breaks `run`;
//! it only costs a rebuild of the pruned stages.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::ports::{CacheEntry, ImageStore, StageCache};
use crate::domain::value_objects::{ContentHash, Stage};
use crate::error::BerthResult;

/// One cache entry and the tags whose build used it.
#[derive(Debug, Clone)]
pub struct CacheListing {
    pub entry: CacheEntry,
    pub referenced_by: Vec<String>,
}

impl CacheListing {
    pub fn is_referenced(&self) -> bool {
        !self.referenced_by.is_empty()
    }
}

/// Result of `cache prune`
#[derive(Debug, Clone, Default)]
pub struct PruneResult {
    /// Entries removed (or that would be removed on a dry run)
    pub removed: Vec<CacheEntry>,
    /// Entries still referenced by an image
    pub kept: usize,
    pub dry_run: bool,
}

pub struct CacheUseCase<SC: StageCache, IS: ImageStore> {
    cache: SC,
    images: IS,
}

impl<SC: StageCache, IS: ImageStore> CacheUseCase<SC, IS> {
    pub fn new(cache: SC, images: IS) -> Self {
        Self { cache, images }
    }

    /// All entries, sorted by stage then key.
    pub fn list(&self) -> BerthResult<Vec<CacheListing>> {
        let references = self.references()?;
        let listings = self
            .cache
            .entries()?
            .into_iter()
            .map(|entry| {
                let referenced_by = references
                    .get(&(entry.key.stage(), entry.key.key().clone()))
                    .map(|tags| tags.iter().cloned().collect())
                    .unwrap_or_default();
                CacheListing {
                    entry,
                    referenced_by,
                }
            })
            .collect();
        Ok(listings)
    }

    /// Remove every entry no tagged image references.
    pub fn prune(&self, dry_run: bool) -> BerthResult<PruneResult> {
        let mut result = PruneResult {
            dry_run,
            ..PruneResult::default()
        };

        for listing in self.list()? {
            if listing.is_referenced() {
                result.kept += 1;
                continue;
            }
            if !dry_run {
                let key = &listing.entry.key;
                self.cache.remove(key.stage(), key.key())?;
                tracing::info!(entry = %key, "pruned stage cache entry");
            }
            result.removed.push(listing.entry);
        }
        Ok(result)
    }

    fn references(&self) -> BerthResult<BTreeMap<(Stage, ContentHash), BTreeSet<String>>> {
        let mut references: BTreeMap<(Stage, ContentHash), BTreeSet<String>> = BTreeMap::new();
        for image in self.images.list()? {
            for stage in Stage::ALL.into_iter().filter(Stage::produces_snapshot) {
                references
                    .entry((stage, image.metadata.stages.get(stage).clone()))
                    .or_default()
                    .insert(image.metadata.tag.clone());
            }
        }
        Ok(references)
    }
}
