//! Build Use Case
//!
//! Runs the four stages strictly in order:
//! 1. Base - copy the resolved base runtime into a snapshot
//! 2. Dependencies - install the resolved manifest into the base snapshot
//! 3. Artifact - place the entrypoint sources under the workdir
//! 4. Launch - embed the launch directive (metadata only)
//!
//! Every snapshot-producing stage is looked up in the stage cache by a key
//! chained to its parent's key. The image is published only when every stage
//! succeeded; completed stages stay cached after a failure.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{
    BuildManifest, ImageStages, InstalledSet, Recipe, RuntimeImage, IMAGE_FORMAT_VERSION,
    INSTALLED_FILE,
};
use crate::domain::ports::{
    skip_none, BaseRuntime, BaseRuntimeProvider, BuildEvent, DependencyInstaller, EventSink,
    FileSystem, ImageStore, NoopEventSink, Snapshot, StageCache, Staging,
};
use crate::domain::services::{
    check_source, destination, map_into_rootfs, normalize_source, resolve_target, ContextFilter,
    IGNORE_FILE,
};
use crate::domain::value_objects::{ImageTag, Stage, StageKey};
use crate::error::{BerthError, BerthResult};

use super::options::BuildOptions;
use super::result::{BuildFailure, BuildResult, StageOutcome};

/// Build use case - orchestrates the staged pipeline
///
/// Parameterized by its ports so tests can swap in fakes.
pub struct BuildUseCase<BP, DI, SC, IS, FS>
where
    BP: BaseRuntimeProvider,
    DI: DependencyInstaller,
    SC: StageCache,
    IS: ImageStore,
    FS: FileSystem,
{
    bases: BP,
    installer: DI,
    cache: SC,
    images: IS,
    fs: FS,
}

/// A stage snapshot plus whether it came from the cache.
struct Materialized {
    snapshot: Snapshot,
    cached: bool,
    detail: Option<String>,
}

impl Materialized {
    fn outcome(&self) -> StageOutcome {
        StageOutcome {
            stage: self.snapshot.key.stage(),
            key: self.snapshot.key.key().clone(),
            cached: self.cached,
            detail: self.detail.clone(),
        }
    }
}

impl<BP, DI, SC, IS, FS> BuildUseCase<BP, DI, SC, IS, FS>
where
    BP: BaseRuntimeProvider,
    DI: DependencyInstaller,
    SC: StageCache,
    IS: ImageStore,
    FS: FileSystem,
{
    pub fn new(bases: BP, installer: DI, cache: SC, images: IS, fs: FS) -> Self {
        Self {
            bases,
            installer,
            cache,
            images,
            fs,
        }
    }

    /// Execute the build silently
    pub fn execute(&self, options: &BuildOptions) -> Result<BuildResult, BuildFailure> {
        self.execute_with_events(options, Arc::new(NoopEventSink))
    }

    /// Execute the build, reporting progress to `sink`
    pub fn execute_with_events(
        &self,
        options: &BuildOptions,
        sink: Arc<dyn EventSink>,
    ) -> Result<BuildResult, BuildFailure> {
        let sink = sink.as_ref();
        let context = options.context.as_path();
        let no_cache = options.no_cache;
        let mut warnings = Vec::new();
        let mut outcomes = Vec::new();

        let (recipe, recipe_warnings) =
            Recipe::load(&options.recipe_path()).map_err(BuildFailure::outside_stages)?;
        for warning in recipe_warnings {
            warn(sink, &mut warnings, warning.to_string());
        }

        let tag = match &options.tag {
            Some(tag) => tag.clone(),
            None => tag_for_context(context).map_err(BuildFailure::outside_stages)?,
        };

        let _build = tracing::info_span!("build", tag = %tag).entered();
        tracing::info!(context = %context.display(), "build started");
        sink.on_build(BuildEvent::Started {
            context: context.to_path_buf(),
            tag: tag.to_string(),
        });

        let (base, base_snapshot) = self.stage(Stage::Base, sink, || {
            let base = self.bases.resolve(recipe.base())?;
            let key = StageKey::root(
                Stage::Base,
                [base.version.as_str(), base.digest.as_str()],
            );
            let built = self.materialize(&key, no_cache, sink, |staging| {
                let entries = self.fs.copy_tree(&base.rootfs, &staging.rootfs(), &skip_none)?;
                Ok(Some(format!("{} entries from base {}", entries, base.version)))
            })?;
            outcomes.push(built.outcome());
            Ok((base, built.snapshot))
        })?;

        let (installed, deps_snapshot) = self.stage(Stage::Dependencies, sink, || {
            let manifest = BuildManifest::load(&context.join(recipe.manifest()))?;
            let key = StageKey::derive(
                &base_snapshot.key,
                Stage::Dependencies,
                [manifest.canonical()],
            );

            let mut fresh: Option<InstalledSet> = None;
            let built = self.materialize(&key, no_cache, sink, |staging| {
                let rootfs = staging.rootfs();
                self.fs.copy_tree(&base_snapshot.rootfs, &rootfs, &skip_none)?;
                let installed = self
                    .installer
                    .install(&manifest, &base.site_packages_in(&rootfs))?;
                let detail = format!("{} packages", installed.len());
                fresh = Some(installed);
                Ok(Some(detail))
            })?;

            let installed = match fresh {
                Some(set) => set,
                None => self.read_installed(&base, &built.snapshot.rootfs)?,
            };
            outcomes.push(built.outcome());
            Ok((installed, built.snapshot))
        })?;

        let artifact_snapshot = self.stage(Stage::Artifact, sink, || {
            let filter = self.context_filter(context)?;

            let mut inputs = vec![recipe.workdir().display().to_string()];
            for source in recipe.sources() {
                check_source(source, context)?;
                let path = context.join(source);
                if !self.fs.exists(&path) {
                    return Err(BerthError::ArtifactNotFound {
                        path: source.clone(),
                    });
                }
                let skip = filter.for_source(source);
                inputs.push(normalize_source(source).display().to_string());
                inputs.push(self.fs.tree_digest(&path, &skip)?.to_string());
            }
            let key = StageKey::derive(&deps_snapshot.key, Stage::Artifact, &inputs);

            let built = self.materialize(&key, no_cache, sink, |staging| {
                let rootfs = staging.rootfs();
                self.fs.copy_tree(&deps_snapshot.rootfs, &rootfs, &skip_none)?;
                self.fs
                    .create_dir_all(&map_into_rootfs(&rootfs, recipe.workdir()))?;

                let mut placed = 0;
                for source in recipe.sources() {
                    let skip = filter.for_source(source);
                    placed += self.fs.copy_tree(
                        &context.join(source),
                        &destination(&rootfs, recipe.workdir(), source),
                        &skip,
                    )?;
                }
                Ok(Some(format!(
                    "{} entries placed in {}",
                    placed,
                    recipe.workdir().display()
                )))
            })?;
            outcomes.push(built.outcome());
            Ok(built.snapshot)
        })?;

        let (launch_key, env) = self.stage(Stage::Launch, sink, || {
            let mut env = base.layout.env.clone();
            env.extend(recipe.env().iter().map(|(k, v)| (k.clone(), v.clone())));

            let key = StageKey::derive(
                &artifact_snapshot.key,
                Stage::Launch,
                launch_inputs(recipe.launch().canonical(), &env, &base.layout.path),
            );
            sink.on_build(BuildEvent::StageStarted {
                stage: Stage::Launch,
                key: key.key().clone(),
            });

            if let Err(err) = resolve_target(
                &self.fs,
                &artifact_snapshot.rootfs,
                recipe.launch(),
                &base.layout.path,
            ) {
                warn(sink, &mut warnings, err.to_string());
            }

            let detail = Some(recipe.launch().to_string());
            sink.on_build(BuildEvent::StageCompleted {
                stage: Stage::Launch,
                key: key.key().clone(),
                detail: detail.clone(),
            });
            outcomes.push(StageOutcome {
                stage: Stage::Launch,
                key: key.key().clone(),
                cached: false,
                detail,
            });
            Ok((key, env))
        })?;

        let digest = self
            .fs
            .tree_digest(&artifact_snapshot.rootfs, &skip_none)
            .map_err(|e| BuildFailure::outside_stages(e.into()))?;

        let image = RuntimeImage {
            version: IMAGE_FORMAT_VERSION,
            tag: tag.to_string(),
            digest: digest.clone(),
            built_at: Utc::now(),
            base_version: base.version.to_string(),
            path: base.layout.path.clone(),
            stages: ImageStages {
                base: base_snapshot.key.key().clone(),
                dependencies: deps_snapshot.key.key().clone(),
                artifact: artifact_snapshot.key.key().clone(),
                launch: launch_key.key().clone(),
            },
            launch: recipe.launch().clone(),
            env,
            packages: installed.to_map(),
        };

        let stored = self
            .images
            .publish(&image, &artifact_snapshot.rootfs)
            .map_err(BuildFailure::outside_stages)?;

        tracing::info!(digest = %digest, "image published");
        sink.on_build(BuildEvent::Completed {
            tag: tag.to_string(),
            digest,
        });

        Ok(BuildResult {
            image: stored,
            stages: outcomes,
            installed,
            warnings,
        })
    }

    /// Run one stage body, attributing any error to `stage`.
    fn stage<T>(
        &self,
        stage: Stage,
        sink: &dyn EventSink,
        body: impl FnOnce() -> BerthResult<T>,
    ) -> Result<T, BuildFailure> {
        let _span = tracing::info_span!("stage", stage = %stage).entered();
        body().map_err(|error| {
            tracing::error!(error = %error, "stage failed");
            sink.on_build(BuildEvent::StageFailed {
                stage,
                error: error.to_string(),
            });
            BuildFailure::at(stage, error)
        })
    }

    /// Reuse the cached snapshot for `key`, or build and commit a new one.
    fn materialize(
        &self,
        key: &StageKey,
        no_cache: bool,
        sink: &dyn EventSink,
        build: impl FnOnce(&Staging) -> BerthResult<Option<String>>,
    ) -> BerthResult<Materialized> {
        if no_cache {
            self.cache.remove(key.stage(), key.key())?;
        } else if let Some(snapshot) = self.cache.lookup(key)? {
            tracing::debug!(key = %key, "cache hit");
            sink.on_build(BuildEvent::StageCached {
                stage: key.stage(),
                key: key.key().clone(),
            });
            return Ok(Materialized {
                snapshot,
                cached: true,
                detail: None,
            });
        }

        tracing::debug!(key = %key, "cache miss");
        sink.on_build(BuildEvent::StageStarted {
            stage: key.stage(),
            key: key.key().clone(),
        });

        let staging = self.cache.prepare(key)?;
        let detail = build(&staging)?;
        let snapshot = self.cache.commit(staging)?;

        sink.on_build(BuildEvent::StageCompleted {
            stage: key.stage(),
            key: key.key().clone(),
            detail: detail.clone(),
        });
        Ok(Materialized {
            snapshot,
            cached: false,
            detail,
        })
    }

    /// Exclusion rules for the context; no `.berthignore` leaves only the reserved files.
    fn context_filter(&self, context: &Path) -> BerthResult<ContextFilter> {
        let file = context.join(IGNORE_FILE);
        if !self.fs.exists(&file) {
            return Ok(ContextFilter::reserved_only());
        }
        ContextFilter::parse(context, &self.fs.read(&file)?)
    }

    /// Installed set recorded in a cached dependency snapshot.
    fn read_installed(&self, base: &BaseRuntime, rootfs: &Path) -> BerthResult<InstalledSet> {
        let record = base.site_packages_in(rootfs).join(INSTALLED_FILE);
        let content = self.fs.read(&record)?;
        InstalledSet::from_toml(&content).map_err(|e| BerthError::store(record, e))
    }
}

fn warn(sink: &dyn EventSink, warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{}", message);
    sink.on_build(BuildEvent::Warning {
        message: message.clone(),
    });
    warnings.push(message);
}

/// Launch key inputs. Every env key, env value and PATH entry is its own
/// part, after a count, so no value can spill into its neighbour.
fn launch_inputs(
    launch: String,
    env: &BTreeMap<String, String>,
    path: &[String],
) -> Vec<String> {
    let mut inputs = vec![launch, env.len().to_string()];
    for (key, value) in env {
        inputs.push(key.clone());
        inputs.push(value.clone());
    }
    inputs.push(path.len().to_string());
    inputs.extend(path.iter().cloned());
    inputs
}

/// Default tag: the context directory's name.
fn tag_for_context(context: &Path) -> BerthResult<ImageTag> {
    let absolute = if context.is_absolute() {
        context.to_path_buf()
    } else {
        std::env::current_dir()?.join(context)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    let name = normalized
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ImageTag::from_context_name(&name)
}
