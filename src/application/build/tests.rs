//! Build Use Case Tests
//!
//! Run against the real directory-backed adapters in temp dirs.

use super::*;
use crate::domain::ports::events::recording::RecordingEventSink;
use crate::domain::ports::ImageStore;
use crate::domain::value_objects::{ImageTag, Stage};
use crate::error::BerthError;
use crate::infrastructure::{
    DirectoryBaseProvider, DirectoryPackageIndex, FsImageStore, FsStageCache, IndexInstaller,
    LocalFs,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

type LocalBuild = BuildUseCase<
    DirectoryBaseProvider,
    IndexInstaller<DirectoryPackageIndex>,
    FsStageCache,
    FsImageStore,
    LocalFs,
>;

const RECIPE: &str = r#"
[base]
version = "3.11"

[artifact]
sources = ["bot_main.py"]

[launch]
command = ["python", "bot_main.py"]
"#;

struct Fixture {
    _root: TempDir,
    bases: PathBuf,
    index: PathBuf,
    store: PathBuf,
    context: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempdir().unwrap();
        let fixture = Self {
            bases: root.path().join("bases"),
            index: root.path().join("index"),
            store: root.path().join("store"),
            context: root.path().join("bot"),
            _root: root,
        };

        let bin = fixture.bases.join("3.11/rootfs/usr/bin");
        fs::create_dir_all(&bin).unwrap();
        write_executable(&bin.join("python"), "#!/bin/sh\nexit 0\n");

        fixture.publish("requests", "2.31.0", "idna>=2.5\n");
        fixture.publish("requests", "2.30.0", "");
        fixture.publish("idna", "3.6", "");
        fixture.publish("certifi", "2024.2.2", "");

        fs::create_dir_all(&fixture.context).unwrap();
        fixture.write("berth.toml", RECIPE);
        fixture.write("requirements.txt", "requests==2.31.0\n");
        fixture.write("bot_main.py", "print('hi')\n");
        fixture
    }

    fn publish(&self, name: &str, version: &str, requires: &str) {
        let dir = self.index.join(name).join(version);
        let files = dir.join("files").join(name);
        fs::create_dir_all(&files).unwrap();
        fs::write(files.join("__init__.py"), format!("# {name} {version}\n")).unwrap();
        if !requires.is_empty() {
            fs::write(dir.join("requires.txt"), requires).unwrap();
        }
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.context.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn use_case(&self) -> LocalBuild {
        BuildUseCase::new(
            DirectoryBaseProvider::new(&self.bases),
            IndexInstaller::new(DirectoryPackageIndex::new(&self.index)),
            FsStageCache::new(&self.store),
            FsImageStore::new(&self.store),
            LocalFs::new(),
        )
    }

    fn options(&self) -> BuildOptions {
        BuildOptions::new(&self.context)
    }

    fn build(&self) -> Result<BuildResult, BuildFailure> {
        self.use_case().execute(&self.options())
    }

    fn build_recorded(&self) -> (Result<BuildResult, BuildFailure>, RecordingEventSink) {
        let sink = RecordingEventSink::default();
        let result = self
            .use_case()
            .execute_with_events(&self.options(), Arc::new(sink.clone()));
        (result, sink)
    }

    fn tag_exists(&self, tag: &str) -> bool {
        FsImageStore::new(&self.store)
            .load(&ImageTag::parse(tag).unwrap())
            .is_ok()
    }
}

fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[test]
fn builds_image_with_dependencies_and_entrypoint() {
    let fixture = Fixture::new();
    let result = fixture.build().unwrap();

    assert_eq!(result.tag(), "bot");
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(
        result.image.metadata.packages.get("requests").map(String::as_str),
        Some("2.31.0")
    );
    assert_eq!(
        result.image.metadata.packages.get("idna").map(String::as_str),
        Some("3.6")
    );
    assert!(!result.image.metadata.packages.contains_key("certifi"));

    let rootfs = &result.image.rootfs;
    assert!(rootfs.join("app/bot_main.py").is_file());
    assert!(rootfs.join("usr/local/lib/site-packages/requests/__init__.py").is_file());
    assert!(rootfs.join("usr/bin/python").is_file());
    assert!(!rootfs.join("app/berth.toml").exists());

    let stages: Vec<Stage> = result.stages.iter().map(|o| o.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(result.stages.iter().all(|o| !o.cached));
}

#[test]
fn identical_inputs_give_identical_images() {
    let fixture = Fixture::new();
    let first = fixture.build().unwrap();
    let second = fixture.build().unwrap();

    assert_eq!(first.digest(), second.digest());
    assert_eq!(first.installed, second.installed);
    assert_eq!(first.image.metadata.stages, second.image.metadata.stages);
    assert!(second.was_cached(Stage::Base));
    assert!(second.was_cached(Stage::Dependencies));
    assert!(second.was_cached(Stage::Artifact));
}

#[test]
fn no_cache_rebuilds_to_the_same_digest() {
    let fixture = Fixture::new();
    let first = fixture.build().unwrap();
    let second = fixture
        .use_case()
        .execute(&fixture.options().with_no_cache(true))
        .unwrap();

    assert!(second.stages.iter().all(|o| !o.cached));
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn changing_entrypoint_keeps_dependencies_cached() {
    let fixture = Fixture::new();
    let first = fixture.build().unwrap();

    fixture.write("bot_main.py", "print('changed')\n");
    let (second, sink) = fixture.build_recorded();
    let second = second.unwrap();

    assert_eq!(sink.cached_stages(), [Stage::Base, Stage::Dependencies]);
    assert_eq!(sink.executed_stages(), [Stage::Artifact, Stage::Launch]);
    assert_eq!(
        first.image.metadata.stages.dependencies,
        second.image.metadata.stages.dependencies
    );
    assert_ne!(
        first.image.metadata.stages.artifact,
        second.image.metadata.stages.artifact
    );
    assert_eq!(first.installed, second.installed);
}

#[test]
fn permuted_manifest_reuses_dependency_stage() {
    let fixture = Fixture::new();
    fixture.write("requirements.txt", "requests==2.31.0\ncertifi\n");
    let first = fixture.build().unwrap();

    fixture.write("requirements.txt", "# reordered\ncertifi\n\nrequests==2.31.0\n");
    let (second, sink) = fixture.build_recorded();
    let second = second.unwrap();

    assert!(sink.cached_stages().contains(&Stage::Dependencies));
    assert_eq!(first.installed, second.installed);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn nonexistent_dependency_fails_without_image() {
    let fixture = Fixture::new();
    fixture.write("requirements.txt", "nonexistent-pkg-xyz==1.0\n");

    let (result, sink) = fixture.build_recorded();
    let failure = result.unwrap_err();

    assert_eq!(failure.stage, Some(Stage::Dependencies));
    assert!(matches!(
        failure.error,
        BerthError::DependencyResolution { ref entry, .. } if entry.contains("nonexistent-pkg-xyz")
    ));
    assert!(failure.to_string().contains("nonexistent-pkg-xyz"));
    assert!(!fixture.tag_exists("bot"));
    assert!(sink.executed_stages().contains(&Stage::Dependencies));
    assert!(!sink.executed_stages().contains(&Stage::Artifact));
}

#[test]
fn malformed_manifest_reports_line() {
    let fixture = Fixture::new();
    fixture.write("requirements.txt", "requests==2.31.0\n-r other.txt\n");

    let failure = fixture.build().unwrap_err();
    assert_eq!(failure.stage, Some(Stage::Dependencies));
    assert!(matches!(failure.error, BerthError::ManifestParse { line: 2, .. }));
}

#[test]
fn missing_entrypoint_fails_before_launch_and_keeps_dependency_cache() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.context.join("bot_main.py")).unwrap();

    let (result, sink) = fixture.build_recorded();
    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Some(Stage::Artifact));
    assert!(matches!(failure.error, BerthError::ArtifactNotFound { .. }));
    assert!(!sink.executed_stages().contains(&Stage::Launch));
    assert!(!fixture.tag_exists("bot"));

    fixture.write("bot_main.py", "print('back')\n");
    let (retry, sink) = fixture.build_recorded();
    retry.unwrap();
    assert_eq!(sink.cached_stages(), [Stage::Base, Stage::Dependencies]);
}

#[test]
fn escaping_source_is_rejected() {
    let fixture = Fixture::new();
    fixture.write(
        "berth.toml",
        &RECIPE.replace("[\"bot_main.py\"]", "[\"../outside.py\"]"),
    );

    let failure = fixture.build().unwrap_err();
    assert_eq!(failure.stage, Some(Stage::Artifact));
    assert!(matches!(failure.error, BerthError::ArtifactOutsideContext { .. }));
}

#[test]
fn unknown_base_fails_in_base_stage() {
    let fixture = Fixture::new();
    fixture.write("berth.toml", &RECIPE.replace("3.11", "2.7"));

    let failure = fixture.build().unwrap_err();
    assert_eq!(failure.stage, Some(Stage::Base));
    assert!(matches!(failure.error, BerthError::BaseNotFound { .. }));
}

#[test]
fn missing_recipe_fails_outside_stages() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.context.join("berth.toml")).unwrap();

    let failure = fixture.build().unwrap_err();
    assert_eq!(failure.stage, None);
    assert!(matches!(failure.error, BerthError::RecipeInvalid { .. }));
}

#[cfg(unix)]
#[test]
fn unresolvable_launch_target_is_only_a_warning() {
    let fixture = Fixture::new();
    fixture.write(
        "berth.toml",
        &RECIPE.replace("[\"python\", \"bot_main.py\"]", "[\"ruby\", \"bot_main.py\"]"),
    );

    let result = fixture.build().unwrap();
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("ruby"));
}

#[test]
fn unknown_recipe_keys_become_warnings() {
    let fixture = Fixture::new();
    fixture.write("berth.toml", &format!("{RECIPE}\n[lunch]\nfoo = 1\n"));

    let (result, sink) = fixture.build_recorded();
    let result = result.unwrap();
    assert!(result.warnings.iter().any(|w| w.contains("lunch")));
    assert!(sink
        .build_events()
        .iter()
        .any(|e| matches!(e, crate::domain::ports::BuildEvent::Warning { .. })));
}

#[test]
fn directory_sources_honor_berthignore() {
    let fixture = Fixture::new();
    fixture.write(
        "berth.toml",
        &RECIPE.replace("[\"bot_main.py\"]", "[\"bot_main.py\", \"handlers\"]"),
    );
    fixture.write("handlers/chat.py", "def chat(): pass\n");
    fixture.write("handlers/__pycache__/chat.pyc", "bytecode");
    fixture.write(".berthignore", "__pycache__/\n");

    let result = fixture.build().unwrap();
    let app = result.image.rootfs.join("app");
    assert!(app.join("handlers/chat.py").is_file());
    assert!(!app.join("handlers/__pycache__").exists());
}

#[test]
fn ignored_files_do_not_change_artifact_key() {
    let fixture = Fixture::new();
    fixture.write(
        "berth.toml",
        &RECIPE.replace("[\"bot_main.py\"]", "[\"bot_main.py\", \"handlers\"]"),
    );
    fixture.write("handlers/chat.py", "def chat(): pass\n");
    fixture.write(".berthignore", "*.log\n");
    let first = fixture.build().unwrap();

    fixture.write("handlers/debug.log", "noise");
    let second = fixture.build().unwrap();
    assert!(second.was_cached(Stage::Artifact));
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn whole_context_source_never_places_recipe_or_ignore_file() {
    let fixture = Fixture::new();
    fixture.write("berth.toml", &RECIPE.replace("[\"bot_main.py\"]", "[\".\"]"));
    fixture.write(".berthignore", "!berth.toml\n!.berthignore\n");

    let result = fixture.build().unwrap();
    let app = result.image.rootfs.join("app");
    assert!(app.join("bot_main.py").is_file());
    assert!(!app.join("berth.toml").exists());
    assert!(!app.join(".berthignore").exists());
}

#[test]
fn malformed_berthignore_fails_the_artifact_stage() {
    let fixture = Fixture::new();
    fixture.write(".berthignore", "*.log\n[z-a]\n");

    let failure = fixture.build().unwrap_err();
    assert_eq!(failure.stage, Some(Stage::Artifact));
    match failure.error {
        BerthError::RecipeInvalid { file, message } => {
            assert!(file.ends_with(".berthignore"));
            assert!(message.starts_with("line 2:"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn explicit_tag_and_recipe_env_land_in_metadata() {
    let fixture = Fixture::new();
    fixture.write(
        "berth.toml",
        &format!("{RECIPE}\n[env]\nPYTHONUNBUFFERED = \"1\"\n"),
    );

    let options = fixture
        .options()
        .with_tag(ImageTag::parse("chatbot").unwrap());
    let result = fixture.use_case().execute(&options).unwrap();

    assert_eq!(result.tag(), "chatbot");
    assert_eq!(
        result.image.metadata.env.get("PYTHONUNBUFFERED").map(String::as_str),
        Some("1")
    );
    assert_eq!(result.image.metadata.launch.argv(), ["python", "bot_main.py"]);
    assert!(fixture.tag_exists("chatbot"));
}
