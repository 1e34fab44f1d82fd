//! Use Case Factory
//!
//! Creates use cases with infrastructure dependencies wired up.
//! This is the dependency injection point for the application.

use std::io;
use std::sync::Arc;

use is_terminal::IsTerminal;

use crate::application::{BuildUseCase, CacheUseCase, RunUseCase};
use crate::config::Settings;
use crate::domain::ports::EventSink;
use crate::infrastructure::{
    ConsoleEventSink, DirectoryBaseProvider, DirectoryPackageIndex, FsImageStore, FsStageCache,
    IndexInstaller, JsonEventSink, LocalFs, LocalProcessRunner,
};

/// Type alias for the concrete BuildUseCase with all dependencies
pub type ConcreteBuildUseCase = BuildUseCase<
    DirectoryBaseProvider,
    IndexInstaller<DirectoryPackageIndex>,
    FsStageCache,
    FsImageStore,
    LocalFs,
>;

/// Type alias for the concrete RunUseCase with all dependencies
pub type ConcreteRunUseCase = RunUseCase<FsImageStore, LocalProcessRunner, LocalFs>;

/// Type alias for the concrete CacheUseCase with all dependencies
pub type ConcreteCacheUseCase = CacheUseCase<FsStageCache, FsImageStore>;

pub fn create_build_use_case(settings: &Settings) -> ConcreteBuildUseCase {
    BuildUseCase::new(
        DirectoryBaseProvider::new(&settings.bases),
        IndexInstaller::new(DirectoryPackageIndex::new(&settings.index)),
        FsStageCache::new(&settings.store),
        FsImageStore::new(&settings.store),
        LocalFs::new(),
    )
}

pub fn create_run_use_case(settings: &Settings) -> ConcreteRunUseCase {
    RunUseCase::new(
        FsImageStore::new(&settings.store),
        LocalProcessRunner::new(),
        LocalFs::new(),
    )
}

pub fn create_cache_use_case(settings: &Settings) -> ConcreteCacheUseCase {
    CacheUseCase::new(
        FsStageCache::new(&settings.store),
        FsImageStore::new(&settings.store),
    )
}

pub fn create_image_store(settings: &Settings) -> FsImageStore {
    FsImageStore::new(&settings.store)
}

/// Where progress events go for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    /// NDJSON on stdout (build)
    JsonStdout,
    /// NDJSON on stderr (run: stdout belongs to the child)
    JsonStderr,
    /// Human-readable lines on stderr
    Console,
}

/// Create the event sink for a command.
pub fn create_event_sink(target: EventTarget, settings: &Settings, verbose: u8) -> Arc<dyn EventSink> {
    match target {
        EventTarget::JsonStdout => Arc::new(JsonEventSink::stdout()),
        EventTarget::JsonStderr => Arc::new(JsonEventSink::stderr()),
        EventTarget::Console => {
            let decorated = settings.color.decorate(io::stderr().is_terminal());
            Arc::new(ConsoleEventSink::with_writer(
                io::stderr(),
                decorated,
                verbose > 0,
            ))
        }
    }
}
