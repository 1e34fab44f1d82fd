//! Domain Services
//!
//! Pure business logic over domain entities. Anything touching disk goes
//! through a port.

mod launch;
mod placement;
mod resolver;

pub use launch::{
    compose_env, map_into_rootfs, resolve_target, target_candidates, ROOTFS_VAR,
};
pub use placement::{
    check_source, destination, is_reserved, normalize_source, ContextFilter, IGNORE_FILE,
};
pub use resolver::{Resolver, MAX_ATTEMPTS};

#[cfg(test)]
pub(crate) use resolver::fake::FakeIndex;
