#![no_main]

use std::path::{Component, Path};

use berth::domain::value_objects::BaseVersion;
use berth::infrastructure::repositories::parse_descriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let version = BaseVersion::parse("3.11").expect("valid version");
    let Ok(layout) = parse_descriptor(&version, Path::new("base.toml"), content) else {
        return;
    };

    // Whatever the input, an accepted layout stays inside the rootfs and
    // keeps an absolute search path.
    assert!(!layout.site_packages.as_os_str().is_empty());
    assert!(layout
        .site_packages
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir)));
    assert!(layout.path.iter().all(|entry| entry.starts_with('/')));
});
