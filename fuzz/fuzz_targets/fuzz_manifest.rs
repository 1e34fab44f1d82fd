#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Manifest parsing must never panic; a parsed manifest must render
        if let Ok(manifest) =
            berth::domain::entities::BuildManifest::parse(content, Path::new("requirements.txt"))
        {
            let _ = manifest.canonical();
        }
    }
});
