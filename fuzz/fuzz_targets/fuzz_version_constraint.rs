#![no_main]

use libfuzzer_sys::fuzz_target;

use berth::domain::value_objects::{Version, VersionReq};

fuzz_target!(|data: (&str, &str)| {
    let (req, version) = data;
    if let (Ok(req), Ok(version)) = (req.parse::<VersionReq>(), version.parse::<Version>()) {
        let _ = req.matches(&version);
        // Rendering must parse back to the same requirement
        let again: VersionReq = req.to_string().parse().expect("rendered requirement parses");
        assert_eq!(again, req);
    }
});
