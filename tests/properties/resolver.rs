//! Property tests for dependency resolution over a directory index.

use std::fs;
use std::path::Path;

use proptest::prelude::*;

use berth::domain::entities::BuildManifest;
use berth::domain::services::Resolver;
use berth::domain::value_objects::Version;
use berth::infrastructure::DirectoryPackageIndex;

const PACKAGES: &[&str] = &["alpha", "beta", "gamma", "delta"];

/// Index where every package has versions 1.0..=4.0 and each `beta`
/// release requires some `gamma`.
fn write_index(root: &Path) {
    for name in PACKAGES {
        for major in 1..=4 {
            let dir = root.join(name).join(format!("{major}.0"));
            fs::create_dir_all(dir.join("files").join(name)).unwrap();
            if *name == "beta" {
                fs::write(dir.join("requires.txt"), format!("gamma>={major}.0\n")).unwrap();
            }
        }
    }
}

fn requirement() -> impl Strategy<Value = String> {
    (
        prop::sample::select(PACKAGES),
        prop_oneof![Just(">="), Just("<="), Just("==")],
        1u64..=4,
    )
        .prop_map(|(name, op, major)| format!("{name}{op}{major}.0"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: resolution depends on the set of requirements, not their order.
    #[test]
    fn property_resolution_is_order_independent(
        mut lines in proptest::collection::vec(requirement(), 1..6)
    ) {
        let index_dir = tempfile::tempdir().unwrap();
        write_index(index_dir.path());
        let index = DirectoryPackageIndex::new(index_dir.path());
        let resolver = Resolver::new(&index);

        let forward = BuildManifest::parse(&lines.join("\n"), Path::new("m")).unwrap();
        lines.reverse();
        let backward = BuildManifest::parse(&lines.join("\n"), Path::new("m")).unwrap();

        let a = resolver.resolve(&forward).map(|s| s.to_map()).map_err(|e| e.kind());
        let b = resolver.resolve(&backward).map(|s| s.to_map()).map_err(|e| e.kind());
        prop_assert_eq!(a, b);
    }

    /// PROPERTY: every selected version satisfies every root constraint on its name.
    #[test]
    fn property_selection_satisfies_root_constraints(
        lines in proptest::collection::vec(requirement(), 1..6)
    ) {
        let index_dir = tempfile::tempdir().unwrap();
        write_index(index_dir.path());
        let index = DirectoryPackageIndex::new(index_dir.path());

        let manifest = BuildManifest::parse(&lines.join("\n"), Path::new("m")).unwrap();
        if let Ok(installed) = Resolver::new(&index).resolve(&manifest) {
            for (name, req) in manifest.merged() {
                let version: &Version = installed.get(&name).unwrap();
                prop_assert!(req.matches(version), "{} {} violates {}", name, version, req);
            }
        }
    }
}
