//! Property tests for manifest and version parsing.

use std::path::Path;

use proptest::prelude::*;

use berth::domain::entities::BuildManifest;
use berth::domain::value_objects::{Version, VersionReq};

fn package_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,6}([-_.][a-z0-9]{1,4})?").unwrap()
}

fn version_string() -> impl Strategy<Value = String> {
    proptest::collection::vec(0u64..40, 1..=3).prop_map(|segments| {
        segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

fn constraint() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just("=="),
            Just(">="),
            Just("<="),
            Just(">"),
            Just("<"),
            Just("!="),
            Just("~=")
        ],
        version_string(),
    )
        .prop_map(|(op, v)| {
            // `~=` needs at least two segments
            if op == "~=" && !v.contains('.') {
                format!("{op}{v}.0")
            } else {
                format!("{op}{v}")
            }
        })
}

fn declaration() -> impl Strategy<Value = String> {
    (package_name(), proptest::option::of(constraint()))
        .prop_map(|(name, c)| format!("{}{}", name, c.unwrap_or_default()))
}

fn manifest_lines() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(declaration(), 0..8)
}

fn parse(content: &str) -> BuildManifest {
    BuildManifest::parse(content, Path::new("requirements.txt")).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: manifest parsing never panics, whatever the input.
    #[test]
    fn property_manifest_parse_never_panics(content in "\\PC*") {
        let _ = BuildManifest::parse(&content, Path::new("requirements.txt"));
    }

    /// PROPERTY: the canonical form ignores line order, comments and blank lines.
    #[test]
    fn property_canonical_form_is_order_independent(
        lines in manifest_lines(),
        seed in any::<u64>(),
    ) {
        let forward = parse(&lines.join("\n"));

        let mut shuffled = lines.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
        }
        let noisy = format!("# pinned\n\n{}\n\n", shuffled.join("\n  # note\n"));
        let backward = parse(&noisy);

        prop_assert_eq!(forward.canonical(), backward.canonical());
    }

    /// PROPERTY: a version survives display and re-parse.
    #[test]
    fn property_version_display_reparses(raw in version_string()) {
        let version: Version = raw.parse().unwrap();
        let again: Version = version.to_string().parse().unwrap();
        prop_assert_eq!(version, again);
    }

    /// PROPERTY: `==v` matches exactly the versions equal to v.
    #[test]
    fn property_exact_pin_matches_only_itself(a in version_string(), b in version_string()) {
        let req: VersionReq = format!("=={a}").parse().unwrap();
        let va: Version = a.parse().unwrap();
        let vb: Version = b.parse().unwrap();
        prop_assert!(req.matches(&va));
        prop_assert_eq!(req.matches(&vb), va == vb);
    }
}
