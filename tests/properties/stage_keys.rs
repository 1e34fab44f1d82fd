//! Property tests for chained stage keys.

use proptest::prelude::*;

use berth::domain::value_objects::{Stage, StageKey};

fn inputs() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[ -~]{0,12}", 0..4)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: equal inputs and parent always give the same key.
    #[test]
    fn property_keys_are_deterministic(base in inputs(), deps in inputs()) {
        let a = StageKey::derive(&StageKey::root(Stage::Base, &base), Stage::Dependencies, &deps);
        let b = StageKey::derive(&StageKey::root(Stage::Base, &base), Stage::Dependencies, &deps);
        prop_assert_eq!(a, b);
    }

    /// PROPERTY: a different parent changes every descendant key.
    #[test]
    fn property_parent_change_invalidates_children(
        base in inputs(),
        other in inputs(),
        deps in inputs(),
    ) {
        prop_assume!(base != other);
        let a = StageKey::derive(&StageKey::root(Stage::Base, &base), Stage::Dependencies, &deps);
        let b = StageKey::derive(&StageKey::root(Stage::Base, &other), Stage::Dependencies, &deps);
        prop_assert_ne!(a.key(), b.key());
    }
}
