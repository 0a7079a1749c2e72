//! Property tests for conditional value merging

use proptest::prelude::*;
use trellis_package::{ConditionalValue, Identity, IdentitySet};

fn flag() -> impl Strategy<Value = String> {
    "-[A-Za-z]{1,6}"
}

fn conditional_value() -> impl Strategy<Value = ConditionalValue> {
    (
        prop::collection::vec(flag(), 0..4),
        prop::collection::vec(("[A-F]", prop::collection::vec(flag(), 0..3)), 0..5),
    )
        .prop_map(|(base, fragments)| {
            let mut value = ConditionalValue::new(base);
            for (identity, values) in fragments {
                value.push_fragment(Identity::new(identity), values);
            }
            value
        })
}

proptest! {
    #[test]
    fn empty_identity_set_yields_base(value in conditional_value()) {
        prop_assert_eq!(value.resolve(&IdentitySet::new()), value.base.clone());
    }

    #[test]
    fn single_identity_appends_its_fragment(value in conditional_value(), id in "[A-F]") {
        let identity = Identity::new(id);
        let active: IdentitySet = [identity.clone()].into_iter().collect();

        let mut expected = value.base.clone();
        if let Some((_, fragment)) = value.fragments.iter().find(|(i, _)| *i == identity) {
            expected.extend(fragment.iter().cloned());
        }
        prop_assert_eq!(value.resolve(&active), expected);
    }

    #[test]
    fn growing_identity_set_only_appends(
        value in conditional_value(),
        ids in prop::collection::btree_set("[A-F]", 0..6),
        extra in "[A-F]",
    ) {
        let smaller: IdentitySet = ids.iter().map(|s| Identity::new(s.as_str())).collect();
        let mut larger = smaller.clone();
        larger.insert(Identity::new(extra));

        let small = value.resolve(&smaller);
        let large = value.resolve(&larger);
        prop_assert!(large.len() >= small.len());
        for item in &small {
            prop_assert!(large.contains(item));
        }
    }
}
