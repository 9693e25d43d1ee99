//! Property tests for the location algebra
//!
//! The generators build arbitrary location trees over the grammar; the
//! properties check the laws the rest of the crate leans on: display/parse
//! round-trips, shift inversion, map monotonicity, and join concatenation.

use proptest::prelude::*;

use gts::seq::{Location, RecordInfo};
use gts::Sequence;

/// Leaf locations with spans of at least two bases, within a 1000-base
/// coordinate space.
fn arb_leaf() -> impl Strategy<Value = Location> {
    prop_oneof![
        (0usize..1000).prop_map(Location::Point),
        (0usize..500, 2usize..500, any::<bool>(), any::<bool>()).prop_map(
            |(start, len, partial5, partial3)| Location::Range {
                start,
                end: start + len,
                partial5,
                partial3,
            }
        ),
        (0usize..500, 2usize..500).prop_map(|(start, len)| Location::Ambiguous {
            start,
            end: start + len,
        }),
        (0usize..500, 2usize..500).prop_map(|(start, len)| Location::Between {
            start,
            end: start + len,
        }),
    ]
}

/// Arbitrary location trees: leaves wrapped in complement/join/order up to
/// three levels deep.
fn arb_location() -> impl Strategy<Value = Location> {
    arb_leaf().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|loc| Location::Complement(Box::new(loc))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Location::Join),
            prop::collection::vec(inner, 1..4).prop_map(Location::Order),
        ]
    })
}

proptest! {
    /// Display then parse restores the exact location.
    #[test]
    fn prop_display_parse_round_trip(loc in arb_location()) {
        let shown = loc.to_string();
        let parsed: Location = shown.parse().expect("display output must parse");
        prop_assert_eq!(parsed, loc);
    }

    /// A successful insertion shift is undone by the matching deletion.
    #[test]
    fn prop_shift_inverse(loc in arb_location(), offset in 0usize..1200, amount in 1isize..100) {
        let original = loc.clone();
        let mut loc = loc;
        prop_assert!(loc.shift(offset, amount), "insertions never invalidate");
        prop_assert!(loc.shift(offset, -amount), "undoing an insertion must succeed");
        prop_assert_eq!(loc, original);
    }

    /// Shifting by zero never changes a location.
    #[test]
    fn prop_shift_zero_is_identity(loc in arb_location(), offset in 0usize..1200) {
        let original = loc.clone();
        let mut loc = loc;
        prop_assert!(loc.shift(offset, 0));
        prop_assert_eq!(loc, original);
    }

    /// Map is strictly increasing over leaf locations.
    #[test]
    fn prop_map_monotonic_on_leaves(loc in arb_leaf()) {
        for i in 1..loc.len() {
            prop_assert!(loc.map(i - 1) < loc.map(i));
        }
    }

    /// Locating a join yields the concatenation of locating its parts.
    #[test]
    fn prop_join_concatenates(a in arb_leaf(), b in arb_leaf()) {
        let bytes: Vec<u8> = (0..1000u32).map(|i| b"acgt"[(i % 4) as usize]).collect();
        let seq = Sequence::new(RecordInfo::default(), bytes);

        let mut expected = a.locate(&seq).bytes().to_vec();
        expected.extend_from_slice(b.locate(&seq).bytes());

        let joined = Location::Join(vec![a.clone(), b.clone()]);
        let joined_located = joined.locate(&seq);
        prop_assert_eq!(joined_located.bytes(), &expected[..]);

        let ordered = Location::Order(vec![a, b]);
        let ordered_located = ordered.locate(&seq);
        prop_assert_eq!(ordered_located.bytes(), &expected[..]);
    }

    /// Length is invariant under complement wrapping and equals the sum of
    /// the parts under join.
    #[test]
    fn prop_len_laws(a in arb_leaf(), b in arb_leaf()) {
        let complement = Location::Complement(Box::new(a.clone()));
        prop_assert_eq!(complement.len(), a.len());
        let join = Location::Join(vec![a.clone(), b.clone()]);
        prop_assert_eq!(join.len(), a.len() + b.len());
    }
}

#[test]
fn test_spec_examples() {
    let loc: Location = "join(complement(5..10),order(20..25,30..35))"
        .parse()
        .unwrap();
    assert_eq!(loc.to_string(), "join(complement(5..10),order(20..25,30..35))");
    assert_eq!(loc.map(0), 4);
    assert_eq!(loc.len(), 18);
}
