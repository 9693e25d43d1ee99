//! Integration tests for the sequence-edit engine and the feature table
//!
//! Scenario-level coverage: the feature-table ordering discipline, edits
//! propagating through feature locations, and the involution laws, exercised
//! through the public API and the golden fixture.

use gts::io::genbank::{format_record, parse_record};
use gts::operations;
use gts::seq::{Feature, FeatureTable, Qualifiers, RecordInfo, Selector, Topology};
use gts::Sequence;

const GOLDEN: &str = include_str!("data/ptest01.gb");

fn feature(key: &str, location: &str) -> Feature {
    Feature::new(key, location.parse().unwrap(), Qualifiers::new())
}

fn plain(bytes: &[u8]) -> Sequence {
    Sequence::new(RecordInfo::default(), bytes.to_vec())
}

#[test]
fn test_feature_table_add_order() {
    // Features arrive out of order; the table puts the source feature first
    // and sorts the rest by position.
    let mut table = FeatureTable::new();
    table.add(feature("gene", "100..200"));
    table.add(feature("source", "1..500"));
    table.add(feature("CDS", "50..150"));
    table.add(feature("misc_feature", "complement(75..125)"));

    let summary: Vec<(String, String)> = table
        .iter()
        .map(|f| (f.key.clone(), f.location.to_string()))
        .collect();
    assert_eq!(
        summary,
        [
            ("source".to_string(), "1..500".to_string()),
            ("CDS".to_string(), "50..150".to_string()),
            ("misc_feature".to_string(), "complement(75..125)".to_string()),
            ("gene".to_string(), "100..200".to_string()),
        ]
    );
}

#[test]
fn test_no_add_sequence_breaks_source_first() {
    let mut table = FeatureTable::new();
    for location in ["90..99", "10..20", "30..40"] {
        table.add(feature("gene", location));
    }
    table.add(feature("source", "1..100"));
    table.add(feature("gene", "5..8"));

    assert!(table.get(0).unwrap().is_source());
    let starts: Vec<usize> = table.iter().skip(1).map(|f| f.location.map(0)).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn test_delete_across_feature() {
    // Length 20 with a feature over [5, 15); deleting five bases at 6
    // shortens the feature to [5, 10).
    let mut seq = plain(b"atgcatgcatgcatgcatgc");
    seq.features_mut().add(feature("gene", "6..15"));

    let out = operations::delete(&seq, 6, 5).unwrap();
    assert_eq!(out.len(), 15);
    assert_eq!(out.features().get(0).unwrap().location.to_string(), "6..10");
}

#[test]
fn test_rotate_circular_record() {
    let mut seq = plain(b"atgcatgcatgcatgcatgc");
    seq.info_mut().topology = Topology::Circular;
    seq.features_mut().add(feature("gene", "16..20"));

    let out = operations::rotate(&seq, 10).unwrap();
    assert_eq!(out.len(), 20);
    assert_eq!(out.features().get(0).unwrap().location.to_string(), "6..10");

    // A span that must cross the origin becomes a join of its two parts.
    let out = operations::rotate(&seq, 17).unwrap();
    assert_eq!(
        out.features().get(0).unwrap().location.to_string(),
        "join(19..20,1..3)"
    );
}

#[test]
fn test_rotate_rejects_linear_record() {
    let seq = plain(b"atgcatgc");
    assert!(operations::rotate(&seq, 3).is_err());
}

#[test]
fn test_edit_length_laws_on_golden() {
    let seq = parse_record(GOLDEN).unwrap();
    let guest = plain(b"ggggg");

    assert_eq!(
        operations::insert(&seq, 100, &guest).unwrap().len(),
        seq.len() + guest.len()
    );
    assert_eq!(
        operations::embed(&seq, 100, &guest).unwrap().len(),
        seq.len() + guest.len()
    );
    assert_eq!(operations::delete(&seq, 100, 7).unwrap().len(), seq.len() - 7);
    assert_eq!(operations::rotate(&seq, 13).unwrap().len(), seq.len());
    assert_eq!(operations::reverse(&seq).len(), seq.len());
    assert_eq!(operations::complement(&seq).len(), seq.len());
}

#[test]
fn test_reverse_involution_on_golden() {
    let seq = parse_record(GOLDEN).unwrap();
    assert_eq!(operations::reverse(&operations::reverse(&seq)), seq);
}

#[test]
fn test_complement_involution_on_golden() {
    let seq = parse_record(GOLDEN).unwrap();
    assert_eq!(operations::complement(&operations::complement(&seq)), seq);
}

#[test]
fn test_rotate_round_trip_on_golden() {
    let seq = parse_record(GOLDEN).unwrap();
    let back = operations::rotate(&operations::rotate(&seq, 77).unwrap(), -77).unwrap();
    assert_eq!(back, seq);
}

#[test]
fn test_edited_golden_still_formats() {
    // An edited record keeps a writable feature table.
    let seq = parse_record(GOLDEN).unwrap();
    let guest = plain(b"aaaaaaaaaa");
    let edited = operations::insert(&seq, 60, &guest).unwrap();
    let text = format_record(&edited).unwrap();
    let reparsed = parse_record(&text).unwrap();
    assert_eq!(reparsed.len(), 250);
    assert_eq!(format_record(&reparsed).unwrap(), text);
}

#[test]
fn test_clear_keeps_source_features() {
    let seq = parse_record(GOLDEN).unwrap();
    let cleared = seq.set_features(seq.features().filter(&Selector::source()));
    assert_eq!(cleared.features().len(), 1);
    assert!(cleared.features().get(0).unwrap().is_source());
}

#[test]
fn test_select_inverted_keeps_source() {
    let seq = parse_record(GOLDEN).unwrap();
    let filter = Selector::source().or(Selector::parse("CDS").unwrap().not());
    let selected = seq.set_features(seq.features().filter(&filter));
    assert!(selected.features().iter().any(|f| f.is_source()));
    assert!(selected.features().iter().all(|f| f.key != "CDS"));
}

#[test]
fn test_embed_widens_insert_splits() {
    let mut seq = plain(b"atgcatgcatgcatgcatgc");
    seq.features_mut().add(feature("gene", "5..15"));
    let guest = plain(b"cccc");

    let embedded = operations::embed(&seq, 10, &guest).unwrap();
    assert_eq!(
        embedded.features().get(0).unwrap().location.to_string(),
        "5..19"
    );

    let inserted = operations::insert(&seq, 10, &guest).unwrap();
    assert_eq!(
        inserted.features().get(0).unwrap().location.to_string(),
        "join(5..10,15..19)"
    );
}
