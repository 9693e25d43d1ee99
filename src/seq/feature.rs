//! Features and the feature table.
//!
//! A [`Feature`] pairs a key (`CDS`, `gene`, `source`, ...) with a
//! [`Location`] and its [`Qualifiers`]. A [`FeatureTable`] keeps features in
//! the canonical INSDC order: every `source` feature before every other
//! feature, and each group sorted by position.

use std::collections::HashMap;

use crate::seq::location::{location_cmp, location_less, Location};
use crate::seq::qualifiers::Qualifiers;
use crate::seq::selector::Selector;

/// The feature key whose members are pinned to the front of the table.
pub const SOURCE_KEY: &str = "source";

/// A single entry of an INSDC feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature key, e.g. `source`, `gene`, `CDS`
    pub key: String,
    /// Where in the sequence the feature lives
    pub location: Location,
    /// The `/name=value` annotations of the feature
    pub qualifiers: Qualifiers,

    order: HashMap<String, usize>,
}

impl Feature {
    /// Create a new feature.
    pub fn new(key: impl Into<String>, location: Location, qualifiers: Qualifiers) -> Self {
        Feature {
            key: key.into(),
            location,
            qualifiers,
            order: HashMap::new(),
        }
    }

    /// Create a feature that remembers the source order of its qualifier
    /// names. Used by the parsers so that output reproduces the input.
    pub(crate) fn with_order(
        key: impl Into<String>,
        location: Location,
        qualifiers: Qualifiers,
        order: HashMap<String, usize>,
    ) -> Self {
        Feature {
            key: key.into(),
            location,
            qualifiers,
            order,
        }
    }

    /// Whether this is a `source` feature.
    pub fn is_source(&self) -> bool {
        self.key == SOURCE_KEY
    }

    /// Qualifier names in output order: names seen in the source first (in
    /// source order), then names added at runtime in ascending alphabetical
    /// order, and `translation` always last.
    pub fn output_names(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = Vec::with_capacity(self.order.len());
        let mut remains: Vec<&str> = Vec::new();
        let mut has_translation = false;

        for name in self.qualifiers.names() {
            if name == "translation" {
                has_translation = true;
            } else if self.order.contains_key(name) {
                ordered.push(name);
            } else {
                remains.push(name);
            }
        }

        ordered.sort_by_key(|name| self.order[*name]);
        remains.sort_unstable();
        ordered.extend(remains);
        if has_translation {
            ordered.push("translation");
        }
        ordered
    }

    /// The stored translation, stripped of formatting newlines.
    pub fn translation(&self) -> Option<String> {
        let values = self.qualifiers.values("translation");
        values.first().map(|value| value.replace('\n', ""))
    }
}

/// An ordered INSDC feature table.
///
/// Invariant: all `source` features precede all non-source features, and
/// within each group features are sorted by [`location_cmp`]. [`add`]
/// maintains the invariant; [`insert`] does not and is only correct while
/// parsing, where the source order is already canonical.
///
/// [`add`]: FeatureTable::add
/// [`insert`]: FeatureTable::insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureTable {
    features: Vec<Feature>,
}

impl FeatureTable {
    /// Create an empty feature table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of features in the table.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the table holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Iterate mutably over the features in table order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Feature> {
        self.features.iter_mut()
    }

    /// The feature at the given index.
    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    /// Insert a feature at the given position without re-sorting.
    ///
    /// This can break the table invariant; [`add`](FeatureTable::add) is the
    /// safe way to extend a table that is already sorted.
    pub fn insert(&mut self, index: usize, feature: Feature) {
        self.features.insert(index, feature);
    }

    /// Add a feature at its sorted position.
    ///
    /// `source` features go to the end of the leading source run; everything
    /// else is placed by binary search over the non-source region, after any
    /// feature comparing equal, so repeated adds are stable. On a table whose
    /// invariant was broken by positional [`insert`](FeatureTable::insert)
    /// calls, the chosen position is well-defined but arbitrary.
    pub fn add(&mut self, feature: Feature) {
        let sources = self
            .features
            .iter()
            .take_while(|f| f.is_source())
            .count();

        if feature.is_source() {
            self.features.insert(sources, feature);
        } else {
            let i = self.features[sources..]
                .partition_point(|f| !location_less(&feature.location, &f.location));
            self.features.insert(sources + i, feature);
        }
    }

    /// Keep the features matching the selector, in table order.
    pub fn filter(&self, selector: &Selector) -> FeatureTable {
        FeatureTable {
            features: self
                .features
                .iter()
                .filter(|f| selector.matches(f))
                .cloned()
                .collect(),
        }
    }

    /// Re-establish the table invariant with a stable sort.
    pub fn sort(&mut self) {
        self.features.sort_by(|a, b| {
            match (a.is_source(), b.is_source()) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => location_cmp(&a.location, &b.location),
            }
        });
    }
}

impl IntoIterator for FeatureTable {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureTable {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        FeatureTable {
            features: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(key: &str, location: &str) -> Feature {
        Feature::new(key, location.parse().unwrap(), Qualifiers::new())
    }

    #[test]
    fn test_add_keeps_source_first_and_sorted() {
        let mut table = FeatureTable::new();
        table.add(feature("gene", "100..200"));
        table.add(feature(SOURCE_KEY, "1..500"));
        table.add(feature("CDS", "50..150"));
        table.add(feature("misc_feature", "complement(75..125)"));

        let order: Vec<(&str, String)> = table
            .iter()
            .map(|f| (f.key.as_str(), f.location.to_string()))
            .collect();
        assert_eq!(
            order,
            [
                ("source", "1..500".to_string()),
                ("CDS", "50..150".to_string()),
                ("misc_feature", "complement(75..125)".to_string()),
                ("gene", "100..200".to_string()),
            ]
        );
    }

    #[test]
    fn test_add_source_goes_to_end_of_source_run() {
        let mut table = FeatureTable::new();
        table.add(feature(SOURCE_KEY, "1..100"));
        table.add(feature("gene", "5..20"));
        table.add(feature(SOURCE_KEY, "101..200"));

        assert!(table.get(0).unwrap().is_source());
        assert!(table.get(1).unwrap().is_source());
        assert_eq!(table.get(1).unwrap().location.to_string(), "101..200");
        assert_eq!(table.get(2).unwrap().key, "gene");
    }

    #[test]
    fn test_add_is_stable_for_equal_locations() {
        let mut table = FeatureTable::new();
        let mut first = feature("gene", "10..20");
        first.qualifiers.add("label", "first");
        let mut second = feature("gene", "10..20");
        second.qualifiers.add("label", "second");

        table.add(first);
        table.add(second);
        assert_eq!(table.get(0).unwrap().qualifiers.values("label"), ["first"]);
        assert_eq!(table.get(1).unwrap().qualifiers.values("label"), ["second"]);
    }

    #[test]
    fn test_output_names_order() {
        let mut qualifiers = Qualifiers::new();
        qualifiers.add("translation", "MKV");
        qualifiers.add("gene", "phiX");
        qualifiers.add("codon_start", "1");
        let order = HashMap::from([("gene".to_string(), 0), ("codon_start".to_string(), 1)]);
        let mut f = Feature::with_order("CDS", "1..9".parse().unwrap(), qualifiers, order);
        f.qualifiers.add("note", "added later");
        f.qualifiers.add("db_xref", "taxon:562");

        assert_eq!(
            f.output_names(),
            ["gene", "codon_start", "db_xref", "note", "translation"]
        );
    }

    #[test]
    fn test_translation_strips_newlines() {
        let mut qualifiers = Qualifiers::new();
        qualifiers.add("translation", "MKVLG\nERT");
        let f = Feature::new("CDS", "1..24".parse().unwrap(), qualifiers);
        assert_eq!(f.translation().unwrap(), "MKVLGERT");
    }
}
