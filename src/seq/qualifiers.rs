//! Feature qualifiers.
//!
//! Qualifiers are the `/name=value` annotations attached to a feature. A
//! name may carry several values, and names keep the order in which they
//! were first added, which is what makes format-preserving output possible.

/// An insertion-ordered multimap from qualifier name to values.
///
/// An empty value stands for a value-less qualifier such as `/pseudo`.
///
/// # Examples
///
/// ```
/// use gts::seq::Qualifiers;
///
/// let mut qualifiers = Qualifiers::new();
/// qualifiers.add("gene", "lacZ");
/// qualifiers.add("note", "first copy");
/// qualifiers.add("note", "second copy");
///
/// assert_eq!(qualifiers.values("note"), ["first copy", "second copy"]);
/// assert_eq!(qualifiers.names().collect::<Vec<_>>(), ["gene", "note"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    entries: Vec<(String, Vec<String>)>,
}

impl Qualifiers {
    /// Create an empty qualifier map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for the given name, creating the name on first use.
    pub fn add(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value.to_string()),
            None => self
                .entries
                .push((name.to_string(), vec![value.to_string()])),
        }
    }

    /// The values recorded for a name, empty if the name is absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any value is recorded for the name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Qualifier names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    /// The number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no qualifiers at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
