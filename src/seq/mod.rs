//! Sequence records: bytes, header metadata, and the feature table.

pub mod feature;
pub mod location;
pub mod qualifiers;
pub mod selector;

pub use feature::{Feature, FeatureTable, SOURCE_KEY};
pub use location::{location_cmp, location_less, Location};
pub use qualifiers::Qualifiers;
pub use selector::Selector;

/// Topology of the molecule as recorded on the LOCUS line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Topology {
    /// A linear molecule
    #[default]
    Linear,
    /// A circular molecule; rotation is only defined for these
    Circular,
}

impl Topology {
    /// The LOCUS line spelling of the topology.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Circular => "circular",
        }
    }
}

/// The organism block of a GenBank record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    /// The free-form SOURCE value
    pub name: String,
    /// The ORGANISM name
    pub organism: String,
    /// The taxonomic lineage, newline-separated exactly as read
    pub taxonomy: String,
}

/// A literature reference of a GenBank record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// Reference number
    pub number: usize,
    /// The parenthesized base-span note, e.g. `(bases 1 to 5386)`
    pub note: String,
    /// AUTHORS subfield
    pub authors: Option<String>,
    /// CONSRTM subfield
    pub consortium: Option<String>,
    /// TITLE subfield
    pub title: Option<String>,
    /// JOURNAL subfield
    pub journal: Option<String>,
    /// PUBMED subfield
    pub pubmed: Option<String>,
    /// REMARK subfield
    pub remark: Option<String>,
}

/// Header metadata of a sequence record.
///
/// GenBank records fill every field; FASTA records only carry a name and a
/// definition. Empty strings mean the field was absent, except `keywords`
/// where an empty-but-present list (`KEYWORDS    .`) is distinct from no
/// KEYWORDS line at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordInfo {
    /// Locus name (or FASTA identifier)
    pub name: String,
    /// Molecule type, e.g. `DNA`, `ss-DNA`, `RNA`
    pub molecule: String,
    /// Linear or circular
    pub topology: Topology,
    /// GenBank division code, e.g. `PHG`, `BCT`
    pub division: String,
    /// Record date in `dd-MMM-yyyy` form, kept verbatim
    pub date: String,
    /// DEFINITION field (or FASTA description)
    pub definition: String,
    /// ACCESSION field
    pub accession: String,
    /// VERSION field
    pub version: String,
    /// DBLINK entries as `(name, value)` pairs
    pub dblink: Vec<(String, String)>,
    /// KEYWORDS entries; `None` when the record has no KEYWORDS line
    pub keywords: Option<Vec<String>>,
    /// SOURCE/ORGANISM block
    pub source: Option<Source>,
    /// REFERENCE blocks in record order
    pub references: Vec<Reference>,
    /// COMMENT blocks in record order
    pub comments: Vec<String>,
}

/// An annotated sequence record.
///
/// A sequence owns its raw IUPAC bytes, the header metadata, and the feature
/// table. Edits never mutate a sequence in place: every operation in
/// [`crate::operations`] produces a fresh `Sequence` with the feature
/// coordinates shifted to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    info: RecordInfo,
    bytes: Vec<u8>,
    features: FeatureTable,
}

impl Sequence {
    /// Create a sequence with no features.
    pub fn new(info: RecordInfo, bytes: Vec<u8>) -> Self {
        Sequence {
            info,
            bytes,
            features: FeatureTable::new(),
        }
    }

    /// Create a sequence with the given feature table.
    pub fn with_features(info: RecordInfo, bytes: Vec<u8>, features: FeatureTable) -> Self {
        Sequence {
            info,
            bytes,
            features,
        }
    }

    /// The number of bases in the sequence.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the sequence holds no bases.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw sequence bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable access to the raw sequence bytes.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The header metadata.
    pub fn info(&self) -> &RecordInfo {
        &self.info
    }

    /// Mutable access to the header metadata.
    pub fn info_mut(&mut self) -> &mut RecordInfo {
        &mut self.info
    }

    /// The feature table.
    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// Mutable access to the feature table.
    pub fn features_mut(&mut self) -> &mut FeatureTable {
        &mut self.features
    }

    /// Replace the feature table, returning a new sequence.
    pub fn set_features(&self, features: FeatureTable) -> Sequence {
        Sequence {
            info: self.info.clone(),
            bytes: self.bytes.clone(),
            features,
        }
    }

    /// Whether the record is circular.
    pub fn is_circular(&self) -> bool {
        self.info.topology == Topology::Circular
    }

    /// A featureless sub-sequence over `[start, end)` of the same record.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds, like slice indexing.
    pub fn slice(&self, start: usize, end: usize) -> Sequence {
        Sequence::new(self.info.clone(), self.bytes[start..end].to_vec())
    }

    /// Concatenate another sequence onto this one. The other sequence's
    /// features are carried over, shifted past this sequence's end.
    pub fn concat(&self, other: &Sequence) -> Sequence {
        let mut bytes = Vec::with_capacity(self.len() + other.len());
        bytes.extend_from_slice(&self.bytes);
        bytes.extend_from_slice(&other.bytes);

        let mut features = self.features.clone();
        for feature in &other.features {
            let mut feature = feature.clone();
            feature.location.shift(0, self.len() as isize);
            features.add(feature);
        }
        Sequence {
            info: self.info.clone(),
            bytes,
            features,
        }
    }
}
