//! gts: a toolkit for INSDC/GenBank-style annotated sequence records
//!
//! # Overview
//!
//! gts reads, edits, and writes annotated biological sequences with
//! byte-exact round-trip fidelity. Three subsystems do the heavy lifting:
//!
//! - [`seq::Location`]: the recursive INSDC location algebra with parsing,
//!   formatting, coordinate mapping, and edit-aware shifting
//! - [`seq::FeatureTable`]: the ordered feature table with its
//!   source-features-first discipline and composable selectors
//! - [`operations`]: insert/embed/delete/rotate/reverse/complement edits
//!   that rewrite the raw bytes and every feature location together
//!
//! ## Quick Start
//!
//! ```no_run
//! use gts::io::SeqStream;
//! use gts::operations;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> gts::Result<()> {
//! let reader = BufReader::new(File::open("plasmid.gb")?);
//! for record in SeqStream::new(reader)? {
//!     let record = record?;
//!     let flipped = operations::reverse(&operations::complement(&record));
//!     println!("{}: {} bp", flipped.info().name, flipped.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`seq`]: sequences, locations, features, qualifiers, selectors
//! - [`operations`]: the sequence-edit engine and strand arithmetic
//! - [`io`]: GenBank/FASTA streaming parsers, formatters, and detection

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod io;
pub mod operations;
pub mod seq;

// Re-export commonly used types
pub use error::{GtsError, Result};
pub use seq::{Feature, FeatureTable, Location, Qualifiers, RecordInfo, Selector, Sequence};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
