//! Record I/O: format detection, streaming parsers, and formatters.

pub mod fasta;
pub mod genbank;
pub mod scanner;
pub mod source;

pub use genbank::GenBankStream;
pub use fasta::FastaStream;
pub use scanner::SeqStream;
pub use source::{DataSink, DataSource, MMAP_THRESHOLD};

use std::io::Write;

use crate::error::{GtsError, Result};
use crate::seq::Sequence;

/// The record formats the toolkit knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// GenBank flat files
    GenBank,
    /// FASTA files
    Fasta,
    /// EMBL flat files (recognized, but reading and writing are refused)
    Embl,
}

impl FileType {
    /// Resolve a `--format` value.
    pub fn from_name(name: &str) -> Result<FileType> {
        match name.to_ascii_lowercase().as_str() {
            "gb" | "genbank" => Ok(FileType::GenBank),
            "fa" | "fasta" | "fna" => Ok(FileType::Fasta),
            "embl" => Ok(FileType::Embl),
            other => Err(GtsError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Derive an output format from a path extension. Unknown extensions
    /// and standard output default to GenBank.
    pub fn from_extension(extension: Option<&str>) -> FileType {
        match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("fa") | Some("fasta") | Some("fna") => FileType::Fasta,
            Some("embl") => FileType::Embl,
            _ => FileType::GenBank,
        }
    }

    /// Format a record in this file type.
    pub fn format_record(&self, seq: &Sequence) -> Result<String> {
        match self {
            FileType::GenBank => genbank::format_record(seq),
            FileType::Fasta => fasta::format_record(seq),
            FileType::Embl => Err(GtsError::UnsupportedFormat(
                "EMBL records are not supported".to_string(),
            )),
        }
    }

    /// Format a record and write it to `out`.
    pub fn write_record(&self, out: &mut dyn Write, seq: &Sequence) -> Result<()> {
        let text = self.format_record(seq)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(FileType::from_name("genbank").unwrap(), FileType::GenBank);
        assert_eq!(FileType::from_name("gb").unwrap(), FileType::GenBank);
        assert_eq!(FileType::from_name("FASTA").unwrap(), FileType::Fasta);
        assert_eq!(FileType::from_name("embl").unwrap(), FileType::Embl);
        assert!(FileType::from_name("xlsx").is_err());
    }

    #[test]
    fn test_from_extension_defaults_to_genbank() {
        assert_eq!(FileType::from_extension(Some("gb")), FileType::GenBank);
        assert_eq!(FileType::from_extension(Some("fasta")), FileType::Fasta);
        assert_eq!(FileType::from_extension(Some("embl")), FileType::Embl);
        assert_eq!(FileType::from_extension(Some("txt")), FileType::GenBank);
        assert_eq!(FileType::from_extension(None), FileType::GenBank);
    }

    #[test]
    fn test_embl_write_is_refused() {
        let seq = Sequence::new(crate::seq::RecordInfo::default(), b"atgc".to_vec());
        assert!(matches!(
            FileType::Embl.format_record(&seq),
            Err(GtsError::UnsupportedFormat(_))
        ));
    }
}
