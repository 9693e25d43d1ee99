//! Auto-detecting record scanner.
//!
//! [`SeqStream`] sniffs the first non-blank line of its input to decide the
//! record format, then yields one [`Sequence`] per record in source order.
//! Detection follows the flat-file conventions: `LOCUS ` opens a GenBank
//! record, `ID   ` an EMBL record, and `>` a FASTA record.

use std::io::{BufRead, BufReader, Cursor, Read};

use crate::error::{GtsError, Result};
use crate::io::fasta::FastaStream;
use crate::io::genbank::GenBankStream;
use crate::seq::Sequence;

type Rejoined<R> = BufReader<std::io::Chain<Cursor<Vec<u8>>, R>>;

enum Inner<R: BufRead> {
    GenBank(GenBankStream<Rejoined<R>>),
    Fasta(FastaStream<Rejoined<R>>),
    Empty,
}

/// A format-detecting iterator of sequence records.
pub struct SeqStream<R: BufRead> {
    inner: Inner<R>,
}

impl<R: BufRead> SeqStream<R> {
    /// Sniff the reader's first non-blank line and build the matching
    /// record stream. The consumed bytes are stitched back in front of the
    /// reader, so nothing is lost.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut consumed: Vec<u8> = Vec::new();
        let mut first: Option<String> = None;
        let mut buf = String::new();
        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            consumed.extend_from_slice(buf.as_bytes());
            if !buf.trim().is_empty() {
                first = Some(buf.trim_end_matches(['\n', '\r']).to_string());
                break;
            }
        }

        let Some(first) = first else {
            return Ok(SeqStream { inner: Inner::Empty });
        };
        let rejoined = BufReader::new(Cursor::new(consumed).chain(reader));

        let inner = if first.starts_with("LOCUS ") {
            Inner::GenBank(GenBankStream::from_reader(rejoined))
        } else if first.starts_with('>') {
            Inner::Fasta(FastaStream::from_reader(rejoined))
        } else if first.starts_with("ID   ") {
            return Err(GtsError::UnsupportedFormat(
                "EMBL records are not supported".to_string(),
            ));
        } else {
            return Err(GtsError::UnsupportedFormat(
                "unable to detect the record format".to_string(),
            ));
        };
        Ok(SeqStream { inner })
    }
}

impl<R: BufRead> Iterator for SeqStream<R> {
    type Item = Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::GenBank(stream) => stream.next(),
            Inner::Fasta(stream) => stream.next(),
            Inner::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_genbank() {
        let input = "\
LOCUS       TEST_DATA                 20 bp    DNA     linear   UNA 14-MAY-2020
ORIGIN\x20\x20\x20\x20\x20\x20
        1 gagttttatc gcttccatga
//
";
        let records: Vec<_> = SeqStream::new(input.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].info().name, "TEST_DATA");
    }

    #[test]
    fn test_detects_fasta_after_blank_lines() {
        let input = "\n\n>seq1\natgc\n";
        let records: Vec<_> = SeqStream::new(input.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bytes(), b"atgc");
    }

    #[test]
    fn test_rejects_embl_and_unknown() {
        assert!(matches!(
            SeqStream::new(&b"ID   X56734; SV 1; linear; mRNA\n"[..]),
            Err(GtsError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SeqStream::new(&b"this is not a sequence file\n"[..]),
            Err(GtsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        let mut stream = SeqStream::new(&b""[..]).unwrap();
        assert!(stream.next().is_none());
    }
}
