//! FASTA reading and writing.
//!
//! FASTA records carry a `>` header and wrapped sequence lines. The reader
//! accepts any line wrapping; the writer emits 70 bases per line. Header
//! text maps onto [`RecordInfo`]: the first word becomes the record name and
//! the full header its definition.

use std::io::BufRead;

use crate::error::{GtsError, Result};
use crate::seq::{RecordInfo, Sequence};

/// Bases per line written by [`write_record`].
const LINE_WIDTH: usize = 70;

/// Streaming FASTA reader yielding one [`Sequence`] per record.
pub struct FastaStream<R: BufRead> {
    reader: R,
    line_number: usize,
    finished: bool,
    /// Look-ahead buffer holding the next record's header line.
    next_header: Option<String>,
}

impl<R: BufRead> FastaStream<R> {
    /// Create a stream over any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        FastaStream {
            reader,
            line_number: 0,
            finished: false,
            next_header: None,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(
            buf.trim_end_matches('\n').trim_end_matches('\r').to_string(),
        ))
    }

    fn read_record(&mut self) -> Result<Option<Sequence>> {
        let header = match self.next_header.take() {
            Some(header) => header,
            None => loop {
                match self.read_line()? {
                    None => return Ok(None),
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => break line,
                }
            },
        };

        let Some(header) = header.strip_prefix('>') else {
            return Err(GtsError::InvalidFasta {
                line: self.line_number,
                msg: "expected a `>` header line".to_string(),
            });
        };

        let mut bytes = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with('>') => {
                    self.next_header = Some(line);
                    break;
                }
                Some(line) => {
                    let line = line.trim();
                    if line.contains(char::is_whitespace) {
                        return Err(GtsError::InvalidFasta {
                            line: self.line_number,
                            msg: "sequence lines must not contain whitespace".to_string(),
                        });
                    }
                    bytes.extend_from_slice(line.as_bytes());
                }
            }
        }

        let info = RecordInfo {
            name: header.split_whitespace().next().unwrap_or_default().to_string(),
            definition: header.to_string(),
            molecule: "DNA".to_string(),
            division: "UNA".to_string(),
            date: "01-JAN-1970".to_string(),
            ..RecordInfo::default()
        };
        Ok(Some(Sequence::new(info, bytes)))
    }
}

impl<R: BufRead> Iterator for FastaStream<R> {
    type Item = Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(seq)) => Some(Ok(seq)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Format a record as FASTA text.
///
/// Writing an empty sequence is refused, matching the GenBank formatter.
pub fn format_record(seq: &Sequence) -> Result<String> {
    if seq.is_empty() {
        return Err(GtsError::EmptySequence);
    }
    let info = seq.info();
    let header = if info.definition.is_empty() {
        &info.name
    } else {
        &info.definition
    };
    let mut out = String::with_capacity(seq.len() + seq.len() / LINE_WIDTH + header.len() + 2);
    out.push('>');
    out.push_str(header);
    out.push('\n');
    for chunk in seq.bytes().chunks(LINE_WIDTH) {
        for &b in chunk {
            out.push(b as char);
        }
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_records() {
        let input = ">seq1 first record\nATGCATGC\nATGC\n\n>seq2\nGGGG\n";
        let records: Vec<_> = FastaStream::from_reader(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].info().name, "seq1");
        assert_eq!(records[0].info().definition, "seq1 first record");
        assert_eq!(records[0].bytes(), b"ATGCATGCATGC");
        assert_eq!(records[1].bytes(), b"GGGG");
    }

    #[test]
    fn test_rejects_headerless_input() {
        let input = "ATGC\n";
        let err = FastaStream::from_reader(input.as_bytes())
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, GtsError::InvalidFasta { line: 1, .. }));
    }

    #[test]
    fn test_write_wraps_at_seventy() {
        let bytes = vec![b'a'; 75];
        let mut seq = Sequence::new(RecordInfo::default(), bytes);
        seq.info_mut().name = "x".to_string();
        let out = format_record(&seq).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], ">x");
        assert_eq!(lines[1].len(), 70);
        assert_eq!(lines[2].len(), 5);
    }

    #[test]
    fn test_round_trip() {
        let input = ">seq1 a description\natgcatgcat\n";
        let records: Vec<_> = FastaStream::from_reader(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(format_record(&records[0]).unwrap(), input);
    }
}
