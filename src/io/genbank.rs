//! GenBank flat-file reading and writing.
//!
//! The parser consumes one record at a time (everything up to the `//`
//! terminator) and is strict: truncated fields, unknown top-level keywords,
//! and any deviation from the fixed ORIGIN line shape are errors that name
//! the offending line. The formatter emits the canonical column layout, so
//! for records that already use it, `format(parse(input)) == input`
//! byte for byte.
//!
//! # Examples
//!
//! ```no_run
//! use gts::io::GenBankStream;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> gts::Result<()> {
//! let reader = BufReader::new(File::open("record.gb")?);
//! for record in GenBankStream::from_reader(reader) {
//!     let record = record?;
//!     println!("{}: {} bp", record.info().name, record.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{GtsError, Result};
use crate::seq::{
    Feature, FeatureTable, Location, Qualifiers, RecordInfo, Reference, Sequence, Source, Topology,
};

/// Column where every top-level field body starts.
const BODY_COLUMN: usize = 12;

/// Continuation prefix for top-level field bodies.
const BODY_PREFIX: &str = "            ";

/// Key indent of a canonical feature table inside a record.
const KEY_INDENT: usize = 5;

/// Location/qualifier column of a canonical feature table.
const FEATURE_DEPTH: usize = 21;

/// Qualifier continuation prefix at the canonical depth.
const FEATURE_PREFIX: &str = "                     ";

/// The literal FEATURES header line.
const FEATURES_HEADER: &str = "FEATURES             Location/Qualifiers";

/// Bases per ORIGIN data line.
const ORIGIN_LINE: usize = 60;

/// Bases per ORIGIN group.
const ORIGIN_GROUP: usize = 10;

/// Qualifiers whose values the INSDC defines as unquoted literals.
const UNQUOTED_QUALIFIERS: &[&str] = &[
    "anticodon",
    "citation",
    "codon_start",
    "compare",
    "direction",
    "estimated_length",
    "mod_base",
    "number",
    "rpt_type",
    "rpt_unit_range",
    "tag_peptide",
    "transl_except",
    "transl_table",
];

/// Insert the continuation prefix after every newline of a field body.
fn add_prefix(value: &str, prefix: &str) -> String {
    value.replace('\n', &format!("\n{prefix}"))
}

/// Streaming GenBank reader yielding one [`Sequence`] per record.
pub struct GenBankStream<R: BufRead> {
    reader: R,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> GenBankStream<R> {
    /// Create a stream over any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        GenBankStream {
            reader,
            line_number: 0,
            finished: false,
        }
    }

    /// Read the lines of the next record (through `//`) and parse them.
    fn read_record(&mut self) -> Result<Option<Sequence>> {
        let mut lines: Vec<String> = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                if lines.is_empty() {
                    return Ok(None);
                }
                break;
            }
            self.line_number += 1;
            let line = buf.trim_end_matches('\n').trim_end_matches('\r');
            if lines.is_empty() && line.trim().is_empty() {
                continue;
            }
            lines.push(line.to_string());
            if line == "//" {
                break;
            }
        }
        let base = self.line_number - lines.len();
        RecordParser::new(&lines, base).parse().map(Some)
    }
}

impl<R: BufRead> Iterator for GenBankStream<R> {
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

/// Parse a single GenBank record from a string.
pub fn parse_record(input: &str) -> Result<Sequence> {
    let lines: Vec<String> = input.lines().map(str::to_string).collect();
    RecordParser::new(&lines, 0).parse()
}

/// Parse a standalone feature table file, as consumed by `annotate`.
pub fn parse_feature_table(input: &str) -> Result<FeatureTable> {
    let lines: Vec<String> = input.lines().map(str::to_string).collect();
    let mut parser = RecordParser::new(&lines, 0);
    while matches!(parser.line(), Some(l) if l.trim().is_empty()) {
        parser.advance();
    }
    let table = parser.parse_features_block()?;
    match parser.line() {
        None => Ok(table),
        Some(_) => Err(parser.error("unexpected line after feature table")),
    }
}

struct RecordParser<'a> {
    lines: &'a [String],
    idx: usize,
    base: usize,
}

impl<'a> RecordParser<'a> {
    fn new(lines: &'a [String], base: usize) -> Self {
        RecordParser {
            lines,
            idx: 0,
            base,
        }
    }

    fn line(&self) -> Option<&'a str> {
        self.lines.get(self.idx).map(String::as_str)
    }

    fn advance(&mut self) {
        self.idx += 1;
    }

    fn error(&self, msg: impl Into<String>) -> GtsError {
        GtsError::InvalidGenBank {
            line: self.base + self.idx.min(self.lines.len().saturating_sub(1)) + 1,
            msg: msg.into(),
        }
    }

    fn parse(mut self) -> Result<Sequence> {
        let locus = self.line().ok_or_else(|| self.error("expected LOCUS line"))?;
        if !locus.starts_with("LOCUS ") {
            return Err(self.error("expected LOCUS line"));
        }
        let (mut info, declared_len) = parse_locus(locus).map_err(|msg| self.error(msg))?;
        self.advance();

        let mut features = FeatureTable::new();
        let mut bytes: Vec<u8> = Vec::new();
        let mut terminated = false;

        while let Some(line) = self.line() {
            if line == "//" {
                terminated = true;
                self.advance();
                break;
            }
            if line.starts_with(' ') || line.is_empty() {
                return Err(self.error("unexpected indented line"));
            }
            let keyword = line.split(' ').next().unwrap_or_default();
            match keyword {
                "DEFINITION" => info.definition = self.field_body()?,
                "ACCESSION" => info.accession = self.field_body()?,
                "VERSION" => info.version = self.field_body()?,
                "DBLINK" => info.dblink = self.parse_dblink()?,
                "KEYWORDS" => {
                    let body = self.field_body()?;
                    info.keywords = Some(split_keywords(&body));
                }
                "SOURCE" => info.source = Some(self.parse_source()?),
                "REFERENCE" => {
                    let reference = self.parse_reference()?;
                    info.references.push(reference);
                }
                "COMMENT" => {
                    let body = self.field_body()?;
                    info.comments.push(body);
                }
                "FEATURES" => {
                    if line != FEATURES_HEADER {
                        return Err(self.error("malformed FEATURES header"));
                    }
                    self.advance();
                    features = self.parse_features_block()?;
                }
                "ORIGIN" => {
                    if !line[6..].trim().is_empty() {
                        return Err(self.error("unexpected text on ORIGIN line"));
                    }
                    self.advance();
                    bytes = self.parse_origin()?;
                }
                _ => return Err(self.error(format!("unknown keyword `{keyword}`"))),
            }
        }

        if !terminated {
            return Err(self.error("expected `//` terminator"));
        }
        if bytes.len() != declared_len {
            return Err(self.error(format!(
                "sequence has {} bases but the LOCUS line declares {declared_len}",
                bytes.len()
            )));
        }

        Ok(Sequence::with_features(info, bytes, features))
    }

    /// Read the body of the field on the current line, plus any continuation
    /// lines indented to the body column. Bodies keep embedded newlines so
    /// the formatter can reproduce the original wrapping.
    fn field_body(&mut self) -> Result<String> {
        let line = self.line().expect("field_body called at end of record");
        if line.len() <= BODY_COLUMN || line[BODY_COLUMN..].trim().is_empty() {
            let keyword = line.split(' ').next().unwrap_or_default().to_string();
            return Err(self.error(format!("field `{keyword}` has no body")));
        }
        let mut body = line[BODY_COLUMN..].to_string();
        self.advance();
        while let Some(line) = self.line() {
            if line.len() <= BODY_COLUMN
                || !line.starts_with(BODY_PREFIX)
                || line[BODY_COLUMN..].trim().is_empty()
            {
                break;
            }
            body.push('\n');
            body.push_str(&line[BODY_COLUMN..]);
            self.advance();
        }
        Ok(body)
    }

    fn parse_dblink(&mut self) -> Result<Vec<(String, String)>> {
        let start = self.idx;
        let body = self.field_body()?;
        let mut entries = Vec::new();
        for (i, line) in body.split('\n').enumerate() {
            match line.split_once(": ") {
                Some((name, value)) if !name.is_empty() => {
                    entries.push((name.to_string(), value.to_string()));
                }
                _ => {
                    self.idx = start + i;
                    return Err(self.error("DBLINK entries must have the form `name: value`"));
                }
            }
        }
        Ok(entries)
    }

    fn parse_source(&mut self) -> Result<Source> {
        let name = self.field_body()?;
        let line = self
            .line()
            .ok_or_else(|| self.error("SOURCE requires an ORGANISM subfield"))?;
        if !line.starts_with("  ORGANISM  ") {
            return Err(self.error("SOURCE requires an ORGANISM subfield"));
        }
        let organism = line[BODY_COLUMN..].to_string();
        self.advance();

        let mut taxonomy = String::new();
        while let Some(line) = self.line() {
            if line.len() <= BODY_COLUMN
                || !line.starts_with(BODY_PREFIX)
                || line[BODY_COLUMN..].trim().is_empty()
            {
                break;
            }
            if !taxonomy.is_empty() {
                taxonomy.push('\n');
            }
            taxonomy.push_str(&line[BODY_COLUMN..]);
            self.advance();
        }

        Ok(Source {
            name,
            organism,
            taxonomy,
        })
    }

    fn parse_reference(&mut self) -> Result<Reference> {
        let line = self.line().expect("parse_reference called at end");
        if line.len() <= BODY_COLUMN {
            return Err(self.error("field `REFERENCE` has no body"));
        }
        let rest = &line[BODY_COLUMN..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self.error("REFERENCE requires a reference number"));
        }
        let number: usize = rest[..digits]
            .parse()
            .map_err(|_| self.error("REFERENCE number is out of range"))?;
        let mut note = rest[digits..].trim_start().to_string();
        self.advance();

        // The base-span note may wrap onto continuation lines.
        while let Some(line) = self.line() {
            if line.len() <= BODY_COLUMN
                || !line.starts_with(BODY_PREFIX)
                || line[BODY_COLUMN..].trim().is_empty()
            {
                break;
            }
            note.push('\n');
            note.push_str(&line[BODY_COLUMN..]);
            self.advance();
        }

        let mut reference = Reference {
            number,
            note,
            ..Reference::default()
        };

        let mut any = false;
        loop {
            let Some(line) = self.line() else { break };
            let slot = match line {
                l if l.starts_with("  AUTHORS   ") => &mut reference.authors,
                l if l.starts_with("  CONSRTM   ") => &mut reference.consortium,
                l if l.starts_with("  TITLE     ") => &mut reference.title,
                l if l.starts_with("  JOURNAL   ") => &mut reference.journal,
                l if l.starts_with("   PUBMED   ") => &mut reference.pubmed,
                l if l.starts_with("  REMARK    ") => &mut reference.remark,
                l if l.starts_with(' ') => {
                    return Err(self.error("malformed REFERENCE subfield"));
                }
                _ => break,
            };
            *slot = Some(self.field_body()?);
            any = true;
        }
        if !any {
            return Err(self.error("REFERENCE requires at least one subfield"));
        }

        Ok(reference)
    }

    /// Parse the feature table lines starting at the current position. The
    /// first key line fixes the key indent and the location column for the
    /// whole table.
    fn parse_features_block(&mut self) -> Result<FeatureTable> {
        let first = match self.line() {
            Some(line) if !line.trim().is_empty() => line,
            _ => return Err(self.error("expected at least one feature")),
        };

        let indent = first.len() - first.trim_start_matches(' ').len();
        let after_key = first[indent..]
            .find(|c: char| !is_key_char(c))
            .map(|i| indent + i)
            .unwrap_or(first.len());
        let key = &first[indent..after_key];
        if key.is_empty() {
            return Err(self.error("expected a feature key"));
        }
        let pad = first[after_key..]
            .bytes()
            .take_while(|&b| b == b' ')
            .count();
        let depth = after_key + pad;
        if pad == 0 || depth >= first.len() {
            return Err(self.error("expected a feature location"));
        }

        let mut table = FeatureTable::new();
        let location = self.parse_location(&first[depth..])?;
        let key = key.to_string();
        self.advance();
        let (qualifiers, order) = self.parse_qualifiers(depth)?;
        let n = table.len();
        table.insert(n, Feature::with_order(key, location, qualifiers, order));

        while let Some(line) = self.line() {
            if !line.starts_with(' ') || line.trim().is_empty() {
                break;
            }
            let Some((key, location_text)) = split_key_line(line, indent, depth) else {
                return Err(self.error("malformed feature table line"));
            };
            let location = self.parse_location(location_text)?;
            let key = key.to_string();
            self.advance();
            let (qualifiers, order) = self.parse_qualifiers(depth)?;
            let n = table.len();
            table.insert(n, Feature::with_order(key, location, qualifiers, order));
        }

        Ok(table)
    }

    fn parse_location(&self, text: &str) -> Result<Location> {
        text.parse()
            .map_err(|_| self.error(format!("`{text}` is not a location")))
    }

    /// Parse the qualifier lines of one feature. Quoted values may continue
    /// over depth-indented lines until the closing quote; the line breaks
    /// are kept in the value.
    fn parse_qualifiers(&mut self, depth: usize) -> Result<(Qualifiers, HashMap<String, usize>)> {
        let mut qualifiers = Qualifiers::new();
        let mut order: HashMap<String, usize> = HashMap::new();

        while let Some(line) = self.line() {
            if line.len() <= depth
                || !line[..depth].bytes().all(|b| b == b' ')
                || !line[depth..].starts_with('/')
            {
                break;
            }
            let text = &line[depth + 1..];
            let (name, value) = match text.split_once('=') {
                None => (text.to_string(), String::new()),
                Some((name, rest)) => {
                    if let Some(quoted) = rest.strip_prefix('"') {
                        let name = name.to_string();
                        let value = self.parse_quoted_value(quoted, depth)?;
                        (name, value)
                    } else {
                        (name.to_string(), rest.to_string())
                    }
                }
            };
            if name.is_empty() {
                return Err(self.error("qualifier has no name"));
            }
            if name != "translation" && !order.contains_key(&name) {
                order.insert(name.clone(), order.len());
            }
            qualifiers.add(&name, &value);
            self.advance();
        }

        Ok((qualifiers, order))
    }

    /// Continue a quoted qualifier value across wrapped lines. On return the
    /// current line is the one holding the closing quote.
    fn parse_quoted_value(&mut self, opening: &str, depth: usize) -> Result<String> {
        if let Some(value) = opening.strip_suffix('"') {
            return Ok(value.to_string());
        }
        let mut value = opening.to_string();
        loop {
            let next = self.idx + 1;
            let Some(line) = self.lines.get(next).map(String::as_str) else {
                return Err(self.error("unterminated quoted qualifier value"));
            };
            if line.len() <= depth || !line[..depth].bytes().all(|b| b == b' ') {
                return Err(self.error("unterminated quoted qualifier value"));
            }
            self.advance();
            let text = &line[depth..];
            value.push('\n');
            match text.strip_suffix('"') {
                Some(tail) => {
                    value.push_str(tail);
                    return Ok(value);
                }
                None => value.push_str(text),
            }
        }
    }

    /// Parse ORIGIN data lines. Every line must carry a 9-column right
    /// aligned position matching the running base count, followed by
    /// single-space separated groups of at most ten letters; only the last
    /// group of a line may fall short, and only the last line may hold fewer
    /// than sixty bases.
    fn parse_origin(&mut self) -> Result<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        let mut short_line = false;

        while let Some(line) = self.line() {
            if !line.starts_with(' ') {
                break;
            }
            if short_line {
                return Err(self.error("sequence data after a short ORIGIN line"));
            }
            if line.len() < 11 {
                return Err(self.error("malformed ORIGIN line"));
            }
            let expected = format!("{:>9}", bytes.len() + 1);
            if line[..9] != expected {
                return Err(self.error("malformed sequence position"));
            }

            let mut rest = &line[9..];
            let mut count = 0usize;
            while !rest.is_empty() {
                let Some(group) = rest.strip_prefix(' ') else {
                    return Err(self.error("sequence groups must be separated by single spaces"));
                };
                let len = group
                    .bytes()
                    .take_while(u8::is_ascii_alphabetic)
                    .count();
                if len == 0 {
                    return Err(self.error("expected a group of sequence letters"));
                }
                if len > ORIGIN_GROUP {
                    return Err(self.error("sequence group is longer than ten letters"));
                }
                if len < ORIGIN_GROUP && !group[len..].is_empty() {
                    return Err(self.error("short sequence group before the end of the line"));
                }
                bytes.extend_from_slice(group[..len].as_bytes());
                count += len;
                rest = &group[len..];
            }
            if count > ORIGIN_LINE {
                return Err(self.error("ORIGIN line holds more than sixty bases"));
            }
            if count < ORIGIN_LINE {
                short_line = true;
            }
            self.advance();
        }

        Ok(bytes)
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '\''
}

/// Split a non-first feature key line into key and location text, verifying
/// the established indent and location column.
fn split_key_line<'l>(line: &'l str, indent: usize, depth: usize) -> Option<(&'l str, &'l str)> {
    let bytes = line.as_bytes();
    if line.len() <= depth || !bytes[..indent].iter().all(|&b| b == b' ') {
        return None;
    }
    if bytes[indent] == b' ' {
        return None;
    }
    let after_key = line[indent..]
        .find(|c: char| !is_key_char(c))
        .map(|i| indent + i)?;
    if after_key == indent || after_key >= depth {
        return None;
    }
    if !bytes[after_key..depth].iter().all(|&b| b == b' ') || bytes[depth] == b' ' {
        return None;
    }
    Some((&line[indent..after_key], &line[depth..]))
}

fn split_keywords(body: &str) -> Vec<String> {
    let stripped = body.strip_suffix('.').unwrap_or(body);
    if stripped.is_empty() {
        return Vec::new();
    }
    stripped.split("; ").map(str::to_string).collect()
}

fn parse_locus(line: &str) -> std::result::Result<(RecordInfo, usize), String> {
    let tokens: Vec<&str> = line[5..].split_whitespace().collect();
    if tokens.len() != 7 {
        return Err("malformed LOCUS line".to_string());
    }
    let length: usize = tokens[1]
        .parse()
        .map_err(|_| "malformed LOCUS length".to_string())?;
    if tokens[2] != "bp" {
        return Err("expected `bp` on LOCUS line".to_string());
    }
    let topology = match tokens[4] {
        "linear" => Topology::Linear,
        "circular" => Topology::Circular,
        other => return Err(format!("unknown topology `{other}`")),
    };
    let date = tokens[6];
    if !is_valid_date(date) {
        return Err(format!("malformed LOCUS date `{date}`"));
    }

    let info = RecordInfo {
        name: tokens[0].to_string(),
        molecule: tokens[3].to_string(),
        topology,
        division: tokens[5].to_string(),
        date: date.to_string(),
        ..RecordInfo::default()
    };
    Ok((info, length))
}

/// Validate the `dd-MMM-yyyy` LOCUS date shape.
fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 11
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2] == b'-'
        && bytes[3..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6] == b'-'
        && bytes[7..].iter().all(u8::is_ascii_digit)
}

/// Format a record as GenBank text in the canonical column layout.
///
/// Returns [`GtsError::EmptySequence`] for a record with no bases: the flat
/// file format has no representation for one.
pub fn format_record(seq: &Sequence) -> Result<String> {
    if seq.is_empty() {
        return Err(GtsError::EmptySequence);
    }
    let info = seq.info();
    let mut out = String::new();

    let length = seq.len().to_string();
    let pad = 28usize
        .saturating_sub(info.name.len() + length.len())
        .max(1);
    out.push_str(&format!(
        "LOCUS       {}{}{} bp {:>6}     {:<9}{} {}\n",
        info.name,
        " ".repeat(pad),
        length,
        info.molecule,
        info.topology.as_str(),
        info.division,
        info.date,
    ));

    if !info.definition.is_empty() {
        out.push_str(&format!(
            "DEFINITION  {}\n",
            add_prefix(&info.definition, BODY_PREFIX)
        ));
    }
    if !info.accession.is_empty() {
        out.push_str(&format!(
            "ACCESSION   {}\n",
            add_prefix(&info.accession, BODY_PREFIX)
        ));
    }
    if !info.version.is_empty() {
        out.push_str(&format!(
            "VERSION     {}\n",
            add_prefix(&info.version, BODY_PREFIX)
        ));
    }
    for (i, (name, value)) in info.dblink.iter().enumerate() {
        let prefix = if i == 0 { "DBLINK      " } else { BODY_PREFIX };
        out.push_str(&format!("{prefix}{name}: {value}\n"));
    }
    if let Some(keywords) = &info.keywords {
        out.push_str(&format!("KEYWORDS    {}.\n", keywords.join("; ")));
    }
    if let Some(source) = &info.source {
        out.push_str(&format!(
            "SOURCE      {}\n",
            add_prefix(&source.name, BODY_PREFIX)
        ));
        out.push_str(&format!("  ORGANISM  {}\n", source.organism));
        for line in source.taxonomy.split('\n').filter(|l| !l.is_empty()) {
            out.push_str(BODY_PREFIX);
            out.push_str(line);
            out.push('\n');
        }
    }
    for reference in &info.references {
        let head = format!(
            "REFERENCE   {:<3}{}",
            reference.number,
            add_prefix(&reference.note, BODY_PREFIX)
        );
        out.push_str(head.trim_end());
        out.push('\n');
        for (prefix, value) in [
            ("  AUTHORS   ", &reference.authors),
            ("  CONSRTM   ", &reference.consortium),
            ("  TITLE     ", &reference.title),
            ("  JOURNAL   ", &reference.journal),
            ("   PUBMED   ", &reference.pubmed),
            ("  REMARK    ", &reference.remark),
        ] {
            if let Some(value) = value {
                out.push_str(&format!("{prefix}{}\n", add_prefix(value, BODY_PREFIX)));
            }
        }
    }
    for comment in &info.comments {
        out.push_str(&format!("COMMENT     {}\n", add_prefix(comment, BODY_PREFIX)));
    }

    if !seq.features().is_empty() {
        out.push_str(FEATURES_HEADER);
        out.push('\n');
        for feature in seq.features() {
            format_feature(&mut out, feature);
        }
    }

    out.push_str("ORIGIN      \n");
    for (i, chunk) in seq.bytes().chunks(ORIGIN_LINE).enumerate() {
        out.push_str(&format!("{:>9}", i * ORIGIN_LINE + 1));
        for group in chunk.chunks(ORIGIN_GROUP) {
            out.push(' ');
            for &b in group {
                out.push(b as char);
            }
        }
        out.push('\n');
    }
    out.push_str("//\n");

    Ok(out)
}

fn format_feature(out: &mut String, feature: &Feature) {
    out.push_str(&format!(
        "{}{:<width$}{}\n",
        " ".repeat(KEY_INDENT),
        feature.key,
        feature.location,
        width = FEATURE_DEPTH - KEY_INDENT,
    ));
    for name in feature.output_names() {
        for value in feature.qualifiers.values(name) {
            if value.is_empty() {
                out.push_str(&format!("{FEATURE_PREFIX}/{name}\n"));
            } else if UNQUOTED_QUALIFIERS.contains(&name) {
                out.push_str(&format!(
                    "{FEATURE_PREFIX}/{name}={}\n",
                    add_prefix(value, FEATURE_PREFIX)
                ));
            } else {
                out.push_str(&format!(
                    "{FEATURE_PREFIX}/{name}=\"{}\"\n",
                    add_prefix(value, FEATURE_PREFIX)
                ));
            }
        }
    }
}
