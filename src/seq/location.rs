//! INSDC feature locations.
//!
//! A [`Location`] is a reference from a feature into the coordinate space of
//! its sequence. Externally (in flat files) locations are written 1-based
//! with closed intervals; internally every position is 0-based and spans are
//! half-open. All INSDC location shapes are represented as one recursive
//! enum: points, ranges (with 5'/3' partial markers), ambiguous intervals,
//! between-base locations, and the `complement`/`join`/`order` operators.
//!
//! # Examples
//!
//! ```
//! use gts::seq::Location;
//!
//! let loc: Location = "join(complement(5..10),12)".parse()?;
//! assert_eq!(loc.len(), 7);
//! assert_eq!(loc.to_string(), "join(complement(5..10),12)");
//! # Ok::<(), gts::GtsError>(())
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::GtsError;
use crate::operations::strand;
use crate::seq::Sequence;

/// A feature location as defined by the INSDC feature table format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A single base (`42`)
    Point(usize),
    /// A contiguous span (`3..8`, `<3..8`, `3..>8`)
    Range {
        /// Start of the span (inclusive)
        start: usize,
        /// End of the span (exclusive)
        end: usize,
        /// The span extends beyond the recorded start (`<`)
        partial5: bool,
        /// The span extends beyond the recorded end (`>`)
        partial3: bool,
    },
    /// A single base somewhere within a span (`3.8`)
    Ambiguous {
        /// Start of the span (inclusive)
        start: usize,
        /// End of the span (exclusive)
        end: usize,
    },
    /// A site between two bases (`3^4`)
    Between {
        /// Start of the span (inclusive)
        start: usize,
        /// End of the span (exclusive)
        end: usize,
    },
    /// The reverse strand of the inner location
    Complement(Box<Location>),
    /// Locations that are physically joined into one contiguous stretch
    Join(Vec<Location>),
    /// Locations that belong together without implying joining
    Order(Vec<Location>),
}

impl Location {
    /// Create a plain range with no partial markers.
    pub fn range(start: usize, end: usize) -> Self {
        Location::Range {
            start,
            end,
            partial5: false,
            partial3: false,
        }
    }

    /// The number of bases spanned by the location.
    pub fn len(&self) -> usize {
        match self {
            Location::Point(_) => 1,
            Location::Range { start, end, .. }
            | Location::Ambiguous { start, end }
            | Location::Between { start, end } => end - start,
            Location::Complement(inner) => inner.len(),
            Location::Join(locs) | Location::Order(locs) => locs.iter().map(Location::len).sum(),
        }
    }

    /// Whether the location spans zero bases.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a local index within the location to a global sequence index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`. Callers index locations the way they
    /// index slices; an out-of-range index is a programming error.
    pub fn map(&self, index: usize) -> usize {
        match self {
            Location::Point(pos) => {
                assert!(index < 1, "index {index} is outside of a point location");
                *pos
            }
            Location::Range { start, .. }
            | Location::Ambiguous { start, .. }
            | Location::Between { start, .. } => {
                assert!(
                    index < self.len(),
                    "index {index} is outside of a location with length {}",
                    self.len()
                );
                start + index
            }
            Location::Complement(inner) => inner.map(index),
            Location::Join(locs) | Location::Order(locs) => {
                let mut index = index;
                for loc in locs {
                    if index < loc.len() {
                        return loc.map(index);
                    }
                    index -= loc.len();
                }
                panic!(
                    "index {index} is outside of a location with length {}",
                    self.len()
                );
            }
        }
    }

    /// Extract the sequence referenced by the location.
    ///
    /// `complement` locations yield the complement of the inner bytes; `join`
    /// and `order` concatenate the bytes of their parts in order.
    pub fn locate(&self, seq: &Sequence) -> Sequence {
        match self {
            Location::Point(pos) => seq.slice(*pos, pos + 1),
            Location::Range { start, end, .. }
            | Location::Ambiguous { start, end }
            | Location::Between { start, end } => seq.slice(*start, *end),
            Location::Complement(inner) => {
                let mut sub = inner.locate(seq);
                strand::complement_inplace(sub.bytes_mut());
                sub
            }
            Location::Join(locs) | Location::Order(locs) => {
                let mut bytes = Vec::with_capacity(self.len());
                for loc in locs {
                    bytes.extend_from_slice(loc.locate(seq).bytes());
                }
                Sequence::new(seq.info().clone(), bytes)
            }
        }
    }

    /// Shift the location to account for an insertion (`amount > 0`) or a
    /// deletion (`amount < 0`) at `offset`.
    ///
    /// Returns `false` if the shift invalidates the location: a deleted
    /// point, or a span left with fewer than two bases. An invalidated
    /// location keeps its original coordinates. `join` and `order` are valid
    /// only if every child is; all children are shifted regardless.
    pub fn shift(&mut self, offset: usize, amount: isize) -> bool {
        match self {
            Location::Point(pos) => {
                if amount == 0 || *pos < offset {
                    return true;
                }
                if amount < 0 && *pos < offset + amount.unsigned_abs() {
                    return false;
                }
                *pos = pos.wrapping_add_signed(amount);
                true
            }
            Location::Range { start, end, .. }
            | Location::Ambiguous { start, end }
            | Location::Between { start, end } => shift_span(start, end, offset, amount),
            Location::Complement(inner) => inner.shift(offset, amount),
            Location::Join(locs) | Location::Order(locs) => {
                let mut ok = true;
                for loc in locs.iter_mut() {
                    if !loc.shift(offset, amount) {
                        ok = false;
                    }
                }
                ok
            }
        }
    }
}

/// Shift a half-open span for an edit at `offset`.
///
/// Insertions move an endpoint when `offset` is at or before it, so a span is
/// extended by an insertion anywhere inside it (or exactly at its end).
/// Deletions move endpoints at or beyond the end of the deleted region and
/// leave the span untouched on failure; a span is invalidated unless at least
/// two bases remain.
fn shift_span(start: &mut usize, end: &mut usize, offset: usize, amount: isize) -> bool {
    match amount.cmp(&0) {
        Ordering::Greater => {
            let n = amount as usize;
            if offset <= *start {
                *start += n;
            }
            if offset <= *end {
                *end += n;
            }
            true
        }
        Ordering::Less => {
            let n = amount.unsigned_abs();
            let mut c = *start;
            let mut d = *end;
            if offset + n <= c {
                c -= n;
            }
            if offset + n <= d {
                d -= n;
            }
            if c + 1 < d {
                *start = c;
                *end = d;
                true
            } else {
                false
            }
        }
        Ordering::Equal => true,
    }
}

/// Compare two locations by position: first by the global index of their
/// first base, then by the global index of their last base. Equal on ties.
pub fn location_cmp(a: &Location, b: &Location) -> Ordering {
    a.map(0)
        .cmp(&b.map(0))
        .then_with(|| a.map(a.len() - 1).cmp(&b.map(b.len() - 1)))
}

/// Test if location `a` is positioned strictly before location `b`.
pub fn location_less(a: &Location, b: &Location) -> bool {
    location_cmp(a, b) == Ordering::Less
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Point(pos) => write!(f, "{}", pos + 1),
            Location::Range {
                start,
                end,
                partial5,
                partial3,
            } => {
                let p5 = if *partial5 { "<" } else { "" };
                let p3 = if *partial3 { ">" } else { "" };
                write!(f, "{}{}..{}{}", p5, start + 1, p3, end)
            }
            Location::Ambiguous { start, end } => write!(f, "{}.{}", start + 1, end),
            Location::Between { start, end } => write!(f, "{}^{}", start + 1, end),
            Location::Complement(inner) => write!(f, "complement({inner})"),
            Location::Join(locs) => {
                write!(f, "join(")?;
                for (i, loc) in locs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{loc}")?;
                }
                write!(f, ")")
            }
            Location::Order(locs) => {
                write!(f, "order(")?;
                for (i, loc) in locs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{loc}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for Location {
    type Err = GtsError;

    /// Parse an INSDC location string. The entire input must be consumed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cur = Cursor::new(s.as_bytes());
        match parse_location(&mut cur) {
            Some(loc) if cur.at_end() => Ok(loc),
            _ => Err(GtsError::InvalidLocation(s.to_string())),
        }
    }
}

/// Backtracking cursor over the location grammar. Alternatives save and
/// restore `pos`, so a failed branch never consumes input.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, tag: &[u8]) -> bool {
        if self.buf[self.pos..].starts_with(tag) {
            self.pos += tag.len();
            true
        } else {
            false
        }
    }

    fn integer(&mut self) -> Option<usize> {
        let begin = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == begin {
            return None;
        }
        // Digits only, so the only possible failure is overflow.
        std::str::from_utf8(&self.buf[begin..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

/// Ordered alternatives: range, order, join, complement, ambiguous, between,
/// point. Compound forms are tried before the bare point so that `5..8` does
/// not stop at `5`.
fn parse_location(cur: &mut Cursor) -> Option<Location> {
    let save = cur.pos;
    for alt in [
        parse_range,
        parse_order,
        parse_join,
        parse_complement,
        parse_ambiguous,
        parse_between,
        parse_point,
    ] {
        if let Some(loc) = alt(cur) {
            return Some(loc);
        }
        cur.pos = save;
    }
    None
}

fn parse_point(cur: &mut Cursor) -> Option<Location> {
    let pos = cur.integer()?;
    Some(Location::Point(pos.checked_sub(1)?))
}

fn parse_range(cur: &mut Cursor) -> Option<Location> {
    let partial5 = cur.eat(b'<');
    let start = cur.integer()?.checked_sub(1)?;
    if !cur.eat_str(b"..") {
        return None;
    }
    let mut partial3 = cur.eat(b'>');
    let end = cur.integer()?;
    if cur.eat(b'>') {
        partial3 = true;
    }
    if end <= start {
        return None;
    }
    Some(Location::Range {
        start,
        end,
        partial5,
        partial3,
    })
}

fn parse_ambiguous(cur: &mut Cursor) -> Option<Location> {
    let start = cur.integer()?.checked_sub(1)?;
    if !cur.eat(b'.') {
        return None;
    }
    let end = cur.integer()?;
    if end <= start {
        return None;
    }
    Some(Location::Ambiguous { start, end })
}

fn parse_between(cur: &mut Cursor) -> Option<Location> {
    let start = cur.integer()?.checked_sub(1)?;
    if !cur.eat(b'^') {
        return None;
    }
    let end = cur.integer()?;
    if end <= start {
        return None;
    }
    Some(Location::Between { start, end })
}

fn parse_complement(cur: &mut Cursor) -> Option<Location> {
    if !cur.eat_str(b"complement(") {
        return None;
    }
    let inner = parse_location(cur)?;
    if !cur.eat(b')') {
        return None;
    }
    Some(Location::Complement(Box::new(inner)))
}

fn parse_join(cur: &mut Cursor) -> Option<Location> {
    if !cur.eat_str(b"join(") {
        return None;
    }
    let locs = parse_list(cur)?;
    Some(Location::Join(locs))
}

fn parse_order(cur: &mut Cursor) -> Option<Location> {
    if !cur.eat_str(b"order(") {
        return None;
    }
    let locs = parse_list(cur)?;
    Some(Location::Order(locs))
}

fn parse_list(cur: &mut Cursor) -> Option<Vec<Location>> {
    let mut locs = vec![parse_location(cur)?];
    loop {
        let save = cur.pos;
        if !cur.eat(b',') {
            break;
        }
        while matches!(cur.peek(), Some(b) if b.is_ascii_whitespace()) {
            cur.pos += 1;
        }
        match parse_location(cur) {
            Some(loc) => locs.push(loc),
            None => {
                cur.pos = save;
                break;
            }
        }
    }
    if !cur.eat(b')') {
        return None;
    }
    Some(locs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Location {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_simple_forms() {
        assert_eq!(parse("42"), Location::Point(41));
        assert_eq!(parse("3..8"), Location::range(2, 8));
        assert_eq!(
            parse("<3..>8"),
            Location::Range {
                start: 2,
                end: 8,
                partial5: true,
                partial3: true,
            }
        );
        assert_eq!(parse("3.8"), Location::Ambiguous { start: 2, end: 8 });
        assert_eq!(parse("3^4"), Location::Between { start: 2, end: 4 });
    }

    #[test]
    fn test_parse_trailing_partial_marker() {
        assert_eq!(
            parse("3..8>"),
            Location::Range {
                start: 2,
                end: 8,
                partial5: false,
                partial3: true,
            }
        );
    }

    #[test]
    fn test_parse_compound_forms() {
        assert_eq!(
            parse("complement(5..10)"),
            Location::Complement(Box::new(Location::range(4, 10)))
        );
        assert_eq!(
            parse("join(1..2,4..5)"),
            Location::Join(vec![Location::range(0, 2), Location::range(3, 5)])
        );
        assert_eq!(
            parse("order(1..2, 4..5)"),
            Location::Order(vec![Location::range(0, 2), Location::range(3, 5)])
        );
    }

    #[test]
    fn test_parse_rejects_trailing_input() {
        assert!("5..10x".parse::<Location>().is_err());
        assert!("join(1..2,)".parse::<Location>().is_err());
        assert!("complement(1..2".parse::<Location>().is_err());
        assert!("".parse::<Location>().is_err());
        assert!("0".parse::<Location>().is_err());
        assert!("5..4".parse::<Location>().is_err());
        assert!("8.3".parse::<Location>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for s in [
            "42",
            "3..8",
            "<3..8",
            "3..>8",
            "<3..>8",
            "3.8",
            "3^4",
            "complement(5..10)",
            "join(complement(5..10),order(20..25,30..35))",
            "order(1,2..3,complement(join(4..5,8..9)))",
        ] {
            assert_eq!(parse(s).to_string(), s);
        }
    }

    #[test]
    fn test_len_and_map() {
        let loc = parse("join(complement(5..10),order(20..25,30..35))");
        assert_eq!(loc.len(), 18);
        assert_eq!(loc.map(0), 4);
        assert_eq!(loc.map(5), 9);
        assert_eq!(loc.map(6), 19);
        assert_eq!(loc.map(12), 29);
        assert_eq!(loc.map(17), 34);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_map_out_of_range_panics() {
        parse("5..10").map(6);
    }

    #[test]
    fn test_shift_insertion_extends_span() {
        let mut loc = parse("5..10");
        assert!(loc.shift(6, 3));
        assert_eq!(loc, Location::range(4, 13));

        let mut loc = parse("5..10");
        assert!(loc.shift(0, 2));
        assert_eq!(loc, Location::range(6, 12));

        // Insertion past the end leaves the span alone.
        let mut loc = parse("5..10");
        assert!(loc.shift(11, 2));
        assert_eq!(loc, Location::range(4, 10));
    }

    #[test]
    fn test_shift_deletion_moves_and_shrinks() {
        // Deletion downstream of the span.
        let mut loc = parse("5..10");
        assert!(loc.shift(10, -3));
        assert_eq!(loc, Location::range(4, 10));

        // Deletion upstream of the span moves it whole.
        let mut loc = parse("11..20");
        assert!(loc.shift(0, -5));
        assert_eq!(loc, Location::range(5, 15));

        // Deletion of the tail shrinks the span.
        let mut loc = parse("6..15");
        assert!(loc.shift(6, -5));
        assert_eq!(loc, Location::range(5, 10));
    }

    #[test]
    fn test_shift_deletion_invalidates_small_remainder() {
        // The whole span is deleted.
        let mut loc = parse("5..10");
        assert!(!loc.shift(4, -6));
        assert_eq!(loc, Location::range(4, 10), "failure preserves coordinates");

        // A single remaining base is not enough.
        let mut loc = parse("5..10");
        assert!(!loc.shift(5, -5));
        assert_eq!(loc, Location::range(4, 10));
    }

    #[test]
    fn test_shift_point() {
        let mut loc = parse("10");
        assert!(loc.shift(5, 3));
        assert_eq!(loc, Location::Point(12));

        let mut loc = parse("10");
        assert!(loc.shift(5, -3));
        assert_eq!(loc, Location::Point(6));

        // The point itself is deleted.
        let mut loc = parse("10");
        assert!(!loc.shift(8, -3));
        assert_eq!(loc, Location::Point(9));

        // Positions before the edit never move.
        let mut loc = parse("10");
        assert!(loc.shift(15, -3));
        assert_eq!(loc, Location::Point(9));
    }

    #[test]
    fn test_shift_compound_requires_all_children() {
        let mut loc = parse("join(1..4,11..20)");
        assert!(loc.shift(4, -4));
        assert_eq!(loc, parse("join(1..4,7..16)"));

        let mut loc = parse("join(1..4,11..20)");
        assert!(!loc.shift(0, -4));
    }

    #[test]
    fn test_shift_inverse() {
        for s in ["5..10", "join(3..6,9..12)", "complement(4..8)", "7"] {
            let original = parse(s);
            for offset in 0..12 {
                let mut loc = original.clone();
                assert!(loc.shift(offset, 4));
                assert!(loc.shift(offset, -4));
                assert_eq!(loc, original, "shift at {offset} did not invert");
            }
        }
    }

    #[test]
    fn test_location_ordering() {
        let a = parse("50..150");
        let b = parse("complement(75..125)");
        let c = parse("100..200");
        assert!(location_less(&a, &b));
        assert!(location_less(&b, &c));
        assert_eq!(location_cmp(&a, &a), Ordering::Equal);

        // Same start: the shorter span sorts first.
        let d = parse("50..100");
        assert!(location_less(&d, &a));
    }
}
