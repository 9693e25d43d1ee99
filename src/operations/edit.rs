//! Sequence edit operations.
//!
//! Every operation takes the sequence by reference and produces a fresh
//! [`Sequence`]: the raw bytes are edited and the same coordinate change is
//! propagated through every feature location. A feature whose location
//! cannot survive the edit (see [`Location::shift`]) is dropped from the
//! result; it never fails the operation.

use crate::error::{GtsError, Result};
use crate::operations::strand;
use crate::seq::{FeatureTable, Location, Sequence};

/// Insert `guest` into `host` at `index`, splitting feature spans.
///
/// A span that strictly contains the insertion point is rewritten as a
/// `join` of the part before the insertion and the part after it, so the
/// inserted bases end up annotated by neither. Use [`embed`] to extend
/// spans over the insertion instead. The guest's own features are carried
/// into the product, shifted to the insertion point.
pub fn insert(host: &Sequence, index: usize, guest: &Sequence) -> Result<Sequence> {
    check_bounds(host, index)?;
    let amount = guest.len();

    let mut features: FeatureTable = host
        .features()
        .iter()
        .filter_map(|feature| {
            let mut feature = feature.clone();
            match split_spans(&feature.location, index, amount) {
                Some(location) => {
                    feature.location = location;
                    Some(feature)
                }
                None => None,
            }
        })
        .collect();
    features.sort();
    merge_guest_features(&mut features, guest, index);

    Ok(Sequence::with_features(
        host.info().clone(),
        splice_bytes(host, index, guest),
        features,
    ))
}

/// Insert `guest` into `host` at `index`, extending feature spans.
///
/// Every feature location undergoes a plain coordinate shift, which widens
/// any span the insertion lands in.
pub fn embed(host: &Sequence, index: usize, guest: &Sequence) -> Result<Sequence> {
    check_bounds(host, index)?;
    let amount = guest.len() as isize;

    let mut features: FeatureTable = host
        .features()
        .iter()
        .filter_map(|feature| {
            let mut feature = feature.clone();
            feature.location.shift(index, amount).then_some(feature)
        })
        .collect();
    features.sort();
    merge_guest_features(&mut features, guest, index);

    Ok(Sequence::with_features(
        host.info().clone(),
        splice_bytes(host, index, guest),
        features,
    ))
}

/// Delete `count` bases starting at `index`.
///
/// Features whose spans are left with fewer than two bases are dropped.
pub fn delete(seq: &Sequence, index: usize, count: usize) -> Result<Sequence> {
    if index + count > seq.len() {
        return Err(GtsError::OutOfBounds {
            index: index + count,
            len: seq.len(),
        });
    }

    let mut bytes = Vec::with_capacity(seq.len() - count);
    bytes.extend_from_slice(&seq.bytes()[..index]);
    bytes.extend_from_slice(&seq.bytes()[index + count..]);

    let mut features: FeatureTable = seq
        .features()
        .iter()
        .filter_map(|feature| {
            let mut feature = feature.clone();
            feature
                .location
                .shift(index, -(count as isize))
                .then_some(feature)
        })
        .collect();
    features.sort();

    Ok(Sequence::with_features(seq.info().clone(), bytes, features))
}

/// Rotate a circular sequence left by `amount` bases (negative rotates
/// right).
///
/// Feature spans are rewritten at their new coordinates; a span that would
/// cross the origin becomes a `join` of its tail and head parts. Rotating a
/// non-circular sequence is an error.
pub fn rotate(seq: &Sequence, amount: isize) -> Result<Sequence> {
    if !seq.is_circular() {
        return Err(GtsError::NotCircular(seq.info().name.clone()));
    }
    if seq.is_empty() {
        return Ok(seq.clone());
    }

    let len = seq.len();
    let shift = amount.rem_euclid(len as isize) as usize;
    let mut bytes = seq.bytes().to_vec();
    bytes.rotate_left(shift);

    let mut features: FeatureTable = seq
        .features()
        .iter()
        .map(|feature| {
            let mut feature = feature.clone();
            feature.location = rotate_location(&feature.location, shift, len);
            feature
        })
        .collect();
    features.sort();

    Ok(Sequence::with_features(seq.info().clone(), bytes, features))
}

/// Reverse the sequence.
///
/// Every coordinate maps through `x -> len - x`; span endpoints and partial
/// markers swap, and `join`/`order` parts reverse their order so they stay
/// ascending.
pub fn reverse(seq: &Sequence) -> Sequence {
    let len = seq.len();
    let mut bytes = seq.bytes().to_vec();
    bytes.reverse();

    let mut features: FeatureTable = seq
        .features()
        .iter()
        .map(|feature| {
            let mut feature = feature.clone();
            feature.location = reverse_location(&feature.location, len);
            feature
        })
        .collect();
    features.sort();

    Sequence::with_features(seq.info().clone(), bytes, features)
}

/// Complement the sequence.
///
/// The bytes go through the IUPAC complement table and every feature
/// location toggles a `complement` wrapper; wrapping twice folds back to the
/// bare location, so the operation is an involution.
pub fn complement(seq: &Sequence) -> Sequence {
    let mut bytes = seq.bytes().to_vec();
    strand::complement_inplace(&mut bytes);

    let features: FeatureTable = seq
        .features()
        .iter()
        .map(|feature| {
            let mut feature = feature.clone();
            feature.location = toggle_complement(feature.location.clone());
            feature
        })
        .collect();

    Sequence::with_features(seq.info().clone(), bytes, features)
}

fn check_bounds(seq: &Sequence, index: usize) -> Result<()> {
    if index > seq.len() {
        return Err(GtsError::OutOfBounds {
            index,
            len: seq.len(),
        });
    }
    Ok(())
}

fn splice_bytes(host: &Sequence, index: usize, guest: &Sequence) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(host.len() + guest.len());
    bytes.extend_from_slice(&host.bytes()[..index]);
    bytes.extend_from_slice(guest.bytes());
    bytes.extend_from_slice(&host.bytes()[index..]);
    bytes
}

fn merge_guest_features(features: &mut FeatureTable, guest: &Sequence, index: usize) {
    for feature in guest.features() {
        let mut feature = feature.clone();
        feature.location.shift(0, index as isize);
        features.add(feature);
    }
}

/// Transform a location for a splitting insertion of `amount` bases at
/// `offset`. Spans that strictly contain the offset split into a `join`;
/// everything else takes the plain shift. Insertions cannot invalidate a
/// location, so this only returns `None` for the sake of symmetry with
/// shifting (a plain shift by a positive amount always succeeds).
fn split_spans(loc: &Location, offset: usize, amount: usize) -> Option<Location> {
    match loc {
        Location::Range {
            start,
            end,
            partial5,
            partial3,
        } if *start < offset && offset < *end => Some(Location::Join(vec![
            Location::Range {
                start: *start,
                end: offset,
                partial5: *partial5,
                partial3: false,
            },
            Location::Range {
                start: offset + amount,
                end: *end + amount,
                partial5: false,
                partial3: *partial3,
            },
        ])),
        Location::Complement(inner) => Some(Location::Complement(Box::new(split_spans(
            inner, offset, amount,
        )?))),
        Location::Join(locs) => Some(Location::Join(
            locs.iter()
                .map(|l| split_spans(l, offset, amount))
                .collect::<Option<_>>()?,
        )),
        Location::Order(locs) => Some(Location::Order(
            locs.iter()
                .map(|l| split_spans(l, offset, amount))
                .collect::<Option<_>>()?,
        )),
        other => {
            let mut shifted = other.clone();
            shifted.shift(offset, amount as isize).then_some(shifted)
        }
    }
}

fn rotate_location(loc: &Location, shift: usize, len: usize) -> Location {
    let relocate = |x: usize| (x + len - shift) % len;

    match loc {
        Location::Point(pos) => Location::Point(relocate(*pos)),
        Location::Range {
            start,
            end,
            partial5,
            partial3,
        } => {
            // A span covering the whole sequence covers it from anywhere.
            if end - start >= len {
                return loc.clone();
            }
            let span_len = end - start;
            let start = relocate(*start);
            if start + span_len <= len {
                Location::Range {
                    start,
                    end: start + span_len,
                    partial5: *partial5,
                    partial3: *partial3,
                }
            } else {
                Location::Join(vec![
                    Location::Range {
                        start,
                        end: len,
                        partial5: *partial5,
                        partial3: false,
                    },
                    Location::Range {
                        start: 0,
                        end: start + span_len - len,
                        partial5: false,
                        partial3: *partial3,
                    },
                ])
            }
        }
        Location::Ambiguous { start, end } => {
            let span_len = end - start;
            let start = relocate(*start);
            if start + span_len <= len {
                Location::Ambiguous {
                    start,
                    end: start + span_len,
                }
            } else {
                Location::Join(vec![
                    Location::range(start, len),
                    Location::range(0, start + span_len - len),
                ])
            }
        }
        Location::Between { start, end } => {
            let span_len = end - start;
            let start = relocate(*start);
            if start + span_len <= len {
                Location::Between {
                    start,
                    end: start + span_len,
                }
            } else {
                Location::Join(vec![
                    Location::range(start, len),
                    Location::range(0, start + span_len - len),
                ])
            }
        }
        Location::Complement(inner) => {
            Location::Complement(Box::new(rotate_location(inner, shift, len)))
        }
        Location::Join(locs) => normalize_join(
            locs.iter()
                .map(|l| rotate_location(l, shift, len))
                .collect(),
        ),
        Location::Order(locs) => Location::Order(
            locs.iter()
                .map(|l| rotate_location(l, shift, len))
                .collect(),
        ),
    }
}

/// Collapse a rotated `join`: nested joins produced by wrapped parts are
/// flattened, contiguous plain ranges fuse back into one, and a single
/// remaining part sheds the wrapper. This is what lets a rotation be undone
/// by the opposite rotation.
fn normalize_join(parts: Vec<Location>) -> Location {
    let mut flat: Vec<Location> = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Location::Join(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut merged: Vec<Location> = Vec::with_capacity(flat.len());
    for part in flat {
        let fused = match (merged.last_mut(), &part) {
            (
                Some(Location::Range {
                    end: prev_end,
                    partial3: prev_partial3,
                    ..
                }),
                Location::Range {
                    start,
                    end,
                    partial5: false,
                    partial3,
                },
            ) if *prev_end == *start && !*prev_partial3 => {
                *prev_end = *end;
                *prev_partial3 = *partial3;
                true
            }
            _ => false,
        };
        if !fused {
            merged.push(part);
        }
    }

    if merged.len() == 1 {
        merged.pop().unwrap()
    } else {
        Location::Join(merged)
    }
}

fn reverse_location(loc: &Location, len: usize) -> Location {
    match loc {
        Location::Point(pos) => Location::Point(len - 1 - pos),
        Location::Range {
            start,
            end,
            partial5,
            partial3,
        } => Location::Range {
            start: len - end,
            end: len - start,
            partial5: *partial3,
            partial3: *partial5,
        },
        Location::Ambiguous { start, end } => Location::Ambiguous {
            start: len - end,
            end: len - start,
        },
        Location::Between { start, end } => Location::Between {
            start: len - end,
            end: len - start,
        },
        Location::Complement(inner) => {
            Location::Complement(Box::new(reverse_location(inner, len)))
        }
        Location::Join(locs) => Location::Join(
            locs.iter()
                .rev()
                .map(|l| reverse_location(l, len))
                .collect(),
        ),
        Location::Order(locs) => Location::Order(
            locs.iter()
                .rev()
                .map(|l| reverse_location(l, len))
                .collect(),
        ),
    }
}

fn toggle_complement(loc: Location) -> Location {
    match loc {
        Location::Complement(inner) => *inner,
        other => Location::Complement(Box::new(other)),
    }
}
