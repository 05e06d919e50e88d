//! Positional byte-for-byte comparison of two buffers.
//!
//! Byte `i` of one buffer is compared with byte `i` of the other; there is
//! no alignment, so an insertion shows up as a difference at every later
//! position.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::hexfmt::{hex_bytes, hex_pair};

/// Bytes of context before a difference.
pub const CONTEXT_BEFORE: usize = 2;
/// Bytes of context from the difference onwards (inclusive).
pub const CONTEXT_AFTER: usize = 3;

/// A byte at some position, or the end of a buffer shorter than that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteValue {
    Byte(u8),
    Eof,
}

impl ByteValue {
    fn at(data: &[u8], index: usize) -> Self {
        data.get(index).copied().map_or(ByteValue::Eof, ByteValue::Byte)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, ByteValue::Eof)
    }
}

impl fmt::Display for ByteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteValue::Byte(b) => write!(f, "{:02X}", b),
            ByteValue::Eof => f.write_str("EOF"),
        }
    }
}

impl Serialize for ByteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ByteValue::Byte(b) => serializer.serialize_str(&hex_pair(*b)),
            ByteValue::Eof => serializer.serialize_str("EOF"),
        }
    }
}

/// Hex bytes around a difference, one string per buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffContext {
    pub context1: String,
    pub context2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteDifference {
    pub offset: u64,
    pub byte1: ByteValue,
    pub byte2: ByteValue,
    pub context: DiffContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub identical: bool,
    pub similarity_percent: f64,
    /// The first differences found, possibly capped; see `total_differences`.
    pub differences: Vec<ByteDifference>,
    pub total_differences: u64,
    pub size_match: bool,
    /// `len(b) - len(a)`.
    pub size_delta: i64,
}

impl ComparisonResult {
    /// True when fewer differences were kept than exist.
    pub fn is_truncated(&self) -> bool {
        (self.differences.len() as u64) < self.total_differences
    }
}

fn context(a: &[u8], b: &[u8], index: usize) -> DiffContext {
    let start = index.saturating_sub(CONTEXT_BEFORE);
    let end = a.len().max(b.len()).min(index + CONTEXT_AFTER);
    let window = |data: &[u8]| {
        let lo = start.min(data.len());
        let hi = end.min(data.len());
        hex_bytes(&data[lo..hi])
    };
    DiffContext {
        context1: window(a),
        context2: window(b),
    }
}

fn difference(a: &[u8], b: &[u8], index: usize) -> ByteDifference {
    ByteDifference {
        offset: index as u64,
        byte1: ByteValue::at(a, index),
        byte2: ByteValue::at(b, index),
        context: context(a, b, index),
    }
}

/// Compare `a` and `b`, keeping every difference.
pub fn compare(a: &[u8], b: &[u8]) -> ComparisonResult {
    compare_with_limit(a, b, usize::MAX)
}

/// Compare `a` and `b`, keeping at most `limit` differences.
///
/// `total_differences` and the similarity always cover both buffers in full.
/// Similarity is the count of equal positions below the shorter length over
/// the longer length; two empty buffers are identical at 100%.
pub fn compare_with_limit(a: &[u8], b: &[u8], limit: usize) -> ComparisonResult {
    let common = a.len().min(b.len());
    let longest = a.len().max(b.len());

    let mut differences = Vec::new();
    let mut matching: u64 = 0;
    let mut total: u64 = 0;

    for (i, (x, y)) in a[..common].iter().zip(&b[..common]).enumerate() {
        if x == y {
            matching += 1;
        } else {
            total += 1;
            if differences.len() < limit {
                differences.push(difference(a, b, i));
            }
        }
    }

    // Past the shorter buffer every position differs (byte vs EOF).
    let tail = longest - common;
    total += tail as u64;
    let room = limit.saturating_sub(differences.len()).min(tail);
    differences.extend((common..common + room).map(|i| difference(a, b, i)));

    let similarity_percent = if longest == 0 {
        100.0
    } else {
        matching as f64 / longest as f64 * 100.0
    };

    log::debug!(
        "compare: {} vs {} bytes, {} differences, {:.2}% similar",
        a.len(),
        b.len(),
        total,
        similarity_percent
    );

    ComparisonResult {
        identical: total == 0,
        similarity_percent,
        differences,
        total_differences: total,
        size_match: a.len() == b.len(),
        size_delta: b.len() as i64 - a.len() as i64,
    }
}
