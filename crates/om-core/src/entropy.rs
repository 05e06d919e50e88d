//! Shannon entropy over whole buffers and fixed-size block sweeps.
//!
//! A profile walks the buffer in non-overlapping blocks (the last one may be
//! short), classifies each block into an [`EntropyBand`], merges consecutive
//! blocks of the same band into [`EntropyRegion`]s and derives
//! [`EntropyInsight`]s from the region counts.

use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::histogram::ByteHistogram;

/// Default block size for entropy sweeps.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Buffers at least this large are swept in parallel.
const PARALLEL_THRESHOLD: usize = 1024 * 1024;

/// Region count above which the buffer looks like a container.
const CONTAINER_REGION_COUNT: usize = 10;

/// Shannon entropy of `data` in bits per byte, in `[0, 8]`.
///
/// An empty slice returns 0.0: there is no probability mass, so the sum is
/// empty and the result is defined as zero rather than NaN.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    ByteHistogram::from_data(data).entropy()
}

/// Entropy band a block falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntropyBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EntropyBand {
    /// `< 4` low, `< 6` medium, `< 7.5` high, otherwise very-high.
    pub fn classify(entropy: f64) -> Self {
        if entropy < 4.0 {
            Self::Low
        } else if entropy < 6.0 {
            Self::Medium
        } else if entropy < 7.5 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// One fixed-size block of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntropyBlock {
    pub offset: u64,
    /// Bytes in this block; only the final block may be shorter than the block size.
    pub length: usize,
    pub entropy: f64,
    /// `offset / buffer_len * 100`.
    pub percentage: f64,
}

impl EntropyBlock {
    pub fn band(&self) -> EntropyBand {
        EntropyBand::classify(self.entropy)
    }
}

/// A maximal run of consecutive blocks sharing one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntropyRegion {
    #[serde(rename = "type")]
    pub band: EntropyBand,
    pub start_offset: u64,
    pub start_percent: f64,
    /// Offset of the last block in the region.
    pub end_offset: u64,
    pub end_percent: f64,
    /// Entropy of the first block in the region.
    pub entropy: f64,
    pub block_count: usize,
}

/// Summary observations derived from region counts.
///
/// Serialized as `{ "kind": "repetitive-data", "message": "..." }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyInsight {
    CompressedOrEncrypted,
    RepetitiveData,
    ContainerOrArchive,
}

impl EntropyInsight {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CompressedOrEncrypted => "compressed-or-encrypted",
            Self::RepetitiveData => "repetitive-data",
            Self::ContainerOrArchive => "container-or-archive",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::CompressedOrEncrypted => "File appears to be compressed or encrypted",
            Self::RepetitiveData => "File contains significant repetitive data",
            Self::ContainerOrArchive => {
                "Multiple data types detected - possible container or archive"
            }
        }
    }
}

impl Serialize for EntropyInsight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntropyInsight", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", self.message())?;
        state.end()
    }
}

/// Full block sweep of one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntropyProfile {
    pub block_size: usize,
    pub total_blocks: usize,
    pub blocks: Vec<EntropyBlock>,
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub regions: Vec<EntropyRegion>,
    pub insights: Vec<EntropyInsight>,
}

fn block_at(index: usize, block_size: usize, chunk: &[u8], total_len: usize) -> EntropyBlock {
    let offset = index * block_size;
    EntropyBlock {
        offset: offset as u64,
        length: chunk.len(),
        entropy: shannon_entropy(chunk),
        percentage: offset as f64 / total_len as f64 * 100.0,
    }
}

/// Entropy of every `block_size` chunk of `data`, left to right.
///
/// Returns an empty vector for empty input or a zero block size.
pub fn entropy_blocks(data: &[u8], block_size: usize) -> Vec<EntropyBlock> {
    if data.is_empty() || block_size == 0 {
        return vec![];
    }

    let total_len = data.len();
    if total_len >= PARALLEL_THRESHOLD {
        data.par_chunks(block_size)
            .enumerate()
            .map(|(i, chunk)| block_at(i, block_size, chunk, total_len))
            .collect()
    } else {
        data.chunks(block_size)
            .enumerate()
            .map(|(i, chunk)| block_at(i, block_size, chunk, total_len))
            .collect()
    }
}

/// Merge consecutive same-band blocks into regions.
pub fn detect_regions(blocks: &[EntropyBlock]) -> Vec<EntropyRegion> {
    let mut regions: Vec<EntropyRegion> = Vec::new();

    for block in blocks {
        let band = block.band();
        match regions.last_mut() {
            Some(current) if current.band == band => {
                current.end_offset = block.offset;
                current.end_percent = block.percentage;
                current.block_count += 1;
            }
            _ => regions.push(EntropyRegion {
                band,
                start_offset: block.offset,
                start_percent: block.percentage,
                end_offset: block.offset,
                end_percent: block.percentage,
                entropy: block.entropy,
                block_count: 1,
            }),
        }
    }

    regions
}

/// Insight rules, all evaluated independently.
///
/// Only the `high` band counts as "high" here; `very-high` regions do not.
pub fn derive_insights(regions: &[EntropyRegion]) -> Vec<EntropyInsight> {
    let high = regions.iter().filter(|r| r.band == EntropyBand::High).count();
    let low = regions.iter().filter(|r| r.band == EntropyBand::Low).count();

    let mut insights = Vec::new();
    if high > low * 2 {
        insights.push(EntropyInsight::CompressedOrEncrypted);
    }
    if low > high * 2 {
        insights.push(EntropyInsight::RepetitiveData);
    }
    if regions.len() > CONTAINER_REGION_COUNT {
        insights.push(EntropyInsight::ContainerOrArchive);
    }
    insights
}

/// Aggregate blocks into a profile: statistics, regions and insights.
pub fn profile_from_blocks(blocks: Vec<EntropyBlock>, block_size: usize) -> EntropyProfile {
    let (average, max, min) = if blocks.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = blocks.iter().map(|b| b.entropy).sum();
        let max = blocks.iter().map(|b| b.entropy).fold(f64::MIN, f64::max);
        let min = blocks.iter().map(|b| b.entropy).fold(f64::MAX, f64::min);
        (sum / blocks.len() as f64, max, min)
    };

    let regions = detect_regions(&blocks);
    let insights = derive_insights(&regions);

    EntropyProfile {
        block_size,
        total_blocks: blocks.len(),
        blocks,
        average,
        max,
        min,
        regions,
        insights,
    }
}

/// Sweep `data` in `block_size` chunks and build its profile.
pub fn compute_entropy_profile(data: &[u8], block_size: usize) -> EntropyProfile {
    let blocks = entropy_blocks(data, block_size);
    log::debug!(
        "entropy sweep: {} bytes, block size {}, {} blocks",
        data.len(),
        block_size,
        blocks.len()
    );
    profile_from_blocks(blocks, block_size)
}

/// Incremental block sweep for input that arrives in chunks.
///
/// Feeding the same bytes through any sequence of `push` calls followed by
/// `finish` yields exactly the blocks `entropy_blocks` computes over the
/// whole buffer. The total length must be known up front because block
/// percentages are relative to it.
///
/// At most 64 KiB is reserved up front; larger blocks grow the buffer as
/// data arrives.
const MAX_PENDING_PREALLOC: usize = 64 * 1024;

#[derive(Debug)]
pub struct EntropyScanner {
    block_size: usize,
    total_len: usize,
    pending: Vec<u8>,
    consumed: usize,
    blocks: Vec<EntropyBlock>,
}

impl EntropyScanner {
    pub fn new(block_size: usize, total_len: usize) -> Self {
        Self {
            block_size,
            total_len,
            pending: Vec::with_capacity(block_size.min(MAX_PENDING_PREALLOC)),
            consumed: 0,
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, mut chunk: &[u8]) {
        if self.block_size == 0 {
            return;
        }
        while !chunk.is_empty() {
            let want = self.block_size - self.pending.len();
            let take = want.min(chunk.len());
            self.pending.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];
            if self.pending.len() == self.block_size {
                self.flush_block();
            }
        }
    }

    fn flush_block(&mut self) {
        let index = self.consumed / self.block_size;
        // The caller may under-report the total; never divide by less than what was seen.
        let total = self.total_len.max(self.consumed + self.pending.len());
        self.blocks
            .push(block_at(index, self.block_size, &self.pending, total));
        self.consumed += self.pending.len();
        self.pending.clear();
    }

    /// Flush the boundary block and return every block in order.
    pub fn finish(mut self) -> Vec<EntropyBlock> {
        if !self.pending.is_empty() {
            self.flush_block();
        }
        self.blocks
    }
}

/// Raw byte grid, one row per `width` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub width: usize,
    pub height: usize,
    /// `height` rows of `width` values; the last row is padded with 0.
    pub rows: Vec<Vec<u8>>,
}

pub fn entropy_heatmap(data: &[u8], width: usize) -> Heatmap {
    if width == 0 {
        return Heatmap {
            width,
            height: 0,
            rows: vec![],
        };
    }

    let rows: Vec<Vec<u8>> = data
        .chunks(width)
        .map(|chunk| {
            let mut row = chunk.to_vec();
            row.resize(width, 0);
            row
        })
        .collect();

    Heatmap {
        width,
        height: rows.len(),
        rows,
    }
}

/// Coarse verdict from a single entropy figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntropyVerdict {
    pub entropy: f64,
    pub is_compressed: bool,
    pub is_encrypted: bool,
    pub randomness_percent: f64,
}

impl EntropyVerdict {
    pub fn from_entropy(entropy: f64) -> Self {
        Self {
            entropy,
            is_compressed: entropy > 7.5,
            is_encrypted: entropy > 7.9,
            randomness_percent: entropy / 8.0 * 100.0,
        }
    }

    pub fn of(data: &[u8]) -> Self {
        Self::from_entropy(shannon_entropy(data))
    }
}
