//! Byte-value frequency table.
//!
//! Entropy for every block and every whole-buffer summary is derived from a
//! `ByteHistogram`, so there is exactly one Shannon implementation.

use serde::Serialize;

use crate::bytes::{PRINTABLE_MAX, PRINTABLE_MIN};

/// Count of each byte value (index = byte value) over a slice.
#[derive(Debug, Clone)]
pub struct ByteHistogram {
    pub counts: [u64; 256],
    pub total: u64,
}

impl Default for ByteHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteHistogram {
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            total: 0,
        }
    }

    pub fn from_data(data: &[u8]) -> Self {
        let mut hist = Self::new();
        hist.add(data);
        hist
    }

    /// Accumulate more bytes into the table.
    pub fn add(&mut self, data: &[u8]) {
        for &byte in data {
            self.counts[byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    /// Merge another histogram into this one.
    pub fn merge(&mut self, other: &ByteHistogram) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
        self.total += other.total;
    }

    /// Probability of `byte`; 0.0 when the histogram is empty.
    pub fn frequency(&self, byte: u8) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.counts[byte as usize] as f64 / self.total as f64
        }
    }

    /// Shannon entropy in bits per byte, in `[0, 8]`.
    ///
    /// An empty histogram has no probability mass at all; it reports 0.0
    /// instead of NaN.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let total = self.total as f64;
        let entropy: f64 = self
            .counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum();

        // Rounding can leave a single-valued slice at -0.0.
        entropy.clamp(0.0, 8.0)
    }

    pub fn unique_values(&self) -> u32 {
        self.counts.iter().filter(|&&c| c > 0).count() as u32
    }

    pub fn stats(&self) -> HistogramStats {
        let (most_common, most_common_count) = self
            .counts
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(i, &c)| (i as u8, c))
            .unwrap_or((0, 0));

        // 1.0 = every byte value equally likely, 0.0 = a single value.
        // A single-valued histogram has std dev `expected * sqrt(255)`.
        let expected = self.total as f64 / 256.0;
        let flatness = if self.total > 0 {
            let variance: f64 = self
                .counts
                .iter()
                .map(|&c| (c as f64 - expected).powi(2))
                .sum::<f64>()
                / 256.0;
            let max_std_dev = expected * 255f64.sqrt();
            1.0 - (variance.sqrt() / max_std_dev).min(1.0)
        } else {
            0.0
        };

        HistogramStats {
            total: self.total,
            unique_values: self.unique_values(),
            most_common,
            most_common_count,
            entropy: self.entropy(),
            flatness,
        }
    }

    /// True when more than 85% of bytes are printable ASCII or tab/CR/LF.
    pub fn looks_ascii(&self) -> bool {
        if self.total == 0 {
            return false;
        }

        let printable: u64 = self.counts[PRINTABLE_MIN as usize..=PRINTABLE_MAX as usize]
            .iter()
            .sum::<u64>()
            + self.counts[0x09]
            + self.counts[0x0A]
            + self.counts[0x0D];

        printable as f64 / self.total as f64 > 0.85
    }
}

/// Summary of a histogram, as carried in analysis reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramStats {
    pub total: u64,
    pub unique_values: u32,
    pub most_common: u8,
    pub most_common_count: u64,
    pub entropy: f64,
    pub flatness: f64,
}
