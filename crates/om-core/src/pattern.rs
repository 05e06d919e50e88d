use memchr::memmem;
use rayon::prelude::*;

/// Buffers at least this large are split across threads by `find_all`.
const MIN_PARALLEL_SIZE: usize = 1024 * 1024;

/// First occurrence of `pattern` in `data` at or after `start`.
///
/// An empty pattern never matches.
pub fn find_from(data: &[u8], pattern: &[u8], start: usize) -> Option<usize> {
    if pattern.is_empty() || start >= data.len() {
        return None;
    }
    memmem::find(&data[start..], pattern).map(|pos| start + pos)
}

/// All (possibly overlapping) offsets where `pattern` occurs in `data`, sorted.
///
/// Large buffers are split into chunks searched in parallel; chunks overlap by
/// `pattern.len() - 1` bytes so matches straddling a boundary are not lost.
pub fn find_all(data: &[u8], pattern: &[u8]) -> Vec<u64> {
    if pattern.is_empty() || data.len() < pattern.len() {
        return vec![];
    }

    let finder = memmem::Finder::new(pattern);
    if data.len() < MIN_PARALLEL_SIZE {
        return find_overlapping(&finder, data, 0);
    }

    let num_threads = rayon::current_num_threads().max(1);
    // each chunk must advance past the overlap, so it is never shorter than two patterns
    let chunk_size = (data.len() / num_threads)
        .max(MIN_PARALLEL_SIZE)
        .max(pattern.len() * 2);
    let overlap = pattern.len() - 1;

    let mut chunks: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    while start < data.len() {
        let end = (start + chunk_size).min(data.len());
        chunks.push((start, end));
        if end >= data.len() {
            break;
        }
        start = end - overlap;
    }

    let mut results: Vec<u64> = chunks
        .par_iter()
        .flat_map_iter(|&(chunk_start, chunk_end)| {
            find_overlapping(&finder, &data[chunk_start..chunk_end], chunk_start)
        })
        .collect();

    // overlapping chunk edges can report the same hit twice
    results.sort_unstable();
    results.dedup();
    results
}

/// `memmem::find_iter` skips past each match; step one byte past each hit
/// instead so overlapping occurrences are reported like a naive scan would.
fn find_overlapping(finder: &memmem::Finder<'_>, data: &[u8], base: usize) -> Vec<u64> {
    let mut results = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let Some(hit) = finder.find(&data[pos..]) else {
            break;
        };
        results.push((base + pos + hit) as u64);
        pos += hit + 1;
    }
    results
}
