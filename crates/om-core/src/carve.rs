//! Signature-based extraction of embedded files.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::hexfmt::hex_offset;
use crate::signatures::{find_occurrences, Signature, CARVE_SIGNATURES};
use crate::types::FileRegion;

/// One embedded file located by header/footer search.
///
/// The bytes at `offset` start with the signature header and the bytes
/// ending at `offset + length` end with its footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarvedFile {
    #[serde(rename = "type")]
    pub file_type: &'static str,
    pub extension: &'static str,
    pub mime: &'static str,
    pub offset: u64,
    pub length: u64,
    pub hex_offset: String,
}

impl CarvedFile {
    fn new(signature: &Signature, start: usize, end: usize) -> Self {
        Self {
            file_type: signature.name,
            extension: signature.extension,
            mime: signature.mime,
            offset: start as u64,
            length: (end - start) as u64,
            hex_offset: hex_offset(start as u64),
        }
    }

    pub fn region(&self) -> FileRegion {
        FileRegion::new(self.offset, self.length)
    }

    /// The carved bytes, borrowed from the host buffer.
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        self.region().slice(data)
    }

    /// Suggested file name for an exported copy, e.g. `carved_0x1F40.jpg`.
    pub fn file_name(&self) -> String {
        format!("carved_{}.{}", self.hex_offset, self.extension)
    }
}

/// Everything `carve` found in one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarveReport {
    pub total_found: usize,
    pub files: Vec<CarvedFile>,
    /// Distinct signature names, in first-seen order.
    pub types: Vec<&'static str>,
}

impl CarveReport {
    fn from_files(files: Vec<CarvedFile>) -> Self {
        let mut seen = HashSet::new();
        let types = files
            .iter()
            .map(|f| f.file_type)
            .filter(|t| seen.insert(*t))
            .collect();
        Self {
            total_found: files.len(),
            files,
            types,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Carve `data` against the built-in catalog.
pub fn carve(data: &[u8]) -> CarveReport {
    carve_with(data, CARVE_SIGNATURES)
}

/// Carve `data` against a caller-supplied catalog.
///
/// Signatures are searched independently (and in parallel); spans found by
/// different signatures may overlap and are all kept. Results are ordered by
/// catalog position, then by discovery order within a signature.
pub fn carve_with(data: &[u8], catalog: &[Signature]) -> CarveReport {
    let per_signature: Vec<Vec<CarvedFile>> = catalog
        .par_iter()
        .map(|sig| {
            let found: Vec<CarvedFile> = find_occurrences(data, sig.header, sig.footer)
                .into_iter()
                .map(|span| CarvedFile::new(sig, span.start, span.end))
                .collect();
            if !found.is_empty() {
                log::debug!("carve: {} x{}", sig.name, found.len());
            }
            found
        })
        .collect();

    let report = CarveReport::from_files(per_signature.into_iter().flatten().collect());
    log::debug!(
        "carve: {} files of {} types in {} bytes",
        report.total_found,
        report.types.len(),
        data.len()
    );
    report
}
