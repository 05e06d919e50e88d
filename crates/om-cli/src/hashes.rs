//! Cryptographic digests and hash-based duplicate detection.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHashes {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha384: String,
    pub sha512: String,
    pub processing_ms: f64,
    pub file_size: u64,
}

fn digest_hex<D: Digest>(data: &[u8]) -> String {
    hex::encode(D::digest(data))
}

pub fn sha256_hex(data: &[u8]) -> String {
    digest_hex::<Sha256>(data)
}

impl FileHashes {
    /// Every digest of `data`, computed concurrently.
    pub fn compute(data: &[u8]) -> Self {
        let start = Instant::now();

        let ((md5, sha1), (sha256, (sha384, sha512))) = rayon::join(
            || {
                rayon::join(
                    || format!("{:x}", md5::compute(data)),
                    || digest_hex::<Sha1>(data),
                )
            },
            || {
                rayon::join(
                    || digest_hex::<Sha256>(data),
                    || {
                        rayon::join(
                            || digest_hex::<Sha384>(data),
                            || digest_hex::<Sha512>(data),
                        )
                    },
                )
            },
        );

        let processing_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!("hashed {} bytes in {:.2} ms", data.len(), processing_ms);

        Self {
            md5,
            sha1,
            sha256,
            sha384,
            sha512,
            processing_ms,
            file_size: data.len() as u64,
        }
    }

    /// `(algorithm, hex digest)` pairs.
    pub fn digests(&self) -> [(&'static str, &str); 5] {
        [
            ("MD5", self.md5.as_str()),
            ("SHA-1", self.sha1.as_str()),
            ("SHA-256", self.sha256.as_str()),
            ("SHA-384", self.sha384.as_str()),
            ("SHA-512", self.sha512.as_str()),
        ]
    }

    /// Algorithm whose digest equals `known`, if any.
    pub fn find_match(&self, known: &str) -> Option<&'static str> {
        self.digests()
            .into_iter()
            .find(|(_, digest)| verify_hash(digest, known))
            .map(|(algorithm, _)| algorithm)
    }
}

fn normalize(hash: &str) -> String {
    hash.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and whitespace-insensitive digest comparison.
pub fn verify_hash(calculated: &str, known: &str) -> bool {
    normalize(calculated) == normalize(known)
}

/// A file taking part in duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashedFile {
    pub name: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub sha256: String,
    pub size: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub total_files: usize,
    pub unique_files: usize,
    pub duplicate_groups: usize,
    /// Copies beyond the first in each group.
    pub total_duplicates: usize,
    /// Bytes held by those extra copies.
    pub wasted_space: u64,
    pub groups: Vec<DuplicateGroup>,
    pub unique: Vec<String>,
}

/// Group files by SHA-256. Groups and their members keep input order.
pub fn find_duplicates(files: &[HashedFile]) -> DuplicateReport {
    let mut order: Vec<&str> = Vec::new();
    let mut by_hash: HashMap<&str, Vec<&HashedFile>> = HashMap::new();
    for file in files {
        let entry = by_hash.entry(file.sha256.as_str()).or_default();
        if entry.is_empty() {
            order.push(file.sha256.as_str());
        }
        entry.push(file);
    }

    let mut report = DuplicateReport {
        total_files: files.len(),
        ..Default::default()
    };

    for hash in order {
        let Some(members) = by_hash.get(hash) else {
            continue;
        };
        match members.as_slice() {
            [single] => report.unique.push(single.name.clone()),
            [first, rest @ ..] => {
                report.total_duplicates += rest.len();
                report.wasted_space += first.size * rest.len() as u64;
                report.groups.push(DuplicateGroup {
                    sha256: hash.to_string(),
                    size: first.size,
                    files: members.iter().map(|f| f.name.clone()).collect(),
                });
            }
            [] => {}
        }
    }

    report.unique_files = report.unique.len();
    report.duplicate_groups = report.groups.len();
    report
}
