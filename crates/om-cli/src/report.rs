//! JSON forensic report assembled from core analysis and file hashes.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use om_core::hexfmt::hex_offset;
use om_core::{ComparisonResult, FileAnalysis};
use serde::Serialize;

use crate::hashes::FileHashes;

pub const GENERATOR: &str = "OmniMeta Forensic Analysis Tool";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: String,
    pub generator: &'static str,
    pub version: &'static str,
}

impl ReportMetadata {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            generator: GENERATOR,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInformation {
    pub file_name: String,
    pub file_size: u64,
    pub file_size_formatted: String,
    pub last_modified: Option<String>,
    pub extension: Option<String>,
}

impl FileInformation {
    pub fn new(path: &Path, name: String, size: u64) -> Self {
        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(rfc3339);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase());
        Self {
            file_name: name,
            file_size: size,
            file_size_formatted: format_size(size),
            last_modified,
            extension,
        }
    }
}

/// Summary flags pulled out of the full analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicSummary {
    pub file_signature: String,
    pub detected_type: &'static str,
    pub entropy: f64,
    pub is_compressed: bool,
    pub is_encrypted: bool,
    pub randomness: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleString {
    pub offset: String,
    pub value: String,
    pub length: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArtifacts {
    pub total_strings: usize,
    pub urls_found: usize,
    pub emails_found: usize,
    pub ip_addresses_found: usize,
    pub file_paths_found: usize,
    pub carved_files: usize,
    pub sample_strings: Vec<SampleString>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicReport {
    pub report_metadata: ReportMetadata,
    pub file_information: FileInformation,
    pub forensic_analysis: ForensicSummary,
    pub cryptographic_hashes: FileHashes,
    pub extracted_artifacts: ExtractedArtifacts,
    pub analysis: FileAnalysis,
}

impl ForensicReport {
    pub fn new(file: FileInformation, hashes: FileHashes, analysis: FileAnalysis) -> Self {
        let counts = analysis.patterns.counts();
        let forensic_analysis = ForensicSummary {
            file_signature: analysis.signature.clone(),
            detected_type: analysis.detected_type,
            entropy: analysis.verdict.entropy,
            is_compressed: analysis.verdict.is_compressed,
            is_encrypted: analysis.verdict.is_encrypted,
            randomness: analysis.verdict.randomness_percent,
        };
        let extracted_artifacts = ExtractedArtifacts {
            total_strings: analysis.strings.total,
            urls_found: counts.urls,
            emails_found: counts.emails,
            ip_addresses_found: counts.ip_addresses,
            file_paths_found: counts.paths,
            carved_files: analysis.carving.total_found,
            sample_strings: analysis
                .strings
                .sample
                .iter()
                .map(|s| SampleString {
                    offset: hex_offset(s.offset),
                    value: s.value.clone(),
                    length: s.length,
                })
                .collect(),
        };

        Self {
            report_metadata: ReportMetadata::now(),
            file_information: file,
            forensic_analysis,
            cryptographic_hashes: hashes,
            extracted_artifacts,
            analysis,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedFile {
    pub name: String,
    pub size: u64,
}

/// Comparison result with the identity of both sides.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub report_metadata: ReportMetadata,
    pub file1: ComparedFile,
    pub file2: ComparedFile,
    pub name_match: bool,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

/// Human-readable size, e.g. `1.50 KB (1536 bytes)`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB ({} bytes)", bytes as f64 / GB as f64, bytes)
    } else if bytes >= MB {
        format!("{:.2} MB ({} bytes)", bytes as f64 / MB as f64, bytes)
    } else if bytes >= KB {
        format!("{:.2} KB ({} bytes)", bytes as f64 / KB as f64, bytes)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use om_core::Analyzer;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1536), "1.50 KB (1536 bytes)");
        assert_eq!(format_size(3 << 20), "3.00 MB (3145728 bytes)");
    }

    #[test]
    fn report_summarises_analysis() {
        let data = b"\xFF\xD8\xFF\xE0 see http://evil.example/payload for 10.0.0.1 \xFF\xD9";
        let analysis = Analyzer::default().analyze(data);
        let file = FileInformation {
            file_name: "photo.jpg".to_string(),
            file_size: data.len() as u64,
            file_size_formatted: format_size(data.len() as u64),
            last_modified: None,
            extension: Some("JPG".to_string()),
        };
        let report = ForensicReport::new(file, FileHashes::compute(data), analysis);

        assert_eq!(report.forensic_analysis.detected_type, "JPEG Image");
        assert_eq!(report.forensic_analysis.file_signature, "FF D8 FF E0 20 73 65 65");
        assert_eq!(report.extracted_artifacts.urls_found, 1);
        assert_eq!(report.extracted_artifacts.ip_addresses_found, 1);
        assert_eq!(report.extracted_artifacts.carved_files, 1);
        assert_eq!(report.extracted_artifacts.sample_strings[0].offset, "0x4");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reportMetadata"]["generator"], GENERATOR);
        assert!(json["reportMetadata"]["generatedAt"].as_str().unwrap().contains('T'));
        assert_eq!(json["cryptographicHashes"]["fileSize"], data.len() as u64);
    }

    #[test]
    fn file_information_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evidence.bin");
        std::fs::write(&path, b"1234").unwrap();
        let info = FileInformation::new(&path, "evidence.bin".to_string(), 4);
        assert_eq!(info.extension.as_deref(), Some("BIN"));
        assert!(info.last_modified.is_some());
        assert_eq!(info.file_size_formatted, "4 bytes");
    }

    #[test]
    fn comparison_report_flattens_result() {
        let report = ComparisonReport {
            report_metadata: ReportMetadata::now(),
            file1: ComparedFile { name: "a".into(), size: 1 },
            file2: ComparedFile { name: "b".into(), size: 2 },
            name_match: false,
            result: om_core::compare(b"x", b"xy"),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalDifferences"], 1);
        assert_eq!(json["file2"]["size"], 2);
        assert_eq!(json["differences"][0]["byte1"], "EOF");
    }
}
