pub mod types;
pub mod bytes;
pub mod histogram;
pub mod entropy;
pub mod pattern;
pub mod signatures;
pub mod carve;
pub mod strings;
pub mod diff;
pub mod hexfmt;
pub mod config;
pub mod error;
pub mod analysis;

pub use types::*;
pub use histogram::{ByteHistogram, HistogramStats};
pub use entropy::{
    compute_entropy_profile, entropy_blocks, entropy_heatmap, shannon_entropy, EntropyBand,
    EntropyBlock, EntropyInsight, EntropyProfile, EntropyRegion, EntropyScanner, EntropyVerdict,
    Heatmap,
};
pub use pattern::{find_all, find_from};
pub use signatures::{
    detect_type, find_occurrences, signature_hex, MagicEntry, Signature, CARVE_SIGNATURES,
    MAGIC_TABLE,
};
pub use carve::{carve, carve_with, CarveReport, CarvedFile};
pub use strings::{
    classify_patterns, extract_strings, scan_text_patterns, ExtractedString, PatternMatch,
    PatternMatches, StringScanner, TextPatterns,
};
pub use diff::{compare, compare_with_limit, ByteDifference, ByteValue, ComparisonResult, DiffContext};
pub use hexfmt::{HexFormat, HexLine};
pub use config::AnalysisConfig;
pub use error::ConfigError;
pub use analysis::{AnalysisObserver, Analyzer, FileAnalysis, NoopObserver, Stage};
