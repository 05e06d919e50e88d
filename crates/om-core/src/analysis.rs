//! One-call analysis of a buffer: every engine, run concurrently.
//!
//! The engines share nothing but the borrowed input, so independent stages
//! are forked with `rayon::join` and their results assembled afterwards.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::carve::{carve, CarveReport};
use crate::config::AnalysisConfig;
use crate::diff::{compare_with_limit, ComparisonResult};
use crate::entropy::{compute_entropy_profile, entropy_heatmap, EntropyProfile, EntropyVerdict, Heatmap};
use crate::histogram::{ByteHistogram, HistogramStats};
use crate::signatures::{detect_type, signature_hex};
use crate::strings::{
    classify_patterns, extract_strings, scan_text_patterns, ExtractedString, PatternMatches,
    TextPatterns,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Histogram,
    Entropy,
    Strings,
    Patterns,
    Carving,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Histogram,
        Stage::Entropy,
        Stage::Strings,
        Stage::Patterns,
        Stage::Carving,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Histogram => "histogram",
            Stage::Entropy => "entropy",
            Stage::Strings => "strings",
            Stage::Patterns => "patterns",
            Stage::Carving => "carving",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress hooks supplied by the caller.
///
/// Stages run on the rayon pool, so calls may arrive from several threads
/// and interleave.
pub trait AnalysisObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}
    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AnalysisObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringSummary {
    pub total: usize,
    /// The first strings found, up to the configured sample size.
    pub sample: Vec<ExtractedString>,
}

/// Combined output of every engine over one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub size: u64,
    /// Leading bytes as hex pairs.
    pub signature: String,
    pub detected_type: &'static str,
    /// Verdict over the leading sample only.
    pub verdict: EntropyVerdict,
    pub heatmap: Heatmap,
    pub histogram: HistogramStats,
    pub looks_ascii: bool,
    pub entropy: EntropyProfile,
    pub strings: StringSummary,
    pub patterns: PatternMatches,
    pub text_patterns: TextPatterns,
    pub carving: CarveReport,
}

pub struct Analyzer {
    config: AnalysisConfig,
    observer: Box<dyn AnalysisObserver>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: impl AnalysisObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn timed<T>(&self, stage: Stage, f: impl FnOnce() -> T) -> T {
        self.observer.stage_started(stage);
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();
        log::trace!("{stage} finished in {elapsed:?}");
        self.observer.stage_finished(stage, elapsed);
        out
    }

    pub fn entropy(&self, data: &[u8]) -> EntropyProfile {
        self.timed(Stage::Entropy, || {
            compute_entropy_profile(data, self.config.entropy_block_size)
        })
    }

    pub fn strings(&self, data: &[u8]) -> Vec<ExtractedString> {
        self.timed(Stage::Strings, || {
            extract_strings(data, self.config.min_string_length)
        })
    }

    pub fn carve(&self, data: &[u8]) -> CarveReport {
        self.timed(Stage::Carving, || carve(data))
    }

    /// Positional comparison, capped at the configured number of differences.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> ComparisonResult {
        compare_with_limit(a, b, self.config.max_reported_differences)
    }

    /// Run every engine over `data`.
    pub fn analyze(&self, data: &[u8]) -> FileAnalysis {
        let window = &data[..data.len().min(self.config.signature_window)];
        let sample = &data[..data.len().min(self.config.metadata_sample_size)];

        let (histogram, (entropy, ((strings, (patterns, text_patterns)), carving))) = rayon::join(
            || self.timed(Stage::Histogram, || ByteHistogram::from_data(data)),
            || {
                rayon::join(
                    || self.entropy(data),
                    || {
                        rayon::join(
                            || {
                                let strings = self.strings(data);
                                let patterns = self.timed(Stage::Patterns, || {
                                    rayon::join(
                                        || classify_patterns(&strings),
                                        || scan_text_patterns(data),
                                    )
                                });
                                (strings, patterns)
                            },
                            || self.carve(data),
                        )
                    },
                )
            },
        );

        let detected_type = detect_type(window);
        log::debug!("analyzed {} bytes: {}", data.len(), detected_type);

        FileAnalysis {
            size: data.len() as u64,
            signature: signature_hex(data, self.config.signature_window),
            detected_type,
            verdict: EntropyVerdict::of(sample),
            heatmap: entropy_heatmap(sample, self.config.heatmap_width),
            histogram: histogram.stats(),
            looks_ascii: histogram.looks_ascii(),
            entropy,
            strings: StringSummary {
                total: strings.len(),
                sample: strings.into_iter().take(self.config.sample_strings).collect(),
            },
            patterns,
            text_patterns,
            carving,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(Stage, bool)>>,
    }

    impl AnalysisObserver for std::sync::Arc<Recorder> {
        fn stage_started(&self, stage: Stage) {
            if let Ok(mut events) = self.events.lock() {
                events.push((stage, false));
            }
        }

        fn stage_finished(&self, stage: Stage, _elapsed: Duration) {
            if let Ok(mut events) = self.events.lock() {
                events.push((stage, true));
            }
        }
    }

    fn sample_file() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        data.extend_from_slice(b"\x00\x00contact admin@example.com via http://example.com/x \x00");
        data.extend_from_slice(&[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]);
        data.extend(std::iter::repeat(0u8).take(600));
        data
    }

    #[test]
    fn analyze_combines_every_engine() {
        let data = sample_file();
        let analysis = Analyzer::default().analyze(&data);
        assert_eq!(analysis.size, data.len() as u64);
        assert_eq!(analysis.detected_type, "PNG Image");
        assert_eq!(analysis.signature, "89 50 4E 47 0D 0A 1A 0A");
        assert_eq!(analysis.histogram.total, data.len() as u64);
        assert_eq!(analysis.entropy.total_blocks, data.len().div_ceil(256));
        assert_eq!(analysis.strings.total, analysis.strings.sample.len());
        assert_eq!(analysis.patterns.emails.len(), 1);
        assert_eq!(analysis.text_patterns.urls, vec!["http://example.com/x"]);
        assert_eq!(analysis.carving.total_found, 1);
        assert_eq!(analysis.carving.files[0].file_type, "PNG");
        assert_eq!(analysis.heatmap.width, 64);
    }

    #[test]
    fn analyze_empty_buffer() {
        let analysis = Analyzer::default().analyze(&[]);
        assert_eq!(analysis.size, 0);
        assert_eq!(analysis.detected_type, "Unknown");
        assert_eq!(analysis.signature, "");
        assert_eq!(analysis.entropy.total_blocks, 0);
        assert_eq!(analysis.strings.total, 0);
        assert!(analysis.carving.is_empty());
        assert_eq!(analysis.verdict.entropy, 0.0);
    }

    #[test]
    fn string_sample_is_capped() {
        let data = b"abcd\x00".repeat(20);
        let config = AnalysisConfig {
            sample_strings: 5,
            ..Default::default()
        };
        let analysis = Analyzer::new(config).analyze(&data);
        assert_eq!(analysis.strings.total, 20);
        assert_eq!(analysis.strings.sample.len(), 5);
    }

    #[test]
    fn observer_sees_every_stage_once() {
        let recorder = std::sync::Arc::new(Recorder::default());
        let analyzer = Analyzer::default().with_observer(recorder.clone());
        analyzer.analyze(&sample_file());

        let events = recorder.events.lock().expect("lock").clone();
        assert_eq!(events.len(), Stage::ALL.len() * 2);
        for stage in Stage::ALL {
            let started = events.iter().position(|e| *e == (stage, false));
            let finished = events.iter().position(|e| *e == (stage, true));
            assert!(started.is_some() && started < finished, "{stage}");
        }
    }

    #[test]
    fn compare_uses_configured_limit() {
        let config = AnalysisConfig {
            max_reported_differences: 3,
            ..Default::default()
        };
        let r = Analyzer::new(config).compare(&[0; 10], &[1; 10]);
        assert_eq!(r.differences.len(), 3);
        assert_eq!(r.total_differences, 10);
    }

    #[test]
    fn analysis_serializes_camel_case() {
        let json = serde_json::to_value(Analyzer::default().analyze(&sample_file())).expect("json");
        assert_eq!(json["detectedType"], "PNG Image");
        assert!(json["textPatterns"]["emails"].is_array());
        assert_eq!(json["carving"]["totalFound"], 1);
        assert!(json["entropy"]["regions"][0]["type"].is_string());
    }
}
