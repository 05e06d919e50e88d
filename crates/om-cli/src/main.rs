//! OmniMeta - forensic binary analysis from the command line.

mod config;
mod hashes;
mod mapped_file;
mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use om_core::hexfmt::{format_offset, hex_offset, parse_hex_bytes, parse_offset};
use om_core::{
    classify_patterns, detect_type, entropy_heatmap, find_all, signature_hex, AnalysisObserver,
    Analyzer, EntropyVerdict, ExtractedString, HexFormat, PatternMatches, Stage,
};

use hashes::{find_duplicates, FileHashes, HashedFile};
use mapped_file::MappedFile;
use report::{ComparedFile, ComparisonReport, FileInformation, ForensicReport, ReportMetadata};

#[derive(Parser, Debug)]
#[command(name = "omnimeta")]
#[command(author, version, about = "Forensic binary analysis", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG still takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// JSON analysis configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write output here instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full forensic report: hashes, signature, entropy, strings, patterns, carving.
    Analyze { file: PathBuf },

    /// Block-wise entropy profile.
    Entropy {
        file: PathBuf,
        #[arg(long)]
        block_size: Option<usize>,
        /// Include a byte heatmap of the leading sample.
        #[arg(long, default_value_t = false)]
        heatmap: bool,
    },

    /// Printable strings, optionally classified into patterns.
    Strings {
        file: PathBuf,
        #[arg(long)]
        min_length: Option<usize>,
        #[arg(long, default_value_t = false)]
        patterns: bool,
    },

    /// File type from magic bytes.
    Detect { file: PathBuf },

    /// Locate embedded files by header/footer signatures.
    Carve {
        file: PathBuf,
        /// Export every carved file into this directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Positional byte comparison of two files.
    Compare {
        first: PathBuf,
        second: PathBuf,
        /// Maximum differences listed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Hex dump of a byte range.
    Hexdump {
        file: PathBuf,
        /// Start offset: decimal, 0x-prefixed or bare hex.
        #[arg(long, default_value = "0")]
        offset: String,
        #[arg(long, default_value_t = 4096)]
        length: u64,
        /// Bytes per row.
        #[arg(long, default_value_t = 16)]
        width: usize,
    },

    /// Every offset of a hex byte pattern, e.g. "FF D8 FF".
    Search { file: PathBuf, pattern: String },

    /// MD5, SHA-1, SHA-256, SHA-384 and SHA-512 digests.
    Hash {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Known digest to check against every algorithm.
        #[arg(long)]
        verify: Option<String>,
    },

    /// Group identical files by SHA-256.
    Duplicates {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
}

/// Widest hex dump row accepted by `hexdump --width`.
const MAX_HEX_WIDTH: usize = 4096;

/// Reports analyzer stage timings through the log.
struct LogObserver;

impl AnalysisObserver for LogObserver {
    fn stage_started(&self, stage: Stage) {
        log::debug!("{stage} started");
    }

    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        log::info!("{stage} finished in {elapsed:.2?}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    run(cli)
}

fn overrides_for(command: &Command) -> config::Overrides {
    match *command {
        Command::Entropy { block_size, .. } => config::Overrides {
            block_size,
            ..Default::default()
        },
        Command::Strings { min_length, .. } => config::Overrides {
            min_length,
            ..Default::default()
        },
        Command::Compare { limit, .. } => config::Overrides {
            limit,
            ..Default::default()
        },
        _ => config::Overrides::default(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref(), overrides_for(&cli.command))?;
    let analyzer = Analyzer::new(config).with_observer(LogObserver);
    let out = cli.output.as_deref();

    match cli.command {
        Command::Analyze { file } => {
            let mapped = MappedFile::open(&file)?;
            let data = mapped.bytes();
            log::info!("analyzing {} ({} bytes)", file.display(), data.len());

            let (hashes, analysis) =
                rayon::join(|| FileHashes::compute(data), || analyzer.analyze(data));
            let info = FileInformation::new(&file, mapped.name(), mapped.len());
            emit_json(&ForensicReport::new(info, hashes, analysis), out)
        }

        Command::Entropy { file, heatmap, .. } => {
            let mapped = MappedFile::open(&file)?;
            let data = mapped.bytes();
            let sample = &data[..data.len().min(analyzer.config().metadata_sample_size)];
            let output = EntropyOutput {
                file: mapped.name(),
                verdict: EntropyVerdict::of(data),
                profile: analyzer.entropy(data),
                heatmap: heatmap.then(|| entropy_heatmap(sample, analyzer.config().heatmap_width)),
            };
            emit_json(&output, out)
        }

        Command::Strings { file, patterns, .. } => {
            let mapped = MappedFile::open(&file)?;
            let strings = analyzer.strings(mapped.bytes());
            let output = StringsOutput {
                file: mapped.name(),
                total: strings.len(),
                patterns: patterns.then(|| classify_patterns(&strings)),
                strings,
            };
            emit_json(&output, out)
        }

        Command::Detect { file } => {
            let mapped = MappedFile::open(&file)?;
            let data = mapped.bytes();
            let config = analyzer.config();
            let window = &data[..data.len().min(config.signature_window)];
            let sample = &data[..data.len().min(config.metadata_sample_size)];
            let output = DetectOutput {
                file: mapped.name(),
                size: mapped.len(),
                signature: signature_hex(data, config.signature_window),
                detected_type: detect_type(window),
                verdict: EntropyVerdict::of(sample),
            };
            emit_json(&output, out)
        }

        Command::Carve { file, out_dir } => {
            let mapped = MappedFile::open(&file)?;
            let data = mapped.bytes();
            let carved = analyzer.carve(data);
            log::info!("carved {} files from {}", carved.total_found, file.display());

            if let Some(dir) = out_dir {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                for found in &carved.files {
                    let path = dir.join(found.file_name());
                    std::fs::write(&path, found.bytes(data))
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    log::info!("wrote {} ({} bytes)", path.display(), found.length);
                }
            }
            emit_json(&carved, out)
        }

        Command::Compare { first, second, .. } => {
            let a = MappedFile::open(&first)?;
            let b = MappedFile::open(&second)?;
            let result = analyzer.compare(a.bytes(), b.bytes());
            let output = ComparisonReport {
                report_metadata: ReportMetadata::now(),
                name_match: a.name() == b.name(),
                file1: ComparedFile {
                    name: a.name(),
                    size: a.len(),
                },
                file2: ComparedFile {
                    name: b.name(),
                    size: b.len(),
                },
                result,
            };
            emit_json(&output, out)
        }

        Command::Hexdump {
            file,
            offset,
            length,
            width,
        } => {
            let start = parse_offset(&offset)
                .with_context(|| format!("invalid offset: {offset}"))?;
            if width == 0 || width > MAX_HEX_WIDTH {
                bail!("--width must be between 1 and {MAX_HEX_WIDTH}");
            }
            let mapped = MappedFile::open(&file)?;
            let format = HexFormat {
                bytes_per_row: width,
                ..Default::default()
            };
            emit_text(&format.dump(start, mapped.slice_at(start, length)), out)
        }

        Command::Search { file, pattern } => {
            let needle = parse_hex_bytes(&pattern)
                .with_context(|| format!("invalid hex pattern: {pattern}"))?;
            let mapped = MappedFile::open(&file)?;
            let hits = find_all(mapped.bytes(), &needle);
            log::info!("{} hits for {}", hits.len(), pattern);
            for &hit in hits.iter().take(5) {
                log::debug!("hit at {}", format_offset(hit));
            }
            let output = SearchOutput {
                file: mapped.name(),
                pattern: om_core::hexfmt::hex_bytes(&needle),
                count: hits.len(),
                offsets: hits.iter().map(|&o| hex_offset(o)).collect(),
            };
            emit_json(&output, out)
        }

        Command::Hash { files, verify } => {
            let results = files
                .par_iter()
                .map(|path| -> Result<HashOutput> {
                    let mapped = MappedFile::open(path)?;
                    let hashes = FileHashes::compute(mapped.bytes());
                    let verification = verify.as_deref().map(|expected| Verification {
                        expected: expected.to_string(),
                        algorithm: hashes.find_match(expected),
                        matched: hashes.find_match(expected).is_some(),
                    });
                    Ok(HashOutput {
                        file: mapped.name(),
                        hashes,
                        verification,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            emit_json(&results, out)
        }

        Command::Duplicates { files } => {
            let hashed = files
                .par_iter()
                .map(|path| -> Result<HashedFile> {
                    let mapped = MappedFile::open(path)?;
                    Ok(HashedFile {
                        name: path.display().to_string(),
                        sha256: hashes::sha256_hex(mapped.bytes()),
                        size: mapped.len(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let report = find_duplicates(&hashed);
            log::info!(
                "{} duplicate groups, {} bytes wasted",
                report.duplicate_groups,
                report.wasted_space
            );
            emit_json(&report, out)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntropyOutput {
    file: String,
    verdict: EntropyVerdict,
    profile: om_core::EntropyProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    heatmap: Option<om_core::Heatmap>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StringsOutput {
    file: String,
    total: usize,
    strings: Vec<ExtractedString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patterns: Option<PatternMatches>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectOutput {
    file: String,
    size: u64,
    signature: String,
    detected_type: &'static str,
    verdict: EntropyVerdict,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput {
    file: String,
    pattern: String,
    count: usize,
    offsets: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Verification {
    expected: String,
    matched: bool,
    algorithm: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashOutput {
    file: String,
    hashes: FileHashes,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<Verification>,
}

fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    emit_text(&(json + "\n"), out)
}

fn emit_text(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("failed to write to stdout")?;
        }
    }
    Ok(())
}
