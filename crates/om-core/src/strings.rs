//! Printable-string extraction and text pattern classification.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::bytes::{is_printable, PrintableRuns};

/// Minimum run length reported by default.
pub const DEFAULT_MIN_LENGTH: usize = 4;

/// A maximal run of printable ASCII bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedString {
    pub offset: u64,
    pub value: String,
    pub length: usize,
}

impl ExtractedString {
    fn new(offset: u64, run: &[u8]) -> Self {
        // every byte is in 0x20..=0x7E, so this is a plain ASCII copy
        let value: String = run.iter().map(|&b| b as char).collect();
        Self {
            offset,
            length: value.len(),
            value,
        }
    }
}

/// All printable runs of at least `min_length` bytes, in offset order.
///
/// A run ending exactly at the end of `data` is reported like any other.
pub fn extract_strings(data: &[u8], min_length: usize) -> Vec<ExtractedString> {
    let strings: Vec<ExtractedString> = PrintableRuns::new(data)
        .filter(|(_, run)| run.len() >= min_length)
        .map(|(offset, run)| ExtractedString::new(offset as u64, run))
        .collect();
    log::debug!(
        "strings: {} runs >= {} bytes in {} bytes",
        strings.len(),
        min_length,
        data.len()
    );
    strings
}

/// Incremental form of [`extract_strings`] for data arriving in chunks.
///
/// Runs spanning chunk boundaries are joined; the output equals
/// `extract_strings` over the concatenated input.
#[derive(Debug)]
pub struct StringScanner {
    min_length: usize,
    position: u64,
    run_start: u64,
    run: Vec<u8>,
    found: Vec<ExtractedString>,
}

impl StringScanner {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            position: 0,
            run_start: 0,
            run: Vec::new(),
            found: Vec::new(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            if is_printable(byte) {
                if self.run.is_empty() {
                    self.run_start = self.position;
                }
                self.run.push(byte);
            } else {
                self.flush();
            }
            self.position += 1;
        }
    }

    /// Strings completed so far; the run still open at the end is excluded.
    pub fn found(&self) -> &[ExtractedString] {
        &self.found
    }

    pub fn finish(mut self) -> Vec<ExtractedString> {
        self.flush();
        self.found
    }

    fn flush(&mut self) {
        if !self.run.is_empty() && self.run.len() >= self.min_length {
            self.found.push(ExtractedString::new(self.run_start, &self.run));
        }
        self.run.clear();
    }
}

// Per-string classifiers. Extracted strings are printable ASCII, so the
// character classes below never see anything else.
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").expect("url regex"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex")
});
static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("ipv4 regex")
});
static WIN_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[A-Z]:\\[^\\/:*?"<>|\r\n]+"#).expect("path regex")
});

/// True if every dot-separated component of a dotted quad is at most 255.
pub fn is_valid_ipv4(candidate: &str) -> bool {
    let mut parts = 0;
    for part in candidate.split('.') {
        parts += 1;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match part.parse::<u16>() {
            Ok(n) if n <= 255 => {}
            _ => return false,
        }
    }
    parts == 4
}

/// A pattern hit inside an extracted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    #[serde(flatten)]
    pub source: ExtractedString,
    #[serde(rename = "match")]
    pub matched: String,
}

/// Pattern hits grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatches {
    pub urls: Vec<PatternMatch>,
    pub emails: Vec<PatternMatch>,
    pub ip_addresses: Vec<PatternMatch>,
    pub paths: Vec<PatternMatch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCounts {
    pub urls: usize,
    pub emails: usize,
    pub ip_addresses: usize,
    pub paths: usize,
    pub total: usize,
}

impl PatternMatches {
    pub fn counts(&self) -> PatternCounts {
        let (urls, emails, ip_addresses, paths) = (
            self.urls.len(),
            self.emails.len(),
            self.ip_addresses.len(),
            self.paths.len(),
        );
        PatternCounts {
            urls,
            emails,
            ip_addresses,
            paths,
            total: urls + emails + ip_addresses + paths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total == 0
    }
}

fn collect_matches(out: &mut Vec<PatternMatch>, re: &Regex, source: &ExtractedString) {
    out.extend(re.find_iter(&source.value).map(|m| PatternMatch {
        source: source.clone(),
        matched: m.as_str().to_string(),
    }));
}

/// Classify every string against the url, email, IPv4 and Windows path
/// patterns. A string may contribute to several categories.
pub fn classify_patterns(strings: &[ExtractedString]) -> PatternMatches {
    let mut matches = PatternMatches::default();
    for s in strings {
        collect_matches(&mut matches.urls, &URL, s);
        collect_matches(&mut matches.emails, &EMAIL, s);
        matches.ip_addresses.extend(
            IPV4.find_iter(&s.value)
                .filter(|m| is_valid_ipv4(m.as_str()))
                .map(|m| PatternMatch {
                    source: s.clone(),
                    matched: m.as_str().to_string(),
                }),
        );
        collect_matches(&mut matches.paths, &WIN_PATH, s);
    }
    log::debug!("patterns: {:?}", matches.counts());
    matches
}

// Whole-buffer scanners, run over lossily decoded text. `(?-u)` keeps
// `\b`, `\d` and `\s` ASCII-only.
static TEXT_EMAIL: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r"(?-u)\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b")
        .expect("email regex")
});
static TEXT_URL: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r#"(?-u)https?://[^\s<>"{}|\\^`\[\]]+"#).expect("url regex")
});
static TEXT_IPV4: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r"(?-u)\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ipv4 regex")
});
static TEXT_CARD: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r"(?-u)\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b")
        .expect("card regex")
});
static TEXT_PHONE: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r"(?-u)\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("phone regex")
});

/// Distinct pattern hits over a whole buffer, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPatterns {
    pub emails: Vec<String>,
    pub urls: Vec<String>,
    pub ip_addresses: Vec<String>,
    pub credit_cards: Vec<String>,
    pub phone_numbers: Vec<String>,
}

impl TextPatterns {
    pub fn total(&self) -> usize {
        self.emails.len()
            + self.urls.len()
            + self.ip_addresses.len()
            + self.credit_cards.len()
            + self.phone_numbers.len()
    }
}

fn distinct_matches(
    re: &regex::bytes::Regex,
    text: &[u8],
    keep: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    re.find_iter(text)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .filter(|s| keep(s))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Scan the whole buffer as text for emails, URLs, IPv4 addresses, card-like
/// digit groups and phone numbers.
///
/// Invalid UTF-8 is replaced rather than rejected, so arbitrary binary input
/// is accepted.
pub fn scan_text_patterns(data: &[u8]) -> TextPatterns {
    let text = String::from_utf8_lossy(data);
    let text = text.as_bytes();
    TextPatterns {
        emails: distinct_matches(&TEXT_EMAIL, text, |_| true),
        urls: distinct_matches(&TEXT_URL, text, |_| true),
        ip_addresses: distinct_matches(&TEXT_IPV4, text, is_valid_ipv4),
        credit_cards: distinct_matches(&TEXT_CARD, text, |_| true),
        phone_numbers: distinct_matches(&TEXT_PHONE, text, |_| true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_runs_with_offsets() {
        let data = b"\x00\x01Hello\x00ab\x00World!\xFF";
        let strings = extract_strings(data, 4);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].offset, 2);
        assert_eq!(strings[0].value, "Hello");
        assert_eq!(strings[0].length, 5);
        assert_eq!(strings[1].offset, 10);
        assert_eq!(strings[1].value, "World!");
    }

    #[test]
    fn run_at_eof_is_flushed() {
        let strings = extract_strings(b"\x00\x00tail", 4);
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].offset, 2);
        assert_eq!(strings[0].value, "tail");
    }

    #[test]
    fn short_runs_dropped() {
        assert!(extract_strings(b"abc\x00de\x00f", 4).is_empty());
        assert_eq!(extract_strings(b"abc\x00de", 2).len(), 2);
        assert!(extract_strings(&[], 4).is_empty());
    }

    #[test]
    fn tab_and_newline_split_runs() {
        let strings = extract_strings(b"line one\nline two\tend!", 4);
        let values: Vec<_> = strings.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["line one", "line two", "end!"]);
    }

    #[test]
    fn scanner_matches_one_shot() {
        let data = b"\x00abcdef\x01\x02ghij\x00klmnopqrstu\x00vw";
        let expected = extract_strings(data, 4);
        for chunk_size in [1, 2, 3, 5, 7, 64] {
            let mut scanner = StringScanner::new(4);
            for chunk in data.chunks(chunk_size) {
                scanner.push(chunk);
            }
            assert_eq!(scanner.finish(), expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn scanner_joins_across_chunks_and_flushes_tail() {
        let mut scanner = StringScanner::new(4);
        scanner.push(b"\x00he");
        scanner.push(b"llo");
        assert!(scanner.found().is_empty());
        let strings = scanner.finish();
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].offset, 1);
        assert_eq!(strings[0].value, "hello");
    }

    fn es(offset: u64, value: &str) -> ExtractedString {
        ExtractedString {
            offset,
            value: value.to_string(),
            length: value.len(),
        }
    }

    #[test]
    fn classify_each_category() {
        let strings = vec![
            es(0, "see https://example.com/a?b=1 now"),
            es(40, "mail admin@corp.example.org please"),
            es(80, "host 192.168.1.10 up"),
            es(120, r"C:\Windows\System32\cmd.exe"),
        ];
        let m = classify_patterns(&strings);
        assert_eq!(m.urls.len(), 1);
        assert_eq!(m.urls[0].matched, "https://example.com/a?b=1");
        assert_eq!(m.urls[0].source.offset, 0);
        assert_eq!(m.emails[0].matched, "admin@corp.example.org");
        assert_eq!(m.ip_addresses[0].matched, "192.168.1.10");
        assert_eq!(m.ip_addresses[0].source.offset, 80);
        assert_eq!(m.paths[0].matched, r"C:\Windows");
        assert_eq!(m.counts().total, 4);
    }

    #[test]
    fn ipv4_octets_over_255_rejected() {
        let strings = vec![es(0, "999.1.1.1 and 256.0.0.1 and 10.0.0.255")];
        let m = classify_patterns(&strings);
        let ips: Vec<_> = m.ip_addresses.iter().map(|p| p.matched.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.255"]);
    }

    #[test]
    fn ipv4_validation() {
        assert!(is_valid_ipv4("0.0.0.0"));
        assert!(is_valid_ipv4("255.255.255.255"));
        assert!(!is_valid_ipv4("999.999.999.999"));
        assert!(!is_valid_ipv4("1.2.3"));
        assert!(!is_valid_ipv4("1.2.3.4.5"));
        assert!(!is_valid_ipv4("1..2.3"));
    }

    #[test]
    fn multiple_matches_in_one_string() {
        let strings = vec![es(7, "http://a.io http://b.io")];
        let m = classify_patterns(&strings);
        assert_eq!(m.urls.len(), 2);
        assert!(m.urls.iter().all(|u| u.source.offset == 7));
    }

    #[test]
    fn pattern_match_serializes_flat() {
        let m = PatternMatch {
            source: es(3, "x@y.io"),
            matched: "x@y.io".to_string(),
        };
        let json = serde_json::to_value(&m).expect("serialize");
        assert_eq!(json["offset"], 3);
        assert_eq!(json["value"], "x@y.io");
        assert_eq!(json["length"], 6);
        assert_eq!(json["match"], "x@y.io");
    }

    #[test]
    fn text_patterns_dedup_in_first_seen_order() {
        let data = b"b@x.com a@x.com b@x.com\x00\xFF\xFEhttps://one.example/p\n";
        let p = scan_text_patterns(data);
        assert_eq!(p.emails, vec!["b@x.com", "a@x.com"]);
        assert_eq!(p.urls, vec!["https://one.example/p"]);
    }

    #[test]
    fn text_patterns_numbers() {
        let data = b"card 4111 1111 1111 1111; call 555-123-4567; ip 8.8.8.8 999.8.8.8";
        let p = scan_text_patterns(data);
        assert_eq!(p.credit_cards, vec!["4111 1111 1111 1111"]);
        assert_eq!(p.phone_numbers, vec!["555-123-4567"]);
        assert_eq!(p.ip_addresses, vec!["8.8.8.8"]);
    }

    #[test]
    fn text_patterns_on_binary_noise() {
        // control bytes and invalid UTF-8 only
        let data: Vec<u8> = (0u8..0x20).chain(0x80..=0xFF).cycle().take(4096).collect();
        let p = scan_text_patterns(&data);
        assert_eq!(p.total(), 0);
    }
}
