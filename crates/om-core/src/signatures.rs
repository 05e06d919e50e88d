//! File-type magic numbers: prefix detection and header/footer occurrence search.

use std::ops::Range;

use crate::hexfmt::hex_bytes;
use crate::pattern::find_from;

/// Bytes sampled from the start of a buffer for type detection.
pub const SAMPLE_WINDOW: usize = 8;

/// Label returned when no prefix matches.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// A detection-table entry: a prefix and the label it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicEntry {
    pub label: &'static str,
    pub prefix: &'static [u8],
}

/// Ordered detection table; the first matching prefix wins.
///
/// A longer prefix must come before any shorter entry that is a prefix of
/// it, otherwise the shorter one shadows it. Every prefix fits in
/// [`SAMPLE_WINDOW`].
pub static MAGIC_TABLE: &[MagicEntry] = &[
    // Images
    MagicEntry { label: "JPEG Image", prefix: &[0xFF, 0xD8, 0xFF] },
    MagicEntry { label: "PNG Image", prefix: &[0x89, 0x50, 0x4E, 0x47] },
    MagicEntry { label: "GIF Image", prefix: &[0x47, 0x49, 0x46, 0x38] },
    MagicEntry { label: "BMP Image", prefix: b"BM" },
    MagicEntry { label: "TIFF Image (little-endian)", prefix: &[0x49, 0x49, 0x2A, 0x00] },
    MagicEntry { label: "TIFF Image (big-endian)", prefix: &[0x4D, 0x4D, 0x00, 0x2A] },
    MagicEntry { label: "ICO/CUR Image", prefix: &[0x00, 0x00, 0x01, 0x00] },

    // Documents & databases
    MagicEntry { label: "PDF Document", prefix: &[0x25, 0x50, 0x44, 0x46] },
    MagicEntry { label: "SQLite Database", prefix: b"SQLite f" },

    // Archives & compressed
    MagicEntry { label: "ZIP Archive", prefix: &[0x50, 0x4B, 0x03, 0x04] },
    MagicEntry { label: "ZIP Archive (empty)", prefix: &[0x50, 0x4B, 0x05, 0x06] },
    MagicEntry { label: "ZIP Archive (spanned)", prefix: &[0x50, 0x4B, 0x07, 0x08] },
    MagicEntry { label: "RAR Archive (v5)", prefix: &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x01, 0x00] },
    MagicEntry { label: "RAR Archive", prefix: &[0x52, 0x61, 0x72, 0x21] },
    MagicEntry { label: "7-Zip Archive", prefix: &[0x37, 0x7A, 0xBC, 0xAF] },
    MagicEntry { label: "GZIP Archive", prefix: &[0x1F, 0x8B, 0x08] },
    MagicEntry { label: "XZ Archive", prefix: &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00] },
    MagicEntry { label: "Zstandard Archive", prefix: &[0x28, 0xB5, 0x2F, 0xFD] },
    MagicEntry { label: "BZIP2 Archive", prefix: b"BZh" },

    // Audio & video
    MagicEntry { label: "MP3 Audio", prefix: b"ID3" },
    MagicEntry { label: "MP3 Audio (no ID3)", prefix: &[0xFF, 0xFB] },
    MagicEntry { label: "MP4/MOV Video", prefix: b"ftyp" },
    MagicEntry { label: "WAV/AVI/WebP", prefix: b"RIFF" },
    MagicEntry { label: "OGG Media", prefix: b"OggS" },
    MagicEntry { label: "FLAC Audio", prefix: b"fLaC" },

    // Executables
    MagicEntry { label: "ELF Executable", prefix: b"\x7fELF" },
    MagicEntry { label: "PE Executable", prefix: b"MZ" },
    MagicEntry { label: "Mach-O Executable (64-bit)", prefix: &[0xCF, 0xFA, 0xED, 0xFE] },
    MagicEntry { label: "Mach-O Executable (32-bit)", prefix: &[0xCE, 0xFA, 0xED, 0xFE] },
    MagicEntry { label: "Java Class", prefix: &[0xCA, 0xFE, 0xBA, 0xBE] },
    MagicEntry { label: "WebAssembly Module", prefix: &[0x00, 0x61, 0x73, 0x6D] },
];

/// First table entry whose prefix matches the start of `window`.
pub fn detect(window: &[u8]) -> Option<&'static MagicEntry> {
    MAGIC_TABLE.iter().find(|entry| window.starts_with(entry.prefix))
}

/// Type label for the start of `window`, or `"Unknown"`.
///
/// Only the prefix matters: trailing bytes and total length are irrelevant
/// as long as the window covers the matching prefix.
pub fn detect_type(window: &[u8]) -> &'static str {
    detect(window).map_or(UNKNOWN_TYPE, |entry| entry.label)
}

/// The first `window` bytes as upper-case space-separated hex pairs.
pub fn signature_hex(data: &[u8], window: usize) -> String {
    hex_bytes(&data[..data.len().min(window)])
}

/// A carvable format: header and footer delimit an embedded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub header: &'static [u8],
    pub footer: &'static [u8],
    pub extension: &'static str,
    pub mime: &'static str,
}

/// Built-in carving catalog, searched in this order.
pub static CARVE_SIGNATURES: &[Signature] = &[
    Signature {
        name: "JPEG",
        header: &[0xFF, 0xD8, 0xFF],
        footer: &[0xFF, 0xD9],
        extension: "jpg",
        mime: "image/jpeg",
    },
    Signature {
        name: "PNG",
        header: &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        // IEND chunk type + CRC
        footer: &[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82],
        extension: "png",
        mime: "image/png",
    },
    Signature {
        name: "GIF",
        header: b"GIF8",
        footer: &[0x00, 0x3B],
        extension: "gif",
        mime: "image/gif",
    },
    Signature {
        name: "PDF",
        header: b"%PDF",
        footer: b"%%EOF",
        extension: "pdf",
        mime: "application/pdf",
    },
    Signature {
        name: "ZIP",
        header: b"PK\x03\x04",
        // end of central directory record
        footer: b"PK\x05\x06",
        extension: "zip",
        mime: "application/zip",
    },
];

/// Look up a carve signature by name.
pub fn carve_signature(name: &str) -> Option<&'static Signature> {
    CARVE_SIGNATURES.iter().find(|s| s.name == name)
}

/// Every greedy, non-overlapping `header ... footer` span in `data`.
///
/// From a cursor starting at 0: find the next header at or after the cursor,
/// then the nearest footer after the header's end. A header with no footer
/// after it is abandoned. Each emitted span is `[header_start, footer_end)`
/// and the cursor resumes at `footer_end`, so consumed bytes are never
/// rescanned. An empty header or footer never matches.
pub fn find_occurrences(data: &[u8], header: &[u8], footer: &[u8]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    if header.is_empty() || footer.is_empty() {
        return spans;
    }

    let mut cursor = 0;
    while cursor < data.len() {
        let Some(start) = find_from(data, header, cursor) else {
            break;
        };
        let body = start + header.len();
        let Some(footer_start) = find_from(data, footer, body) else {
            // No footer past this header means none past any later header
            // either: every later search would start further right.
            break;
        };
        let end = footer_start + footer.len();
        spans.push(start..end);
        cursor = end;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_jpeg_regardless_of_tail() {
        assert_eq!(detect_type(&[0xFF, 0xD8, 0xFF]), "JPEG Image");
        assert_eq!(detect_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46]), "JPEG Image");
        let mut long = vec![0xFF, 0xD8, 0xFF];
        long.extend(vec![0x00; 10_000]);
        assert_eq!(detect_type(&long), "JPEG Image");
    }

    #[test]
    fn detect_common_types() {
        assert_eq!(detect_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]), "PNG Image");
        assert_eq!(detect_type(b"%PDF-1.7"), "PDF Document");
        assert_eq!(detect_type(b"PK\x03\x04\x14\x00"), "ZIP Archive");
        assert_eq!(detect_type(b"PK\x05\x06"), "ZIP Archive (empty)");
        assert_eq!(detect_type(b"BM\x36\x00"), "BMP Image");
        assert_eq!(detect_type(b"ID3\x04"), "MP3 Audio");
        assert_eq!(detect_type(b"\x7fELF\x02\x01"), "ELF Executable");
        assert_eq!(detect_type(b"SQLite format 3\x00"), "SQLite Database");
    }

    #[test]
    fn longer_prefix_wins_over_generic() {
        assert_eq!(detect_type(b"Rar!\x1a\x07\x01\x00"), "RAR Archive (v5)");
        assert_eq!(detect_type(b"Rar!\x1a\x07\x00"), "RAR Archive");
    }

    #[test]
    fn detect_unknown_and_truncated() {
        assert_eq!(detect_type(&[0xAA; 8]), UNKNOWN_TYPE);
        assert_eq!(detect_type(&[]), UNKNOWN_TYPE);
        // window shorter than the prefix cannot match
        assert_eq!(detect_type(&[0xFF, 0xD8]), UNKNOWN_TYPE);
    }

    #[test]
    fn table_prefixes_fit_window() {
        for entry in MAGIC_TABLE {
            assert!(!entry.prefix.is_empty(), "{}", entry.label);
            assert!(entry.prefix.len() <= SAMPLE_WINDOW, "{}", entry.label);
        }
    }

    #[test]
    fn no_entry_is_shadowed_by_an_earlier_one() {
        for (j, later) in MAGIC_TABLE.iter().enumerate() {
            for earlier in &MAGIC_TABLE[..j] {
                assert!(
                    !later.prefix.starts_with(earlier.prefix),
                    "{} is shadowed by {}",
                    later.label,
                    earlier.label
                );
            }
        }
    }

    #[test]
    fn every_entry_detects_itself() {
        for entry in MAGIC_TABLE {
            assert_eq!(detect_type(entry.prefix), entry.label);
        }
    }

    #[test]
    fn signature_hex_window() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        assert_eq!(signature_hex(&data, SAMPLE_WINDOW), "FF D8 FF E0 00 10 4A 46");
        assert_eq!(signature_hex(&data[..2], SAMPLE_WINDOW), "FF D8");
        assert_eq!(signature_hex(&[], SAMPLE_WINDOW), "");
    }

    #[test]
    fn carve_signature_lookup() {
        assert_eq!(carve_signature("PDF").map(|s| s.extension), Some("pdf"));
        assert!(carve_signature("TAR").is_none());
    }

    #[test]
    fn occurrences_single_span() {
        let data = b"..HDR..body..FTR..";
        assert_eq!(find_occurrences(data, b"HDR", b"FTR"), vec![2..16]);
    }

    #[test]
    fn occurrences_header_immediately_followed_by_footer() {
        assert_eq!(find_occurrences(b"HDRFTR", b"HDR", b"FTR"), vec![0..6]);
    }

    #[test]
    fn occurrences_nearest_footer_and_cursor_resume() {
        // H1 H2 F1 F2: H1 resolves to F1, the cursor resumes after F1 so H2
        // (inside the consumed span) is never reported.
        let data = b"H..H..F..F";
        assert_eq!(find_occurrences(data, b"H", b"F"), vec![0..7]);

        // A header after the first footer starts a fresh span.
        let data = b"H.F.H..F";
        assert_eq!(find_occurrences(data, b"H", b"F"), vec![0..3, 4..8]);
    }

    #[test]
    fn occurrences_footer_must_follow_header_end() {
        // The footer overlapping the header itself does not count.
        assert!(find_occurrences(b"ABC", b"AB", b"BC").is_empty());
        assert_eq!(find_occurrences(b"ABBC", b"AB", b"BC"), vec![0..4]);
    }

    #[test]
    fn occurrences_unterminated_header_abandoned() {
        assert!(find_occurrences(b"..HDR....", b"HDR", b"FTR").is_empty());
        assert_eq!(find_occurrences(b"HDR.FTR.HDR..", b"HDR", b"FTR"), vec![0..7]);
    }

    #[test]
    fn occurrences_degenerate() {
        assert!(find_occurrences(b"", b"H", b"F").is_empty());
        assert!(find_occurrences(b"HF", b"", b"F").is_empty());
        assert!(find_occurrences(b"HF", b"H", b"").is_empty());
    }
}
