//! Hex rendering shared by every consumer of raw bytes: dumps, diff context,
//! signature prefixes.

use std::fmt::Write;

/// Layout parameters for a hex dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexFormat {
    /// Minimum digits in the offset column.
    pub offset_width: usize,
    pub bytes_per_row: usize,
    /// Extra space after every `group_size` bytes; 0 disables grouping.
    pub group_size: usize,
    /// Stand-in for non-printable bytes in the ASCII column.
    pub fallback: char,
    pub uppercase: bool,
}

impl Default for HexFormat {
    fn default() -> Self {
        Self {
            offset_width: 8,
            bytes_per_row: 16,
            group_size: 8,
            fallback: '.',
            uppercase: true,
        }
    }
}

/// A formatted hex row split into its three visual parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexLine {
    pub offset: String,
    pub hex: String,
    pub ascii: String,
}

impl std::fmt::Display for HexLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} {}", self.offset, self.hex, self.ascii)
    }
}

impl HexFormat {
    fn push_byte(&self, out: &mut String, byte: u8) {
        // write! into a String cannot fail
        let _ = if self.uppercase {
            write!(out, "{:02X}", byte)
        } else {
            write!(out, "{:02x}", byte)
        };
    }

    /// Format one row. `data` longer than `bytes_per_row` is truncated;
    /// shorter rows are padded so columns stay aligned.
    pub fn format_row(&self, byte_offset: u64, data: &[u8]) -> HexLine {
        let per_row = self.bytes_per_row.max(1);
        let data = &data[..data.len().min(per_row)];

        let mut offset = String::with_capacity(self.offset_width + 2);
        let _ = if self.uppercase {
            write!(offset, "{:0width$X}  ", byte_offset, width = self.offset_width)
        } else {
            write!(offset, "{:0width$x}  ", byte_offset, width = self.offset_width)
        };

        let mut hex = String::with_capacity(per_row * 3 + per_row / 8);
        for j in 0..per_row {
            match data.get(j) {
                Some(&b) => {
                    self.push_byte(&mut hex, b);
                    hex.push(' ');
                }
                None => hex.push_str("   "),
            }
            if self.group_size > 0 && (j + 1) % self.group_size == 0 && j + 1 < per_row {
                hex.push(' ');
            }
        }

        let mut ascii = String::with_capacity(per_row + 2);
        ascii.push('|');
        for &b in data {
            if b.is_ascii_graphic() || b == b' ' {
                ascii.push(b as char);
            } else {
                ascii.push(self.fallback);
            }
        }
        for _ in data.len()..per_row {
            ascii.push(' ');
        }
        ascii.push('|');

        HexLine { offset, hex, ascii }
    }

    /// Every row of `data`, with offsets starting at `base_offset`.
    pub fn lines(&self, base_offset: u64, data: &[u8]) -> Vec<HexLine> {
        let per_row = self.bytes_per_row.max(1);
        data.chunks(per_row)
            .enumerate()
            .map(|(i, row)| self.format_row(base_offset + (i * per_row) as u64, row))
            .collect()
    }

    /// Full dump, one row per line.
    pub fn dump(&self, base_offset: u64, data: &[u8]) -> String {
        let mut out = String::new();
        for line in self.lines(base_offset, data) {
            let _ = writeln!(out, "{line}");
        }
        out
    }
}

/// Upper-case two-digit hex for one byte.
pub fn hex_pair(byte: u8) -> String {
    format!("{:02X}", byte)
}

/// Upper-case hex pairs joined by single spaces, e.g. `"FF D8 FF"`.
pub fn hex_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, &b) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", b);
    }
    out
}

/// `0x`-prefixed upper-case offset, e.g. `0x1F40`.
pub fn hex_offset(offset: u64) -> String {
    format!("0x{:X}", offset)
}

/// Format a byte offset for display, with a size hint past 1 MiB.
pub fn format_offset(offset: u64) -> String {
    if offset >= 1 << 30 {
        format!("0x{:X} ({:.1} GB)", offset, offset as f64 / (1u64 << 30) as f64)
    } else if offset >= 1 << 20 {
        format!("0x{:X} ({:.1} MB)", offset, offset as f64 / (1u64 << 20) as f64)
    } else {
        format!("0x{:X}", offset)
    }
}

/// Parse an offset string: "0xFF00", "FF00", "1024" (decimal).
pub fn parse_offset(input: &str) -> Option<u64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if s.chars().all(|c| c.is_ascii_hexdigit()) && s.chars().any(|c| c.is_ascii_alphabetic()) {
        // letters present → hex
        u64::from_str_radix(s, 16).ok()
    } else {
        s.parse::<u64>().ok()
    }
}

/// Parse a hex byte string such as `"FF D8 FF"`, `"ffd8ff"` or `"0xFF,0xD8"`.
///
/// Separators (whitespace, `,`, `:`, `-`) and `0x` prefixes are ignored.
/// Returns `None` for an odd digit count, stray characters or empty input.
pub fn parse_hex_bytes(input: &str) -> Option<Vec<u8>> {
    let cleaned: String = input
        .replace("0x", "")
        .replace("0X", "")
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | ':' | '-'))
        .collect();

    if cleaned.is_empty()
        || cleaned.len() % 2 != 0
        || !cleaned.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }

    (0..cleaned.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(cleaned.get(i..i + 2)?, 16).ok())
        .collect()
}
