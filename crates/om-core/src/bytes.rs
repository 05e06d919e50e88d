//! Byte-level classification used by the string extractor and histogram.

/// Lowest printable ASCII byte (space).
pub const PRINTABLE_MIN: u8 = 0x20;
/// Highest printable ASCII byte (`~`).
pub const PRINTABLE_MAX: u8 = 0x7E;

/// True for bytes in the printable ASCII range `[0x20, 0x7E]`.
///
/// Tab, CR and LF are *not* printable here: they terminate a string run.
#[inline]
pub fn is_printable(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

/// Iterator over maximal runs of printable bytes, yielding `(offset, run)`.
///
/// Every run is maximal: the byte before it (if any) and the byte after it
/// (if any) are non-printable.
pub struct PrintableRuns<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PrintableRuns<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for PrintableRuns<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        let skip = rest.iter().position(|&b| is_printable(b))?;
        let start = self.pos + skip;
        let len = self.data[start..]
            .iter()
            .position(|&b| !is_printable(b))
            .unwrap_or(self.data.len() - start);
        self.pos = start + len;
        Some((start, &self.data[start..start + len]))
    }
}
