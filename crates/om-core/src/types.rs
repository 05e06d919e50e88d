use serde::Serialize;

/// A byte range within a buffer, defined by offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FileRegion {
    pub offset: u64,
    pub length: u64,
}

impl FileRegion {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Region spanning `[start, end)`. An inverted range yields an empty region at `start`.
    pub fn from_bounds(start: u64, end: u64) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    /// Returns the exclusive end offset of this region.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns true if this region overlaps with `other`.
    pub fn overlaps(&self, other: &FileRegion) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// Returns true if this region fully contains `other`.
    pub fn contains(&self, other: &FileRegion) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }

    /// Borrow the bytes this region covers, clipped to `data`.
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        let len = data.len() as u64;
        let start = self.offset.min(len) as usize;
        let end = self.end().min(len) as usize;
        &data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_end() {
        assert_eq!(FileRegion::new(10, 20).end(), 30);
    }

    #[test]
    fn region_end_saturates() {
        let r = FileRegion::new(u64::MAX - 5, 10);
        assert_eq!(r.end(), u64::MAX);
    }

    #[test]
    fn region_from_bounds() {
        assert_eq!(FileRegion::from_bounds(4, 12), FileRegion::new(4, 8));
        assert!(FileRegion::from_bounds(12, 4).is_empty());
    }

    #[test]
    fn region_overlaps_partial() {
        let a = FileRegion::new(0, 10);
        let b = FileRegion::new(5, 10);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn region_no_overlap_adjacent() {
        let a = FileRegion::new(0, 10);
        let b = FileRegion::new(10, 10);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn region_contains() {
        let outer = FileRegion::new(0, 100);
        let inner = FileRegion::new(10, 20);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.contains(&inner));
    }

    #[test]
    fn slice_is_clipped() {
        let data = b"ABCDEFGH";
        assert_eq!(FileRegion::new(2, 3).slice(data), b"CDE");
        assert_eq!(FileRegion::new(6, 100).slice(data), b"GH");
        assert!(FileRegion::new(100, 4).slice(data).is_empty());
    }
}
