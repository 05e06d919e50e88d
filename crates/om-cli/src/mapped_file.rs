use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::Mmap;
use om_core::FileRegion;

/// Read-only evidence file, memory-mapped so engines borrow its bytes
/// without a copy.
pub struct MappedFile {
    path: PathBuf,
    // None for an empty file: mapping zero bytes is an error on some platforms.
    mmap: Option<Mmap>,
}

impl MappedFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let len = file
            .metadata()
            .with_context(|| format!("failed to read metadata for {}", path.display()))?
            .len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the file must not be modified externally while mapped.
            let mmap = unsafe { Mmap::map(&file) }
                .with_context(|| format!("failed to mmap {}", path.display()))?;
            Some(mmap)
        };

        log::debug!("mapped {} ({} bytes)", path.display(), len);
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for reports, falling back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn len(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// The whole file.
    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Bytes covered by `region`, clipped at end of file.
    pub fn slice(&self, region: FileRegion) -> &[u8] {
        region.slice(self.bytes())
    }

    pub fn slice_at(&self, offset: u64, len: u64) -> &[u8] {
        self.slice(FileRegion::new(offset, len))
    }
}
