//! Gzip compressed tar writer

use std::fs::File;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use fs_err as fs;
use tempfile::NamedTempFile;

use crate::Result;

/// Default gzip compression level
pub(crate) const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Writer for `.tar.gz` archives.
///
/// The archive is written to a temporary file next to the output path and only
/// renamed into place once it is complete.
pub(crate) struct TarGzWriter {
    /// Compression level (0-9)
    compression_level: u32,
}

impl TarGzWriter {
    /// Create a new TarGzWriter
    pub fn new(compression_level: u32) -> Self {
        Self {
            compression_level: compression_level.min(9),
        }
    }

    /// Write an archive to `output_path`, `fill` adds the entries
    pub fn write<F>(&self, output_path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut tar::Builder<GzEncoder<&File>>) -> Result<()>,
    {
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        if output_path.exists() {
            tracing::debug!("Removing existing {}", output_path.display());
            fs::remove_file(output_path)?;
        }

        let temp_file = NamedTempFile::new_in(parent)?;
        {
            let encoder = GzEncoder::new(
                temp_file.as_file(),
                Compression::new(self.compression_level),
            );
            let mut builder = tar::Builder::new(encoder);
            builder.follow_symlinks(false);

            fill(&mut builder)?;

            builder.into_inner()?.finish()?;
        }

        temp_file
            .persist(output_path)
            .map_err(|e| e.error)?;

        Ok(())
    }
}
