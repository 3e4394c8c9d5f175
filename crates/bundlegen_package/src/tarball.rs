//! `.tar.gz` bundles

use std::path::{Path, PathBuf};

use crate::archiver::{TarGzWriter, TreeArchiver};
use crate::ownership::OwnershipPolicy;
use crate::{ArchiveType, Result, ensure_source_dir};

/// Name of the archive root. The contents of the source directory are placed
/// directly at the top level of the tarball.
pub const ARCHIVE_ROOT: &str = ".";

/// Options for creating a tarball
#[derive(Debug, Clone)]
pub struct TarballOptions {
    /// Ownership override applied to every entry
    pub ownership: OwnershipPolicy,

    /// Gzip compression level (0-9)
    pub compression_level: u32,
}

impl Default for TarballOptions {
    fn default() -> Self {
        Self {
            ownership: OwnershipPolicy::default(),
            compression_level: crate::archiver::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl TarballOptions {
    /// Set the ownership policy
    pub fn with_ownership(mut self, ownership: OwnershipPolicy) -> Self {
        self.ownership = ownership;
        self
    }

    /// Set the compression level
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }
}

/// Create a `.tar.gz` of the `source` directory.
///
/// The output is written to `dest` with `.tar.gz` appended unless it already
/// carries that suffix. An existing file at the output path is replaced.
/// Returns the path of the written archive.
pub fn create_tarball(source: &Path, dest: &Path, options: &TarballOptions) -> Result<PathBuf> {
    let output_path = ArchiveType::TarGz.output_path(dest);
    tracing::info!(
        "Creating tgz of {} as {}",
        source.display(),
        output_path.display()
    );

    let source = ensure_source_dir(source)?;
    write_tarball(&source, &output_path, options)?;

    Ok(output_path)
}

/// Write the tarball of an existing source directory to exactly `output_path`
pub(crate) fn write_tarball(
    source: &Path,
    output_path: &Path,
    options: &TarballOptions,
) -> Result<()> {
    let writer = TarGzWriter::new(options.compression_level);
    if options.ownership.is_empty() {
        tracing::debug!("Keeping ownership and permissions found on disk");
    }
    writer.write(output_path, |builder| {
        let count = TreeArchiver::new(source, ARCHIVE_ROOT)
            .with_policy(options.ownership)
            .append_to(builder)?;
        tracing::debug!("Archived {} entries", count);
        Ok(())
    })
}
