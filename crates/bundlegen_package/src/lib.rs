//! # bundlegen_package
//!
//! A library for packaging an unpacked application file system tree into a
//! distributable bundle for RDK set-top-box platforms.
//!
//! Three formats are supported:
//!
//! - `.tar.gz`: a gzip compressed tarball of the tree
//! - `.ipk`: an opkg style composite of `data.tar.gz`, `control.tar.gz` and
//!   `debian-binary`
//! - `.wgt`: a zipped widget that is signed by an external signing tool
//!
//! Ownership and permissions of the archived entries can be overridden with an
//! [`OwnershipPolicy`].
//!
//! ## Examples
//!
//! ```rust,no_run
//! use bundlegen_package::{create_tarball, OwnershipPolicy, TarballOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = TarballOptions::default()
//!     .with_ownership(OwnershipPolicy::new().with_uid(0).with_gid(0));
//!
//! let output = create_tarball(Path::new("/work/bundle"), Path::new("/out/bundle"), &options)?;
//! assert!(output.ends_with("bundle.tar.gz"));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod archiver;
pub mod control;
pub mod error;
pub mod ipk;
pub mod ownership;
pub mod process;
pub mod tarball;
pub mod widget;

mod scratch;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

// Re-export main types
pub use archiver::{ArchiveEntry, EntryKind, TreeArchiver};
pub use control::{AppMetadata, ControlManifest, PlatformArch};
pub use error::{PackageError, Result};
pub use ipk::create_ipk;
pub use ownership::{ModeMask, OwnershipPolicy};
pub use tarball::{TarballOptions, create_tarball};
pub use widget::{WidgetConfig, create_widget};

/// Archive type of the produced bundle
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// .tar.gz format
    #[default]
    TarGz,
    /// .ipk format (opkg)
    Ipk,
    /// .wgt format (signed widget)
    Widget,
}

impl ArchiveType {
    /// Get the file extension for this archive type
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveType::TarGz => ".tar.gz",
            ArchiveType::Ipk => ".ipk",
            ArchiveType::Widget => ".wgt",
        }
    }

    /// Append the extension to `dest` unless it already ends with it
    pub fn output_path(&self, dest: &Path) -> PathBuf {
        if dest.to_string_lossy().ends_with(self.extension()) {
            return dest.to_path_buf();
        }
        let mut name = OsString::from(dest.as_os_str());
        name.push(self.extension());
        PathBuf::from(name)
    }
}

/// Fail with [`PackageError::SourceNotFound`] when `source` is not a directory
pub(crate) fn ensure_source_dir(source: &Path) -> Result<PathBuf> {
    if !source.is_dir() {
        tracing::error!(
            "Cannot create bundle - source directory {} does not exist",
            source.display()
        );
        return Err(PackageError::SourceNotFound(source.to_path_buf()));
    }
    Ok(std::path::absolute(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ArchiveType::TarGz, "out/bundle", "out/bundle.tar.gz")]
    #[case(ArchiveType::TarGz, "out/bundle.tar.gz", "out/bundle.tar.gz")]
    #[case(ArchiveType::TarGz, "out/bundle.gz", "out/bundle.gz.tar.gz")]
    #[case(ArchiveType::Ipk, "/tmp/app", "/tmp/app.ipk")]
    #[case(ArchiveType::Ipk, "/tmp/app.ipk", "/tmp/app.ipk")]
    #[case(ArchiveType::Widget, "app", "app.wgt")]
    #[case(ArchiveType::Widget, "app.wgt", "app.wgt")]
    fn test_output_path(
        #[case] archive_type: ArchiveType,
        #[case] dest: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            archive_type.output_path(Path::new(dest)),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn test_ensure_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = ensure_source_dir(dir.path()).unwrap();
        assert!(source.is_absolute());

        assert!(matches!(
            ensure_source_dir(&dir.path().join("missing")),
            Err(PackageError::SourceNotFound(_))
        ));
    }
}
