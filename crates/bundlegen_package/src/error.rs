//! Error types for the bundlegen_package crate

use std::path::PathBuf;
use std::process::ExitStatus;

/// Result type alias using PackageError
pub type Result<T> = std::result::Result<T, PackageError>;

/// Errors that can occur during bundle packaging
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The directory to package does not exist
    #[error("Source directory does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// An external program (e.g. the widget signer) exited unsuccessfully
    #[error("`{program}` failed with {status}")]
    ExternalProcess {
        /// The program that was run
        program: String,
        /// Its exit status
        status: ExitStatus,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WalkDir error
    #[error("Failed to walk directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Zip error
    #[error("Failed to write zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to strip prefix from path
    #[error("Could not strip prefix from path: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Mode mask is not a valid octal permission mask
    #[error("Invalid mode mask '{0}': expected an octal value like 770")]
    InvalidModeMask(String),

    /// The control manifest has not been written before building an ipk
    #[error("Control file not found: {0} (write the control manifest first)")]
    ControlFileMissing(PathBuf),

    /// A static widget resource is missing
    #[error("Widget resource not found: {0}")]
    ResourceMissing(PathBuf),
}
