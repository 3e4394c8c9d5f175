//! Errors of the bundle level operations

use std::path::PathBuf;

use bundlegen_package::PackageError;
use miette::Diagnostic;
use thiserror::Error;

/// An error that can occur while configuring or creating a bundle
#[allow(missing_docs)]
#[derive(Debug, Error, Diagnostic)]
pub enum BundleError {
    #[error(transparent)]
    #[diagnostic(code(bundlegen::package))]
    Package(#[from] PackageError),

    #[error("Could not parse configuration: {0}")]
    #[diagnostic(
        code(bundlegen::configuration),
        help("supported keys are `temp_root`, `compression_level`, `[ownership]` and `[widget]`")
    )]
    InvalidConfiguration(#[from] toml::de::Error),

    #[error("Invalid gzip compression level {0}")]
    #[diagnostic(help("use a level between 0 (no compression) and 9 (best compression)"))]
    InvalidCompressionLevel(u32),

    #[error("Cannot find app metadata file in the bundle ({0}) and none was provided")]
    #[diagnostic(help(
        "embed `rootfs/appmetadata.json` in the image or pass the path of a metadata file"
    ))]
    MetadataNotFound(PathBuf),

    #[error("App metadata file {0} does not exist")]
    MetadataFileMissing(PathBuf),

    #[error("Could not parse JSON file ({0}): {1}")]
    InvalidJson(PathBuf, serde_json::Error),

    #[error("Widget bundles need a `[widget]` section in the configuration")]
    #[diagnostic(help("set `widget.resources_dir` to the directory holding the signing tool"))]
    WidgetNotConfigured,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
