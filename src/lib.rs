//! # bundlegen
//!
//! The packaging stage of the RDK bundle generator. Turns a processed OCI
//! bundle directory into one distributable artifact: a `.tar.gz`, an opkg
//! `.ipk` or a signed `.wgt` widget.
//!
//! The archive formats themselves live in [`bundlegen_package`]; this crate
//! adds the configuration file, app metadata lookup and logging setup.
//!
//! ```rust,no_run
//! use bundlegen::{BundleFormat, BundleRequest, create_bundle};
//! use bundlegen::metadata::{PlatformConfig, load_app_metadata};
//! use bundlegen::tool_configuration::Configuration;
//! use std::path::Path;
//!
//! # fn main() -> miette::Result<()> {
//! bundlegen::console_utils::init_logging(0);
//!
//! let config = Configuration::from_path(Path::new("bundlegen.toml"))?;
//! let bundle_dir = Path::new("/work/com.rdk.app");
//! let request = BundleRequest {
//!     bundle_dir: bundle_dir.to_path_buf(),
//!     output: bundle_dir.to_path_buf(),
//!     format: BundleFormat::Ipk,
//!     app_metadata: load_app_metadata(bundle_dir, None)?,
//!     platform: PlatformConfig::from_path(Path::new("rpi3.json"))?,
//! };
//! let output = create_bundle(&config, &request)?;
//! println!("{}", output.display());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod console_utils;
pub mod error;
pub mod metadata;
pub mod tool_configuration;

use std::path::PathBuf;

use bundlegen_package::{
    AppMetadata, ArchiveType, ControlManifest, create_ipk, create_tarball, create_widget,
};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use bundlegen_package;
pub use error::BundleError;

use metadata::PlatformConfig;
use tool_configuration::Configuration;

/// The kind of artifact to produce
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum BundleFormat {
    /// Gzip compressed tarball
    #[default]
    #[strum(to_string = "tar.gz", serialize = "tgz")]
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    /// opkg package
    #[strum(to_string = "ipk")]
    #[serde(rename = "ipk")]
    Ipk,
    /// Signed widget
    #[strum(to_string = "wgt", serialize = "widget")]
    #[serde(rename = "wgt", alias = "widget")]
    Widget,
}

impl From<BundleFormat> for ArchiveType {
    fn from(value: BundleFormat) -> Self {
        match value {
            BundleFormat::TarGz => ArchiveType::TarGz,
            BundleFormat::Ipk => ArchiveType::Ipk,
            BundleFormat::Widget => ArchiveType::Widget,
        }
    }
}

/// What to package and where to put it
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// The processed bundle directory
    pub bundle_dir: PathBuf,

    /// Output path, the format's extension is appended if missing
    pub output: PathBuf,

    /// The artifact format
    pub format: BundleFormat,

    /// App metadata, used for the control manifest of `.ipk` bundles
    pub app_metadata: AppMetadata,

    /// Target platform, used for the control manifest of `.ipk` bundles
    pub platform: PlatformConfig,
}

/// Package a bundle directory and return the path of the created artifact
pub fn create_bundle(
    config: &Configuration,
    request: &BundleRequest,
) -> Result<PathBuf, BundleError> {
    let output = match request.format {
        BundleFormat::TarGz => create_tarball(
            &request.bundle_dir,
            &request.output,
            &config.tarball_options(),
        )?,
        BundleFormat::Ipk => {
            fs::create_dir_all(&config.temp_root)?;
            let control_dir = tempfile::Builder::new()
                .prefix("control-")
                .tempdir_in(&config.temp_root)?;
            let manifest = ControlManifest::from_metadata(
                &request.app_metadata,
                request.platform.platform_arch().as_ref(),
            );
            let control_file = manifest.write(control_dir.path())?;
            create_ipk(
                &request.bundle_dir,
                &request.output,
                &control_file,
                &config.tarball_options(),
            )?
        }
        BundleFormat::Widget => {
            let widget_config = config
                .widget_config()
                .ok_or(BundleError::WidgetNotConfigured)?;
            create_widget(&request.bundle_dir, &request.output, &widget_config)?
        }
    };

    tracing::info!("Successfully generated bundle at {}", output.display());
    Ok(output)
}
