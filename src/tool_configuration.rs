//! Configuration for the bundlegen packaging stage.
//!
//! Read from a TOML file, every key is optional:
//!
//! ```toml
//! temp_root = "/tmp/bundlegen"
//! compression_level = 6
//!
//! [ownership]
//! uid = 0
//! gid = 0
//! mode_mask = "770"
//!
//! [widget]
//! resources_dir = "/usr/share/bundlegen/resources"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bundlegen_package::{OwnershipPolicy, TarballOptions, WidgetConfig};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::BundleError;

/// Default root for scratch directories
pub const DEFAULT_TEMP_ROOT: &str = "/tmp/bundlegen";

/// Highest gzip compression level
const MAX_COMPRESSION_LEVEL: u32 = 9;

fn default_openssl_conf() -> PathBuf {
    PathBuf::from("/dev/null")
}

/// Global configuration for creating bundles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Root under which scratch directories are created
    pub temp_root: PathBuf,

    /// Gzip compression level for `.tar.gz` and `.ipk` bundles
    pub compression_level: u32,

    /// Ownership override applied to archived entries
    pub ownership: OwnershipPolicy,

    /// Signing setup for `.wgt` bundles
    pub widget: Option<WidgetSettings>,
}

/// The `[widget]` section of the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetSettings {
    /// Directory holding `config.xml`, `icon.png`, the signer and the
    /// certificate
    pub resources_dir: PathBuf,

    /// Signing tool, defaults to the one in `resources_dir`
    #[serde(default)]
    pub signer: Option<PathBuf>,

    /// Signing certificate, defaults to the one in `resources_dir`
    #[serde(default)]
    pub certificate: Option<PathBuf>,

    /// `OPENSSL_CONF` for the signer
    #[serde(default = "default_openssl_conf")]
    pub openssl_conf: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            temp_root: PathBuf::from(DEFAULT_TEMP_ROOT),
            compression_level: TarballOptions::default().compression_level,
            ownership: OwnershipPolicy::default(),
            widget: None,
        }
    }
}

impl FromStr for Configuration {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Configuration = toml::from_str(s)?;
        if config.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(BundleError::InvalidCompressionLevel(config.compression_level));
        }
        Ok(config)
    }
}

impl Configuration {
    /// Load the configuration from a TOML file
    pub fn from_path(path: &Path) -> Result<Self, BundleError> {
        tracing::debug!("Loading configuration from {}", path.display());
        fs::read_to_string(path)?.parse()
    }

    /// Options for the tarball and ipk packagers
    pub fn tarball_options(&self) -> TarballOptions {
        TarballOptions::default()
            .with_ownership(self.ownership)
            .with_compression_level(self.compression_level)
    }

    /// Options for the widget packager, `None` without a `[widget]` section
    pub fn widget_config(&self) -> Option<WidgetConfig> {
        let settings = self.widget.as_ref()?;
        let mut config = WidgetConfig::from_resources_dir(&settings.resources_dir)
            .with_temp_root(&self.temp_root);
        if let Some(signer) = &settings.signer {
            config.signer = signer.clone();
        }
        if let Some(certificate) = &settings.certificate {
            config.certificate = certificate.clone();
        }
        config.openssl_conf = settings.openssl_conf.clone();
        Some(config)
    }
}
