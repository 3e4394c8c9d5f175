//! App metadata and platform records that feed the control manifest

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bundlegen_package::{AppMetadata, PlatformArch};
use fs_err as fs;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::BundleError;

/// Location of the app metadata inside an unpacked bundle
pub const EMBEDDED_METADATA_PATH: &str = "rootfs/appmetadata.json";

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, BundleError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| BundleError::InvalidJson(path.to_path_buf(), e))
}

/// Load the app metadata of the bundle in `bundle_dir`.
///
/// The metadata is either embedded in the image at
/// [`EMBEDDED_METADATA_PATH`] or given as a separate file with `custom`. When
/// both exist the separate file is used. The embedded file does not belong
/// into the final bundle, so it is removed from the rootfs once loaded.
pub fn load_app_metadata(
    bundle_dir: &Path,
    custom: Option<&Path>,
) -> Result<AppMetadata, BundleError> {
    let embedded = embedded_metadata_path(bundle_dir);
    let embedded_exists = embedded.is_file();

    let metadata_file = match custom {
        Some(custom) => {
            if !custom.is_file() {
                return Err(BundleError::MetadataFileMissing(custom.to_path_buf()));
            }
            if embedded_exists {
                tracing::warn!(
                    "Metadata found in image, but custom metadata provided. Using {}",
                    custom.display()
                );
            }
            custom
        }
        None if embedded_exists => embedded.as_path(),
        None => return Err(BundleError::MetadataNotFound(embedded)),
    };

    tracing::debug!("Loading metadata from {}", metadata_file.display());
    let metadata = read_json(metadata_file)?;

    if embedded_exists {
        fs::remove_file(&embedded)?;
    }

    Ok(metadata)
}

/// The `arch` object of a platform record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchConfig {
    /// Base architecture, e.g. `arm`
    #[serde(default)]
    pub arch: Option<String>,

    /// Architecture variant, e.g. `v7`
    #[serde(default)]
    pub variant: Option<String>,
}

/// A platform record. Only the architecture is used for packaging, all other
/// keys are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Target architecture
    #[serde(default)]
    pub arch: Option<ArchConfig>,

    /// Everything else in the record
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PlatformConfig {
    /// Read a platform record from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, BundleError> {
        read_json(path)
    }

    /// The architecture for the control manifest, if the record has one
    pub fn platform_arch(&self) -> Option<PlatformArch> {
        self.arch.clone().map(PlatformArch::from)
    }
}

impl From<ArchConfig> for PlatformArch {
    fn from(value: ArchConfig) -> Self {
        PlatformArch {
            arch: value.arch,
            variant: value.variant,
        }
    }
}

/// Path of the embedded metadata file of `bundle_dir`
pub fn embedded_metadata_path(bundle_dir: &Path) -> PathBuf {
    bundle_dir.join(EMBEDDED_METADATA_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bundle_with_embedded(id: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("rootfs")).unwrap();
        fs::write(
            embedded_metadata_path(dir.path()),
            format!(r#"{{"id": "{id}", "version": "1.0.0"}}"#),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_embedded_metadata_is_loaded_and_removed() {
        let bundle = bundle_with_embedded("com.rdk.embedded");

        let metadata = load_app_metadata(bundle.path(), None).unwrap();

        assert_eq!(metadata.id.as_deref(), Some("com.rdk.embedded"));
        assert_eq!(metadata.version.as_deref(), Some("1.0.0"));
        assert!(!embedded_metadata_path(bundle.path()).exists());
    }

    #[test]
    fn test_custom_metadata_wins() {
        let bundle = bundle_with_embedded("com.rdk.embedded");
        let custom = bundle.path().join("custom.json");
        fs::write(&custom, r#"{"id": "com.rdk.custom"}"#).unwrap();

        let metadata = load_app_metadata(bundle.path(), Some(&custom)).unwrap();

        assert_eq!(metadata.id.as_deref(), Some("com.rdk.custom"));
        assert!(custom.exists());
        assert!(!embedded_metadata_path(bundle.path()).exists());
    }

    #[test]
    fn test_no_metadata() {
        let bundle = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_app_metadata(bundle.path(), None),
            Err(BundleError::MetadataNotFound(_))
        ));
    }

    #[test]
    fn test_missing_custom_metadata_keeps_embedded() {
        let bundle = bundle_with_embedded("com.rdk.embedded");
        let result = load_app_metadata(bundle.path(), Some(&bundle.path().join("nope.json")));

        assert!(matches!(result, Err(BundleError::MetadataFileMissing(_))));
        assert!(embedded_metadata_path(bundle.path()).exists());
    }

    #[test]
    fn test_invalid_metadata() {
        let bundle = tempfile::tempdir().unwrap();
        let custom = bundle.path().join("custom.json");
        fs::write(&custom, "{ not json").unwrap();

        assert!(matches!(
            load_app_metadata(bundle.path(), Some(&custom)),
            Err(BundleError::InvalidJson(..))
        ));
    }

    #[test]
    fn test_platform_arch() {
        let platform: PlatformConfig = serde_json::from_str(
            r#"{"platformName": "rpi3", "arch": {"arch": "arm", "variant": "v7"}, "os": "linux"}"#,
        )
        .unwrap();

        let arch = platform.platform_arch().unwrap();
        assert_eq!(arch.to_string(), "armv7");
        assert_eq!(platform.extra["platformName"], "rpi3");

        let no_variant: PlatformConfig =
            serde_json::from_str(r#"{"arch": {"arch": "x86_64"}}"#).unwrap();
        assert_eq!(no_variant.platform_arch().unwrap().to_string(), "x86_64");

        let none: PlatformConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(none.platform_arch(), None);
    }
}
