//! The opkg `control` manifest

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// File name of the manifest
pub const CONTROL_FILE_NAME: &str = "control";

const DEFAULT_PACKAGE: &str = "test_package";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_DESCRIPTION: &str = "some package";
const DEFAULT_PRIORITY: &str = "optional";

/// Application metadata handed over together with the bundle directory.
///
/// Only `id`, `version`, `description` and `priority` are used for packaging,
/// everything else is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Package version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Free form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// opkg priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// All other fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Architecture of the target platform, e.g. `arm` + `v7`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformArch {
    /// Base architecture
    #[serde(default)]
    pub arch: Option<String>,

    /// Architecture variant
    #[serde(default)]
    pub variant: Option<String>,
}

impl fmt::Display for PlatformArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.arch.as_deref().unwrap_or_default(),
            self.variant.as_deref().unwrap_or_default()
        )
    }
}

/// The fields of an opkg control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlManifest {
    /// `Package:`
    pub package: String,
    /// `Version:`
    pub version: String,
    /// `Architecture:`
    pub architecture: String,
    /// `Description:`
    pub description: String,
    /// `Priority:`
    pub priority: String,
}

impl ControlManifest {
    /// Derive the manifest from app metadata and the platform architecture.
    /// Missing fields fall back to their defaults.
    pub fn from_metadata(metadata: &AppMetadata, arch: Option<&PlatformArch>) -> Self {
        let field = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };

        Self {
            package: field(&metadata.id, DEFAULT_PACKAGE),
            version: field(&metadata.version, DEFAULT_VERSION),
            architecture: arch.map(ToString::to_string).unwrap_or_default(),
            description: field(&metadata.description, DEFAULT_DESCRIPTION),
            priority: field(&metadata.priority, DEFAULT_PRIORITY),
        }
    }

    /// Render the manifest. Bundles never declare dependencies, so `Depends`
    /// is always empty.
    pub fn render(&self) -> String {
        format!(
            "Package: {}\nVersion: {}\nArchitecture: {}\nDescription: {}\nPriority: {}\nDepends: \n",
            self.package, self.version, self.architecture, self.description, self.priority
        )
    }

    /// Write the manifest to `dir/control`, replacing an existing file
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CONTROL_FILE_NAME);
        fs::write(&path, self.render())?;
        tracing::debug!("Wrote control file {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let manifest = ControlManifest::from_metadata(&AppMetadata::default(), None);
        assert_eq!(
            manifest.render(),
            "Package: test_package\n\
             Version: 1.0.0\n\
             Architecture: \n\
             Description: some package\n\
             Priority: optional\n\
             Depends: \n"
        );
    }

    #[test]
    fn test_from_metadata() {
        let metadata: AppMetadata = serde_json::from_str(
            r#"{
                "id": "com.rdk.wayland-egl-test",
                "version": "1.2.3",
                "description": "Simple wayland egl demo",
                "priority": "required",
                "type": "application/vnd.rdk-app.dac.native",
                "graphics": true
            }"#,
        )
        .unwrap();
        assert_eq!(metadata.extra.len(), 2);

        let arch = PlatformArch {
            arch: Some("arm".to_string()),
            variant: Some("v7".to_string()),
        };
        let manifest = ControlManifest::from_metadata(&metadata, Some(&arch));
        assert_eq!(
            manifest.render(),
            "Package: com.rdk.wayland-egl-test\n\
             Version: 1.2.3\n\
             Architecture: armv7\n\
             Description: Simple wayland egl demo\n\
             Priority: required\n\
             Depends: \n"
        );
    }

    #[test]
    fn test_arch_without_variant() {
        let arch = PlatformArch {
            arch: Some("arm64".to_string()),
            variant: None,
        };
        let manifest = ControlManifest::from_metadata(&AppMetadata::default(), Some(&arch));
        assert_eq!(manifest.architecture, "arm64");
    }

    #[test]
    fn test_write_overwrites() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONTROL_FILE_NAME), "old content that is longer")?;

        let manifest = ControlManifest::from_metadata(&AppMetadata::default(), None);
        let path = manifest.write(dir.path())?;

        assert_eq!(path, dir.path().join("control"));
        assert_eq!(fs::read_to_string(&path)?, manifest.render());
        Ok(())
    }
}
