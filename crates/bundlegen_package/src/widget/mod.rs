//! Signed `.wgt` widget bundles
//!
//! A widget is built in a scratch workspace:
//!
//! 1. copy the bundle directory into the workspace
//! 2. merge the static resources (`config.xml`, `icon.png`)
//! 3. zip the workspace contents
//! 4. sign the zip with the external signing tool, which writes the `.wgt`
//!
//! The workspace is removed afterwards, also when one of the steps fails.

use std::path::{Path, PathBuf};
use std::process::Command;

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::process::{check_status, run_streaming};
use crate::scratch::ScratchWorkspace;
use crate::{ArchiveType, Result, ensure_source_dir};

mod archive;
mod stage;

pub use stage::STATIC_RESOURCES;

/// Name of the signing tool inside the resources directory
pub const SIGNER_NAME: &str = "create-sign-sky-app";
/// Name of the signing certificate inside the resources directory
pub const CERTIFICATE_NAME: &str = "sky-debug-widget-cert.p12";

/// Where widgets are staged and how they are signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Root under which the scratch workspaces are created
    pub temp_root: PathBuf,

    /// Directory holding `config.xml` and `icon.png`
    pub resources_dir: PathBuf,

    /// The signing executable
    pub signer: PathBuf,

    /// PKCS#12 certificate bundle passed to the signer
    pub certificate: PathBuf,

    /// Value of `OPENSSL_CONF` for the signer. The signer fails with the
    /// system OpenSSL configuration, so it is pointed at an empty file.
    pub openssl_conf: PathBuf,
}

impl WidgetConfig {
    /// Config with the signer and certificate inside `resources_dir`
    pub fn from_resources_dir(resources_dir: impl Into<PathBuf>) -> Self {
        let resources_dir = resources_dir.into();
        Self {
            temp_root: std::env::temp_dir().join("bundlegen"),
            signer: resources_dir.join(SIGNER_NAME),
            certificate: resources_dir.join(CERTIFICATE_NAME),
            resources_dir,
            openssl_conf: PathBuf::from("/dev/null"),
        }
    }

    /// Set the root for scratch workspaces
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    fn sign_command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.signer);
        command
            .arg("--skipvalid")
            .arg("--inwgt")
            .arg(input)
            .arg("--pkcs")
            .arg(&self.certificate)
            .arg("--outwgt")
            .arg(output)
            .env("OPENSSL_CONF", &self.openssl_conf);
        command
    }
}

/// Create a signed `.wgt` of the `source` directory.
///
/// The output is written to `dest` with `.wgt` appended unless it already
/// carries that suffix. Fails with
/// [`PackageError::ExternalProcess`](crate::PackageError::ExternalProcess) when
/// the signer exits unsuccessfully; a partial output written by the signer is
/// left in place.
pub fn create_widget(source: &Path, dest: &Path, config: &WidgetConfig) -> Result<PathBuf> {
    let output_path = ArchiveType::Widget.output_path(dest);
    tracing::info!(
        "Creating widget of {} as {}",
        source.display(),
        output_path.display()
    );

    let source = ensure_source_dir(source)?;

    if output_path.exists() {
        fs::remove_file(&output_path)?;
    }
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let workspace = ScratchWorkspace::new_in(&config.temp_root, "")?;
    let build_dir = workspace.path().join("wgt");

    stage::copy_tree(&source, &build_dir)?;
    stage::copy_static_resources(&config.resources_dir, &build_dir)?;

    let zip_path = workspace.path().join("temp.zip");
    archive::zip_dir(&build_dir, &zip_path)?;

    tracing::info!("Signing widget");
    let mut command = config.sign_command(&zip_path, &output_path);
    let status = run_streaming(&mut command)?;
    check_status(&command, status)?;

    Ok(output_path)
}
