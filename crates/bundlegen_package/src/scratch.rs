//! Uniquely named scratch directories that are removed on drop

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use fs_err as fs;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::Result;

/// Number of random characters appended to a scratch directory name
const RANDOM_SUFFIX_LEN: usize = 32;

/// A temporary directory owned by a single packaging call.
///
/// The name is `<prefix><YYYYmmdd-HHMMSS>_<random>`, so concurrent calls never
/// share a workspace. The directory and everything in it is deleted when the
/// value is dropped, on success and on error alike.
#[derive(Debug)]
pub(crate) struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a new workspace under `root`, creating `root` if needed
    pub fn new_in(root: &Path, prefix: &str) -> Result<Self> {
        fs::create_dir_all(root)?;
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}{timestamp}_"))
            .rand_bytes(RANDOM_SUFFIX_LEN)
            .tempdir_in(root)?;
        tracing::debug!("Created scratch workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path of the workspace
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        tracing::debug!("Removing scratch workspace {}", self.dir.path().display());
        // staged read-only directories would keep their children alive
        for entry in WalkDir::new(self.dir.path())
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            if let Ok(metadata) = entry.metadata()
                && metadata.permissions().mode() & 0o700 != 0o700
            {
                let permissions =
                    std::fs::Permissions::from_mode(metadata.permissions().mode() | 0o700);
                if let Err(e) = fs::set_permissions(entry.path(), permissions) {
                    tracing::debug!("{e}");
                }
            }
        }
    }
}
