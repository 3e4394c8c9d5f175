//! Staging of the widget contents

use std::path::Path;

use fs_err as fs;
use walkdir::WalkDir;

use crate::{PackageError, Result};

/// Static resources merged into every widget
pub const STATIC_RESOURCES: [&str; 2] = ["config.xml", "icon.png"];

/// Deep copy `from` into `to`.
///
/// Symlinks are recreated as symlinks (dangling ones included), regular files
/// and directories keep their permissions. Special files are skipped. Returns
/// the number of copied entries.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to)?;

    let mut copied = 0;
    // applied once the children are in place, read-only directories would
    // reject them otherwise
    let mut dir_permissions = Vec::new();
    for entry in WalkDir::new(from).follow_links(false).min_depth(1) {
        let entry = entry?;
        let path = entry.path();
        let dest_path = to.join(path.strip_prefix(from)?);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(path)?;
            if !path.exists() {
                tracing::warn!(
                    "Copying dangling symlink {} -> {}",
                    path.display(),
                    target.display()
                );
            }
            if fs::symlink_metadata(&dest_path).is_ok() {
                fs::remove_file(&dest_path)?;
            }
            std::os::unix::fs::symlink(&target, &dest_path)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&dest_path)?;
            dir_permissions.push((dest_path, entry.metadata()?.permissions()));
        } else if file_type.is_file() {
            fs::copy(path, &dest_path)?;
        } else {
            tracing::warn!("Skipping special file {}", path.display());
            continue;
        }
        copied += 1;
    }

    for (dir, permissions) in dir_permissions.into_iter().rev() {
        fs::set_permissions(dir, permissions)?;
    }

    tracing::info!("Copied {} entries to {}", copied, to.display());
    Ok(copied)
}

/// Copy the static widget resources from `resources_dir` into `to`
pub(crate) fn copy_static_resources(resources_dir: &Path, to: &Path) -> Result<()> {
    for name in STATIC_RESOURCES {
        let resource = resources_dir.join(name);
        if !resource.is_file() {
            return Err(PackageError::ResourceMissing(resource));
        }
        fs::copy(&resource, to.join(name))?;
    }
    Ok(())
}
