//! `.ipk` bundles
//!
//! An ipk is a gzip compressed tarball with exactly three members, in this
//! order:
//!
//! - `data.tar.gz`: the bundle directory
//! - `control.tar.gz`: the `control` manifest
//! - `debian-binary`: the format version, `2.0`
//!
//! The intermediate files are built in a private scratch directory next to the
//! output file, so concurrent builds into the same directory do not interfere.

use std::path::{Path, PathBuf};

use fs_err as fs;

use crate::archiver::TarGzWriter;
use crate::control::CONTROL_FILE_NAME;
use crate::scratch::ScratchWorkspace;
use crate::tarball::{TarballOptions, write_tarball};
use crate::{ArchiveType, PackageError, Result, ensure_source_dir};

/// Member holding the file system tree
pub const DATA_NAME: &str = "data.tar.gz";
/// Member holding the control manifest
pub const CONTROL_NAME: &str = "control.tar.gz";
/// Member holding the format version
pub const DEBIAN_BINARY_NAME: &str = "debian-binary";
/// Content of `debian-binary`
pub const DEBIAN_BINARY_VERSION: &str = "2.0";

/// Removes the consumed control manifest on every exit path
struct RemoveOnDrop<'a>(&'a Path);

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.0)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove {}: {}", self.0.display(), e);
        }
    }
}

/// Create an `.ipk` of the `source` directory.
///
/// `control_file` must have been written before (see
/// [`ControlManifest::write`](crate::ControlManifest::write)). It is consumed:
/// like all other intermediate files it is deleted when this function returns,
/// whether packaging succeeded or not.
///
/// The output is written to `dest` with `.ipk` appended unless it already
/// carries that suffix. Returns the path of the written package.
pub fn create_ipk(
    source: &Path,
    dest: &Path,
    control_file: &Path,
    options: &TarballOptions,
) -> Result<PathBuf> {
    let _control_guard = RemoveOnDrop(control_file);

    let output_path = ArchiveType::Ipk.output_path(dest);
    tracing::info!(
        "Creating ipk of {} as {}",
        source.display(),
        output_path.display()
    );

    let source = ensure_source_dir(source)?;
    if !control_file.is_file() {
        return Err(PackageError::ControlFileMissing(control_file.to_path_buf()));
    }

    let scratch_root = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let scratch = ScratchWorkspace::new_in(scratch_root, ".ipk-")?;

    // first the tarball with the complete file system
    write_tarball(&source, &scratch.path().join(DATA_NAME), options)?;

    let writer = TarGzWriter::new(options.compression_level);
    writer.write(&scratch.path().join(CONTROL_NAME), |builder| {
        let mut file = fs::File::open(control_file)?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&file.metadata()?, tar::HeaderMode::Complete);
        options.ownership.apply(&mut header)?;
        builder.append_data(&mut header, CONTROL_FILE_NAME, &mut file)?;
        Ok(())
    })?;

    fs::write(
        scratch.path().join(DEBIAN_BINARY_NAME),
        DEBIAN_BINARY_VERSION,
    )?;

    writer.write(&output_path, |builder| {
        for name in [DATA_NAME, CONTROL_NAME, DEBIAN_BINARY_NAME] {
            builder.append_path_with_name(scratch.path().join(name), name)?;
        }
        Ok(())
    })?;

    Ok(output_path)
}
