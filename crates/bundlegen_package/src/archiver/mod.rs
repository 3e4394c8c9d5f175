//! Recursive file system to tar translation

use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tar::{EntryType, Header, HeaderMode};
use walkdir::WalkDir;

use crate::ownership::OwnershipPolicy;
use crate::{PackageError, Result};

mod writer;

pub(crate) use writer::{DEFAULT_COMPRESSION_LEVEL, TarGzWriter};

/// Kind of a file system object recorded in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, content is streamed from disk
    Regular,
    /// Directory, children follow as separate entries
    Directory,
    /// Symbolic link, never followed
    Symlink(PathBuf),
    /// Fifo, socket or device node, recorded as a header only
    Other,
}

/// A single record written into an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path on disk
    pub name: PathBuf,

    /// Path inside the archive
    pub name_in_archive: PathBuf,

    /// What kind of object this is
    pub kind: EntryKind,

    /// Owner id
    pub uid: u64,

    /// Group id
    pub gid: u64,

    /// Owner name, only set when overridden by an [`OwnershipPolicy`]
    pub uname: Option<String>,

    /// Group name, only set when overridden by an [`OwnershipPolicy`]
    pub gname: Option<String>,

    /// Permission bits
    pub mode: u32,

    /// Size of the content in bytes (regular files only)
    pub size: u64,

    /// The on-disk metadata
    metadata: std::fs::Metadata,
}

impl ArchiveEntry {
    /// Read a fresh entry from disk without following symlinks
    pub fn from_path(name: &Path, name_in_archive: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(name)?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink(fs::read_link(name)?)
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::Regular
        } else {
            EntryKind::Other
        };

        let size = if kind == EntryKind::Regular {
            metadata.len()
        } else {
            0
        };

        Ok(Self {
            name: name.to_path_buf(),
            name_in_archive: name_in_archive.to_path_buf(),
            kind,
            uid: metadata.uid() as u64,
            gid: metadata.gid() as u64,
            uname: None,
            gname: None,
            mode: metadata.mode() & 0o7777,
            size,
            metadata,
        })
    }

    /// Apply an ownership policy to this entry
    pub fn apply_policy(&mut self, policy: &OwnershipPolicy) {
        if let Some(uid) = policy.uid {
            self.uid = uid;
            self.uname = Some(uid.to_string());
        }
        if let Some(gid) = policy.gid {
            self.gid = gid;
            self.gname = Some(gid.to_string());
        }
        if let Some(mask) = policy.mode_mask {
            self.mode = mask.apply(self.mode);
        }
    }

    fn header(&self) -> io::Result<Header> {
        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(&self.metadata, HeaderMode::Complete);
        header.set_uid(self.uid);
        header.set_gid(self.gid);
        header.set_mode(self.mode);
        if let Some(uname) = &self.uname {
            header.set_username(uname)?;
        }
        if let Some(gname) = &self.gname {
            header.set_groupname(gname)?;
        }
        header.set_size(self.size);
        Ok(header)
    }

    /// Write this entry to a tar builder, streaming regular file content
    pub fn append_to<W: Write>(&self, builder: &mut tar::Builder<W>) -> Result<()> {
        let mut header = self.header()?;
        match &self.kind {
            EntryKind::Regular => {
                let file = fs::File::open(&self.name)?;
                builder.append_data(&mut header, &self.name_in_archive, file)?;
            }
            EntryKind::Directory => {
                header.set_entry_type(EntryType::Directory);
                builder.append_data(&mut header, &self.name_in_archive, io::empty())?;
            }
            EntryKind::Symlink(target) => {
                header.set_entry_type(EntryType::Symlink);
                builder.append_link(&mut header, &self.name_in_archive, target)?;
            }
            EntryKind::Other => {
                builder.append_data(&mut header, &self.name_in_archive, io::empty())?;
            }
        }
        Ok(())
    }
}

/// Walks a directory tree and produces one [`ArchiveEntry`] per file system
/// object, parents before their children.
pub struct TreeArchiver {
    root: PathBuf,
    archive_root: PathBuf,
    policy: OwnershipPolicy,
}

impl TreeArchiver {
    /// Archive `root` with its entries placed under `archive_root`
    pub fn new(root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            archive_root: archive_root.into(),
            policy: OwnershipPolicy::default(),
        }
    }

    /// Set the ownership policy applied to every entry
    pub fn with_policy(mut self, policy: OwnershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Iterate over all entries in depth-first order
    pub fn entries(&self) -> Result<impl Iterator<Item = Result<ArchiveEntry>> + '_> {
        if fs::symlink_metadata(&self.root).is_err() {
            return Err(PackageError::SourceNotFound(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        Ok(walker.into_iter().map(move |entry| -> Result<ArchiveEntry> {
            let entry = entry?;
            let relative = entry.path().strip_prefix(&self.root)?;
            let name_in_archive = if relative.as_os_str().is_empty() {
                self.archive_root.clone()
            } else {
                self.archive_root.join(relative)
            };

            let mut archive_entry = ArchiveEntry::from_path(entry.path(), &name_in_archive)?;
            archive_entry.apply_policy(&self.policy);
            Ok(archive_entry)
        }))
    }

    /// Append the whole tree to a tar builder, returns the number of entries
    pub fn append_to<W: Write>(&self, builder: &mut tar::Builder<W>) -> Result<usize> {
        let mut count = 0;
        for entry in self.entries()? {
            let entry = entry?;
            tracing::debug!("Adding {}", entry.name_in_archive.display());
            entry.append_to(builder)?;
            count += 1;
        }
        Ok(count)
    }
}
