//! Ownership and permission overrides applied while archiving a tree

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PackageError;

/// Permission bits that can be kept by a [`ModeMask`]
const PERMISSION_BITS: u32 = 0o7777;

/// An octal permission mask that is ANDed with every archived entry's mode.
///
/// A mask of `770` removes all permissions of the "other" class.
///
/// ```rust
/// use bundlegen_package::ModeMask;
///
/// let mask: ModeMask = "770".parse().unwrap();
/// assert_eq!(mask.apply(0o777), 0o770);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeMask(u32);

impl ModeMask {
    /// Create a mask from its numeric value
    pub fn new(bits: u32) -> Result<Self, PackageError> {
        if bits > PERMISSION_BITS {
            return Err(PackageError::InvalidModeMask(format!("{bits:o}")));
        }
        Ok(Self(bits))
    }

    /// The mask value
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Apply the mask to a mode
    pub fn apply(&self, mode: u32) -> u32 {
        mode & self.0
    }
}

impl FromStr for ModeMask {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(PackageError::InvalidModeMask(s.to_string()));
        }
        let bits = u32::from_str_radix(digits, 8)
            .map_err(|_| PackageError::InvalidModeMask(s.to_string()))?;
        Self::new(bits).map_err(|_| PackageError::InvalidModeMask(s.to_string()))
    }
}

impl fmt::Display for ModeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

impl Serialize for ModeMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModeMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Optional uid / gid / mode-mask override for every entry of an archive.
///
/// Unset fields leave the on-disk metadata untouched. When a uid (or gid) is
/// set, the owner (or group) name is rewritten to the decimal id instead of
/// being looked up in a user database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnershipPolicy {
    /// Owner id forced on all entries
    #[serde(default)]
    pub uid: Option<u64>,

    /// Group id forced on all entries
    #[serde(default)]
    pub gid: Option<u64>,

    /// Mask ANDed with all entry modes
    #[serde(default)]
    pub mode_mask: Option<ModeMask>,
}

impl OwnershipPolicy {
    /// A policy that keeps the native file system metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the owner id
    pub fn with_uid(mut self, uid: u64) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Force the group id
    pub fn with_gid(mut self, gid: u64) -> Self {
        self.gid = Some(gid);
        self
    }

    /// Mask the permission bits
    pub fn with_mode_mask(mut self, mask: ModeMask) -> Self {
        self.mode_mask = Some(mask);
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none() && self.mode_mask.is_none()
    }

    /// Apply the policy to a tar header
    pub(crate) fn apply(&self, header: &mut tar::Header) -> std::io::Result<()> {
        if let Some(uid) = self.uid {
            header.set_uid(uid);
            header.set_username(&uid.to_string())?;
        }
        if let Some(gid) = self.gid {
            header.set_gid(gid);
            header.set_groupname(&gid.to_string())?;
        }
        if let Some(mask) = self.mode_mask {
            let mode = header.mode()?;
            header.set_mode(mask.apply(mode));
        }
        Ok(())
    }
}
