//! The brand-agnostic ACL value handled by the xattr layer.

use std::fmt;

use crate::error::ValidationError;
use crate::nfs4::Nfs4Acl;
use crate::posix::PosixAcl;
use crate::validate::{validate_nfs4, validate_posix};

/// Which ACL model a filesystem uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AclBrand {
    /// NFSv4 ACLs in `system.nfs4_acl_xdr`.
    Nfs4,
    /// POSIX.1e ACLs in `system.posix_acl_access` and `system.posix_acl_default`.
    Posix,
}

impl fmt::Display for AclBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nfs4 => "NFS4",
            Self::Posix => "POSIX",
        })
    }
}

/// An ACL of either brand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "brand", rename_all = "lowercase"))]
pub enum Acl {
    /// NFSv4 ACL.
    Nfs4(Nfs4Acl),
    /// POSIX ACL.
    Posix(PosixAcl),
}

impl Acl {
    /// The ACL model of this value.
    #[must_use]
    pub const fn brand(&self) -> AclBrand {
        match self {
            Self::Nfs4(_) => AclBrand::Nfs4,
            Self::Posix(_) => AclBrand::Posix,
        }
    }

    /// Returns `true` when the ACL adds nothing beyond the mode bits.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::Nfs4(acl) => acl.is_trivial(),
            Self::Posix(acl) => acl.is_trivial(),
        }
    }

    /// Checks the ACL against the rules for a file or directory target.
    pub fn validate(&self, is_dir: bool) -> Result<(), ValidationError> {
        match self {
            Self::Nfs4(acl) => validate_nfs4(acl, is_dir),
            Self::Posix(acl) => validate_posix(acl, is_dir),
        }
    }

    /// Computes the ACL a child of this directory would inherit.
    ///
    /// Always succeeds; a directory with no inheritable entries yields an
    /// empty ACL of the same brand.
    #[must_use]
    pub fn generate_inherited_acl(&self, is_dir: bool) -> Self {
        match self {
            Self::Nfs4(acl) => Self::Nfs4(acl.generate_inherited_acl(is_dir)),
            Self::Posix(acl) => Self::Posix(acl.generate_inherited_acl(is_dir)),
        }
    }

    /// The trivial ACL of the same brand for `mode`.
    #[must_use]
    pub fn trivial_like(&self, mode: u32) -> Self {
        match self.brand() {
            AclBrand::Nfs4 => Self::Nfs4(Nfs4Acl::trivial_from_mode(mode)),
            AclBrand::Posix => Self::Posix(PosixAcl::trivial_from_mode(mode)),
        }
    }

    /// Returns the NFSv4 ACL, if that is the brand.
    #[must_use]
    pub const fn as_nfs4(&self) -> Option<&Nfs4Acl> {
        match self {
            Self::Nfs4(acl) => Some(acl),
            Self::Posix(_) => None,
        }
    }

    /// Returns the POSIX ACL, if that is the brand.
    #[must_use]
    pub const fn as_posix(&self) -> Option<&PosixAcl> {
        match self {
            Self::Posix(acl) => Some(acl),
            Self::Nfs4(_) => None,
        }
    }
}

impl From<Nfs4Acl> for Acl {
    fn from(acl: Nfs4Acl) -> Self {
        Self::Nfs4(acl)
    }
}

impl From<PosixAcl> for Acl {
    fn from(acl: PosixAcl) -> Self {
        Self::Posix(acl)
    }
}
