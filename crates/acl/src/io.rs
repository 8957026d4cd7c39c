//! crates/acl/src/io.rs
//!
//! Reading, writing and removing ACLs through an open descriptor.
//!
//! The ACL brand is detected per call: a filesystem that serves
//! `system.nfs4_acl_xdr` (with a value or `ENODATA`) is NFSv4, one that
//! answers `EOPNOTSUPP` is probed for POSIX ACLs instead.

use std::io;
use std::os::fd::{AsFd, BorrowedFd};

use logging::trace_acl;
use platform::{Errno, fremove_xattr, fset_xattr, probe_xattr, stat_fd};

use crate::acl::{Acl, AclBrand};
use crate::error::AclError;
use crate::nfs4::{NFS4_ACL_XATTR, Nfs4Acl};
use crate::posix::{POSIX_ACCESS_XATTR, POSIX_DEFAULT_XATTR, PosixAcl};

fn detect_brand(fd: BorrowedFd<'_>) -> Result<(AclBrand, Option<Vec<u8>>), AclError> {
    match probe_xattr(fd, NFS4_ACL_XATTR) {
        Ok(data) => Ok((AclBrand::Nfs4, Some(data))),
        Err(Errno::NODATA) => Ok((AclBrand::Nfs4, None)),
        Err(Errno::OPNOTSUPP) => match probe_xattr(fd, POSIX_ACCESS_XATTR) {
            Ok(data) => Ok((AclBrand::Posix, Some(data))),
            Err(Errno::NODATA) => Ok((AclBrand::Posix, None)),
            Err(Errno::OPNOTSUPP) => Err(AclError::Unsupported),
            Err(errno) => Err(io::Error::from(errno).into()),
        },
        Err(errno) => Err(io::Error::from(errno).into()),
    }
}

/// Reads the ACL of the file behind `fd`.
///
/// An NFSv4 filesystem without a stored ACL yields an empty [`Nfs4Acl`]; a
/// POSIX filesystem yields absent sections for missing xattrs.
///
/// # Errors
///
/// [`AclError::Unsupported`] when the filesystem has neither ACL model,
/// [`AclError::Decode`] for malformed xattr values and [`AclError::Io`] for
/// any other failure.
pub fn get_acl<Fd: AsFd>(fd: Fd) -> Result<Acl, AclError> {
    let fd = fd.as_fd();
    let acl = match detect_brand(fd)? {
        (AclBrand::Nfs4, data) => Acl::Nfs4(Nfs4Acl::from_bytes(&data.unwrap_or_default())?),
        (AclBrand::Posix, access) => {
            let default = match probe_xattr(fd, POSIX_DEFAULT_XATTR) {
                Ok(data) => Some(data),
                Err(Errno::NODATA) => None,
                Err(errno) => return Err(io::Error::from(errno).into()),
            };
            Acl::Posix(PosixAcl::from_xattrs(
                &access.unwrap_or_default(),
                default.as_deref(),
            )?)
        }
    };
    trace_acl!(brand = %acl.brand(), trivial = acl.is_trivial(), "read ACL");
    Ok(acl)
}

/// Validates `acl` against the file type of `fd` and writes it.
///
/// POSIX writes store each section sorted by tag and id. The access xattr
/// is removed when the section is absent and, on directories, the default
/// section is stored or removed. A missing xattr is not an error when
/// removing.
pub fn set_acl<Fd: AsFd>(fd: Fd, acl: &Acl) -> Result<(), AclError> {
    let fd = fd.as_fd();
    let is_dir = stat_fd(fd)?.is_dir();
    acl.validate(is_dir)?;

    match acl {
        Acl::Nfs4(acl) => fset_xattr(fd, NFS4_ACL_XATTR, &acl.to_bytes())?,
        Acl::Posix(acl) => {
            // The kernel rejects sections not sorted by tag and id.
            let acl = acl.kernel_ordered();
            let access = acl.access_bytes();
            if access.is_empty() {
                fremove_xattr(fd, POSIX_ACCESS_XATTR)?;
            } else {
                fset_xattr(fd, POSIX_ACCESS_XATTR, &access)?;
            }

            if is_dir {
                match acl.default_bytes() {
                    Some(default) => fset_xattr(fd, POSIX_DEFAULT_XATTR, &default)?,
                    None => {
                        fremove_xattr(fd, POSIX_DEFAULT_XATTR)?;
                    }
                }
            }
        }
    }
    trace_acl!(brand = %acl.brand(), is_dir, "wrote ACL");
    Ok(())
}

/// Removes every ACL xattr from the file behind `fd`, leaving only the mode
/// bits in effect.
pub fn remove_acl<Fd: AsFd>(fd: Fd) -> Result<(), AclError> {
    let fd = fd.as_fd();
    let (brand, _) = detect_brand(fd)?;
    match brand {
        AclBrand::Nfs4 => {
            fremove_xattr(fd, NFS4_ACL_XATTR)?;
        }
        AclBrand::Posix => {
            fremove_xattr(fd, POSIX_ACCESS_XATTR)?;
            fremove_xattr(fd, POSIX_DEFAULT_XATTR)?;
        }
    }
    trace_acl!(brand = %brand, "removed ACL");
    Ok(())
}
