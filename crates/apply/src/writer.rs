use std::os::fd::BorrowedFd;

use acl::{Acl, AclError};

/// Reads and writes ACLs through open descriptors.
///
/// The recursive driver only talks to the filesystem's ACL storage through
/// this trait, so it can run against an in-memory store where the test
/// filesystem has no ACL support.
pub trait AclWriter {
    /// Reads the ACL of the file behind `fd`.
    fn read_acl(&mut self, fd: BorrowedFd<'_>) -> Result<Acl, AclError>;

    /// Validates and stores `acl` on the file behind `fd`.
    fn write_acl(&mut self, fd: BorrowedFd<'_>, acl: &Acl) -> Result<(), AclError>;
}

/// Stores ACLs in the filesystem's extended attributes.
#[derive(Clone, Copy, Debug, Default)]
pub struct XattrWriter;

impl AclWriter for XattrWriter {
    fn read_acl(&mut self, fd: BorrowedFd<'_>) -> Result<Acl, AclError> {
        acl::get_acl(fd)
    }

    fn write_acl(&mut self, fd: BorrowedFd<'_>, acl: &Acl) -> Result<(), AclError> {
        acl::set_acl(fd, acl)
    }
}

impl<W: AclWriter + ?Sized> AclWriter for &mut W {
    fn read_acl(&mut self, fd: BorrowedFd<'_>) -> Result<Acl, AclError> {
        (**self).read_acl(fd)
    }

    fn write_acl(&mut self, fd: BorrowedFd<'_>, acl: &Acl) -> Result<(), AclError> {
        (**self).write_acl(fd, acl)
    }
}
