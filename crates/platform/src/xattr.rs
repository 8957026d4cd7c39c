//! Descriptor-based extended attribute primitives.
//!
//! ACL xattrs live in the `system.` namespace, which the kernel serves
//! straight from the filesystem. Operating on descriptors keeps every access
//! pinned to the inode the walker verified.

use std::io;
use std::os::fd::AsFd;

use logging::trace_xattr;
use rustix::fs::{XattrFlags, fgetxattr, fremovexattr, fsetxattr};
use rustix::io::Errno;

/// Attempts made when the value grows between the size probe and the read.
const MAX_RANGE_RETRIES: usize = 4;

/// Reads an attribute, returning `Ok(None)` when it is absent (`ENODATA`).
pub fn fget_xattr<Fd: AsFd>(fd: Fd, name: &str) -> io::Result<Option<Vec<u8>>> {
    match read_raw(fd.as_fd(), name) {
        Ok(value) => Ok(Some(value)),
        Err(Errno::NODATA) => Ok(None),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Reads an attribute and reports failures as the raw [`Errno`].
///
/// Callers that branch on `ENODATA` versus `EOPNOTSUPP` to detect the ACL
/// flavour of a filesystem use this instead of [`fget_xattr`].
pub fn probe_xattr<Fd: AsFd>(fd: Fd, name: &str) -> Result<Vec<u8>, Errno> {
    read_raw(fd.as_fd(), name)
}

fn read_raw<Fd: AsFd>(fd: Fd, name: &str) -> Result<Vec<u8>, Errno> {
    let fd = fd.as_fd();
    for _ in 0..MAX_RANGE_RETRIES {
        let mut empty: [u8; 0] = [];
        let size = fgetxattr(fd, name, &mut empty[..])?;
        if size == 0 {
            trace_xattr!(name, size, "read empty xattr");
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; size];
        match fgetxattr(fd, name, &mut buffer[..]) {
            Ok(read) => {
                buffer.truncate(read);
                trace_xattr!(name, size = read, "read xattr");
                return Ok(buffer);
            }
            Err(Errno::RANGE) => continue,
            Err(errno) => return Err(errno),
        }
    }
    Err(Errno::RANGE)
}

/// Creates or replaces an attribute.
pub fn fset_xattr<Fd: AsFd>(fd: Fd, name: &str, value: &[u8]) -> io::Result<()> {
    trace_xattr!(name, size = value.len(), "write xattr");
    fsetxattr(fd, name, value, XattrFlags::empty()).map_err(io::Error::from)
}

/// Removes an attribute. A missing attribute is reported as `Ok(false)`.
pub fn fremove_xattr<Fd: AsFd>(fd: Fd, name: &str) -> io::Result<bool> {
    match fremovexattr(fd, name) {
        Ok(()) => {
            trace_xattr!(name, "removed xattr");
            Ok(true)
        }
        Err(Errno::NODATA) => Ok(false),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Returns `true` when the error means the filesystem has no support for
/// the requested attribute namespace.
#[must_use]
pub fn is_unsupported(error: &io::Error) -> bool {
    matches!(Errno::from_io_error(error), Some(Errno::OPNOTSUPP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    const NAME: &str = "user.acltree.test";

    fn scratch_file() -> Option<(tempfile::TempDir, File)> {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("file");
        let file = File::create(&path).expect("create");
        match fset_xattr(&file, NAME, b"probe") {
            Ok(()) => Some((temp, file)),
            // tmpfs without user xattrs, or a restricted container.
            Err(error) if is_unsupported(&error) => None,
            Err(error) if error.kind() == io::ErrorKind::PermissionDenied => None,
            Err(error) => panic!("unexpected xattr failure: {error}"),
        }
    }

    #[test]
    fn absent_attribute_reads_as_none() {
        let Some((_temp, file)) = scratch_file() else {
            return;
        };
        assert_eq!(
            fget_xattr(&file, "user.acltree.absent").expect("read"),
            None
        );
        assert_eq!(
            probe_xattr(&file, "user.acltree.absent"),
            Err(Errno::NODATA)
        );
    }

    #[test]
    fn set_get_and_remove_attribute() {
        let Some((_temp, file)) = scratch_file() else {
            return;
        };
        let value = vec![7u8; 300];
        fset_xattr(&file, NAME, &value).expect("set");
        assert_eq!(fget_xattr(&file, NAME).expect("get"), Some(value));

        assert!(fremove_xattr(&file, NAME).expect("remove"));
        assert!(!fremove_xattr(&file, NAME).expect("second remove"));
        assert_eq!(fget_xattr(&file, NAME).expect("get after remove"), None);
    }

    #[test]
    fn empty_value_round_trips() {
        let Some((_temp, file)) = scratch_file() else {
            return;
        };
        fset_xattr(&file, NAME, &[]).expect("set empty");
        assert_eq!(fget_xattr(&file, NAME).expect("get"), Some(Vec::new()));
    }

    #[test]
    fn unsupported_detection_matches_errno() {
        assert!(is_unsupported(&io::Error::from(Errno::OPNOTSUPP)));
        assert!(!is_unsupported(&io::Error::from(Errno::NODATA)));
    }
}
