use std::ffi::{OsStr, OsString};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use platform::FileStat;

/// Result of a filesystem traversal step.
///
/// The entry owns the descriptor the walker opened for it. Dropping the
/// entry closes the descriptor; [`into_fd`](Self::into_fd) hands it over.
#[derive(Debug)]
pub struct WalkEntry {
    pub(crate) parent: PathBuf,
    pub(crate) name: OsString,
    pub(crate) fd: OwnedFd,
    pub(crate) stat: FileStat,
    pub(crate) depth: usize,
}

impl WalkEntry {
    /// Absolute path of the directory holding the entry.
    #[must_use]
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// The entry's name within its parent.
    #[must_use]
    pub fn file_name(&self) -> &OsStr {
        &self.name
    }

    /// Absolute path of the entry.
    #[must_use]
    pub fn full_path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// Metadata captured with `statx` right after the open.
    #[must_use]
    pub const fn stat(&self) -> &FileStat {
        &self.stat
    }

    /// Reports the depth of the entry relative to the root; the root's
    /// children are at depth `1`.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` for directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.stat.is_dir()
    }

    /// Returns `true` for symbolic links, which are only yielded when the
    /// walker opens files with `O_PATH`.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.stat.is_symlink()
    }

    /// Borrows the open descriptor.
    #[must_use]
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// Takes ownership of the open descriptor.
    #[must_use]
    pub fn into_fd(self) -> OwnedFd {
        self.fd
    }
}

impl AsFd for WalkEntry {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
