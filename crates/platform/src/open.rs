//! crates/platform/src/open.rs
//!
//! `openat2(2)` wrappers that never traverse symbolic links.

use std::ffi::OsStr;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use rustix::fs::{AtFlags, CWD, FileType, Mode, OFlags, ResolveFlags, StatxFlags, openat2, statx};
use rustix::io::Errno;

/// Flags used for every directory opened by this crate.
pub const DIRECTORY_FLAGS: OFlags = OFlags::RDONLY
    .union(OFlags::DIRECTORY)
    .union(OFlags::NOFOLLOW)
    .union(OFlags::CLOEXEC);

/// Default flags for non-directory entries.
///
/// `NONBLOCK` keeps FIFOs and device nodes from stalling the open.
pub const DEFAULT_FILE_FLAGS: OFlags = OFlags::RDONLY.union(OFlags::NONBLOCK);

/// Upper bound on `EAGAIN` retries, returned by the kernel when a concurrent
/// rename races with path resolution.
const MAX_AGAIN_RETRIES: usize = 8;

fn openat2_retrying<Fd: AsFd>(
    dirfd: Fd,
    path: &OsStr,
    flags: OFlags,
    resolve: ResolveFlags,
) -> io::Result<OwnedFd> {
    let flags = flags | OFlags::NOFOLLOW | OFlags::CLOEXEC;
    let mut attempts = 0;
    loop {
        match openat2(dirfd.as_fd(), path, flags, Mode::empty(), resolve) {
            Ok(fd) => return Ok(fd),
            Err(Errno::INTR) => continue,
            Err(Errno::AGAIN) if attempts < MAX_AGAIN_RETRIES => attempts += 1,
            Err(Errno::NOTDIR) if flags.contains(OFlags::DIRECTORY) => {
                return Err(io::Error::from(classify_not_dir(dirfd.as_fd(), path)));
            }
            Err(errno) => return Err(io::Error::from(errno)),
        }
    }
}

/// A directory open of a symlink fails with `ENOTDIR` rather than `ELOOP`.
/// Reports `ELOOP` when the final component is a symlink so callers can
/// tell it from a regular file.
fn classify_not_dir(dirfd: BorrowedFd<'_>, path: &OsStr) -> Errno {
    match statx(dirfd, path, AtFlags::SYMLINK_NOFOLLOW, StatxFlags::TYPE) {
        Ok(stx) if FileType::from_raw_mode(u32::from(stx.stx_mode)) == FileType::Symlink => {
            Errno::LOOP
        }
        _ => Errno::NOTDIR,
    }
}

/// Opens `path` relative to the working directory without following any
/// symbolic link along the way.
///
/// The final component is opened with `O_NOFOLLOW`; a symlink there yields
/// `ELOOP` unless `flags` contains `O_PATH`, also when `flags` asks for a
/// directory.
pub fn open_no_follow(path: &Path, flags: OFlags) -> io::Result<OwnedFd> {
    openat2_retrying(CWD, path.as_os_str(), flags, ResolveFlags::NO_SYMLINKS)
}

/// Opens a directory by path without following symbolic links.
pub fn open_directory_no_follow(path: &Path) -> io::Result<OwnedFd> {
    open_no_follow(path, DIRECTORY_FLAGS)
}

/// Opens `name` beneath an already open directory.
///
/// Resolution refuses symbolic links and mount crossings, which surface as
/// `ELOOP` and `EXDEV` respectively; see [`is_pruned_open`].
pub fn open_beneath<Fd: AsFd>(parent: Fd, name: &OsStr, flags: OFlags) -> io::Result<OwnedFd> {
    openat2_retrying(
        parent,
        name,
        flags,
        ResolveFlags::NO_SYMLINKS | ResolveFlags::NO_XDEV,
    )
}

/// Returns `true` when an open failed because the entry is a symbolic link
/// or lives on another mount. Walkers skip such entries instead of failing.
#[must_use]
pub fn is_pruned_open(error: &io::Error) -> bool {
    matches!(
        Errno::from_io_error(error),
        Some(Errno::LOOP | Errno::XDEV)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;

    #[test]
    fn open_directory_accepts_real_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let fd = open_directory_no_follow(temp.path()).expect("open dir");
        let stat = crate::stat_fd(&fd).expect("stat");
        assert!(stat.is_dir());
    }

    #[test]
    fn open_no_follow_refuses_symlinked_final_component() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("target");
        fs::write(&target, b"data").expect("write");
        let link = temp.path().join("link");
        symlink(&target, &link).expect("symlink");

        let error = open_no_follow(&link, DEFAULT_FILE_FLAGS).expect_err("symlink refused");
        assert!(is_pruned_open(&error));
    }

    #[test]
    fn open_beneath_with_o_path_returns_link_itself() {
        let temp = tempfile::tempdir().expect("tempdir");
        symlink("/nonexistent", temp.path().join("dangling")).expect("symlink");

        let parent = open_directory_no_follow(temp.path()).expect("open parent");
        let fd = open_beneath(&parent, OsStr::new("dangling"), OFlags::PATH).expect("o_path");
        let stat = crate::stat_fd(&fd).expect("stat link");
        assert!(stat.is_symlink());
    }

    #[test]
    fn open_beneath_refuses_directory_symlink() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("real")).expect("mkdir");
        symlink("real", temp.path().join("alias")).expect("symlink");

        let parent = open_directory_no_follow(temp.path()).expect("open parent");
        let error =
            open_beneath(&parent, OsStr::new("alias"), DIRECTORY_FLAGS).expect_err("refused");
        assert!(is_pruned_open(&error));
    }

    #[test]
    fn directory_open_of_a_regular_file_is_not_pruned() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("plain"), b"data").expect("write");

        let parent = open_directory_no_follow(temp.path()).expect("open parent");
        let error =
            open_beneath(&parent, OsStr::new("plain"), DIRECTORY_FLAGS).expect_err("not a dir");
        assert_eq!(error.kind(), io::ErrorKind::NotADirectory);
        assert!(!is_pruned_open(&error));
    }

    #[test]
    fn symlinked_directory_path_is_refused_as_a_link() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("real")).expect("mkdir");
        let link = temp.path().join("alias");
        symlink("real", &link).expect("symlink");

        let error = open_directory_no_follow(&link).expect_err("symlink refused");
        assert_eq!(Errno::from_io_error(&error), Some(Errno::LOOP));
    }

    #[test]
    fn missing_entry_is_not_a_pruned_open() {
        let temp = tempfile::tempdir().expect("tempdir");
        let parent = open_directory_no_follow(temp.path()).expect("open parent");
        let error = open_beneath(&parent, OsStr::new("absent"), DEFAULT_FILE_FLAGS)
            .expect_err("missing");
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
        assert!(!is_pruned_open(&error));
    }
}
