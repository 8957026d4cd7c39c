//! `statx(2)` metadata captured for walker entries and mount lookups.

use std::io;
use std::os::fd::AsFd;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustix::fs::{AtFlags, CWD, FileType, StatxFlags, StatxTimestamp, statx};

/// Mask requested for every statx call made by this crate.
const STATX_MASK: StatxFlags = StatxFlags::BASIC_STATS
    .union(StatxFlags::BTIME)
    .union(StatxFlags::MNT_ID);

/// Metadata for a single inode, as reported by `statx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    /// File type and permission bits.
    pub mode: u32,
    /// Size in bytes.
    pub size: u64,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Inode number.
    pub ino: u64,
    /// Hard link count.
    pub nlink: u32,
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last status change time.
    pub ctime: SystemTime,
    /// Creation time, when the filesystem records one.
    pub btime: Option<SystemTime>,
    /// Mount id matching the first field of `/proc/self/mountinfo`.
    pub mount_id: u64,
}

impl FileStat {
    /// Returns `true` for directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        FileType::from_raw_mode(self.mode) == FileType::Directory
    }

    /// Returns `true` for symbolic links.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        FileType::from_raw_mode(self.mode) == FileType::Symlink
    }

    /// Returns `true` for regular files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        FileType::from_raw_mode(self.mode) == FileType::RegularFile
    }

    /// Permission bits without the file type.
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    fn from_statx(stx: &rustix::fs::Statx) -> Self {
        let btime = has_btime(stx.stx_mask).then(|| timestamp(&stx.stx_btime));

        Self {
            mode: u32::from(stx.stx_mode),
            size: stx.stx_size,
            uid: stx.stx_uid,
            gid: stx.stx_gid,
            ino: stx.stx_ino,
            nlink: stx.stx_nlink,
            atime: timestamp(&stx.stx_atime),
            mtime: timestamp(&stx.stx_mtime),
            ctime: timestamp(&stx.stx_ctime),
            btime,
            mount_id: stx.stx_mnt_id,
        }
    }
}

/// Filesystems without a birth time leave `STATX_BTIME` out of the
/// returned mask; a zero timestamp on its own is a valid time.
const fn has_btime(mask: u32) -> bool {
    mask & StatxFlags::BTIME.bits() != 0
}

fn timestamp(ts: &StatxTimestamp) -> SystemTime {
    let nanos = Duration::from_nanos(u64::from(ts.tv_nsec));
    if ts.tv_sec >= 0 {
        UNIX_EPOCH + Duration::from_secs(ts.tv_sec as u64) + nanos
    } else {
        UNIX_EPOCH - Duration::from_secs(ts.tv_sec.unsigned_abs()) + nanos
    }
}

/// Stats an open descriptor without following symbolic links.
pub fn stat_fd<Fd: AsFd>(fd: Fd) -> io::Result<FileStat> {
    let stx = statx(
        fd,
        "",
        AtFlags::EMPTY_PATH | AtFlags::SYMLINK_NOFOLLOW,
        STATX_MASK,
    )
    .map_err(io::Error::from)?;
    Ok(FileStat::from_statx(&stx))
}

/// Stats a path without following a symbolic link in the final component.
pub fn stat_path(path: &Path) -> io::Result<FileStat> {
    let stx = statx(CWD, path, AtFlags::SYMLINK_NOFOLLOW, STATX_MASK).map_err(io::Error::from)?;
    Ok(FileStat::from_statx(&stx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::{MetadataExt, symlink};

    #[test]
    fn stat_path_matches_std_metadata() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("data.bin");
        fs::write(&file, vec![0u8; 1234]).expect("write");

        let stat = stat_path(&file).expect("statx");
        let meta = fs::symlink_metadata(&file).expect("metadata");

        assert!(stat.is_file());
        assert!(!stat.is_dir());
        assert_eq!(stat.size, 1234);
        assert_eq!(stat.ino, meta.ino());
        assert_eq!(stat.uid, meta.uid());
        assert_eq!(stat.gid, meta.gid());
        assert_eq!(stat.nlink, 1);
        assert_eq!(stat.mode, meta.mode());
        assert_eq!(stat.mtime, meta.modified().expect("mtime"));
    }

    #[test]
    fn stat_path_does_not_follow_symlinks() {
        let temp = tempfile::tempdir().expect("tempdir");
        let link = temp.path().join("link");
        symlink("/", &link).expect("symlink");

        let stat = stat_path(&link).expect("statx");
        assert!(stat.is_symlink());
        assert!(!stat.is_dir());
    }

    #[test]
    fn stat_fd_and_stat_path_agree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let fd = crate::open_directory_no_follow(temp.path()).expect("open");
        let by_fd = stat_fd(&fd).expect("stat fd");
        let by_path = stat_path(temp.path()).expect("stat path");
        assert_eq!(by_fd.ino, by_path.ino);
        assert_eq!(by_fd.mount_id, by_path.mount_id);
        assert!(by_fd.is_dir());
    }

    #[test]
    fn birth_time_follows_the_statx_mask() {
        let with_btime = (StatxFlags::BASIC_STATS | StatxFlags::BTIME).bits();
        assert!(has_btime(with_btime));
        assert!(!has_btime(StatxFlags::BASIC_STATS.bits()));
    }

    #[test]
    fn birth_time_matches_std_when_recorded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("born.txt");
        fs::write(&file, b"data").expect("write");

        let stat = stat_path(&file).expect("statx");
        let created = fs::metadata(&file).expect("metadata").created().ok();
        assert_eq!(stat.btime, created);
    }

    #[test]
    fn permissions_strip_file_type() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stat = stat_path(temp.path()).expect("stat");
        assert_eq!(stat.permissions(), stat.mode & 0o7777);
        assert_eq!(stat.mode & 0o170000, 0o040000);
    }
}
