//! crates/platform/src/mount.rs
//!
//! Resolves the mount containing a path through `statx` and
//! `/proc/self/mountinfo`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use logging::trace_mount;

use crate::stat::stat_path;

const MOUNTINFO: &str = "/proc/self/mountinfo";

/// The mount that contains a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountInfo {
    /// Mount id as reported by `statx(STATX_MNT_ID)`.
    pub mount_id: u64,
    /// Absolute mountpoint.
    pub mountpoint: PathBuf,
    /// Filesystem source, e.g. `/dev/sda1` or `tank/share`.
    pub source: String,
    /// Filesystem type, e.g. `zfs` or `ext4`.
    pub fs_type: String,
    /// Path below the mountpoint, or `None` when the path is the mountpoint.
    pub relative_path: Option<PathBuf>,
}

/// One parsed line of `/proc/self/mountinfo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountEntry {
    /// Unique mount id.
    pub mount_id: u64,
    /// Mount id of the parent mount.
    pub parent_id: u64,
    /// Mountpoint relative to the process root.
    pub mountpoint: PathBuf,
    /// Filesystem type.
    pub fs_type: String,
    /// Mount source.
    pub source: String,
}

/// Finds the mount containing `path`.
///
/// The path is canonicalized before the relative part is computed, so
/// symbolic links in the argument resolve the same way `realpath(3)` does.
pub fn mount_lookup(path: &Path) -> io::Result<MountInfo> {
    let absolute = fs::canonicalize(path)?;
    let stat = stat_path(&absolute)?;
    let contents = fs::read_to_string(MOUNTINFO)?;

    let entry = parse_mountinfo(&contents)
        .find(|entry| entry.mount_id == stat.mount_id)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("mount id {} not listed in {MOUNTINFO}", stat.mount_id),
            )
        })?;

    let relative_path = absolute
        .strip_prefix(&entry.mountpoint)
        .ok()
        .filter(|rest| !rest.as_os_str().is_empty())
        .map(Path::to_path_buf);

    trace_mount!(
        mount_id = entry.mount_id,
        source = %entry.source,
        fs_type = %entry.fs_type,
        "resolved mountpoint {}",
        entry.mountpoint.display()
    );

    Ok(MountInfo {
        mount_id: entry.mount_id,
        mountpoint: entry.mountpoint,
        source: entry.source,
        fs_type: entry.fs_type,
        relative_path,
    })
}

/// Parses the contents of a mountinfo file, skipping malformed lines.
pub fn parse_mountinfo(contents: &str) -> impl Iterator<Item = MountEntry> + '_ {
    contents.lines().filter_map(parse_line)
}

fn parse_line(line: &str) -> Option<MountEntry> {
    let (front, back) = line.split_once(" - ")?;

    let mut fields = front.split(' ');
    let mount_id = fields.next()?.parse().ok()?;
    let parent_id = fields.next()?.parse().ok()?;
    let _device = fields.next()?;
    let _root = fields.next()?;
    let mountpoint = PathBuf::from(unescape(fields.next()?));

    let mut fields = back.split(' ');
    let fs_type = unescape(fields.next()?);
    let source = unescape(fields.next()?);

    Some(MountEntry {
        mount_id,
        parent_id,
        mountpoint,
        fs_type,
        source,
    })
}

/// Decodes the `\NNN` octal escapes the kernel uses for whitespace and
/// backslashes.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && is_octal_escape(&bytes[index + 1..index + 4])
        {
            let value = bytes[index + 1..index + 4]
                .iter()
                .fold(0u32, |acc, digit| acc * 8 + u32::from(digit - b'0'));
            out.push(u8::try_from(value).unwrap_or(b'?'));
            index += 4;
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits.iter().all(|digit| (b'0'..=b'7').contains(digit))
}
