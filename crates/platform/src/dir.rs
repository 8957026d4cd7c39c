//! Directory listing through an already open descriptor.

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::fd::AsFd;
use std::os::unix::ffi::OsStrExt;

use rustix::fs::{Dir, FileType};

/// A name read from a directory together with its `d_type` hint.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirName {
    /// Entry name, never `.` or `..`.
    pub name: OsString,
    /// `Some(true)` for directories, `None` when the filesystem does not
    /// report a type.
    pub is_dir: Option<bool>,
}

/// Lists the entries of the directory behind `fd`, sorted by name.
///
/// The descriptor's own offset is left untouched; the listing goes through
/// a private reopen of `.`.
pub fn read_dir_sorted<Fd: AsFd>(fd: Fd) -> io::Result<Vec<DirName>> {
    let dir = Dir::read_from(fd).map_err(io::Error::from)?;
    let mut names = Vec::new();
    for entry in dir {
        let entry = entry.map_err(io::Error::from)?;
        let bytes = entry.file_name().to_bytes();
        if bytes == b"." || bytes == b".." {
            continue;
        }
        let is_dir = match entry.file_type() {
            FileType::Directory => Some(true),
            FileType::Unknown => None,
            _ => Some(false),
        };
        names.push(DirName {
            name: OsStr::from_bytes(bytes).to_os_string(),
            is_dir,
        });
    }
    names.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(names)
}
