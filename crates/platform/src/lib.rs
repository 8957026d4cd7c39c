#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Thin wrappers around the Linux system calls the ACL engine and the tree
//! walker depend on. Everything here goes through `rustix`, so the crate
//! stays free of `unsafe`.
//!
//! - [`open_no_follow`] and [`open_beneath`] use `openat2(2)` with
//!   `RESOLVE_NO_SYMLINKS`; walks additionally refuse to cross mounts.
//! - [`stat_fd`] and [`stat_path`] return a [`FileStat`] built from
//!   `statx(2)`, including birth time and mount id.
//! - [`read_dir_sorted`] lists a directory descriptor in name order.
//! - [`mount_lookup`] maps a path to its [`MountInfo`].
//! - [`fget_xattr`], [`fset_xattr`] and [`fremove_xattr`] operate on open
//!   descriptors.
//!
//! # Errors
//!
//! Every function returns [`std::io::Error`] carrying the raw OS error, so
//! callers can match on `ELOOP`, `EXDEV`, `ENODATA` or `EOPNOTSUPP`.

mod dir;
mod mount;
mod open;
mod stat;
mod xattr;

pub use dir::{DirName, read_dir_sorted};
pub use mount::{MountEntry, MountInfo, mount_lookup, parse_mountinfo};
pub use open::{
    DEFAULT_FILE_FLAGS, DIRECTORY_FLAGS, is_pruned_open, open_beneath, open_directory_no_follow,
    open_no_follow,
};
pub use stat::{FileStat, stat_fd, stat_path};
pub use xattr::{fget_xattr, fremove_xattr, fset_xattr, is_unsupported, probe_xattr};

pub use rustix::fs::OFlags;
pub use rustix::io::Errno;
