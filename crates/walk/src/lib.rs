#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides a resumable, descriptor-based traversal of one mounted
//! filesystem. The walker opens every entry relative to its parent's
//! descriptor with `openat2(2)`, refusing symbolic links and mount
//! crossings, so a concurrent rename cannot redirect it outside the tree.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures the root (a mountpoint plus optional
//!   relative path), the expected filesystem source, open flags, a
//!   birth-time cutoff, progress reporting and a saved position.
//! - [`Walker`] implements [`Iterator`] and yields [`WalkEntry`] values in
//!   depth-first pre-order. Names are sorted per directory, so two walks of
//!   an unchanged tree agree item for item.
//! - [`Walker::dir_stack`] captures the position as a [`DirStack`] of
//!   `(path, inode)` frames; [`WalkBuilder::restore`] continues from it.
//! - [`Walker::skip_current_dir`] prunes the directory that was just
//!   yielded.
//!
//! # Invariants
//!
//! - Each reachable entry is yielded at most once per walk, and a restored
//!   walk never repeats items yielded before the snapshot was taken.
//! - Entries that are symbolic links (unless opened with `O_PATH`) or that
//!   live on another mount are skipped silently.
//! - Directory descriptors held by the walker are released on drop.
//!
//! # Errors
//!
//! Traversal reports [`WalkError`]. Failures confined to one entry
//! ([`WalkError::is_entry_error`]) are yielded in place of that entry and
//! counted in [`WalkStats::errors`]; iteration continues with its siblings.
//! Any other error ends iteration. A snapshot that no longer matches the filesystem fails with
//! [`WalkErrorKind::Restore`], whose [`RestoreError::depth`] is the number
//! of frames to keep for a retry with [`DirStack::truncate`].
//!
//! # Examples
//!
//! ```
//! use walk::WalkBuilder;
//! use std::fs;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! fs::create_dir(temp.path().join("nested"))?;
//! fs::write(temp.path().join("nested/more.txt"), b"data")?;
//! fs::write(temp.path().join("file.txt"), b"data")?;
//!
//! let mut names = Vec::new();
//! for entry in WalkBuilder::new(temp.path()).build()? {
//!     let entry = entry?;
//!     names.push((entry.depth(), entry.file_name().to_os_string()));
//! }
//!
//! assert_eq!(
//!     names,
//!     [
//!         (1, "file.txt".into()),
//!         (1, "nested".into()),
//!         (2, "more.txt".into()),
//!     ]
//! );
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod entry;
mod error;
mod progress;
mod stack;
mod walker;

pub use builder::WalkBuilder;
pub use entry::WalkEntry;
pub use error::{CallbackError, RestoreError, WalkError, WalkErrorKind};
pub use progress::{ProgressCallback, WalkStats};
pub use stack::{DirFrame, DirStack};
pub use walker::Walker;

pub use platform::{DEFAULT_FILE_FLAGS, FileStat, OFlags};

/// Deepest directory nesting the walker descends into.
pub const MAX_DEPTH: usize = 2048;
