use std::path::PathBuf;
use std::time::SystemTime;

use platform::{DEFAULT_FILE_FLAGS, OFlags};

use crate::error::{CallbackError, WalkError};
use crate::progress::{ProgressCallback, Reporting, WalkStats};
use crate::stack::DirStack;
use crate::walker::Walker;

/// Configures a traversal rooted at a mountpoint.
///
/// The walker never leaves the mount it starts on: entries on other mounts
/// and symbolic links to directories are skipped.
#[derive(Debug)]
pub struct WalkBuilder {
    pub(crate) mountpoint: PathBuf,
    pub(crate) relative_path: Option<PathBuf>,
    pub(crate) expected_source: Option<String>,
    pub(crate) file_flags: OFlags,
    pub(crate) btime_cutoff: Option<SystemTime>,
    pub(crate) reporting: Option<Reporting>,
    pub(crate) restore: Option<DirStack>,
}

impl WalkBuilder {
    /// Creates a builder that walks everything below `mountpoint`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(mountpoint: P) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            relative_path: None,
            expected_source: None,
            file_flags: DEFAULT_FILE_FLAGS,
            btime_cutoff: None,
            reporting: None,
            restore: None,
        }
    }

    /// Starts the walk at `path` below the mountpoint instead of the
    /// mountpoint itself.
    #[must_use]
    pub fn relative_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    /// Requires the root to live on the filesystem mounted from `source`,
    /// for example a ZFS dataset name.
    #[must_use]
    pub fn expect_source<S: Into<String>>(mut self, source: S) -> Self {
        self.expected_source = Some(source.into());
        self
    }

    /// Flags for opening non-directory entries.
    ///
    /// Defaults to [`DEFAULT_FILE_FLAGS`]. Symbolic links are only yielded
    /// when the flags include `O_PATH`.
    #[must_use]
    pub const fn file_open_flags(mut self, flags: OFlags) -> Self {
        self.file_flags = flags;
        self
    }

    /// Skips non-directories whose birth time is later than `cutoff`.
    #[must_use]
    pub const fn btime_cutoff(mut self, cutoff: SystemTime) -> Self {
        self.btime_cutoff = Some(cutoff);
        self
    }

    /// Calls `callback` every `increment` items and once after the last
    /// one. An increment of zero keeps only the final call.
    #[must_use]
    pub fn reporting<F>(mut self, increment: u64, callback: F) -> Self
    where
        F: FnMut(&DirStack, &WalkStats) -> Result<(), CallbackError> + Send + 'static,
    {
        let callback: ProgressCallback = Box::new(callback);
        self.reporting = Some(Reporting::new(increment, callback));
        self
    }

    /// Resumes from a position saved with [`Walker::dir_stack`].
    ///
    /// An empty snapshot starts a fresh walk.
    #[must_use]
    pub fn restore(mut self, snapshot: DirStack) -> Self {
        self.restore = Some(snapshot);
        self
    }

    /// Opens the root and, when restoring, every saved directory.
    ///
    /// # Errors
    ///
    /// Fails when the root cannot be opened, is not a directory, lives on an
    /// unexpected filesystem, or when a saved frame no longer matches
    /// ([`WalkErrorKind::Restore`](crate::WalkErrorKind::Restore)).
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self)
    }
}
