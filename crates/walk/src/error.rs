use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error raised by a progress callback.
pub type CallbackError = Box<dyn Error + Send + Sync + 'static>;

/// Error returned when traversal fails.
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn open_root(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::OpenRoot { path, source })
    }

    pub(crate) fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir { path, source })
    }

    pub(crate) fn open(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Open { path, source })
    }

    pub(crate) fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Metadata { path, source })
    }

    pub(crate) fn mount_lookup(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::MountLookup { path, source })
    }

    pub(crate) fn callback(path: PathBuf, source: CallbackError) -> Self {
        Self::new(WalkErrorKind::Callback { path, source })
    }

    /// Returns the specific failure.
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the filesystem path associated with the error.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.kind.path()
    }

    /// Returns `true` when the failure concerns one entry. The walker has
    /// already moved past it and the next call continues with its siblings.
    #[must_use]
    pub const fn is_entry_error(&self) -> bool {
        matches!(
            self.kind,
            WalkErrorKind::Open { .. }
                | WalkErrorKind::Metadata { .. }
                | WalkErrorKind::ReadDir { .. }
                | WalkErrorKind::MaxDepth { .. }
        )
    }

    /// Returns the restore failure, when restoring a saved position failed.
    #[must_use]
    pub fn as_restore(&self) -> Option<&RestoreError> {
        match &self.kind {
            WalkErrorKind::Restore(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WalkErrorKind::OpenRoot { path, source } => {
                write!(
                    f,
                    "failed to open traversal root '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::NotADirectory { path } => {
                write!(f, "traversal root '{}' is not a directory", path.display())
            }
            WalkErrorKind::MountLookup { path, source } => {
                write!(f, "failed to look up mount of '{}': {}", path.display(), source)
            }
            WalkErrorKind::MountMismatch {
                path,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{}: filesystem source mismatch (expected {expected}, got {found})",
                    path.display()
                )
            }
            WalkErrorKind::ReadDir { path, source } => {
                write!(
                    f,
                    "failed to read directory '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Open { path, source } => {
                write!(f, "failed to open '{}': {}", path.display(), source)
            }
            WalkErrorKind::Metadata { path, source } => {
                write!(
                    f,
                    "failed to inspect metadata for '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::MaxDepth { path } => {
                write!(
                    f,
                    "max depth {} exceeded at '{}'",
                    crate::MAX_DEPTH,
                    path.display()
                )
            }
            WalkErrorKind::InvalidSkip { .. } => {
                f.write_str("skip_current_dir() can only be called when the last yielded item was a directory")
            }
            WalkErrorKind::Callback { path, source } => {
                write!(
                    f,
                    "progress callback failed in '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Restore(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            WalkErrorKind::OpenRoot { source, .. }
            | WalkErrorKind::MountLookup { source, .. }
            | WalkErrorKind::ReadDir { source, .. }
            | WalkErrorKind::Open { source, .. }
            | WalkErrorKind::Metadata { source, .. } => Some(source),
            WalkErrorKind::Callback { source, .. } => Some(source.as_ref()),
            WalkErrorKind::Restore(error) => Some(error),
            WalkErrorKind::NotADirectory { .. }
            | WalkErrorKind::MountMismatch { .. }
            | WalkErrorKind::MaxDepth { .. }
            | WalkErrorKind::InvalidSkip { .. } => None,
        }
    }
}

impl From<RestoreError> for WalkError {
    fn from(error: RestoreError) -> Self {
        Self::new(WalkErrorKind::Restore(error))
    }
}

/// Classification of traversal failures.
#[derive(Debug)]
pub enum WalkErrorKind {
    /// Failed to open or inspect the traversal root.
    OpenRoot {
        /// Root path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The traversal root is not a directory.
    NotADirectory {
        /// Root path.
        path: PathBuf,
    },
    /// Failed to resolve the mount holding the root.
    MountLookup {
        /// Root path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The root lives on a filesystem other than the expected one.
    MountMismatch {
        /// Root path.
        path: PathBuf,
        /// Filesystem source the caller expected.
        expected: String,
        /// Filesystem source actually mounted there.
        found: String,
    },
    /// Failed to read the contents of a directory.
    ReadDir {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to open an entry.
    Open {
        /// Entry path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to retrieve metadata for an entry.
    Metadata {
        /// Path whose metadata could not be retrieved.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Descending further would exceed [`MAX_DEPTH`](crate::MAX_DEPTH).
    MaxDepth {
        /// Directory that was not entered.
        path: PathBuf,
    },
    /// `skip_current_dir()` was called when the last item was not a directory.
    InvalidSkip {
        /// Path of the last yielded item, or the root when nothing was yielded.
        path: PathBuf,
    },
    /// The progress callback returned an error.
    Callback {
        /// Directory being traversed when the callback ran.
        path: PathBuf,
        /// Error returned by the callback.
        source: CallbackError,
    },
    /// A saved position could not be restored.
    Restore(RestoreError),
}

impl WalkErrorKind {
    /// Returns the filesystem path tied to the failure.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            WalkErrorKind::OpenRoot { path, .. }
            | WalkErrorKind::NotADirectory { path }
            | WalkErrorKind::MountLookup { path, .. }
            | WalkErrorKind::MountMismatch { path, .. }
            | WalkErrorKind::ReadDir { path, .. }
            | WalkErrorKind::Open { path, .. }
            | WalkErrorKind::Metadata { path, .. }
            | WalkErrorKind::MaxDepth { path }
            | WalkErrorKind::InvalidSkip { path }
            | WalkErrorKind::Callback { path, .. } => path,
            WalkErrorKind::Restore(error) => error.path(),
        }
    }
}

/// Failure to re-enter a directory recorded in a saved
/// [`DirStack`](crate::DirStack).
///
/// `depth` is the index of the first frame that could not be reopened or
/// whose inode no longer matches. Retrying with the stack truncated to
/// `depth` frames resumes in the deepest directory that still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreError {
    depth: usize,
    path: PathBuf,
}

impl RestoreError {
    pub(crate) fn new(depth: usize, path: PathBuf) -> Self {
        Self { depth, path }
    }

    /// Index of the first frame that failed verification.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Path of the directory that failed verification.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to restore iterator position at depth {} in directory: {}",
            self.depth,
            self.path.display()
        )
    }
}

impl Error for RestoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error(message: &'static str) -> io::Error {
        io::Error::other(message)
    }

    #[test]
    fn walk_error_path_matches_variant_path() {
        let root = WalkError::open_root(PathBuf::from("root"), io_error("root"));
        assert_eq!(Path::new("root"), root.path());

        let read_dir = WalkError::read_dir(PathBuf::from("dir"), io_error("dir"));
        assert_eq!(Path::new("dir"), read_dir.path());

        let restore = WalkError::from(RestoreError::new(2, PathBuf::from("/a/b")));
        assert_eq!(Path::new("/a/b"), restore.path());
        assert_eq!(restore.as_restore().map(RestoreError::depth), Some(2));
    }

    #[test]
    fn walk_error_display_is_specific_per_variant() {
        let open = WalkError::open(PathBuf::from("entry"), io_error("boom"));
        assert_eq!("failed to open 'entry': boom", open.to_string());

        let metadata = WalkError::metadata(PathBuf::from("meta"), io_error("boom"));
        assert_eq!(
            "failed to inspect metadata for 'meta': boom",
            metadata.to_string()
        );

        let mismatch = WalkError::new(WalkErrorKind::MountMismatch {
            path: PathBuf::from("/mnt/tank"),
            expected: "tank".to_owned(),
            found: "other".to_owned(),
        });
        assert_eq!(
            "/mnt/tank: filesystem source mismatch (expected tank, got other)",
            mismatch.to_string()
        );

        let restore = RestoreError::new(1, PathBuf::from("/mnt/tank/gone"));
        assert_eq!(
            "failed to restore iterator position at depth 1 in directory: /mnt/tank/gone",
            restore.to_string()
        );
    }

    #[test]
    fn walk_error_source_exposes_callback_error() {
        let error = WalkError::callback(PathBuf::from("dir"), "stop".into());
        let source = error.source().expect("callback source");
        assert_eq!(source.to_string(), "stop");
        assert!(error.as_restore().is_none());
    }

    #[test]
    fn walk_error_source_refers_to_underlying_io_error() {
        let error = WalkError::read_dir(PathBuf::from("dir"), io_error("source"));
        let source_ref = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("walk error should expose the underlying io::Error");
        assert_eq!(source_ref.to_string(), "source");
    }
}
