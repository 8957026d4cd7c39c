use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// A directory the walker has descended into.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirFrame {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Inode observed when the directory was opened.
    pub inode: u64,
}

/// Snapshot of a walker's position, root first.
///
/// Restoring a walker from a snapshot reopens every frame, checks each
/// inode, and continues with the first entry after
/// [`resume_after`](Self::resume_after) in the deepest frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirStack {
    frames: Vec<DirFrame>,
    resume_after: Option<OsString>,
}

impl DirStack {
    /// Builds a snapshot from frames and the last name consumed in the
    /// deepest frame.
    #[must_use]
    pub fn new(frames: Vec<DirFrame>, resume_after: Option<OsString>) -> Self {
        Self {
            frames,
            resume_after,
        }
    }

    /// Frames from the root down.
    #[must_use]
    pub fn frames(&self) -> &[DirFrame] {
        &self.frames
    }

    /// Name of the last entry already yielded from the deepest frame.
    #[must_use]
    pub fn resume_after(&self) -> Option<&OsStr> {
        self.resume_after.as_deref()
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when the snapshot holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Path of the deepest frame.
    #[must_use]
    pub fn current_dir(&self) -> Option<&Path> {
        self.frames.last().map(|frame| frame.path.as_path())
    }

    /// Keeps the first `depth` frames.
    ///
    /// The dropped frame at `depth` becomes the resume point of its parent,
    /// so a restored walker continues with that directory's later siblings.
    #[must_use]
    pub fn truncate(&self, depth: usize) -> Self {
        if depth >= self.frames.len() {
            return self.clone();
        }
        Self {
            resume_after: self.frames[depth].path.file_name().map(OsStr::to_os_string),
            frames: self.frames[..depth].to_vec(),
        }
    }
}
