//! Temporary directory trees for tests across the workspace.
//!
//! ```ignore
//! let tree = TestTree::new();
//! tree.dir("a/b");
//! tree.file("a/b/c.txt", b"data");
//! ```

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch directory removed on drop.
///
/// Helpers create parents as needed and panic on failure, which is what a
/// test wants when its fixture cannot be built.
pub struct TestTree {
    temp: TempDir,
}

impl TestTree {
    /// Creates an empty tree under the system temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("create tempdir"),
        }
    }

    /// The tree's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// Creates a directory and any missing parents.
    pub fn dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Writes a file, creating parent directories first.
    pub fn file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Creates a symlink at `relative` pointing to `target`.
    pub fn symlink(&self, target: impl AsRef<Path>, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.path(relative);
        symlink(target, &path).expect("create symlink");
        path
    }

    /// Removes a directory and everything below it.
    pub fn remove_dir(&self, relative: impl AsRef<Path>) {
        fs::remove_dir_all(self.path(relative)).expect("remove dir");
    }

    /// Builds the layout most walker and apply tests share:
    ///
    /// ```text
    /// a/
    ///   a1.txt
    ///   nested/
    ///     deep.txt
    /// b/
    /// c.txt
    /// ```
    #[must_use]
    pub fn sample() -> Self {
        let tree = Self::new();
        tree.file("a/a1.txt", b"one");
        tree.file("a/nested/deep.txt", b"deeper");
        tree.dir("b");
        tree.file("c.txt", b"top");
        tree
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}
