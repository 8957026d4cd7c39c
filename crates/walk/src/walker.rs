use std::ffi::{OsStr, OsString};
use std::io;
use std::os::fd::OwnedFd;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use logging::trace_walk;
use platform::{
    DIRECTORY_FLAGS, DirName, FileStat, OFlags, is_pruned_open, mount_lookup, open_beneath,
    open_directory_no_follow, read_dir_sorted, stat_fd,
};

use crate::MAX_DEPTH;
use crate::builder::WalkBuilder;
use crate::entry::WalkEntry;
use crate::error::{RestoreError, WalkError, WalkErrorKind};
use crate::progress::{Reporting, WalkStats};
use crate::stack::{DirFrame, DirStack};

/// Depth-first pre-order iterator over a single mount.
///
/// Each directory's entries are listed once, sorted by name, when the
/// directory is entered. Every yielded [`WalkEntry`] owns a fresh
/// descriptor; the walker keeps its own descriptor for each directory on
/// the current path and closes them as it climbs back up.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    file_flags: OFlags,
    btime_cutoff: Option<SystemTime>,
    reporting: Option<Reporting>,
    frames: Vec<Frame>,
    stats: WalkStats,
    last: Option<(PathBuf, bool)>,
    finished: bool,
}

#[derive(Debug)]
struct Frame {
    path: PathBuf,
    inode: u64,
    fd: OwnedFd,
    names: Vec<DirName>,
    index: usize,
}

impl Frame {
    fn open(path: PathBuf, fd: OwnedFd, inode: u64) -> io::Result<Self> {
        let names = read_dir_sorted(&fd)?;
        trace_walk!(entries = names.len(), "entered {}", path.display());
        Ok(Self {
            path,
            inode,
            fd,
            names,
            index: 0,
        })
    }

    /// Moves the cursor past every name up to and including `name`.
    fn seek_past(&mut self, name: &OsStr) {
        self.index = self
            .names
            .partition_point(|entry| entry.name.as_os_str() <= name);
    }

    fn last_consumed(&self) -> Option<&OsString> {
        self.index
            .checked_sub(1)
            .and_then(|index| self.names.get(index))
            .map(|entry| &entry.name)
    }
}

impl Walker {
    pub(crate) fn new(builder: WalkBuilder) -> Result<Self, WalkError> {
        let WalkBuilder {
            mountpoint,
            relative_path,
            expected_source,
            file_flags,
            btime_cutoff,
            reporting,
            restore,
        } = builder;

        let root = match relative_path {
            Some(relative) => mountpoint.join(relative),
            None => mountpoint,
        };

        let fd = open_directory_no_follow(&root).map_err(|error| {
            if error.kind() == io::ErrorKind::NotADirectory {
                WalkError::new(WalkErrorKind::NotADirectory { path: root.clone() })
            } else {
                WalkError::open_root(root.clone(), error)
            }
        })?;
        let stat = stat_fd(&fd).map_err(|error| WalkError::open_root(root.clone(), error))?;
        if !stat.is_dir() {
            return Err(WalkError::new(WalkErrorKind::NotADirectory { path: root }));
        }

        if let Some(expected) = expected_source {
            let info =
                mount_lookup(&root).map_err(|error| WalkError::mount_lookup(root.clone(), error))?;
            if info.source != expected {
                return Err(WalkError::new(WalkErrorKind::MountMismatch {
                    path: root,
                    expected,
                    found: info.source,
                }));
            }
        }

        let root_frame = Frame::open(root.clone(), fd, stat.ino)
            .map_err(|error| WalkError::read_dir(root.clone(), error))?;

        let frames = match restore {
            Some(snapshot) if !snapshot.is_empty() => restore_frames(root_frame, &snapshot)?,
            _ => vec![root_frame],
        };

        trace_walk!(
            depth = frames.len(),
            restored = frames.len() > 1,
            "walking {}",
            root.display()
        );

        Ok(Self {
            root,
            file_flags,
            btime_cutoff,
            reporting,
            frames,
            stats: WalkStats::default(),
            last: None,
            finished: false,
        })
    }

    /// Directory the walk started from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Totals accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Snapshot of the current position.
    ///
    /// After a file at depth `d` the snapshot holds `d` frames; after a
    /// directory at depth `d` it holds `d + 1`, the last one being that
    /// directory. Passing the snapshot to [`WalkBuilder::restore`]
    /// continues with the item that would have followed.
    #[must_use]
    pub fn dir_stack(&self) -> DirStack {
        let frames = self
            .frames
            .iter()
            .map(|frame| DirFrame {
                path: frame.path.clone(),
                inode: frame.inode,
            })
            .collect();
        let resume_after = self.frames.last().and_then(Frame::last_consumed).cloned();
        DirStack::new(frames, resume_after)
    }

    /// Prunes the directory that was just yielded so none of its
    /// descendants are visited.
    ///
    /// # Errors
    ///
    /// Returns [`WalkErrorKind::InvalidSkip`] unless the most recent item
    /// was a directory that has not been skipped already. Iteration may
    /// continue after this error.
    pub fn skip_current_dir(&mut self) -> Result<(), WalkError> {
        match self.last.take() {
            Some((path, true)) => {
                self.frames.pop();
                trace_walk!("pruned {}", path.display());
                self.last = Some((path, false));
                Ok(())
            }
            last => {
                let path = last
                    .as_ref()
                    .map_or_else(|| self.root.clone(), |(path, _)| path.clone());
                self.last = last;
                Err(WalkError::new(WalkErrorKind::InvalidSkip { path }))
            }
        }
    }

    fn fail(&mut self, error: WalkError) -> Option<Result<WalkEntry, WalkError>> {
        self.finished = true;
        Some(Err(error))
    }

    fn finish(&mut self) -> Option<Result<WalkEntry, WalkError>> {
        self.finished = true;
        trace_walk!(
            count = self.stats.count,
            bytes = self.stats.bytes,
            "finished {}",
            self.root.display()
        );
        let stack = self.dir_stack();
        let reporting = self.reporting.as_mut()?;
        match reporting.call(&stack, &self.stats) {
            Ok(()) => None,
            Err(error) => Some(Err(WalkError::callback(
                self.stats.current_dir.clone(),
                error,
            ))),
        }
    }

    /// Opens `name` in the deepest frame. `Ok(None)` means the entry is
    /// filtered out.
    fn open_entry(&mut self, name: DirName) -> Result<Option<WalkEntry>, WalkError> {
        let depth = self.frames.len();
        let Some(parent) = self.frames.last() else {
            return Ok(None);
        };
        let parent_path = parent.path.clone();
        let path = parent_path.join(&name.name);

        let hinted_dir = name.is_dir == Some(true);
        let flags = if hinted_dir {
            DIRECTORY_FLAGS
        } else {
            self.file_flags
        };
        let fd = match open_beneath(&parent.fd, &name.name, flags) {
            Ok(fd) => fd,
            Err(error) if is_pruned_open(&error) => {
                trace_walk!("not following {}: {}", path.display(), error);
                return Ok(None);
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                trace_walk!("{} vanished before it was opened", path.display());
                return Ok(None);
            }
            Err(error) => return Err(WalkError::open(path, error)),
        };
        let mut stat = stat_fd(&fd).map_err(|error| WalkError::metadata(path.clone(), error))?;

        if !stat.is_dir() {
            if let (Some(cutoff), Some(btime)) = (self.btime_cutoff, stat.btime)
                && btime > cutoff
            {
                return Ok(None);
            }
            return Ok(Some(self.entry(parent_path, name.name, fd, stat, depth)));
        }

        if depth >= MAX_DEPTH {
            return Err(WalkError::new(WalkErrorKind::MaxDepth { path }));
        }

        // Directories found without a d_type hint were opened with the file
        // flags and need a proper directory descriptor.
        let fd = if hinted_dir {
            fd
        } else {
            drop(fd);
            let fd = open_beneath(&parent.fd, &name.name, DIRECTORY_FLAGS)
                .map_err(|error| WalkError::open(path.clone(), error))?;
            stat = stat_fd(&fd).map_err(|error| WalkError::metadata(path.clone(), error))?;
            fd
        };

        let frame_fd = fd
            .try_clone()
            .map_err(|error| WalkError::open(path.clone(), error))?;
        let frame = Frame::open(path.clone(), frame_fd, stat.ino)
            .map_err(|error| WalkError::read_dir(path, error))?;
        self.frames.push(frame);

        Ok(Some(self.entry(parent_path, name.name, fd, stat, depth)))
    }

    fn entry(
        &mut self,
        parent: PathBuf,
        name: OsString,
        fd: OwnedFd,
        stat: FileStat,
        depth: usize,
    ) -> WalkEntry {
        self.stats.count += 1;
        if !stat.is_dir() {
            self.stats.bytes += stat.size;
        }
        if self.stats.current_dir != parent {
            self.stats.current_dir.clone_from(&parent);
        }
        self.last = Some((parent.join(&name), stat.is_dir()));
        WalkEntry {
            parent,
            name,
            fd,
            stat,
            depth,
        }
    }

    fn report(&mut self) -> Result<(), WalkError> {
        let Some(reporting) = self.reporting.as_ref() else {
            return Ok(());
        };
        if !reporting.is_due(self.stats.count) {
            return Ok(());
        }
        let stack = self.dir_stack();
        if let Some(reporting) = self.reporting.as_mut() {
            reporting
                .call(&stack, &self.stats)
                .map_err(|error| WalkError::callback(self.stats.current_dir.clone(), error))?;
        }
        Ok(())
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let Some(frame) = self.frames.last_mut() else {
                return self.finish();
            };
            let Some(name) = frame.names.get(frame.index).cloned() else {
                self.frames.pop();
                continue;
            };
            frame.index += 1;

            match self.open_entry(name) {
                Ok(Some(entry)) => {
                    if let Err(error) = self.report() {
                        return self.fail(error);
                    }
                    return Some(Ok(entry));
                }
                Ok(None) => {}
                Err(error) if error.is_entry_error() => {
                    self.stats.errors += 1;
                    self.last = Some((error.path().to_path_buf(), false));
                    trace_walk!("{error}");
                    return Some(Err(error));
                }
                Err(error) => return self.fail(error),
            }
        }
    }
}

/// Reopens every saved frame below the already opened root.
fn restore_frames(root: Frame, snapshot: &DirStack) -> Result<Vec<Frame>, RestoreError> {
    let saved = snapshot.frames();
    if saved[0].path != root.path || saved[0].inode != root.inode {
        return Err(RestoreError::new(0, saved[0].path.clone()));
    }

    let mut frames = vec![root];
    for (depth, saved_frame) in saved.iter().enumerate().skip(1) {
        let failed = || RestoreError::new(depth, saved_frame.path.clone());
        let Some(parent) = frames.last_mut() else {
            return Err(failed());
        };
        let name = match saved_frame.path.file_name() {
            Some(name) if saved_frame.path.parent() == Some(parent.path.as_path()) => name,
            _ => return Err(failed()),
        };

        let fd = open_beneath(&parent.fd, name, DIRECTORY_FLAGS).map_err(|_| failed())?;
        let stat = stat_fd(&fd).map_err(|_| failed())?;
        if stat.ino != saved_frame.inode {
            return Err(failed());
        }
        parent.seek_past(name);

        let frame =
            Frame::open(saved_frame.path.clone(), fd, stat.ino).map_err(|_| failed())?;
        frames.push(frame);
    }

    if let (Some(top), Some(resume_after)) = (frames.last_mut(), snapshot.resume_after()) {
        top.seek_past(resume_after);
    }
    trace_walk!(depth = frames.len(), "restored walk position");
    Ok(frames)
}
