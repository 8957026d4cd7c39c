//! crates/apply/src/recursive.rs
//!
//! Applying an edit plan to a whole tree.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use acl::{Acl, InheritedAclCache};
use logging::{trace_apply, warn_apply};
use platform::{DEFAULT_FILE_FLAGS, MountInfo, mount_lookup, open_no_follow, stat_fd};
use walk::{CallbackError, DirStack, RestoreError, WalkBuilder, WalkStats, Walker};

use crate::error::{ApplyError, ApplyFailure};
use crate::plan::EditPlan;
use crate::writer::{AclWriter, XattrWriter};

type Checkpoint = Box<dyn FnMut(&DirStack, &WalkStats) -> Result<(), CallbackError> + Send>;

/// Options for [`apply_recursive`].
#[derive(Default)]
pub struct ApplyOptions {
    recursive: bool,
    resume: Option<DirStack>,
    checkpoint: Option<(u64, Checkpoint)>,
}

impl ApplyOptions {
    /// Options that touch only the named path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Descends into directories.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Continues an interrupted run from a saved walker position.
    #[must_use]
    pub fn resume(mut self, snapshot: DirStack) -> Self {
        self.resume = Some(snapshot);
        self
    }

    /// Hands the walker position to `callback` every `increment` entries
    /// and once at the end, so a caller can persist it for [`resume`].
    ///
    /// [`resume`]: Self::resume
    #[must_use]
    pub fn checkpoint<F>(mut self, increment: u64, callback: F) -> Self
    where
        F: FnMut(&DirStack, &WalkStats) -> Result<(), CallbackError> + Send + 'static,
    {
        self.checkpoint = Some((increment, Box::new(callback)));
        self
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("recursive", &self.recursive)
            .field("resume", &self.resume)
            .field(
                "checkpoint_increment",
                &self.checkpoint.as_ref().map(|(increment, _)| *increment),
            )
            .finish()
    }
}

/// Outcome of a recursive apply.
#[derive(Debug, Default)]
pub struct ApplySummary {
    /// Entries looked at, the root included.
    pub visited: u64,
    /// Entries whose ACL was processed without error.
    pub applied: u64,
    /// Entries that failed, including entries the walker could not open.
    /// A failure of the walk itself ends the run and is recorded here as
    /// well.
    pub errors: Vec<ApplyFailure>,
}

impl ApplySummary {
    /// Returns `true` when no entry failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Applies `plan` to `path` and, with [`ApplyOptions::recursive`], to every
/// entry below it on the same filesystem.
///
/// When the root ends up with an NFSv4 ACL, descendants receive the ACL
/// they would inherit from it, computed once per depth and file type,
/// instead of the plan. POSIX trees get the plan applied to each entry.
/// Symbolic links are never touched.
///
/// # Errors
///
/// Fails when the root cannot be opened or updated, when its mount cannot
/// be resolved, or when the walk cannot start. Failures on individual
/// entries are collected in [`ApplySummary::errors`].
pub fn apply_recursive(
    path: &Path,
    plan: &EditPlan,
    options: ApplyOptions,
) -> Result<ApplySummary, ApplyError> {
    apply_recursive_with(path, plan, options, &mut XattrWriter)
}

/// [`apply_recursive`] with a caller-provided [`AclWriter`].
///
/// # Errors
///
/// See [`apply_recursive`].
pub fn apply_recursive_with<W: AclWriter>(
    path: &Path,
    plan: &EditPlan,
    options: ApplyOptions,
    writer: &mut W,
) -> Result<ApplySummary, ApplyError> {
    let fd = open_no_follow(path, DEFAULT_FILE_FLAGS).map_err(|source| ApplyError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let root = plan.apply(&fd, writer)?;
    let is_dir = stat_fd(&fd).map_err(acl::AclError::from)?.is_dir();
    drop(fd);

    let mut summary = ApplySummary {
        visited: 1,
        applied: 1,
        errors: Vec::new(),
    };
    if !options.recursive || !is_dir {
        return Ok(summary);
    }

    let mount = mount_lookup(path).map_err(|source| ApplyError::Mount {
        path: path.to_path_buf(),
        source,
    })?;
    let cache = match &root.acl {
        Acl::Nfs4(_) => Some(InheritedAclCache::from_root(&root.acl)),
        Acl::Posix(_) => None,
    };
    trace_apply!(
        mountpoint = %mount.mountpoint.display(),
        source = %mount.source,
        inherit = cache.is_some(),
        "applying recursively below {}",
        path.display()
    );

    let walker = open_walker(&mount, options)?;
    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(error) if error.is_entry_error() => {
                summary.visited += 1;
                warn_apply!("{error}");
                summary.errors.push(ApplyFailure {
                    path: error.path().to_path_buf(),
                    error: error.into(),
                });
                continue;
            }
            Err(error) => {
                warn_apply!("walk stopped: {error}");
                summary.errors.push(ApplyFailure {
                    path: error.path().to_path_buf(),
                    error: error.into(),
                });
                break;
            }
        };

        summary.visited += 1;
        if entry.is_symlink() {
            continue;
        }

        let result = match &cache {
            Some(cache) => writer
                .write_acl(entry.fd(), cache.pick(entry.depth(), entry.is_dir()))
                .map_err(ApplyError::from),
            None => plan.apply(entry.fd(), writer).map(|_| ()),
        };
        match result {
            Ok(()) => summary.applied += 1,
            Err(error) => {
                let path = entry.full_path();
                warn_apply!("{}: {error}", path.display());
                summary.errors.push(ApplyFailure { path, error });
            }
        }
    }

    trace_apply!(
        visited = summary.visited,
        applied = summary.applied,
        failed = summary.errors.len(),
        "recursive apply finished"
    );
    Ok(summary)
}

/// Builds the walker, retrying with a shorter snapshot whenever part of the
/// saved position has disappeared.
fn open_walker(mount: &MountInfo, options: ApplyOptions) -> Result<Walker, ApplyError> {
    let ApplyOptions {
        mut resume,
        checkpoint,
        ..
    } = options;
    let checkpoint =
        checkpoint.map(|(increment, callback)| (increment, Arc::new(Mutex::new(callback))));

    loop {
        let mut builder = WalkBuilder::new(&mount.mountpoint).expect_source(mount.source.clone());
        if let Some(relative) = &mount.relative_path {
            builder = builder.relative_path(relative);
        }
        if let Some((increment, callback)) = &checkpoint {
            let callback = Arc::clone(callback);
            builder = builder.reporting(*increment, move |stack, stats| {
                let mut callback = callback
                    .lock()
                    .map_err(|_| CallbackError::from("checkpoint callback panicked"))?;
                (*callback)(stack, stats)
            });
        }
        if let Some(snapshot) = &resume {
            builder = builder.restore(snapshot.clone());
        }

        let error = match builder.build() {
            Ok(walker) => return Ok(walker),
            Err(error) => error,
        };
        let depth = error.as_restore().map(RestoreError::depth).filter(|&depth| depth > 0);
        match (depth, resume.take()) {
            (Some(depth), Some(snapshot)) => {
                warn_apply!("{error}; resuming from the nearest surviving directory");
                resume = Some(snapshot.truncate(depth));
            }
            _ => return Err(error.into()),
        }
    }
}

/// Walks the tree below `path` and returns the final totals.
///
/// Entries that cannot be opened are counted in [`WalkStats::errors`]
/// rather than failing the whole count.
///
/// # Errors
///
/// Fails when `path` is not a directory or the walk itself fails.
pub fn tree_stats(path: &Path) -> Result<WalkStats, ApplyError> {
    let totals = Arc::new(Mutex::new(WalkStats::default()));
    let sink = Arc::clone(&totals);
    let walker = WalkBuilder::new(path)
        .reporting(0, move |_, stats| {
            let mut totals = sink
                .lock()
                .map_err(|_| CallbackError::from("stats sink panicked"))?;
            totals.clone_from(stats);
            Ok(())
        })
        .build()?;
    for item in walker {
        // Unreadable entries are counted in `WalkStats::errors`.
        if let Err(error) = item
            && !error.is_entry_error()
        {
            return Err(error.into());
        }
    }

    let totals = totals.lock().unwrap_or_else(PoisonError::into_inner).clone();
    Ok(totals)
}
