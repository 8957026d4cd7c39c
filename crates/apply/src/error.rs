use std::io;
use std::path::PathBuf;

use acl::{AclBrand, AclError};
use thiserror::Error;
use walk::WalkError;

/// Failure while applying an [`EditPlan`](crate::EditPlan).
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Reading, validating or writing an ACL failed.
    #[error(transparent)]
    Acl(#[from] AclError),
    /// The plan carries edits for the other ACL model.
    #[error("cannot apply {requested} entries to a {found} ACL")]
    BrandMismatch {
        /// Model of the ACL stored on the file.
        found: AclBrand,
        /// Model the plan's entries belong to.
        requested: AclBrand,
    },
    /// The target path could not be opened.
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        /// Target path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
    /// The mount holding the target could not be resolved.
    #[error("failed to look up mount of '{}': {source}", path.display())]
    Mount {
        /// Target path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        #[source]
        source: io::Error,
    },
    /// The tree walk failed.
    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// A single entry the recursive apply could not update.
#[derive(Debug)]
pub struct ApplyFailure {
    /// Path of the entry.
    pub path: PathBuf,
    /// What went wrong.
    pub error: ApplyError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn brand_mismatch_names_both_models() {
        let error = ApplyError::BrandMismatch {
            found: AclBrand::Posix,
            requested: AclBrand::Nfs4,
        };
        assert_eq!(error.to_string(), "cannot apply NFS4 entries to a POSIX ACL");
    }

    #[test]
    fn open_error_exposes_io_source() {
        let error = ApplyError::Open {
            path: PathBuf::from("/tank/data"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(error.to_string().starts_with("failed to open '/tank/data': "));
        let source = error
            .source()
            .and_then(|source| source.downcast_ref::<io::Error>())
            .expect("io source");
        assert_eq!(source.kind(), io::ErrorKind::NotFound);
    }
}
