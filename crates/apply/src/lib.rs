#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `apply` turns setfacl-style requests into ACL writes, for one file or a
//! whole tree.
//!
//! # Design
//!
//! - [`EditPlan`] holds the typed edits (strip, remove default, remove,
//!   modify, replace) and applies them to one descriptor.
//! - [`AclWriter`] abstracts ACL storage; [`XattrWriter`] is the
//!   filesystem implementation.
//! - [`apply_recursive`] applies a plan to a root and walks everything
//!   below it on the same mount. NFSv4 trees receive the ACLs inherited
//!   from the root, precomputed once through
//!   [`InheritedAclCache`](acl::InheritedAclCache); POSIX trees get the
//!   plan applied per entry. An interrupted run resumes from a saved
//!   [`DirStack`](walk::DirStack), falling back to the nearest directory
//!   that still exists.
//! - [`tree_stats`] counts the entries and bytes below a directory.
//!
//! # Errors
//!
//! Failures on the root are returned as [`ApplyError`]. Failures on
//! individual entries are collected in [`ApplySummary::errors`] and the run
//! continues.

mod error;
mod plan;
mod recursive;
mod writer;

pub use error::{ApplyError, ApplyFailure};
pub use plan::{Applied, EditPlan};
pub use recursive::{ApplyOptions, ApplySummary, apply_recursive, apply_recursive_with, tree_stats};
pub use writer::{AclWriter, XattrWriter};
