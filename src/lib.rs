#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `acltree` inspects and edits NFSv4 and POSIX ACLs on Linux filesystems,
//! one file at a time or across a whole tree.
//!
//! The workspace crates are re-exported as modules:
//!
//! - [`acl`]: ACL values, the xattr codecs, validation, inheritance and
//!   descriptor I/O.
//! - [`walk`]: the resumable descriptor-based tree walker.
//! - [`apply`]: setfacl-style edit plans and the recursive apply driver.
//! - [`platform`]: the Linux system call wrappers underneath.
//! - [`logging`]: tracing targets and subscriber setup.
//!
//! # Examples
//!
//! Derive the ACL a new file inherits from its directory:
//!
//! ```
//! use acltree::acl::{AccessMask, AceFlags, AceType, AclFlags, Nfs4Ace, Nfs4Acl, WhoType};
//!
//! let inherit = AceFlags::FILE_INHERIT | AceFlags::DIRECTORY_INHERIT;
//! let parent = Nfs4Acl::from_aces(
//!     [Nfs4Ace::special(AceType::Allow, inherit, AccessMask::all(), WhoType::Owner)],
//!     AclFlags::empty(),
//! );
//! let child = parent.generate_inherited_acl(false);
//! assert!(child.aces()[0].is_inherited());
//! assert!(!child.aces()[0].ace_flags.intersects(AceFlags::PROPAGATION));
//! ```

pub use acl;
pub use apply;
pub use logging;
pub use platform;
pub use walk;

pub use acl::{Acl, AclBrand, AclError, InheritedAclCache, get_acl, remove_acl, set_acl};
pub use apply::{ApplyError, ApplyOptions, ApplySummary, EditPlan, apply_recursive, tree_stats};
pub use walk::{DirStack, RestoreError, WalkBuilder, WalkEntry, WalkError, Walker};
