#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! In-memory NFSv4 and POSIX.1e access control lists, their xattr encodings,
//! the structural rules the kernel enforces on them, and the inheritance
//! algorithm that derives a child's ACL from its parent directory.
//!
//! # Design
//!
//! - [`Nfs4Acl`] and [`PosixAcl`] are immutable once built. NFSv4 ACLs are
//!   kept in canonical order by [`Nfs4Acl::from_aces`]; POSIX ACLs keep the
//!   caller's order within each section.
//! - Bit sets ([`AccessMask`], [`AceFlags`], [`AclFlags`], [`PosixPerm`])
//!   are newtypes over the exact kernel values.
//! - [`validate_nfs4`] and [`validate_posix`] run before every write made by
//!   [`set_acl`].
//! - [`InheritedAclCache`] holds the four ACLs a recursive apply needs.
//!
//! # Errors
//!
//! Decoding fails with [`DecodeError`], validation with [`ValidationError`],
//! and descriptor operations with [`AclError`], which wraps both alongside
//! I/O failures.
//!
//! # Examples
//!
//! ```
//! use acl::{AccessMask, AceFlags, AceType, AclFlags, Nfs4Ace, Nfs4Acl, WhoType};
//!
//! let parent = Nfs4Acl::from_aces(
//!     [Nfs4Ace::special(
//!         AceType::Allow,
//!         AceFlags::FILE_INHERIT | AceFlags::DIRECTORY_INHERIT,
//!         AccessMask::READ_DATA,
//!         WhoType::Everyone,
//!     )],
//!     AclFlags::empty(),
//! );
//! let child = parent.generate_inherited_acl(false);
//! assert_eq!(child.aces()[0].ace_flags, AceFlags::INHERITED);
//! assert_eq!(Nfs4Acl::from_bytes(&child.to_bytes()), Ok(child));
//! ```

mod acl;
mod edit;
mod error;
mod flags;
mod inherit;
mod io;
mod nfs4;
mod posix;
pub mod text;
mod validate;

pub use crate::acl::{Acl, AclBrand};
pub use edit::{PosixEntrySpec, WhoSpec};
pub use error::{AclError, DecodeError, ValidationError};
pub use flags::{AccessMask, AceFlags, AceType, AclFlags, PosixPerm, PosixTag, WhoType};
pub use inherit::InheritedAclCache;
pub use io::{get_acl, remove_acl, set_acl};
pub use nfs4::{NFS4_ACL_XATTR, NO_WHO_ID, Nfs4Ace, Nfs4Acl};
pub use posix::{ACL_UNDEFINED_ID, POSIX_ACCESS_XATTR, POSIX_DEFAULT_XATTR, PosixAce, PosixAcl};
pub use validate::{validate_nfs4, validate_posix};
