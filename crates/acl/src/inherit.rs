//! Derivation of the ACL a newly created child receives from its parent
//! directory, and the per-depth cache used by recursive apply.

use crate::acl::Acl;
use crate::flags::{AceFlags, AclFlags};
use crate::nfs4::Nfs4Acl;
use crate::posix::PosixAcl;

const FILE_CHILD_CLEARED: AceFlags = AceFlags::PROPAGATION;
const NO_PROPAGATE_CLEARED: AceFlags = AceFlags::FILE_INHERIT
    .union(AceFlags::DIRECTORY_INHERIT)
    .union(AceFlags::NO_PROPAGATE_INHERIT);

impl Nfs4Acl {
    /// Computes the ACL a file (`is_dir == false`) or directory child would
    /// inherit from this directory ACL.
    ///
    /// Files take the `FILE_INHERIT` entries with every propagation flag
    /// cleared. Directories take the `DIRECTORY_INHERIT` entries with
    /// `INHERIT_ONLY` cleared, and additionally lose all propagation flags
    /// when `NO_PROPAGATE_INHERIT` was set. Every survivor is marked
    /// `INHERITED`.
    ///
    /// This never fails: a parent with nothing to pass on yields an empty
    /// ACL, and [`validate_nfs4`](crate::validate_nfs4) rejects it later if
    /// it is written to a directory.
    #[must_use]
    pub fn generate_inherited_acl(&self, is_dir: bool) -> Self {
        let selector = if is_dir {
            AceFlags::DIRECTORY_INHERIT
        } else {
            AceFlags::FILE_INHERIT
        };

        let aces = self
            .aces()
            .iter()
            .filter(|ace| ace.ace_flags.contains(selector))
            .map(|ace| {
                let mut inherited = *ace;
                let flags = &mut inherited.ace_flags;
                if is_dir {
                    if flags.contains(AceFlags::NO_PROPAGATE_INHERIT) {
                        flags.remove(NO_PROPAGATE_CLEARED);
                    }
                    flags.remove(AceFlags::INHERIT_ONLY);
                } else {
                    flags.remove(FILE_CHILD_CLEARED);
                }
                flags.insert(AceFlags::INHERITED);
                inherited
            });

        Self::from_aces(aces, self.acl_flags() & AclFlags::AUTO_INHERIT)
    }
}

impl PosixAcl {
    /// Computes the ACL a child would receive from this directory ACL.
    ///
    /// The child's access section is the parent's default section. A
    /// directory child also receives the default section unchanged, mask
    /// included. Without a parent default section the result is empty.
    #[must_use]
    pub fn generate_inherited_acl(&self, is_dir: bool) -> Self {
        let access = self.default_aces().iter().map(|ace| ace.with_default(false));
        if is_dir {
            Self::from_aces(access.chain(self.default_aces().iter().copied()))
        } else {
            Self::from_aces(access)
        }
    }
}

/// Inherited ACLs for the first two levels below a root directory.
///
/// Below depth 2 the inherited ACL is a fixed point for every ACL produced
/// by [`Nfs4Acl::generate_inherited_acl`], so four values cover any depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InheritedAclCache {
    d1_file: Acl,
    d1_dir: Acl,
    d2_file: Acl,
    d2_dir: Acl,
}

impl InheritedAclCache {
    /// Precomputes the four variants from the root directory's ACL.
    #[must_use]
    pub fn from_root(root: &Acl) -> Self {
        let d1_dir = root.generate_inherited_acl(true);
        Self {
            d1_file: root.generate_inherited_acl(false),
            d2_file: d1_dir.generate_inherited_acl(false),
            d2_dir: d1_dir.generate_inherited_acl(true),
            d1_dir,
        }
    }

    /// Returns the ACL for an entry at `depth` below the root, where the
    /// root's direct children are at depth 1.
    ///
    /// Depth counts path components below the root, so the root itself
    /// would be depth 0; a caller counting the root as 1 must subtract one.
    /// Depth 0 is treated like depth 1.
    #[must_use]
    pub const fn pick(&self, depth: usize, is_dir: bool) -> &Acl {
        match (depth <= 1, is_dir) {
            (true, true) => &self.d1_dir,
            (true, false) => &self.d1_file,
            (false, true) => &self.d2_dir,
            (false, false) => &self.d2_file,
        }
    }
}
