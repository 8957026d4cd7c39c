//! Structural checks run before any ACL is written.
//!
//! The rules mirror what Linux and ZFS enforce on `fsetxattr`, so a caller
//! learns about a bad ACL from a precise message instead of a bare `EINVAL`.

use crate::error::ValidationError;
use crate::flags::{AceFlags, AceType, PosixTag};
use crate::nfs4::Nfs4Acl;
use crate::posix::{ACL_UNDEFINED_ID, PosixAce, PosixAcl};

/// Validates an NFSv4 ACL for a file or directory target.
///
/// # Errors
///
/// - DENY on `OWNER@`, `GROUP@` or `EVERYONE@`.
/// - `INHERIT_ONLY` without `FILE_INHERIT` or `DIRECTORY_INHERIT`.
/// - Any propagation flag on a non-directory.
/// - A directory ACL without an ACE carrying `FILE_INHERIT` or
///   `DIRECTORY_INHERIT`.
pub fn validate_nfs4(acl: &Nfs4Acl, is_dir: bool) -> Result<(), ValidationError> {
    let mut has_propagation = false;
    let mut has_inheritable = false;

    for ace in acl.aces() {
        if ace.ace_type == AceType::Deny && ace.who_type.is_special() {
            return Err(ValidationError::DenyOnSpecialPrincipal);
        }
        if ace.ace_flags.contains(AceFlags::INHERIT_ONLY)
            && !ace.ace_flags.intersects(AceFlags::INHERITABLE)
        {
            return Err(ValidationError::InheritOnlyWithoutPropagation);
        }
        has_propagation |= ace.ace_flags.intersects(AceFlags::PROPAGATION);
        has_inheritable |= ace.ace_flags.intersects(AceFlags::INHERITABLE);
    }

    if has_propagation && !is_dir {
        return Err(ValidationError::PropagationOnFile);
    }
    if is_dir && !has_inheritable {
        return Err(ValidationError::NoInheritableAce);
    }
    Ok(())
}

/// Validates a POSIX ACL for a file or directory target.
///
/// Each present section needs exactly one `USER_OBJ`, `GROUP_OBJ` and
/// `OTHER`; named entries need an id and exactly one `MASK`. A default
/// section is only accepted on directories.
pub fn validate_posix(acl: &PosixAcl, is_dir: bool) -> Result<(), ValidationError> {
    if !acl.access().is_empty() {
        validate_section(acl.access(), "access")?;
    }
    if acl.has_default() {
        if !is_dir {
            return Err(ValidationError::DefaultOnFile);
        }
        validate_section(acl.default_aces(), "default")?;
    }
    Ok(())
}

fn validate_section(entries: &[PosixAce], section: &'static str) -> Result<(), ValidationError> {
    let count = |tag: PosixTag| entries.iter().filter(|ace| ace.tag == tag).count();

    for ace in entries {
        if ace.tag.is_named() && ace.id == ACL_UNDEFINED_ID {
            return Err(ValidationError::NamedWithoutId {
                section,
                tag: ace.tag.name(),
            });
        }
    }

    for tag in [PosixTag::UserObj, PosixTag::GroupObj, PosixTag::Other] {
        if count(tag) != 1 {
            return Err(ValidationError::RequiredEntry {
                section,
                tag: tag.name(),
            });
        }
    }

    let masks = count(PosixTag::Mask);
    let named = count(PosixTag::User) + count(PosixTag::Group);
    if named > 0 && masks != 1 {
        return Err(ValidationError::MissingMask { section });
    }
    if masks > 1 {
        return Err(ValidationError::DuplicateMask { section });
    }
    Ok(())
}
