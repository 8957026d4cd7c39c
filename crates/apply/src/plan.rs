//! setfacl-style edits applied to one descriptor.

use std::os::fd::{AsFd, BorrowedFd};

use acl::{
    Acl, AclBrand, AclError, Nfs4Ace, Nfs4Acl, PosixAce, PosixAcl, PosixEntrySpec, PosixTag,
    WhoSpec,
};
use logging::trace_apply;
use platform::stat_fd;

use crate::error::ApplyError;
use crate::writer::AclWriter;

/// The edits of one setfacl invocation, in typed form.
///
/// [`apply`](Self::apply) runs them in a fixed order: strip, remove the
/// default section, remove entries, modify entries, replace the whole ACL.
/// NFSv4 and POSIX edits are kept apart; a plan carrying edits for the
/// model the target file does not use fails with
/// [`ApplyError::BrandMismatch`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditPlan {
    strip: bool,
    remove_default: bool,
    default_only: bool,
    no_mask: bool,
    remove_nfs4: Vec<WhoSpec>,
    remove_posix: Vec<PosixEntrySpec>,
    modify_nfs4: Vec<Nfs4Ace>,
    modify_posix: Vec<PosixAce>,
    replace: Option<Acl>,
}

/// Result of applying a plan to one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    /// The ACL the file carries afterwards.
    pub acl: Acl,
    /// Whether anything was written.
    pub written: bool,
}

impl EditPlan {
    /// An empty plan, which reads the ACL and writes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ACL with the trivial one for the file's mode.
    #[must_use]
    pub const fn strip(mut self) -> Self {
        self.strip = true;
        self
    }

    /// Drops the POSIX default section. Ignored for NFSv4.
    #[must_use]
    pub const fn remove_default(mut self) -> Self {
        self.remove_default = true;
        self
    }

    /// Retargets POSIX removals and modifications at the default section.
    /// NFSv4 removals and modifications are skipped, as NFSv4 has no
    /// default section.
    #[must_use]
    pub const fn default_only(mut self) -> Self {
        self.default_only = true;
        self
    }

    /// Leaves POSIX masks alone instead of recalculating them.
    #[must_use]
    pub const fn no_mask(mut self) -> Self {
        self.no_mask = true;
        self
    }

    /// Removes NFSv4 entries matching any of `specs`.
    #[must_use]
    pub fn remove_nfs4(mut self, specs: impl IntoIterator<Item = WhoSpec>) -> Self {
        self.remove_nfs4.extend(specs);
        self
    }

    /// Removes POSIX entries matching any of `specs`.
    #[must_use]
    pub fn remove_posix(mut self, specs: impl IntoIterator<Item = PosixEntrySpec>) -> Self {
        self.remove_posix.extend(specs);
        self
    }

    /// Adds or overwrites NFSv4 entries.
    #[must_use]
    pub fn modify_nfs4(mut self, aces: impl IntoIterator<Item = Nfs4Ace>) -> Self {
        self.modify_nfs4.extend(aces);
        self
    }

    /// Adds or overwrites POSIX entries.
    #[must_use]
    pub fn modify_posix(mut self, aces: impl IntoIterator<Item = PosixAce>) -> Self {
        self.modify_posix.extend(aces);
        self
    }

    /// Replaces the whole ACL. An NFSv4 replacement keeps the file's
    /// ACL-level flags.
    #[must_use]
    pub fn replace(mut self, acl: impl Into<Acl>) -> Self {
        self.replace = Some(acl.into());
        self
    }

    /// Returns `true` when applying the plan writes an ACL of `brand`.
    #[must_use]
    pub fn writes(&self, brand: AclBrand) -> bool {
        let is_posix = brand == AclBrand::Posix;
        self.strip
            || (self.remove_default && is_posix)
            || !self.remove_nfs4.is_empty()
            || !self.remove_posix.is_empty()
            || !self.modify_nfs4.is_empty()
            || !self.modify_posix.is_empty()
            || self.replace.is_some()
    }

    fn check_brand(&self, found: AclBrand) -> Result<(), ApplyError> {
        let mismatch = |requested| ApplyError::BrandMismatch { found, requested };
        match found {
            AclBrand::Nfs4 if !self.remove_posix.is_empty() || !self.modify_posix.is_empty() => {
                Err(mismatch(AclBrand::Posix))
            }
            AclBrand::Posix if !self.remove_nfs4.is_empty() || !self.modify_nfs4.is_empty() => {
                Err(mismatch(AclBrand::Nfs4))
            }
            _ => match &self.replace {
                Some(replace) if replace.brand() != found => Err(mismatch(replace.brand())),
                _ => Ok(()),
            },
        }
    }

    /// Reads the ACL behind `fd`, applies the plan, and writes the result
    /// when the plan changes anything.
    ///
    /// # Errors
    ///
    /// Fails when reading or writing the ACL fails, when the result does not
    /// validate for the file type, or on [`ApplyError::BrandMismatch`].
    pub fn apply<Fd: AsFd, W: AclWriter>(
        &self,
        fd: Fd,
        writer: &mut W,
    ) -> Result<Applied, ApplyError> {
        let fd = fd.as_fd();
        let current = writer.read_acl(fd)?;
        let brand = current.brand();
        self.check_brand(brand)?;

        let acl = match current {
            Acl::Nfs4(acl) => Acl::Nfs4(self.edit_nfs4(fd, acl)?),
            Acl::Posix(acl) => Acl::Posix(self.edit_posix(fd, acl)?),
        };

        let written = self.writes(brand);
        if written {
            writer.write_acl(fd, &acl)?;
        }
        trace_apply!(brand = %brand, written, "applied edit plan");
        Ok(Applied { acl, written })
    }

    fn edit_nfs4(&self, fd: BorrowedFd<'_>, mut acl: Nfs4Acl) -> Result<Nfs4Acl, ApplyError> {
        if self.strip {
            acl = Nfs4Acl::trivial_from_mode(file_mode(fd)?);
        }
        if !self.default_only {
            if !self.remove_nfs4.is_empty() {
                acl = acl.without_matching(&self.remove_nfs4);
            }
            if !self.modify_nfs4.is_empty() {
                acl = acl.with_modified(&self.modify_nfs4);
            }
        }
        if let Some(Acl::Nfs4(replace)) = &self.replace {
            acl = Nfs4Acl::from_aces(replace.aces().iter().copied(), acl.acl_flags());
        }
        Ok(acl)
    }

    fn edit_posix(&self, fd: BorrowedFd<'_>, mut acl: PosixAcl) -> Result<PosixAcl, ApplyError> {
        let incremental = !self.remove_posix.is_empty() || !self.modify_posix.is_empty();

        // Without an access xattr the permissions live in the mode bits; a
        // directory may still carry a default section.
        if !self.strip && self.replace.is_none() && acl.access().is_empty() && incremental {
            acl = with_trivial_access(&acl, file_mode(fd)?);
        }

        if self.strip {
            acl = PosixAcl::trivial_from_mode(file_mode(fd)?);
        }

        if self.remove_default {
            if acl.access().is_empty() {
                acl = with_trivial_access(&acl, file_mode(fd)?);
            }
            acl = acl.without_default();
        }

        let mut remove = self.remove_posix.clone();
        let mut modify = self.modify_posix.clone();
        if self.default_only {
            if !modify.is_empty() && !acl.has_default() {
                let base = PosixAcl::trivial_from_mode(file_mode(fd)?);
                acl = PosixAcl::from_aces(
                    acl.access()
                        .iter()
                        .copied()
                        .chain(base.access().iter().map(|ace| ace.with_default(true))),
                );
            }
            remove = remove.into_iter().map(PosixEntrySpec::in_default).collect();
            modify = modify.into_iter().map(|ace| ace.with_default(true)).collect();
        }

        if !remove.is_empty() {
            acl = acl.without_matching(&remove);
            if !self.no_mask {
                acl = acl.recalc_mask();
            }
        }

        if !modify.is_empty() {
            let explicit_mask = modify.iter().any(|ace| ace.tag == PosixTag::Mask);
            let recalc = !self.no_mask && !explicit_mask;
            acl = acl.with_modified(&modify, recalc);
            if !recalc {
                // Named entries still need a mask to pass validation.
                acl = acl.ensure_mask();
            }
        }

        if let Some(Acl::Posix(replace)) = &self.replace {
            acl = replace.clone();
        }
        Ok(acl)
    }
}

fn file_mode(fd: BorrowedFd<'_>) -> Result<u32, ApplyError> {
    Ok(stat_fd(fd).map_err(AclError::from)?.mode)
}

fn with_trivial_access(acl: &PosixAcl, mode: u32) -> PosixAcl {
    let base = PosixAcl::trivial_from_mode(mode);
    PosixAcl::from_aces(
        base.access()
            .iter()
            .chain(acl.default_aces())
            .copied(),
    )
}
