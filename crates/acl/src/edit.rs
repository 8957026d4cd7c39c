//! Incremental edits used by setfacl-style operations.
//!
//! Every edit returns a new ACL; the input is never modified. NFSv4 results
//! are re-canonicalized, POSIX results keep entry order within each section.

use crate::flags::{PosixPerm, PosixTag, WhoType};
use crate::nfs4::{NO_WHO_ID, Nfs4Ace, Nfs4Acl};
use crate::posix::{ACL_UNDEFINED_ID, PosixAce, PosixAcl};

/// Selects NFSv4 entries by principal for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WhoSpec {
    /// Principal kind.
    pub who_type: WhoType,
    /// uid or gid when `who_type` is [`WhoType::Named`].
    pub who_id: i64,
    /// Whether a named principal is a group.
    pub is_group: bool,
}

impl WhoSpec {
    /// Matches every entry for `OWNER@`, `GROUP@` or `EVERYONE@`.
    #[must_use]
    pub const fn special(who_type: WhoType) -> Self {
        Self {
            who_type,
            who_id: NO_WHO_ID,
            is_group: false,
        }
    }

    /// Matches entries for the named user `uid`.
    #[must_use]
    pub const fn user(uid: u32) -> Self {
        Self {
            who_type: WhoType::Named,
            who_id: uid as i64,
            is_group: false,
        }
    }

    /// Matches entries for the named group `gid`.
    #[must_use]
    pub const fn group(gid: u32) -> Self {
        Self {
            who_type: WhoType::Named,
            who_id: gid as i64,
            is_group: true,
        }
    }

    fn matches(&self, ace: &Nfs4Ace) -> bool {
        if ace.who_type != self.who_type {
            return false;
        }
        self.who_type != WhoType::Named
            || (ace.who_id == self.who_id && ace.is_group() == self.is_group)
    }
}

/// Selects a POSIX entry by tag, id and section for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PosixEntrySpec {
    /// Entry tag.
    pub tag: PosixTag,
    /// uid or gid for named tags, [`ACL_UNDEFINED_ID`] otherwise.
    pub id: u32,
    /// Whether the spec targets the default section.
    pub default: bool,
}

impl PosixEntrySpec {
    /// Matches the unnamed entry `tag` in the given section.
    #[must_use]
    pub const fn new(tag: PosixTag, default: bool) -> Self {
        Self {
            tag,
            id: ACL_UNDEFINED_ID,
            default,
        }
    }

    /// Matches the named entry `tag:id` in the given section.
    #[must_use]
    pub const fn named(tag: PosixTag, id: u32, default: bool) -> Self {
        Self { tag, id, default }
    }

    /// Returns the same spec retargeted at the default section.
    #[must_use]
    pub const fn in_default(mut self) -> Self {
        self.default = true;
        self
    }

    fn matches(&self, ace: &PosixAce) -> bool {
        ace.tag == self.tag && ace.id == self.id && ace.default == self.default
    }
}

fn same_identity(existing: &Nfs4Ace, new: &Nfs4Ace) -> bool {
    existing.who_type == new.who_type
        && existing.ace_type == new.ace_type
        && (existing.who_type != WhoType::Named
            || (existing.who_id == new.who_id && existing.is_group() == new.is_group()))
}

impl Nfs4Acl {
    /// Replaces the first entry with the same principal and ACE type as each
    /// new entry, appending entries with no match.
    #[must_use]
    pub fn with_modified(&self, new_aces: &[Nfs4Ace]) -> Self {
        let mut aces = self.aces().to_vec();
        for new in new_aces {
            match aces.iter().position(|ace| same_identity(ace, new)) {
                Some(index) => aces[index] = *new,
                None => aces.push(*new),
            }
        }
        Self::from_aces(aces, self.acl_flags())
    }

    /// Drops every entry matched by any spec.
    #[must_use]
    pub fn without_matching(&self, specs: &[WhoSpec]) -> Self {
        let aces = self
            .aces()
            .iter()
            .filter(|ace| !specs.iter().any(|spec| spec.matches(ace)))
            .copied();
        Self::from_aces(aces, self.acl_flags())
    }
}

impl PosixAcl {
    /// Replaces the entry with the same tag, id and section as each new
    /// entry, appending entries with no match. With `recalc_mask` the masks
    /// are recomputed afterwards.
    #[must_use]
    pub fn with_modified(&self, new_aces: &[PosixAce], recalc_mask: bool) -> Self {
        let mut entries: Vec<PosixAce> = self.iter().copied().collect();
        for new in new_aces {
            let position = entries
                .iter()
                .position(|ace| ace.tag == new.tag && ace.id == new.id && ace.default == new.default);
            match position {
                Some(index) => entries[index] = *new,
                None => entries.push(*new),
            }
        }
        let modified = Self::from_aces(entries);
        if recalc_mask {
            modified.recalc_mask()
        } else {
            modified
        }
    }

    /// Drops every entry matched by any spec.
    #[must_use]
    pub fn without_matching(&self, specs: &[PosixEntrySpec]) -> Self {
        Self::from_aces(
            self.iter()
                .filter(|ace| !specs.iter().any(|spec| spec.matches(ace)))
                .copied(),
        )
    }

    /// Sets each section's MASK to the union of its `USER`, `GROUP` and
    /// `GROUP_OBJ` permissions.
    ///
    /// Sections with neither named entries nor a MASK are left alone. A
    /// missing MASK is inserted right after `GROUP_OBJ`.
    #[must_use]
    pub fn recalc_mask(&self) -> Self {
        self.map_sections(|section, default| {
            let has_named = section.iter().any(|ace| ace.tag.is_named());
            let has_mask = section.iter().any(|ace| ace.tag == PosixTag::Mask);
            if !has_named && !has_mask {
                return section.to_vec();
            }

            let mask = section
                .iter()
                .filter(|ace| ace.tag.is_named() || ace.tag == PosixTag::GroupObj)
                .fold(PosixPerm::empty(), |acc, ace| acc | ace.perms);
            let mask_entry = PosixAce::new(PosixTag::Mask, mask).with_default(default);

            let mut result: Vec<PosixAce> = section
                .iter()
                .map(|ace| if ace.tag == PosixTag::Mask { mask_entry } else { *ace })
                .collect();
            if !has_mask {
                insert_after_group_obj(&mut result, mask_entry);
            }
            result
        })
    }

    /// Inserts a MASK equal to the `GROUP_OBJ` permissions into each section
    /// that has named entries but no MASK. Existing masks are kept as is.
    #[must_use]
    pub fn ensure_mask(&self) -> Self {
        self.map_sections(|section, default| {
            let has_named = section.iter().any(|ace| ace.tag.is_named());
            let has_mask = section.iter().any(|ace| ace.tag == PosixTag::Mask);
            let mut result = section.to_vec();
            if has_named && !has_mask {
                let group_perms = section
                    .iter()
                    .find(|ace| ace.tag == PosixTag::GroupObj)
                    .map_or(PosixPerm::empty(), |ace| ace.perms);
                let mask_entry = PosixAce::new(PosixTag::Mask, group_perms).with_default(default);
                insert_after_group_obj(&mut result, mask_entry);
            }
            result
        })
    }

    fn map_sections(&self, mut edit: impl FnMut(&[PosixAce], bool) -> Vec<PosixAce>) -> Self {
        let mut entries = edit(self.access(), false);
        entries.extend(edit(self.default_aces(), true));
        Self::from_aces(entries)
    }
}

fn insert_after_group_obj(section: &mut Vec<PosixAce>, entry: PosixAce) {
    let index = section
        .iter()
        .position(|ace| ace.tag == PosixTag::GroupObj)
        .map_or(section.len(), |index| index + 1);
    section.insert(index, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{AccessMask, AceFlags, AceType, AclFlags};

    const RWX: PosixPerm = PosixPerm::all();
    const RX: PosixPerm = PosixPerm::READ.union(PosixPerm::EXECUTE);
    const R: PosixPerm = PosixPerm::READ;

    fn base() -> Nfs4Acl {
        Nfs4Acl::from_aces(
            [
                Nfs4Ace::special(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, WhoType::Owner),
                Nfs4Ace::user(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, 1000),
                Nfs4Ace::group(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, 1000),
            ],
            AclFlags::AUTO_INHERIT,
        )
    }

    #[test]
    fn nfs4_modify_replaces_matching_identity_in_place() {
        let replacement = Nfs4Ace::group(AceType::Allow, AceFlags::empty(), AccessMask::all(), 1000);
        let acl = base().with_modified(&[replacement]);
        assert_eq!(acl.len(), 3);
        assert_eq!(acl.aces()[2], replacement);
        assert_eq!(acl.aces()[1].access_mask, AccessMask::READ_DATA);
        assert_eq!(acl.acl_flags(), AclFlags::AUTO_INHERIT);
    }

    #[test]
    fn nfs4_modify_appends_different_type_and_recanonicalizes() {
        let deny = Nfs4Ace::user(AceType::Deny, AceFlags::empty(), AccessMask::WRITE_DATA, 1000);
        let acl = base().with_modified(&[deny]);
        assert_eq!(acl.len(), 4);
        assert_eq!(acl.aces()[0], deny);
    }

    #[test]
    fn nfs4_remove_distinguishes_users_from_groups() {
        let acl = base().without_matching(&[WhoSpec::group(1000)]);
        assert_eq!(acl.len(), 2);
        assert!(acl.aces().iter().all(|ace| !ace.is_group()));

        let acl = base().without_matching(&[WhoSpec::special(WhoType::Owner), WhoSpec::user(1000)]);
        assert_eq!(acl.len(), 1);
        assert!(acl.aces()[0].is_group());

        assert_eq!(base().without_matching(&[WhoSpec::user(7)]), base());
    }

    fn named_access() -> PosixAcl {
        PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::named(PosixTag::User, R, 1000),
            PosixAce::new(PosixTag::GroupObj, R),
            PosixAce::new(PosixTag::Mask, R),
            PosixAce::new(PosixTag::Other, PosixPerm::empty()),
        ])
    }

    #[test]
    fn posix_modify_matches_tag_id_and_section() {
        let acl = named_access().with_modified(
            &[
                PosixAce::named(PosixTag::User, RWX, 1000),
                PosixAce::named(PosixTag::User, R, 1000).with_default(true),
            ],
            false,
        );
        assert_eq!(acl.access()[1].perms, RWX);
        assert_eq!(acl.access().len(), 5);
        assert_eq!(acl.default_aces().len(), 1);
        assert_eq!(acl.access()[3], PosixAce::new(PosixTag::Mask, R));
    }

    #[test]
    fn posix_modify_with_recalc_updates_mask_to_union() {
        let acl = named_access()
            .with_modified(&[PosixAce::named(PosixTag::Group, RX, 20)], true);
        let mask = acl
            .access()
            .iter()
            .find(|ace| ace.tag == PosixTag::Mask)
            .expect("mask entry");
        assert_eq!(mask.perms, RX);
        assert_eq!(acl.access().last().map(|ace| ace.tag), Some(PosixTag::Group));
    }

    #[test]
    fn recalc_inserts_missing_mask_after_group_obj() {
        let acl = PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::new(PosixTag::GroupObj, R),
            PosixAce::new(PosixTag::Other, R),
            PosixAce::named(PosixTag::User, PosixPerm::WRITE, 5),
        ])
        .recalc_mask();
        assert_eq!(acl.access()[2], PosixAce::new(PosixTag::Mask, R | PosixPerm::WRITE));
    }

    #[test]
    fn recalc_leaves_trivial_sections_alone() {
        let trivial = PosixAcl::trivial_from_mode(0o751);
        assert_eq!(trivial.recalc_mask(), trivial);
    }

    #[test]
    fn recalc_after_removing_named_entries_falls_back_to_group_obj() {
        let acl = named_access()
            .without_matching(&[PosixEntrySpec::named(PosixTag::User, 1000, false)])
            .recalc_mask();
        assert_eq!(acl.access().len(), 4);
        assert_eq!(acl.access()[2], PosixAce::new(PosixTag::Mask, R));
    }

    #[test]
    fn recalc_handles_default_section_independently() {
        let acl = PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::new(PosixTag::GroupObj, R),
            PosixAce::new(PosixTag::Other, R),
            PosixAce::new(PosixTag::UserObj, RWX).with_default(true),
            PosixAce::new(PosixTag::GroupObj, PosixPerm::empty()).with_default(true),
            PosixAce::named(PosixTag::Group, RWX, 9).with_default(true),
            PosixAce::new(PosixTag::Other, PosixPerm::empty()).with_default(true),
        ])
        .recalc_mask();
        assert_eq!(acl.access().len(), 3);
        assert_eq!(
            acl.default_aces()[2],
            PosixAce::new(PosixTag::Mask, RWX).with_default(true)
        );
    }

    #[test]
    fn ensure_mask_seeds_from_group_obj_and_keeps_existing() {
        let acl = PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::new(PosixTag::GroupObj, RX),
            PosixAce::new(PosixTag::Other, R),
            PosixAce::named(PosixTag::User, RWX, 3),
        ])
        .ensure_mask();
        assert_eq!(acl.access()[2], PosixAce::new(PosixTag::Mask, RX));

        assert_eq!(named_access().ensure_mask(), named_access());
    }

    #[test]
    fn remove_targets_one_section() {
        let mut entries: Vec<PosixAce> = named_access().iter().copied().collect();
        entries.push(PosixAce::named(PosixTag::User, R, 1000).with_default(true));
        let acl = PosixAcl::from_aces(entries);

        let spec = PosixEntrySpec::named(PosixTag::User, 1000, false).in_default();
        let removed = acl.without_matching(&[spec]);
        assert!(!removed.has_default());
        assert_eq!(removed.access().len(), 5);
    }
}
