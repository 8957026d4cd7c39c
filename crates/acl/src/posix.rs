//! crates/acl/src/posix.rs
//!
//! POSIX.1e ACL values and their xattr encoding.
//!
//! A POSIX ACL has two independent sections. The access section lives in
//! `system.posix_acl_access` and the default section, meaningful only on
//! directories, in `system.posix_acl_default`. Each section is encoded as a
//! little-endian `version = 2` header followed by 8-byte entries
//! (`tag:u16, perm:u16, id:u32`).

use crate::error::DecodeError;
use crate::flags::{PosixPerm, PosixTag};

/// Extended attribute holding the access section.
pub const POSIX_ACCESS_XATTR: &str = "system.posix_acl_access";
/// Extended attribute holding the default section.
pub const POSIX_DEFAULT_XATTR: &str = "system.posix_acl_default";

/// Id stored for entries that are not named users or groups.
pub const ACL_UNDEFINED_ID: u32 = u32::MAX;

const POSIX_ACL_VERSION: u32 = 2;
const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 8;

/// A single POSIX ACL entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PosixAce {
    /// Entry kind.
    pub tag: PosixTag,
    /// Granted permissions.
    pub perms: PosixPerm,
    /// uid or gid for named entries, [`ACL_UNDEFINED_ID`] otherwise.
    pub id: u32,
    /// Whether the entry belongs to the default section.
    pub default: bool,
}

impl PosixAce {
    /// Creates an entry that carries no id (`USER_OBJ`, `GROUP_OBJ`, `MASK`,
    /// `OTHER`).
    #[must_use]
    pub const fn new(tag: PosixTag, perms: PosixPerm) -> Self {
        Self {
            tag,
            perms,
            id: ACL_UNDEFINED_ID,
            default: false,
        }
    }

    /// Creates a named entry (`USER` or `GROUP`).
    #[must_use]
    pub const fn named(tag: PosixTag, perms: PosixPerm, id: u32) -> Self {
        Self {
            tag,
            perms,
            id,
            default: false,
        }
    }

    /// Returns the same entry moved into or out of the default section.
    #[must_use]
    pub const fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let id = if self.tag.is_named() {
            self.id
        } else {
            ACL_UNDEFINED_ID
        };
        out.extend_from_slice(&(self.tag as u16).to_le_bytes());
        out.extend_from_slice(&self.perms.bits().to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
    }
}

/// A POSIX ACL with its access and default sections.
///
/// A section is present when it holds at least one entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PosixAcl {
    access: Vec<PosixAce>,
    default: Vec<PosixAce>,
}

impl PosixAcl {
    /// Partitions entries into the two sections by their `default` field,
    /// preserving relative order within each section.
    #[must_use]
    pub fn from_aces(aces: impl IntoIterator<Item = PosixAce>) -> Self {
        let (default, access) = aces.into_iter().partition(|ace| ace.default);
        Self { access, default }
    }

    /// Synthesizes the three-entry access section equivalent to `mode`.
    #[must_use]
    pub fn trivial_from_mode(mode: u32) -> Self {
        Self::from_aces(trivial_entries(mode))
    }

    /// Decodes both sections. A missing or empty value means the section is
    /// absent.
    pub fn from_xattrs(access: &[u8], default: Option<&[u8]>) -> Result<Self, DecodeError> {
        Ok(Self {
            access: decode_section(access, false)?,
            default: default
                .map(|data| decode_section(data, true))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Encodes the access section; empty when the section is absent.
    #[must_use]
    pub fn access_bytes(&self) -> Vec<u8> {
        encode_section(&self.access)
    }

    /// Encodes the default section, or `None` when it is absent.
    #[must_use]
    pub fn default_bytes(&self) -> Option<Vec<u8>> {
        (!self.default.is_empty()).then(|| encode_section(&self.default))
    }

    /// Entries of the access section.
    #[must_use]
    pub fn access(&self) -> &[PosixAce] {
        &self.access
    }

    /// Entries of the default section.
    #[must_use]
    pub fn default_aces(&self) -> &[PosixAce] {
        &self.default
    }

    /// Returns `true` when a default section is present.
    #[must_use]
    pub fn has_default(&self) -> bool {
        !self.default.is_empty()
    }

    /// All entries, access section first.
    pub fn iter(&self) -> impl Iterator<Item = &PosixAce> {
        self.access.iter().chain(&self.default)
    }

    /// Returns `true` when the access section is empty and no default
    /// section exists: permissions come from the mode bits alone.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.access.is_empty() && self.default.is_empty()
    }

    /// Returns a copy without the default section.
    #[must_use]
    pub fn without_default(&self) -> Self {
        Self {
            access: self.access.clone(),
            default: Vec::new(),
        }
    }

    /// Returns a copy with each section sorted by tag and then id, the order
    /// the kernel stores entries in.
    #[must_use]
    pub fn kernel_ordered(&self) -> Self {
        let sorted = |section: &[PosixAce]| {
            let mut section = section.to_vec();
            section.sort_by_key(|ace| (ace.tag, ace.id));
            section
        };
        Self {
            access: sorted(&self.access),
            default: sorted(&self.default),
        }
    }
}

/// `USER_OBJ`, `GROUP_OBJ` and `OTHER` entries derived from `mode`.
pub(crate) fn trivial_entries(mode: u32) -> [PosixAce; 3] {
    [
        PosixAce::new(PosixTag::UserObj, PosixPerm::from_mode_bits(mode >> 6)),
        PosixAce::new(PosixTag::GroupObj, PosixPerm::from_mode_bits(mode >> 3)),
        PosixAce::new(PosixTag::Other, PosixPerm::from_mode_bits(mode)),
    ]
}

fn encode_section(entries: &[PosixAce]) -> Vec<u8> {
    if entries.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(HEADER_LEN + entries.len() * ENTRY_LEN);
    out.extend_from_slice(&POSIX_ACL_VERSION.to_le_bytes());
    for entry in entries {
        entry.encode_into(&mut out);
    }
    out
}

fn decode_section(data: &[u8], default: bool) -> Result<Vec<PosixAce>, DecodeError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < HEADER_LEN {
        return Err(DecodeError::TooShort {
            len: data.len(),
            needed: HEADER_LEN,
        });
    }
    if (data.len() - HEADER_LEN) % ENTRY_LEN != 0 {
        return Err(DecodeError::BadLength(data.len()));
    }

    let version = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if version != POSIX_ACL_VERSION {
        return Err(DecodeError::BadVersion(version));
    }

    data[HEADER_LEN..]
        .chunks_exact(ENTRY_LEN)
        .map(|chunk| {
            let tag = PosixTag::try_from(u16::from_le_bytes([chunk[0], chunk[1]]))?;
            let perms = PosixPerm::from_bits_retain(u16::from_le_bytes([chunk[2], chunk[3]]));
            let id = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            Ok(PosixAce {
                tag,
                perms,
                id,
                default,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RWX: PosixPerm = PosixPerm::all();
    const RX: PosixPerm = PosixPerm::READ.union(PosixPerm::EXECUTE);

    fn sample() -> PosixAcl {
        PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::new(PosixTag::UserObj, RWX).with_default(true),
            PosixAce::named(PosixTag::User, RX, 1000),
            PosixAce::new(PosixTag::GroupObj, RX),
            PosixAce::new(PosixTag::GroupObj, RX).with_default(true),
            PosixAce::new(PosixTag::Mask, RX),
            PosixAce::new(PosixTag::Other, PosixPerm::empty()),
            PosixAce::new(PosixTag::Other, PosixPerm::READ).with_default(true),
        ])
    }

    #[test]
    fn from_aces_partitions_without_reordering() {
        let acl = sample();
        let tags: Vec<_> = acl.access().iter().map(|ace| ace.tag).collect();
        assert_eq!(
            tags,
            vec![
                PosixTag::UserObj,
                PosixTag::User,
                PosixTag::GroupObj,
                PosixTag::Mask,
                PosixTag::Other
            ]
        );
        assert_eq!(acl.default_aces().len(), 3);
        assert!(acl.default_aces().iter().all(|ace| ace.default));
        assert!(acl.has_default());
        assert!(!acl.is_trivial());
    }

    #[test]
    fn access_section_encoding_is_little_endian() {
        let acl = PosixAcl::from_aces([
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::named(PosixTag::Group, PosixPerm::READ, 0x0102),
        ]);
        let bytes = acl.access_bytes();
        assert_eq!(
            bytes,
            vec![
                2, 0, 0, 0, // version
                0x01, 0, 7, 0, 0xff, 0xff, 0xff, 0xff, // USER_OBJ
                0x08, 0, 4, 0, 0x02, 0x01, 0, 0, // GROUP 0x102
            ]
        );
        assert_eq!(acl.default_bytes(), None);
    }

    #[test]
    fn unnamed_entries_always_encode_undefined_id() {
        let ace = PosixAce::named(PosixTag::Other, PosixPerm::READ, 55);
        let acl = PosixAcl::from_aces([ace]);
        let decoded = PosixAcl::from_xattrs(&acl.access_bytes(), None).expect("decode");
        assert_eq!(decoded.access()[0].id, ACL_UNDEFINED_ID);
    }

    #[test]
    fn both_sections_survive_decoding() {
        let acl = sample();
        let default = acl.default_bytes().expect("default section");
        let decoded = PosixAcl::from_xattrs(&acl.access_bytes(), Some(&default)).expect("decode");
        assert_eq!(decoded, acl);
    }

    #[test]
    fn empty_values_mean_absent_sections() {
        let acl = PosixAcl::from_xattrs(&[], Some(&[])).expect("decode");
        assert!(acl.is_trivial());
        assert_eq!(acl.access_bytes(), Vec::<u8>::new());
    }

    #[test]
    fn decode_rejects_malformed_sections() {
        assert_eq!(
            PosixAcl::from_xattrs(&[2, 0], None),
            Err(DecodeError::TooShort { len: 2, needed: 4 })
        );
        assert_eq!(
            PosixAcl::from_xattrs(&[2, 0, 0, 0, 1, 0, 7], None),
            Err(DecodeError::BadLength(7))
        );
        assert_eq!(
            PosixAcl::from_xattrs(&[3, 0, 0, 0], None),
            Err(DecodeError::BadVersion(3))
        );
        assert_eq!(
            PosixAcl::from_xattrs(&[2, 0, 0, 0, 0x40, 0, 7, 0, 0, 0, 0, 0], None),
            Err(DecodeError::UnknownTag(0x40))
        );
    }

    #[test]
    fn trivial_from_mode_builds_three_entries() {
        let acl = PosixAcl::trivial_from_mode(0o640);
        assert_eq!(
            acl.access(),
            &[
                PosixAce::new(PosixTag::UserObj, PosixPerm::READ | PosixPerm::WRITE),
                PosixAce::new(PosixTag::GroupObj, PosixPerm::READ),
                PosixAce::new(PosixTag::Other, PosixPerm::empty()),
            ]
        );
        assert!(!acl.has_default());
    }

    #[test]
    fn kernel_ordering_sorts_by_tag_then_id() {
        let acl = PosixAcl::from_aces([
            PosixAce::new(PosixTag::Other, RX),
            PosixAce::named(PosixTag::User, RX, 20),
            PosixAce::new(PosixTag::UserObj, RWX),
            PosixAce::named(PosixTag::User, RX, 10),
        ])
        .kernel_ordered();
        let ids: Vec<_> = acl.access().iter().map(|ace| (ace.tag, ace.id)).collect();
        assert_eq!(
            ids,
            vec![
                (PosixTag::UserObj, ACL_UNDEFINED_ID),
                (PosixTag::User, 10),
                (PosixTag::User, 20),
                (PosixTag::Other, ACL_UNDEFINED_ID),
            ]
        );
    }

    #[test]
    fn without_default_drops_default_section() {
        let acl = sample().without_default();
        assert!(!acl.has_default());
        assert_eq!(acl.access().len(), 5);
    }
}
