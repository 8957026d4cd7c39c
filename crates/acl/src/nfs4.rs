//! crates/acl/src/nfs4.rs
//!
//! NFSv4 ACL values and their `system.nfs4_acl_xdr` encoding.
//!
//! NFSv4 ACLs differ from POSIX ACLs in a few ways that shape this module:
//!
//! - **Ordered evaluation**: ACEs are evaluated first to last, so the order
//!   stored here is the order written to disk. [`Nfs4Acl::from_aces`] puts
//!   explicit entries ahead of inherited ones and DENY ahead of ALLOW within
//!   each half.
//! - **Granular permissions**: 14 access bits instead of `rwx`.
//! - **Inheritance**: directories carry propagation flags that decide what
//!   files and subdirectories created below them receive.
//!
//! # Wire Format
//!
//! All fields are big-endian `u32`:
//!
//! ```text
//! header: acl_flags, ace_count
//! ace:    ace_type, ace_flags, special_who, access_mask, who
//! ```
//!
//! `special_who` is 1 for `OWNER@`, `GROUP@` and `EVERYONE@`, in which case
//! `who` holds the who code (1, 2 or 3). It is 0 for named principals and
//! `who` then holds the uid or gid.

use crate::error::DecodeError;
use crate::flags::{AccessMask, AceFlags, AceType, AclFlags, WhoType};

/// Extended attribute holding NFSv4 ACLs.
pub const NFS4_ACL_XATTR: &str = "system.nfs4_acl_xdr";

/// `who_id` of entries whose principal is not [`WhoType::Named`].
pub const NO_WHO_ID: i64 = -1;

const HEADER_LEN: usize = 8;
const ACE_LEN: usize = 20;
const SPECIAL_WHO: u32 = 1;

/// Bits granted by a read (`r`) mode bit.
pub(crate) const MODE_READ: AccessMask = AccessMask::READ_DATA
    .union(AccessMask::READ_NAMED_ATTRS)
    .union(AccessMask::READ_ATTRIBUTES)
    .union(AccessMask::READ_ACL)
    .union(AccessMask::SYNCHRONIZE);
/// Bits granted by a write (`w`) mode bit.
pub(crate) const MODE_WRITE: AccessMask = AccessMask::WRITE_DATA
    .union(AccessMask::APPEND_DATA)
    .union(AccessMask::WRITE_NAMED_ATTRS)
    .union(AccessMask::WRITE_ATTRIBUTES)
    .union(AccessMask::WRITE_ACL)
    .union(AccessMask::WRITE_OWNER)
    .union(AccessMask::DELETE_CHILD);

/// A single NFSv4 access control entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nfs4Ace {
    /// Allow, deny, audit or alarm.
    pub ace_type: AceType,
    /// Inheritance, audit and principal flags.
    pub ace_flags: AceFlags,
    /// Permissions the entry covers.
    pub access_mask: AccessMask,
    /// Principal kind.
    pub who_type: WhoType,
    /// uid or gid for [`WhoType::Named`]; [`NO_WHO_ID`] otherwise.
    pub who_id: i64,
}

impl Nfs4Ace {
    /// Creates an entry for `OWNER@`, `GROUP@` or `EVERYONE@`.
    #[must_use]
    pub const fn special(
        ace_type: AceType,
        ace_flags: AceFlags,
        access_mask: AccessMask,
        who_type: WhoType,
    ) -> Self {
        Self {
            ace_type,
            ace_flags,
            access_mask,
            who_type,
            who_id: NO_WHO_ID,
        }
    }

    /// Creates an entry for a named user.
    #[must_use]
    pub const fn user(ace_type: AceType, ace_flags: AceFlags, access_mask: AccessMask, uid: u32) -> Self {
        Self {
            ace_type,
            ace_flags: ace_flags.difference(AceFlags::IDENTIFIER_GROUP),
            access_mask,
            who_type: WhoType::Named,
            who_id: uid as i64,
        }
    }

    /// Creates an entry for a named group; `IDENTIFIER_GROUP` is set.
    #[must_use]
    pub const fn group(ace_type: AceType, ace_flags: AceFlags, access_mask: AccessMask, gid: u32) -> Self {
        Self {
            ace_type,
            ace_flags: ace_flags.union(AceFlags::IDENTIFIER_GROUP),
            access_mask,
            who_type: WhoType::Named,
            who_id: gid as i64,
        }
    }

    /// Returns `true` when the entry carries the `INHERITED` marker.
    #[must_use]
    pub const fn is_inherited(&self) -> bool {
        self.ace_flags.contains(AceFlags::INHERITED)
    }

    /// Returns `true` when the named principal is a group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        self.ace_flags.contains(AceFlags::IDENTIFIER_GROUP)
    }

    /// Bucket used by canonical ordering: explicit DENY, explicit ALLOW,
    /// inherited DENY, inherited ALLOW. AUDIT and ALARM sort with DENY.
    const fn sort_key(&self) -> u8 {
        let inherited = if self.is_inherited() { 2 } else { 0 };
        let allow = matches!(self.ace_type, AceType::Allow) as u8;
        inherited + allow
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let (special, who) = match self.who_type {
            WhoType::Named => (0, self.who_id as u32),
            special => (SPECIAL_WHO, special as u32),
        };
        for word in [
            self.ace_type as u32,
            self.ace_flags.bits(),
            special,
            self.access_mask.bits(),
            who,
        ] {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    fn decode(chunk: &[u8]) -> Result<Self, DecodeError> {
        let word = |index: usize| {
            let start = index * 4;
            u32::from_be_bytes([
                chunk[start],
                chunk[start + 1],
                chunk[start + 2],
                chunk[start + 3],
            ])
        };

        let ace_type = AceType::try_from(word(0))?;
        let ace_flags = AceFlags::from_bits_retain(word(1));
        let access_mask = AccessMask::from_bits_retain(word(3));
        let who = word(4);

        let (who_type, who_id) = match word(2) {
            0 => (WhoType::Named, i64::from(who)),
            SPECIAL_WHO => match WhoType::try_from(who)? {
                WhoType::Named => return Err(DecodeError::UnknownWho(who)),
                special => (special, NO_WHO_ID),
            },
            other => return Err(DecodeError::UnknownWho(other)),
        };

        Ok(Self {
            ace_type,
            ace_flags,
            access_mask,
            who_type,
            who_id,
        })
    }
}

/// An NFSv4 ACL: ACEs in evaluation order plus ACL-level flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nfs4Acl {
    acl_flags: AclFlags,
    aces: Vec<Nfs4Ace>,
}

impl Nfs4Acl {
    /// Builds an ACL in canonical order.
    ///
    /// The sort is stable, so entries within one bucket keep their relative
    /// order. Read-only flags in `acl_flags` are dropped.
    #[must_use]
    pub fn from_aces(aces: impl IntoIterator<Item = Nfs4Ace>, acl_flags: AclFlags) -> Self {
        let mut aces: Vec<Nfs4Ace> = aces.into_iter().collect();
        aces.sort_by_key(Nfs4Ace::sort_key);
        Self {
            acl_flags: acl_flags.intersection(AclFlags::SETTABLE),
            aces,
        }
    }

    /// Synthesizes the three-entry ACL equivalent to `mode`'s permission bits.
    #[must_use]
    pub fn trivial_from_mode(mode: u32) -> Self {
        let ace = |who_type, flags, bits| {
            Nfs4Ace::special(AceType::Allow, flags, mode_to_mask(bits), who_type)
        };
        Self::from_aces(
            [
                ace(WhoType::Owner, AceFlags::empty(), mode >> 6),
                ace(WhoType::Group, AceFlags::IDENTIFIER_GROUP, mode >> 3),
                ace(WhoType::Everyone, AceFlags::empty(), mode),
            ],
            AclFlags::empty(),
        )
    }

    /// Decodes a `system.nfs4_acl_xdr` value.
    ///
    /// An empty value means no ACL is stored and decodes to an empty ACL.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        if data.len() < HEADER_LEN {
            return Err(DecodeError::TooShort {
                len: data.len(),
                needed: HEADER_LEN,
            });
        }

        let acl_flags = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let body = &data[HEADER_LEN..];
        let needed = (count as usize).checked_mul(ACE_LEN);
        if needed.is_none_or(|needed| needed > body.len()) {
            return Err(DecodeError::Truncated {
                count,
                len: data.len(),
            });
        }

        let aces = body
            .chunks_exact(ACE_LEN)
            .take(count as usize)
            .map(Nfs4Ace::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            acl_flags: AclFlags::from_bits_retain(acl_flags),
            aces,
        })
    }

    /// Encodes the ACL for `system.nfs4_acl_xdr`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.aces.len() * ACE_LEN);
        out.extend_from_slice(&self.acl_flags.bits().to_be_bytes());
        out.extend_from_slice(&(self.aces.len() as u32).to_be_bytes());
        for ace in &self.aces {
            ace.encode_into(&mut out);
        }
        out
    }

    /// ACEs in evaluation order.
    #[must_use]
    pub fn aces(&self) -> &[Nfs4Ace] {
        &self.aces
    }

    /// ACL-level flags, including any read-only flags reported by the source.
    #[must_use]
    pub const fn acl_flags(&self) -> AclFlags {
        self.acl_flags
    }

    /// Number of ACEs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aces.len()
    }

    /// Returns `true` when the ACL holds no ACEs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    /// Returns `true` when the ACL is equivalent to the mode bits: either no
    /// ACL is stored or the filesystem flagged it `ACL_IS_TRIVIAL`.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.aces.is_empty() || self.acl_flags.contains(AclFlags::ACL_IS_TRIVIAL)
    }
}

/// Maps one `rwx` mode triplet to NFSv4 access bits.
pub(crate) const fn mode_to_mask(bits: u32) -> AccessMask {
    let mut mask = AccessMask::empty();
    if bits & 0o4 != 0 {
        mask = mask.union(MODE_READ);
    }
    if bits & 0o2 != 0 {
        mask = mask.union(MODE_WRITE);
    }
    if bits & 0o1 != 0 {
        mask = mask.union(AccessMask::EXECUTE);
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(flags: AceFlags, who: WhoType) -> Nfs4Ace {
        Nfs4Ace::special(AceType::Allow, flags, AccessMask::READ_DATA, who)
    }

    fn deny_user(flags: AceFlags, uid: u32) -> Nfs4Ace {
        Nfs4Ace::user(AceType::Deny, flags, AccessMask::WRITE_DATA, uid)
    }

    #[test]
    fn empty_acl_encodes_to_bare_header() {
        let acl = Nfs4Acl::from_aces([], AclFlags::empty());
        let bytes = acl.to_bytes();
        assert_eq!(bytes, vec![0u8; 8]);

        let parsed = Nfs4Acl::from_bytes(&bytes).expect("decode");
        assert!(parsed.is_empty());
        assert_eq!(parsed.acl_flags(), AclFlags::empty());
    }

    #[test]
    fn zero_length_value_means_no_acl() {
        let parsed = Nfs4Acl::from_bytes(&[]).expect("decode");
        assert!(parsed.is_empty());
        assert!(parsed.is_trivial());
    }

    #[test]
    fn encoding_matches_kernel_layout() {
        let acl = Nfs4Acl::from_aces(
            [
                Nfs4Ace::special(
                    AceType::Allow,
                    AceFlags::FILE_INHERIT,
                    AccessMask::READ_DATA | AccessMask::EXECUTE,
                    WhoType::Everyone,
                ),
                Nfs4Ace::group(AceType::Allow, AceFlags::empty(), AccessMask::WRITE_DATA, 1000),
            ],
            AclFlags::AUTO_INHERIT,
        );
        let bytes = acl.to_bytes();
        assert_eq!(bytes.len(), 8 + 2 * 20);

        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        assert_eq!(
            words,
            vec![
                0x1, 2, // header
                0, 0x1, 1, 0x21, 3, // EVERYONE@
                0, 0x40, 0, 0x2, 1000, // group 1000
            ]
        );
        assert_eq!(Nfs4Acl::from_bytes(&bytes).expect("decode"), acl);
    }

    #[test]
    fn from_aces_orders_buckets_stably() {
        let inherited = AceFlags::INHERITED;
        let input = [
            allow(inherited, WhoType::Owner),
            allow(AceFlags::empty(), WhoType::Owner),
            deny_user(inherited, 1),
            deny_user(AceFlags::empty(), 2),
            allow(AceFlags::empty(), WhoType::Everyone),
            Nfs4Ace::special(
                AceType::Audit,
                AceFlags::SUCCESSFUL_ACCESS,
                AccessMask::READ_DATA,
                WhoType::Everyone,
            ),
            deny_user(AceFlags::empty(), 3),
        ];
        let acl = Nfs4Acl::from_aces(input, AclFlags::empty());
        let aces = acl.aces();

        assert_eq!(aces[0], deny_user(AceFlags::empty(), 2));
        assert_eq!(aces[1].ace_type, AceType::Audit);
        assert_eq!(aces[2], deny_user(AceFlags::empty(), 3));
        assert_eq!(aces[3], allow(AceFlags::empty(), WhoType::Owner));
        assert_eq!(aces[4], allow(AceFlags::empty(), WhoType::Everyone));
        assert_eq!(aces[5], deny_user(inherited, 1));
        assert_eq!(aces[6], allow(inherited, WhoType::Owner));
    }

    #[test]
    fn propagation_flags_do_not_count_as_inherited() {
        let acl = Nfs4Acl::from_aces(
            [
                allow(AceFlags::FILE_INHERIT | AceFlags::DIRECTORY_INHERIT, WhoType::Owner),
                deny_user(AceFlags::empty(), 5),
            ],
            AclFlags::empty(),
        );
        assert_eq!(acl.aces()[0].ace_type, AceType::Deny);
        assert_eq!(acl.aces()[1].who_type, WhoType::Owner);
    }

    #[test]
    fn read_only_flags_are_never_set_by_from_aces() {
        let acl = Nfs4Acl::from_aces([], AclFlags::ACL_IS_DIR | AclFlags::PROTECTED);
        assert_eq!(acl.acl_flags(), AclFlags::PROTECTED);
    }

    #[test]
    fn decode_reports_filesystem_flags() {
        let mut bytes = Nfs4Acl::trivial_from_mode(0o644).to_bytes();
        bytes[..4].copy_from_slice(&(AclFlags::ACL_IS_TRIVIAL.bits()).to_be_bytes());
        let acl = Nfs4Acl::from_bytes(&bytes).expect("decode");
        assert!(acl.is_trivial());
        assert_eq!(acl.len(), 3);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert_eq!(
            Nfs4Acl::from_bytes(&[0, 0, 0]),
            Err(DecodeError::TooShort { len: 3, needed: 8 })
        );

        let mut truncated = Nfs4Acl::trivial_from_mode(0o755).to_bytes();
        truncated.truncate(8 + 20 * 2 + 7);
        assert_eq!(
            Nfs4Acl::from_bytes(&truncated),
            Err(DecodeError::Truncated { count: 3, len: 55 })
        );

        let mut huge = vec![0u8; 8];
        huge[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            Nfs4Acl::from_bytes(&huge),
            Err(DecodeError::Truncated { .. })
        ));

        let mut bad_type = Nfs4Acl::trivial_from_mode(0o700).to_bytes();
        bad_type[8..12].copy_from_slice(&9u32.to_be_bytes());
        assert_eq!(
            Nfs4Acl::from_bytes(&bad_type),
            Err(DecodeError::UnknownAceType(9))
        );

        let mut bad_who = Nfs4Acl::trivial_from_mode(0o700).to_bytes();
        bad_who[24..28].copy_from_slice(&7u32.to_be_bytes());
        assert_eq!(
            Nfs4Acl::from_bytes(&bad_who),
            Err(DecodeError::UnknownWho(7))
        );
    }

    #[test]
    fn trivial_from_mode_maps_triplets() {
        let acl = Nfs4Acl::trivial_from_mode(0o750);
        let aces = acl.aces();
        assert_eq!(aces.len(), 3);
        assert_eq!(aces[0].who_type, WhoType::Owner);
        assert_eq!(aces[0].access_mask, MODE_READ | MODE_WRITE | AccessMask::EXECUTE);
        assert_eq!(aces[1].who_type, WhoType::Group);
        assert!(aces[1].is_group());
        assert_eq!(aces[1].access_mask, MODE_READ | AccessMask::EXECUTE);
        assert_eq!(aces[2].who_type, WhoType::Everyone);
        assert!(aces[2].access_mask.is_empty());
        assert!(aces.iter().all(|ace| ace.ace_type == AceType::Allow));
    }

    #[test]
    fn named_constructors_manage_identifier_group() {
        let user = Nfs4Ace::user(
            AceType::Allow,
            AceFlags::IDENTIFIER_GROUP,
            AccessMask::READ_DATA,
            42,
        );
        assert!(!user.is_group());
        assert_eq!(user.who_id, 42);

        let group = Nfs4Ace::group(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, 7);
        assert!(group.is_group());
        assert_eq!(group.who_type, WhoType::Named);
    }
}
