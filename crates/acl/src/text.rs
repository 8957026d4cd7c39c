//! Fixed character tables for the compact getfacl/setfacl notation.
//!
//! Each table is walked in order, one column per bit, so rendered strings
//! have a fixed width with `-` in unset positions: `rwaRWxDdpPcCos` style
//! output for permissions and `fdniSFgI` for flags.

use crate::flags::{AccessMask, AceFlags, PosixPerm};

/// NFSv4 permission characters in display order.
pub const NFS4_PERM_CHARS: [(AccessMask, char); 14] = [
    (AccessMask::READ_DATA, 'r'),
    (AccessMask::WRITE_DATA, 'w'),
    (AccessMask::APPEND_DATA, 'a'),
    (AccessMask::READ_NAMED_ATTRS, 'R'),
    (AccessMask::WRITE_NAMED_ATTRS, 'W'),
    (AccessMask::EXECUTE, 'x'),
    (AccessMask::DELETE_CHILD, 'D'),
    (AccessMask::DELETE, 'd'),
    (AccessMask::READ_ATTRIBUTES, 'p'),
    (AccessMask::WRITE_ATTRIBUTES, 'P'),
    (AccessMask::READ_ACL, 'c'),
    (AccessMask::WRITE_ACL, 'C'),
    (AccessMask::WRITE_OWNER, 'o'),
    (AccessMask::SYNCHRONIZE, 's'),
];

/// NFSv4 ACE flag characters in display order.
pub const NFS4_FLAG_CHARS: [(AceFlags, char); 8] = [
    (AceFlags::FILE_INHERIT, 'f'),
    (AceFlags::DIRECTORY_INHERIT, 'd'),
    (AceFlags::NO_PROPAGATE_INHERIT, 'n'),
    (AceFlags::INHERIT_ONLY, 'i'),
    (AceFlags::SUCCESSFUL_ACCESS, 'S'),
    (AceFlags::FAILED_ACCESS, 'F'),
    (AceFlags::IDENTIFIER_GROUP, 'g'),
    (AceFlags::INHERITED, 'I'),
];

/// POSIX permission characters in display order.
pub const POSIX_PERM_CHARS: [(PosixPerm, char); 3] = [
    (PosixPerm::READ, 'r'),
    (PosixPerm::WRITE, 'w'),
    (PosixPerm::EXECUTE, 'x'),
];

/// A character outside the table being parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} char: {ch:?}")]
pub struct InvalidChar {
    /// Which table rejected the character.
    pub kind: &'static str,
    /// The offending character.
    pub ch: char,
}

/// Named NFSv4 permission sets accepted in place of a character string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionSet {
    /// Every permission bit.
    Full,
    /// Everything except `WRITE_ACL` and `WRITE_OWNER`.
    Modify,
    /// Data, named attributes, attributes and ACL reads.
    Read,
    /// Data, append, named attribute and attribute writes.
    Write,
}

impl PermissionSet {
    /// All named sets.
    pub const ALL: [Self; 4] = [Self::Full, Self::Modify, Self::Read, Self::Write];

    /// Name used in the text notation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "full_set",
            Self::Modify => "modify_set",
            Self::Read => "read_set",
            Self::Write => "write_set",
        }
    }

    /// Looks a set up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|set| set.name() == name)
    }

    /// The access bits the set stands for.
    #[must_use]
    pub const fn mask(self) -> AccessMask {
        match self {
            Self::Full => AccessMask::all(),
            Self::Modify => AccessMask::all()
                .difference(AccessMask::WRITE_ACL)
                .difference(AccessMask::WRITE_OWNER),
            Self::Read => AccessMask::READ_DATA
                .union(AccessMask::READ_NAMED_ATTRS)
                .union(AccessMask::READ_ATTRIBUTES)
                .union(AccessMask::READ_ACL),
            Self::Write => AccessMask::WRITE_DATA
                .union(AccessMask::APPEND_DATA)
                .union(AccessMask::WRITE_NAMED_ATTRS)
                .union(AccessMask::WRITE_ATTRIBUTES),
        }
    }
}

fn render<T: Copy>(table: &[(T, char)], is_set: impl Fn(T) -> bool) -> String {
    table
        .iter()
        .map(|&(bit, ch)| if is_set(bit) { ch } else { '-' })
        .collect()
}

fn parse<T: Copy>(
    text: &str,
    table: &[(T, char)],
    kind: &'static str,
    mut accumulate: impl FnMut(T),
) -> Result<(), InvalidChar> {
    for ch in text.chars().filter(|&ch| ch != '-') {
        let (bit, _) = table
            .iter()
            .find(|(_, candidate)| *candidate == ch)
            .ok_or(InvalidChar { kind, ch })?;
        accumulate(*bit);
    }
    Ok(())
}

/// Renders an access mask as a 14-column string.
#[must_use]
pub fn render_access_mask(mask: AccessMask) -> String {
    render(&NFS4_PERM_CHARS, |bit| mask.contains(bit))
}

/// Parses permission characters or a [`PermissionSet`] name.
pub fn parse_access_mask(text: &str) -> Result<AccessMask, InvalidChar> {
    if let Some(set) = PermissionSet::from_name(text) {
        return Ok(set.mask());
    }
    let mut mask = AccessMask::empty();
    parse(text, &NFS4_PERM_CHARS, "NFS4 perm", |bit| mask.insert(bit))?;
    Ok(mask)
}

/// Renders ACE flags as an 8-column string.
#[must_use]
pub fn render_ace_flags(flags: AceFlags) -> String {
    render(&NFS4_FLAG_CHARS, |bit| flags.contains(bit))
}

/// Parses ACE flag characters.
pub fn parse_ace_flags(text: &str) -> Result<AceFlags, InvalidChar> {
    let mut flags = AceFlags::empty();
    parse(text, &NFS4_FLAG_CHARS, "NFS4 flag", |bit| flags.insert(bit))?;
    Ok(flags)
}

/// Renders POSIX permissions as `rwx` with `-` for unset bits.
#[must_use]
pub fn render_posix_perms(perms: PosixPerm) -> String {
    render(&POSIX_PERM_CHARS, |bit| perms.contains(bit))
}

/// Parses POSIX permission characters.
pub fn parse_posix_perms(text: &str) -> Result<PosixPerm, InvalidChar> {
    let mut perms = PosixPerm::empty();
    parse(text, &POSIX_PERM_CHARS, "POSIX perm", |bit| perms.insert(bit))?;
    Ok(perms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_cover_every_bit_once() {
        let perms = NFS4_PERM_CHARS
            .iter()
            .fold(AccessMask::empty(), |acc, (bit, _)| acc | *bit);
        assert_eq!(perms, AccessMask::all());

        let flags = NFS4_FLAG_CHARS
            .iter()
            .fold(AceFlags::empty(), |acc, (bit, _)| acc | *bit);
        assert_eq!(flags, AceFlags::all());
    }

    #[test]
    fn render_uses_fixed_columns() {
        assert_eq!(render_access_mask(AccessMask::empty()), "--------------");
        assert_eq!(
            render_access_mask(AccessMask::READ_DATA | AccessMask::EXECUTE | AccessMask::SYNCHRONIZE),
            "r----x-------s"
        );
        assert_eq!(render_access_mask(AccessMask::all()), "rwaRWxDdpPcCos");
        assert_eq!(
            render_ace_flags(AceFlags::FILE_INHERIT | AceFlags::INHERITED),
            "f------I"
        );
        assert_eq!(render_posix_perms(PosixPerm::READ | PosixPerm::EXECUTE), "r-x");
    }

    #[test]
    fn parse_accepts_rendered_output() {
        let mask = AccessMask::WRITE_DATA | AccessMask::DELETE | AccessMask::READ_ACL;
        assert_eq!(parse_access_mask(&render_access_mask(mask)), Ok(mask));

        let flags = AceFlags::DIRECTORY_INHERIT | AceFlags::IDENTIFIER_GROUP;
        assert_eq!(parse_ace_flags(&render_ace_flags(flags)), Ok(flags));
        assert_eq!(parse_ace_flags(""), Ok(AceFlags::empty()));
        assert_eq!(parse_posix_perms("rw-"), Ok(PosixPerm::READ | PosixPerm::WRITE));
    }

    #[test]
    fn parse_rejects_unknown_chars() {
        let error = parse_posix_perms("rwz").expect_err("z is not a perm");
        assert_eq!(error, InvalidChar { kind: "POSIX perm", ch: 'z' });
        assert_eq!(error.to_string(), "invalid POSIX perm char: 'z'");
        assert!(parse_ace_flags("fx").is_err());
        assert!(parse_access_mask("full").is_err());
    }

    #[test]
    fn named_sets() {
        assert_eq!(parse_access_mask("full_set"), Ok(AccessMask::all()));
        let modify = PermissionSet::Modify.mask();
        assert!(!modify.contains(AccessMask::WRITE_ACL));
        assert!(!modify.contains(AccessMask::WRITE_OWNER));
        assert!(modify.contains(AccessMask::DELETE));
        assert_eq!(PermissionSet::Read.mask().bits().count_ones(), 4);
        assert_eq!(PermissionSet::Write.mask().bits().count_ones(), 4);
        assert_eq!(PermissionSet::from_name("write_set"), Some(PermissionSet::Write));
    }
}
