//! crates/acl/src/flags.rs
//!
//! Enumerations and bit sets shared by the NFSv4 and POSIX ACL models.
//!
//! Numeric values match the kernel and ZFS definitions bit for bit, so every
//! type converts losslessly to and from the integers found in xattr blobs.

use std::fmt;

use bitflags::bitflags;

use crate::error::DecodeError;

/// NFSv4 ACE type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u32)]
pub enum AceType {
    /// Grants the access mask.
    Allow = 0,
    /// Denies the access mask.
    Deny = 1,
    /// Audits access attempts.
    Audit = 2,
    /// Raises an alarm on access attempts.
    Alarm = 3,
}

impl AceType {
    /// All ACE types in numeric order.
    pub const ALL: [Self; 4] = [Self::Allow, Self::Deny, Self::Audit, Self::Alarm];

    /// Lower-case name used by the text representation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Audit => "audit",
            Self::Alarm => "alarm",
        }
    }

    /// Parses a lower-case type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl TryFrom<u32> for AceType {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Allow),
            1 => Ok(Self::Deny),
            2 => Ok(Self::Audit),
            3 => Ok(Self::Alarm),
            other => Err(DecodeError::UnknownAceType(other)),
        }
    }
}

impl fmt::Display for AceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Principal an NFSv4 ACE applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[repr(u32)]
pub enum WhoType {
    /// A specific user or group, identified by `who_id`.
    Named = 0,
    /// `OWNER@`
    Owner = 1,
    /// `GROUP@`
    Group = 2,
    /// `EVERYONE@`
    Everyone = 3,
}

impl WhoType {
    /// Returns `true` for `OWNER@`, `GROUP@` and `EVERYONE@`.
    #[must_use]
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Named)
    }

    /// Text form of special principals; `None` for [`WhoType::Named`].
    #[must_use]
    pub const fn special_name(self) -> Option<&'static str> {
        match self {
            Self::Named => None,
            Self::Owner => Some("owner@"),
            Self::Group => Some("group@"),
            Self::Everyone => Some("everyone@"),
        }
    }
}

impl TryFrom<u32> for WhoType {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Named),
            1 => Ok(Self::Owner),
            2 => Ok(Self::Group),
            3 => Ok(Self::Everyone),
            other => Err(DecodeError::UnknownWho(other)),
        }
    }
}

bitflags! {
    /// NFSv4 ACE flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AceFlags: u32 {
        /// Inherited by files created in the directory.
        const FILE_INHERIT = 0x01;
        /// Inherited by subdirectories.
        const DIRECTORY_INHERIT = 0x02;
        /// Inheritance stops after one generation.
        const NO_PROPAGATE_INHERIT = 0x04;
        /// Applies only to children, not to the directory itself.
        const INHERIT_ONLY = 0x08;
        /// Audit or alarm on successful access.
        const SUCCESSFUL_ACCESS = 0x10;
        /// Audit or alarm on failed access.
        const FAILED_ACCESS = 0x20;
        /// The named principal is a group.
        const IDENTIFIER_GROUP = 0x40;
        /// The ACE was inherited from a parent directory.
        const INHERITED = 0x80;
    }
}

impl Default for AceFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl AceFlags {
    /// Flags that control propagation to children.
    pub const PROPAGATION: Self = Self::FILE_INHERIT
        .union(Self::DIRECTORY_INHERIT)
        .union(Self::NO_PROPAGATE_INHERIT)
        .union(Self::INHERIT_ONLY);

    /// Flags that make an ACE reach some kind of child.
    pub const INHERITABLE: Self = Self::FILE_INHERIT.union(Self::DIRECTORY_INHERIT);
}

bitflags! {
    /// NFSv4 access mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AccessMask: u32 {
        /// Read file data or list a directory.
        const READ_DATA = 0x0000_0001;
        /// Write file data or create a file in a directory.
        const WRITE_DATA = 0x0000_0002;
        /// Append file data or create a subdirectory.
        const APPEND_DATA = 0x0000_0004;
        /// Read named attributes.
        const READ_NAMED_ATTRS = 0x0000_0008;
        /// Write named attributes.
        const WRITE_NAMED_ATTRS = 0x0000_0010;
        /// Execute a file or traverse a directory.
        const EXECUTE = 0x0000_0020;
        /// Delete an entry within a directory.
        const DELETE_CHILD = 0x0000_0040;
        /// Read basic attributes.
        const READ_ATTRIBUTES = 0x0000_0080;
        /// Write basic attributes.
        const WRITE_ATTRIBUTES = 0x0000_0100;
        /// Delete the object itself.
        const DELETE = 0x0001_0000;
        /// Read the ACL.
        const READ_ACL = 0x0002_0000;
        /// Write the ACL.
        const WRITE_ACL = 0x0004_0000;
        /// Change the owner.
        const WRITE_OWNER = 0x0008_0000;
        /// Use the object for synchronous I/O.
        const SYNCHRONIZE = 0x0010_0000;
    }
}

impl Default for AccessMask {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// ACL-level flags stored in the NFSv4 blob header.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AclFlags: u32 {
        /// Automatic inheritance is enabled.
        const AUTO_INHERIT = 0x0001;
        /// The ACL is protected from inheritance.
        const PROTECTED = 0x0002;
        /// The ACL was assigned by default.
        const DEFAULTED = 0x0004;
        /// Reported by the filesystem: the ACL is equivalent to the mode bits.
        const ACL_IS_TRIVIAL = 0x0001_0000;
        /// Reported by the filesystem: the ACL belongs to a directory.
        const ACL_IS_DIR = 0x0002_0000;
    }
}

impl Default for AclFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl AclFlags {
    /// Flags a caller may set.
    pub const SETTABLE: Self = Self::AUTO_INHERIT
        .union(Self::PROTECTED)
        .union(Self::DEFAULTED);
    /// Flags only the filesystem reports.
    pub const READ_ONLY: Self = Self::ACL_IS_TRIVIAL.union(Self::ACL_IS_DIR);
}

/// POSIX ACL entry tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(u16)]
pub enum PosixTag {
    /// The owning user.
    UserObj = 0x01,
    /// A named user.
    User = 0x02,
    /// The owning group.
    GroupObj = 0x04,
    /// A named group.
    Group = 0x08,
    /// Upper bound for named entries and the owning group.
    Mask = 0x10,
    /// Everyone else.
    Other = 0x20,
}

impl PosixTag {
    /// Returns `true` for entries that carry a uid or gid.
    #[must_use]
    pub const fn is_named(self) -> bool {
        matches!(self, Self::User | Self::Group)
    }

    /// Prefix used by the getfacl text form.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::UserObj | Self::User => "user",
            Self::GroupObj | Self::Group => "group",
            Self::Mask => "mask",
            Self::Other => "other",
        }
    }

    /// Upper-case name used in validation messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserObj => "USER_OBJ",
            Self::User => "USER",
            Self::GroupObj => "GROUP_OBJ",
            Self::Group => "GROUP",
            Self::Mask => "MASK",
            Self::Other => "OTHER",
        }
    }
}

impl TryFrom<u16> for PosixTag {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::UserObj),
            0x02 => Ok(Self::User),
            0x04 => Ok(Self::GroupObj),
            0x08 => Ok(Self::Group),
            0x10 => Ok(Self::Mask),
            0x20 => Ok(Self::Other),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

bitflags! {
    /// POSIX permission bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct PosixPerm: u16 {
        /// Execute or search.
        const EXECUTE = 0x1;
        /// Write.
        const WRITE = 0x2;
        /// Read.
        const READ = 0x4;
    }
}

impl Default for PosixPerm {
    fn default() -> Self {
        Self::empty()
    }
}

impl PosixPerm {
    /// Converts the low three bits of a mode triplet.
    #[must_use]
    pub const fn from_mode_bits(bits: u32) -> Self {
        Self::from_bits_truncate((bits & 0o7) as u16)
    }
}
