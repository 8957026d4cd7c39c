use std::io;

/// Failure to decode an ACL xattr blob.
///
/// Decoding is all-or-nothing; no partially decoded ACL is ever returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The blob is shorter than its fixed header.
    #[error("ACL data too short: {len} bytes, header needs {needed}")]
    TooShort {
        /// Bytes present.
        len: usize,
        /// Bytes required for the header.
        needed: usize,
    },
    /// The NFSv4 header declares more ACEs than the blob holds.
    #[error("NFSv4 ACL data truncated: header declares {count} entries, {len} bytes present")]
    Truncated {
        /// Entry count from the header.
        count: u32,
        /// Bytes present.
        len: usize,
    },
    /// The POSIX blob length is not `4 + 8n`.
    #[error("POSIX ACL length {0} is not a header plus whole entries")]
    BadLength(usize),
    /// The POSIX header version is not 2.
    #[error("POSIX ACL has unexpected version {0}")]
    BadVersion(u32),
    /// An NFSv4 ACE type outside ALLOW/DENY/AUDIT/ALARM.
    #[error("unknown NFSv4 ACE type {0}")]
    UnknownAceType(u32),
    /// An NFSv4 who code outside NAMED/OWNER/GROUP/EVERYONE.
    #[error("unknown NFSv4 who code {0}")]
    UnknownWho(u32),
    /// A POSIX tag outside the six defined tags.
    #[error("unknown POSIX ACL tag {0:#06x}")]
    UnknownTag(u16),
}

/// A structural rule violated by an ACL about to be written.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// DENY on `OWNER@`, `GROUP@` or `EVERYONE@`.
    #[error("DENY entries are not permitted for special principals (OWNER@, GROUP@, EVERYONE@)")]
    DenyOnSpecialPrincipal,
    /// `INHERIT_ONLY` without a propagation flag.
    #[error("INHERIT_ONLY requires FILE_INHERIT or DIRECTORY_INHERIT to also be set")]
    InheritOnlyWithoutPropagation,
    /// Propagation flags on a non-directory.
    #[error(
        "FILE_INHERIT/DIRECTORY_INHERIT/NO_PROPAGATE_INHERIT/INHERIT_ONLY flags are only valid on directories"
    )]
    PropagationOnFile,
    /// A directory ACL that no child would inherit from.
    #[error("directory ACL must contain at least one ACE with FILE_INHERIT or DIRECTORY_INHERIT")]
    NoInheritableAce,
    /// A required POSIX entry is missing or duplicated.
    #[error("{section} ACL must have exactly one {tag} entry")]
    RequiredEntry {
        /// `access` or `default`.
        section: &'static str,
        /// Tag name, e.g. `USER_OBJ`.
        tag: &'static str,
    },
    /// Named POSIX entries without exactly one MASK.
    #[error("{section} ACL must have exactly one MASK entry when named USER or GROUP entries are present")]
    MissingMask {
        /// `access` or `default`.
        section: &'static str,
    },
    /// More than one MASK.
    #[error("{section} ACL has more than one MASK entry")]
    DuplicateMask {
        /// `access` or `default`.
        section: &'static str,
    },
    /// A named POSIX entry without an id.
    #[error("{section} ACL: named {tag} entry has no id")]
    NamedWithoutId {
        /// `access` or `default`.
        section: &'static str,
        /// `USER` or `GROUP`.
        tag: &'static str,
    },
    /// A POSIX default section on a non-directory.
    #[error("default ACL is only valid on directories")]
    DefaultOnFile,
}

/// Error returned by the descriptor-level ACL operations.
#[derive(Debug, thiserror::Error)]
pub enum AclError {
    /// The stored blob could not be decoded.
    #[error("malformed ACL xattr: {0}")]
    Decode(#[from] DecodeError),
    /// The ACL was rejected before writing.
    #[error("invalid ACL: {0}")]
    Invalid(#[from] ValidationError),
    /// The filesystem supports neither NFSv4 nor POSIX ACLs.
    #[error("filesystem does not support ACLs")]
    Unsupported,
    /// A system call failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AclError {
    /// Returns the underlying I/O error, if any.
    #[must_use]
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}
