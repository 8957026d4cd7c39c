//! crates/logging/src/levels.rs
//! Debug flag enum and per-flag verbosity levels.

/// Debug flags for diagnostic categories.
///
/// Each flag owns one tracing target. The `trace_*` macros exported by this
/// crate emit events under exactly these targets, so a [`DebugLevels`] value
/// can be rendered into an `EnvFilter` directive set without inspecting the
/// events themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DebugFlag {
    /// ACL encoding, validation and inheritance.
    Acl,
    /// Tree iteration, pruning and resume.
    Walk,
    /// Mount table lookups.
    Mount,
    /// Extended attribute reads and writes.
    Xattr,
    /// Recursive apply progress and per-entry failures.
    Apply,
}

impl DebugFlag {
    /// Every flag, in the order used for rendering filter directives.
    pub const ALL: [Self; 5] = [Self::Acl, Self::Walk, Self::Mount, Self::Xattr, Self::Apply];

    /// Returns the tracing target events for this flag are emitted under.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Acl => "acltree::acl",
            Self::Walk => "acltree::walk",
            Self::Mount => "acltree::mount",
            Self::Xattr => "acltree::xattr",
            Self::Apply => "acltree::apply",
        }
    }

    /// Returns the short lowercase name accepted by [`DebugFlag::from_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::Walk => "walk",
            Self::Mount => "mount",
            Self::Xattr => "xattr",
            Self::Apply => "apply",
        }
    }

    /// Looks up a flag by its short name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

/// Debug verbosity levels for each flag.
///
/// Level `0` leaves the target at the global default, `1` enables `info`,
/// `2` enables `debug` and anything higher enables `trace`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// ACL engine level.
    pub acl: u8,
    /// Tree iterator level.
    pub walk: u8,
    /// Mount lookup level.
    pub mount: u8,
    /// Extended attribute level.
    pub xattr: u8,
    /// Recursive apply level.
    pub apply: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Acl => self.acl,
            DebugFlag::Walk => self.walk,
            DebugFlag::Mount => self.mount,
            DebugFlag::Xattr => self.xattr,
            DebugFlag::Apply => self.apply,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Acl => self.acl = level,
            DebugFlag::Walk => self.walk = level,
            DebugFlag::Mount => self.mount = level,
            DebugFlag::Xattr => self.xattr = level,
            DebugFlag::Apply => self.apply = level,
        }
    }

    /// Set all flags to the same level.
    pub fn set_all(&mut self, level: u8) {
        for flag in DebugFlag::ALL {
            self.set(flag, level);
        }
    }
}

/// Maps a numeric level onto the tracing level name used in filter directives.
#[must_use]
pub const fn level_directive(level: u8) -> Option<&'static str> {
    match level {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names_round_trip() {
        for flag in DebugFlag::ALL {
            assert_eq!(DebugFlag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(DebugFlag::from_name("flist"), None);
    }

    #[test]
    fn targets_share_crate_prefix() {
        for flag in DebugFlag::ALL {
            assert!(flag.target().starts_with("acltree::"));
            assert!(flag.target().ends_with(flag.name()));
        }
    }

    #[test]
    fn default_debug_levels_are_zero() {
        let levels = DebugLevels::default();
        for flag in DebugFlag::ALL {
            assert_eq!(levels.get(flag), 0);
        }
    }

    #[test]
    fn set_updates_only_the_named_flag() {
        let mut levels = DebugLevels::default();
        levels.set(DebugFlag::Walk, 3);
        assert_eq!(levels.walk, 3);
        assert_eq!(levels.acl, 0);
        assert_eq!(levels.get(DebugFlag::Walk), 3);
    }

    #[test]
    fn set_all_updates_all_levels() {
        let mut levels = DebugLevels::default();
        levels.set_all(2);
        assert!(DebugFlag::ALL.iter().all(|flag| levels.get(*flag) == 2));
    }

    #[test]
    fn level_directive_saturates_at_trace() {
        assert_eq!(level_directive(0), None);
        assert_eq!(level_directive(1), Some("info"));
        assert_eq!(level_directive(2), Some("debug"));
        assert_eq!(level_directive(9), Some("trace"));
    }
}
