//! crates/logging/src/config.rs
//! Verbosity configuration and its rendering into filter directives.

use std::fmt;

use super::levels::{DebugFlag, DebugLevels, level_directive};

/// Global level applied to targets without an explicit debug level.
const BASE_DIRECTIVE: &str = "warn";

/// Combined verbosity configuration.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a verbose level (0-4).
    ///
    /// Level 1 reports the recursive apply summary, level 2 adds the engine,
    /// walker and mount diagnostics, level 3 raises everything to `debug` and
    /// level 4 enables `trace` output for every subsystem.
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.debug.apply = 1;
            }
            2 => {
                config.debug.apply = 2;
                config.debug.acl = 1;
                config.debug.walk = 1;
                config.debug.mount = 1;
            }
            3 => {
                config.debug.set_all(2);
                config.debug.xattr = 1;
            }
            _ => {
                config.debug.set_all(3);
            }
        }

        config
    }

    /// Returns a copy with one flag raised or lowered to `level`.
    #[must_use]
    pub fn with_debug(mut self, flag: DebugFlag, level: u8) -> Self {
        self.debug.set(flag, level);
        self
    }

    /// Applies a comma-separated list of debug flags such as `acl2,walk`.
    ///
    /// A bare flag name means level 1. `all` addresses every flag and `none`
    /// resets them.
    pub fn apply_debug_flags(&mut self, spec: &str) -> Result<(), UnknownDebugFlag> {
        for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let split = item
                .find(|ch: char| ch.is_ascii_digit())
                .unwrap_or(item.len());
            let (name, digits) = item.split_at(split);
            let level = if digits.is_empty() {
                1
            } else {
                digits
                    .parse::<u8>()
                    .map_err(|_| UnknownDebugFlag(item.to_owned()))?
            };

            match name {
                "all" => self.debug.set_all(level),
                "none" => self.debug.set_all(0),
                _ => {
                    let flag =
                        DebugFlag::from_name(name).ok_or_else(|| UnknownDebugFlag(item.to_owned()))?;
                    self.debug.set(flag, level);
                }
            }
        }
        Ok(())
    }

    /// Renders the configuration as an `EnvFilter` directive string.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let mut directives = String::from(BASE_DIRECTIVE);
        for flag in DebugFlag::ALL {
            if let Some(level) = level_directive(self.debug.get(flag)) {
                directives.push(',');
                directives.push_str(flag.target());
                directives.push('=');
                directives.push_str(level);
            }
        }
        directives
    }
}

/// Error returned when a debug flag specification names an unknown flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDebugFlag(pub String);

impl fmt::Display for UnknownDebugFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown debug flag '{}'", self.0)
    }
}

impl std::error::Error for UnknownDebugFlag {}
