#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the diagnostic plumbing shared by the acltree workspace.
//! Every other crate emits structured events through the `trace_*` macros
//! defined here, each of which targets one [`DebugFlag`]. Binaries and tests
//! install a subscriber through [`init_tracing`].
//!
//! # Design
//!
//! - [`DebugFlag`] enumerates the subsystems (ACL engine, walker, mount
//!   lookup, xattr I/O, recursive apply) and maps each to a tracing target.
//! - [`VerbosityConfig`] collects one level per flag. It can be derived from a
//!   `-v` count via [`VerbosityConfig::from_verbose_level`] or from a flag list
//!   such as `acl2,walk` via [`VerbosityConfig::apply_debug_flags`].
//! - [`init_tracing`] renders the configuration into an `EnvFilter` and
//!   installs a stderr `fmt` layer. The [`ENV_VAR`] environment variable takes
//!   precedence when it holds a valid filter.
//!
//! # Invariants
//!
//! - Library crates never install a global subscriber.
//! - Targets emitted by the macros and those returned by
//!   [`DebugFlag::target`] are the same strings.
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flags("walk2").unwrap();
//! assert_eq!(config.debug.get(DebugFlag::Walk), 2);
//! assert_eq!(
//!     config.filter_directives(),
//!     "warn,acltree::walk=debug,acltree::apply=info"
//! );
//! ```

mod config;
mod levels;
mod tracing_bridge;
mod tracing_macros;

pub use config::{UnknownDebugFlag, VerbosityConfig};
pub use levels::{DebugFlag, DebugLevels, level_directive};
pub use tracing_bridge::{ENV_VAR, build_filter, init_tracing, try_init_tracing};
