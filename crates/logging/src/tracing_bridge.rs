//! crates/logging/src/tracing_bridge.rs
//! Subscriber installation for binaries and tests embedding the workspace.
//!
//! Library crates only emit events. Whoever owns the process calls
//! [`init_tracing`] once; the filter comes from the [`ENV_VAR`] environment
//! variable when it is set and parses, and from the supplied
//! [`VerbosityConfig`] otherwise. Output goes to stderr so it never mixes
//! with data written to stdout.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(2));
//! tracing::info!(target: "acltree::apply", "starting");
//! ```

use super::config::VerbosityConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable that overrides the verbosity-derived filter.
pub const ENV_VAR: &str = "ACLTREE_LOG";

/// Builds the filter used by [`init_tracing`].
///
/// An unparsable [`ENV_VAR`] value is ignored in favour of the
/// configuration so a typo never silences diagnostics entirely.
#[must_use]
pub fn build_filter(config: &VerbosityConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_VAR) {
        return filter;
    }
    filter_from_config(config)
}

fn filter_from_config(config: &VerbosityConfig) -> EnvFilter {
    EnvFilter::try_new(config.filter_directives()).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber, failing if one is already set.
pub fn try_init_tracing(config: VerbosityConfig) -> Result<(), TryInitError> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_filter(&config))
        .with(layer)
        .try_init()
}

/// Installs the global subscriber, keeping any subscriber that is already
/// installed.
pub fn init_tracing(config: VerbosityConfig) {
    // A second initialisation (tests, embedding applications) keeps the first.
    let _ = try_init_tracing(config);
}
