//! crates/logging/src/tracing_macros.rs
//! Convenience macros for subsystem-scoped tracing.
//!
//! These macros wrap the standard tracing macros with the target owned by
//! each [`DebugFlag`](crate::DebugFlag), so filter directives rendered by
//! [`VerbosityConfig`](crate::VerbosityConfig) reach them. Callers depend on
//! `tracing` directly.

/// Emit an ACL engine trace.
///
/// # Example
/// ```ignore
/// trace_acl!(aces = acl.len(), "canonicalized NFSv4 ACL");
/// ```
#[macro_export]
macro_rules! trace_acl {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acltree::acl", $($arg)*);
    };
}

/// Emit a tree iterator trace.
///
/// # Example
/// ```ignore
/// trace_walk!(path = %dir.display(), "entering directory");
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acltree::walk", $($arg)*);
    };
}

/// Emit a mount lookup trace.
///
/// # Example
/// ```ignore
/// trace_mount!(mount_id, "resolved mountpoint {}", point.display());
/// ```
#[macro_export]
macro_rules! trace_mount {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "acltree::mount", $($arg)*);
    };
}

/// Emit an extended attribute trace.
///
/// # Example
/// ```ignore
/// trace_xattr!(name, len = data.len(), "read xattr");
/// ```
#[macro_export]
macro_rules! trace_xattr {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "acltree::xattr", $($arg)*);
    };
}

/// Emit a recursive apply trace.
///
/// # Example
/// ```ignore
/// trace_apply!(visited, errors, "recursive apply finished");
/// ```
#[macro_export]
macro_rules! trace_apply {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "acltree::apply", $($arg)*);
    };
}

/// Emit a recursive apply warning, used for per-entry failures that do not
/// abort the walk.
///
/// # Example
/// ```ignore
/// warn_apply!(path = %path.display(), "failed to set ACL: {error}");
/// ```
#[macro_export]
macro_rules! warn_apply {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "acltree::apply", $($arg)*);
    };
}
