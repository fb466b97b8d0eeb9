//! Whole-graph invariant checks.
//!
//! Commands validate the entities they touched when they commit (see
//! [`TopoConfig::check_invariants`](crate::config::TopoConfig)). The full
//! sweep below is more expensive; the session runs it after undo and redo in
//! debug builds and with the `check-invariants` or `strict-invariants`
//! feature.

use crate::topo_error::TopoError;

/// Graph-wide validation.
pub trait DebugInvariants {
    /// Panics on the first violation when whole-graph checks are compiled in.
    fn debug_assert_invariants(&self);
    /// First violation found, if any.
    fn validate_invariants(&self) -> Result<(), TopoError>;
}

/// Evaluates a `Result` and panics with context on `Err`, only when
/// whole-graph checks are compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("invariant violated: ", $($ctx)*, ": {}"), e);
        }
    };
}
