//! TopoError: unified error type for mesh-topo public APIs
//!
//! Every fallible operation of the edit engine returns this type. Variants are
//! grouped into the categories reported by [`TopoError::category`]:
//!
//! - **Precondition**: raised by command constructors before any mutation.
//! - **Lookup**: name resolution failures, `NotFound` distinct from `IsDestroyed`.
//! - **Topology**: impossibilities discovered while a command executes; the
//!   command is rolled back.
//! - **Geometry**: a failure of the geometric collaborator, wrapped with the
//!   entity and operation that triggered it.
//! - **Internal**: a consistency defect detected by the post-command check.

use crate::geometry::kernel::GeomFailure;
use crate::topology::id::EntityKind;
use thiserror::Error;

/// Coarse classification of [`TopoError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Precondition,
    Lookup,
    Topology,
    Geometry,
    Internal,
    History,
    Config,
}

/// Unified error type for topology edit operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopoError {
    /// A ratio lies outside its admissible interval.
    #[error("ratio {ratio} is outside {interval}")]
    RatioOutOfRange { ratio: f64, interval: &'static str },
    /// A segment count or similar count is not admissible.
    #[error("invalid count for {what}: {value}")]
    InvalidCount { what: &'static str, value: u32 },
    /// The command received an empty selection.
    #[error("empty selection: {0}")]
    EmptySelection(&'static str),
    /// The entity must be structured for this operation.
    #[error("{kind} `{name}` is not structured")]
    NotStructured { kind: EntityKind, name: String },
    /// The entity is degenerate (collapsed corners) and the operation needs a full one.
    #[error("{kind} `{name}` is degenerate")]
    Degenerate { kind: EntityKind, name: String },
    /// Any other argument check performed at construction time.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No live entity carries this name.
    #[error("{kind} `{name}` not found")]
    NotFound { kind: EntityKind, name: String },
    /// The name resolves to an entity that has been destroyed.
    #[error("{kind} `{name}` is destroyed")]
    IsDestroyed { kind: EntityKind, name: String },
    /// A cut would coincide with the border of the entity being split.
    #[error("cut of {kind} `{name}` lies on its border")]
    CutOnBorder { kind: EntityKind, name: String },
    /// The propagation frontier ran out before every selected entity was split.
    #[error("split propagation stopped after {split} of {expected} entities")]
    PropagationExhausted { split: usize, expected: usize },
    /// A topological impossibility found while executing.
    #[error("topology error: {0}")]
    Topology(String),
    /// A geometric collaborator failure translated into the core taxonomy.
    #[error("geometry failure on `{entity}` during {operation}: {source}")]
    Geometry {
        entity: String,
        operation: &'static str,
        #[source]
        source: GeomFailure,
    },
    /// An invariant of the entity graph does not hold.
    #[error("internal consistency defect: {0}")]
    Internal(String),
    /// Undo requested with an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Redo requested with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,
    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TopoError {
    /// Category of this error, see the module documentation.
    pub fn category(&self) -> ErrorCategory {
        use TopoError::*;
        match self {
            RatioOutOfRange { .. }
            | InvalidCount { .. }
            | EmptySelection(_)
            | NotStructured { .. }
            | Degenerate { .. }
            | InvalidArgument(_)
            | CutOnBorder { .. } => ErrorCategory::Precondition,
            NotFound { .. } | IsDestroyed { .. } => ErrorCategory::Lookup,
            PropagationExhausted { .. } | Topology(_) => ErrorCategory::Topology,
            Geometry { .. } => ErrorCategory::Geometry,
            Internal(_) => ErrorCategory::Internal,
            NothingToUndo | NothingToRedo => ErrorCategory::History,
            Config(_) => ErrorCategory::Config,
        }
    }

    /// `true` for errors raised before any mutation.
    pub fn is_precondition(&self) -> bool {
        self.category() == ErrorCategory::Precondition
    }
}

pub(crate) fn topology(message: impl Into<String>) -> TopoError {
    TopoError::Topology(message.into())
}

pub(crate) fn invalid_argument(message: impl Into<String>) -> TopoError {
    TopoError::InvalidArgument(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let e = TopoError::RatioOutOfRange { ratio: 1.5, interval: "[0, 1]" };
        assert!(e.is_precondition());
        let e = TopoError::IsDestroyed { kind: EntityKind::Block, name: "Bl0001".into() };
        assert_eq!(e.category(), ErrorCategory::Lookup);
        let e = TopoError::PropagationExhausted { split: 1, expected: 3 };
        assert_eq!(e.category(), ErrorCategory::Topology);
        assert_eq!(TopoError::NothingToRedo.category(), ErrorCategory::History);
    }

    #[test]
    fn geometry_failure_message_names_entity() {
        let e = TopoError::Geometry {
            entity: "Som0003".into(),
            operation: "project",
            source: GeomFailure::Unknown(7),
        };
        let msg = e.to_string();
        assert!(msg.contains("Som0003"), "{msg}");
        assert!(msg.contains("project"), "{msg}");
        assert_eq!(e.category(), ErrorCategory::Geometry);
    }
}
