//! Contract with the geometric modeling kernel.
//!
//! The topology never owns geometry: entities only carry a [`GeomRef`], an
//! opaque handle resolved through the [`GeomModel`] held by the session.
//! Projection failures come back as [`GeomFailure`] and are wrapped by the
//! core into [`TopoError::Geometry`](crate::topo_error::TopoError::Geometry).

use crate::geometry::point::{Point, Vector};
use crate::geometry::rotation::Portion;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque identity of a geometric entity owned by the collaborator.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct GeomRef(pub u64);

impl fmt::Debug for GeomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GeomRef").field(&self.0).finish()
    }
}

impl fmt::Display for GeomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geom#{}", self.0)
    }
}

/// Dimension class of a geometric entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeomKind {
    Vertex,
    Curve,
    Surface,
    Volume,
}

impl GeomKind {
    pub fn dim(self) -> u8 {
        match self {
            GeomKind::Vertex => 0,
            GeomKind::Curve => 1,
            GeomKind::Surface => 2,
            GeomKind::Volume => 3,
        }
    }
}

/// Failure reported by the geometric collaborator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeomFailure {
    /// The handle does not name an entity of the model.
    #[error("unknown geometric entity {0}")]
    Unknown(u64),
    /// The operation makes no sense for this kind of entity.
    #[error("{operation} is not defined on a {kind:?}")]
    NotApplicable { kind: GeomKind, operation: &'static str },
    /// Kernel-specific failure, carried as text.
    #[error("kernel failure: {0}")]
    Kernel(String),
}

/// Geometric collaborator consumed by the edit engine.
///
/// Calls are synchronous. Implementations must not call back into the session.
pub trait GeomModel {
    /// Dimension class of `entity`, `None` when unknown.
    fn kind(&self, entity: GeomRef) -> Option<GeomKind>;

    /// Closest point of `entity` to `p`.
    fn project(&self, entity: GeomRef, p: Point) -> Result<Point, GeomFailure>;

    /// In-place variant of [`project`](Self::project).
    fn project_in_place(&self, entity: GeomRef, p: &mut Point) -> Result<(), GeomFailure> {
        *p = self.project(entity, *p)?;
        Ok(())
    }

    /// Outward normal of a surface at the projection of `p`.
    fn normal(&self, entity: GeomRef, p: Point) -> Result<Vector, GeomFailure>;

    /// Entity swept by `entity` when revolved by `portion` around the X axis.
    fn swept(&self, _entity: GeomRef, _portion: Portion) -> Option<GeomRef> {
        None
    }
}

/// A model with no entities, used when the topology carries no association.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullModel;

impl GeomModel for NullModel {
    fn kind(&self, _entity: GeomRef) -> Option<GeomKind> {
        None
    }

    fn project(&self, entity: GeomRef, _p: Point) -> Result<Point, GeomFailure> {
        Err(GeomFailure::Unknown(entity.0))
    }

    fn normal(&self, entity: GeomRef, _p: Point) -> Result<Vector, GeomFailure> {
        Err(GeomFailure::Unknown(entity.0))
    }
}
