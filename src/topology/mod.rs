//! The entity graph of the block-meshing topology.
//!
//! This module provides:
//! - typed ids for the six entity kinds ([`id`])
//! - their property blocks ([`entity`]) stored in per-kind arenas ([`arena`])
//! - the [`TopoGraph`] with its incidence index, name registry, navigation
//!   primitives and invariant checks
//!
//! The graph is only mutated through [`EditTx`](crate::command::EditTx); every
//! public method here is read-only.

pub mod arena;
pub mod entity;
pub mod graph;
pub mod hexa;
pub mod id;
pub mod registry;
pub mod traverse;
pub mod validation;

pub use arena::EntityState;
pub use entity::*;
pub use graph::{GraphSnapshot, TopoEntity, TopoGraph};
pub use id::{AnyId, BlockId, CoEdgeId, CoFaceId, EdgeId, EntityId, EntityKind, FaceId, VertexId};
pub use traverse::{Chain, ChainStep};

#[cfg(test)]
mod tests;
