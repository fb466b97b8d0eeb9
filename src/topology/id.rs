//! Typed, zero-cost handles for topological entities.
//!
//! Every entity kind has its own id newtype wrapping a `NonZeroU64`, so a
//! `CoEdgeId` can never be passed where a `BlockId` is expected. Ids are
//! allocated by the owning arena, never reused, and order entities by
//! creation; all result sets are sorted by id for reproducibility.
//!
//! `0` is reserved as an invalid value, exactly like the arena slot index
//! `id - 1`.

use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64};

/// The six kinds of topological entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Vertex,
    CoEdge,
    Edge,
    CoFace,
    Face,
    Block,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Vertex,
        EntityKind::CoEdge,
        EntityKind::Edge,
        EntityKind::CoFace,
        EntityKind::Face,
        EntityKind::Block,
    ];

    /// Topological dimension (Edge and CoEdge are 1, Face and CoFace 2).
    pub fn dim(self) -> u8 {
        match self {
            EntityKind::Vertex => 0,
            EntityKind::CoEdge | EntityKind::Edge => 1,
            EntityKind::CoFace | EntityKind::Face => 2,
            EntityKind::Block => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Vertex => "vertex",
            EntityKind::CoEdge => "coedge",
            EntityKind::Edge => "edge",
            EntityKind::CoFace => "coface",
            EntityKind::Face => "face",
            EntityKind::Block => "block",
        };
        f.write_str(s)
    }
}

/// Common surface of all typed ids.
pub trait EntityId: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    const KIND: EntityKind;

    /// Builds the id stored in arena slot `index`.
    fn from_index(index: usize) -> Self;

    /// Arena slot index of this id.
    fn index(self) -> usize;

    fn raw(self) -> u64;

    fn any(self) -> AnyId;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates an id from its raw value, `None` for zero.
            #[inline]
            pub fn new(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map($name)
            }

            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl EntityId for $name {
            const KIND: EntityKind = EntityKind::$kind;

            #[inline]
            fn from_index(index: usize) -> Self {
                match NonZeroU64::new(index as u64 + 1) {
                    Some(raw) => $name(raw),
                    None => unreachable!("arena index overflow"),
                }
            }

            #[inline]
            fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }

            #[inline]
            fn raw(self) -> u64 {
                self.0.get()
            }

            #[inline]
            fn any(self) -> AnyId {
                AnyId::$kind(self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.get())
            }
        }

        impl From<$name> for AnyId {
            fn from(id: $name) -> AnyId {
                AnyId::$kind(id)
            }
        }
    };
}

entity_id!(
    /// Handle of a [`Vertex`](crate::topology::entity::VertexProps).
    VertexId, Vertex, "v"
);
entity_id!(
    /// Handle of a common (shared, discretized) edge.
    CoEdgeId, CoEdge, "ce"
);
entity_id!(
    /// Handle of a composite edge of a coface.
    EdgeId, Edge, "e"
);
entity_id!(
    /// Handle of a common (shared, discretized) face.
    CoFaceId, CoFace, "cf"
);
entity_id!(
    /// Handle of a composite face bounding a block.
    FaceId, Face, "f"
);
entity_id!(
    /// Handle of a block.
    BlockId, Block, "b"
);

/// Id of an entity of any kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnyId {
    Vertex(VertexId),
    CoEdge(CoEdgeId),
    Edge(EdgeId),
    CoFace(CoFaceId),
    Face(FaceId),
    Block(BlockId),
}

impl AnyId {
    pub fn kind(self) -> EntityKind {
        match self {
            AnyId::Vertex(_) => EntityKind::Vertex,
            AnyId::CoEdge(_) => EntityKind::CoEdge,
            AnyId::Edge(_) => EntityKind::Edge,
            AnyId::CoFace(_) => EntityKind::CoFace,
            AnyId::Face(_) => EntityKind::Face,
            AnyId::Block(_) => EntityKind::Block,
        }
    }

    pub fn raw(self) -> u64 {
        match self {
            AnyId::Vertex(id) => id.get(),
            AnyId::CoEdge(id) => id.get(),
            AnyId::Edge(id) => id.get(),
            AnyId::CoFace(id) => id.get(),
            AnyId::Face(id) => id.get(),
            AnyId::Block(id) => id.get(),
        }
    }
}

impl fmt::Display for AnyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyId::Vertex(id) => id.fmt(f),
            AnyId::CoEdge(id) => id.fmt(f),
            AnyId::Edge(id) => id.fmt(f),
            AnyId::CoFace(id) => id.fmt(f),
            AnyId::Face(id) => id.fmt(f),
            AnyId::Block(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(VertexId, u64);
    assert_eq_size!(BlockId, u64);
    assert_eq_size!(Option<CoEdgeId>, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(VertexId::new(0).is_none());
        assert_eq!(VertexId::new(3).map(VertexId::get), Some(3));
    }

    #[test]
    fn index_round_trip() {
        let id = CoFaceId::from_index(4);
        assert_eq!(id.get(), 5);
        assert_eq!(id.index(), 4);
        assert_eq!(id.any().kind(), EntityKind::CoFace);
    }

    #[test]
    fn debug_and_display() {
        let b = BlockId::new(7).unwrap();
        assert_eq!(format!("{:?}", b), "BlockId(7)");
        assert_eq!(format!("{}", b), "b7");
        assert_eq!(format!("{}", AnyId::from(b)), "b7");
    }

    #[test]
    fn json_roundtrip() {
        let e = EdgeId::new(123).unwrap();
        let s = serde_json::to_string(&e).unwrap();
        let e2: EdgeId = serde_json::from_str(&s).unwrap();
        assert_eq!(e, e2);
    }
}
