//! Name-based lookup of entities.
//!
//! `lookup_*` distinguishes a name that was never issued (or was purged) from
//! one that resolves to a destroyed entity. The `_opt` variants fold both into
//! `None` for callers that only want a live entity.

use crate::topo_error::TopoError;
use crate::topology::arena::NameLookup;
use crate::topology::graph::{TopoEntity, TopoGraph};
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};

impl TopoGraph {
    /// Live entity named `name`.
    pub fn lookup<I: TopoEntity>(&self, name: &str) -> Result<I, TopoError> {
        match self.arena::<I>().lookup(name) {
            NameLookup::Live(id) => Ok(id),
            NameLookup::Destroyed(_) => {
                Err(TopoError::IsDestroyed { kind: I::KIND, name: name.to_owned() })
            }
            NameLookup::Missing => Err(TopoError::NotFound { kind: I::KIND, name: name.to_owned() }),
        }
    }

    pub fn lookup_opt<I: TopoEntity>(&self, name: &str) -> Option<I> {
        self.lookup(name).ok()
    }

    /// Entity named `name`, destroyed or not.
    pub fn lookup_any_state<I: TopoEntity>(&self, name: &str) -> Option<I> {
        match self.arena::<I>().lookup(name) {
            NameLookup::Live(id) | NameLookup::Destroyed(id) => Some(id),
            NameLookup::Missing => None,
        }
    }

    pub fn lookup_vertex(&self, name: &str) -> Result<VertexId, TopoError> {
        self.lookup(name)
    }

    pub fn lookup_coedge(&self, name: &str) -> Result<CoEdgeId, TopoError> {
        self.lookup(name)
    }

    pub fn lookup_edge(&self, name: &str) -> Result<EdgeId, TopoError> {
        self.lookup(name)
    }

    pub fn lookup_coface(&self, name: &str) -> Result<CoFaceId, TopoError> {
        self.lookup(name)
    }

    pub fn lookup_face(&self, name: &str) -> Result<FaceId, TopoError> {
        self.lookup(name)
    }

    pub fn lookup_block(&self, name: &str) -> Result<BlockId, TopoError> {
        self.lookup(name)
    }

    pub fn live_vertices(&self) -> Vec<VertexId> {
        self.live()
    }

    pub fn live_coedges(&self) -> Vec<CoEdgeId> {
        self.live()
    }

    pub fn live_cofaces(&self) -> Vec<CoFaceId> {
        self.live()
    }

    pub fn live_blocks(&self) -> Vec<BlockId> {
        self.live()
    }

    pub fn nb_vertices(&self) -> usize {
        self.nb_live::<VertexId>()
    }

    pub fn nb_coedges(&self) -> usize {
        self.nb_live::<CoEdgeId>()
    }

    pub fn nb_cofaces(&self) -> usize {
        self.nb_live::<CoFaceId>()
    }

    pub fn nb_blocks(&self) -> usize {
        self.nb_live::<BlockId>()
    }
}
