//! The entity graph: one arena per kind plus a child-to-parent incidence index.
//!
//! Parent-to-child links live in the property blocks (a coface lists its
//! edges, a block its faces). The reverse direction is derived: every time the
//! state of a live entity changes, its old links are removed from the
//! [`Incidence`] index and the new ones inserted. Destroyed entities are not
//! indexed, so every upward query only returns live entities, sorted by id.

use crate::config::NamePrefixes;
use crate::topology::arena::{Arena, EntityState, Slot};
use crate::topology::entity::{
    BlockProps, CoEdgeProps, CoFaceProps, EdgeProps, FaceProps, VertexProps,
};
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, EntityId, FaceId, VertexId};
use hashbrown::HashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

/// Ties an id type to its property block and its arena in [`TopoGraph`].
pub trait TopoEntity: EntityId + 'static {
    type Props: Clone + fmt::Debug + PartialEq;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props>;
    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props>;

    /// Adds (`on == true`) or removes the child-to-parent links of `props`.
    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool);
}

fn toggle<K: Hash + Eq, V: Ord>(map: &mut HashMap<K, BTreeSet<V>>, key: K, value: V, on: bool) {
    if on {
        map.entry(key).or_default().insert(value);
    } else if let Some(set) = map.get_mut(&key) {
        set.remove(&value);
        if set.is_empty() {
            map.remove(&key);
        }
    }
}

fn parents<K: Hash + Eq, V: Ord + Copy>(map: &HashMap<K, BTreeSet<V>>, key: &K) -> Vec<V> {
    map.get(key).map(|s| s.iter().copied().collect()).unwrap_or_default()
}

/// Child-to-parent links of live entities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Incidence {
    vertex_coedges: HashMap<VertexId, BTreeSet<CoEdgeId>>,
    vertex_cofaces: HashMap<VertexId, BTreeSet<CoFaceId>>,
    vertex_blocks: HashMap<VertexId, BTreeSet<BlockId>>,
    coedge_edges: HashMap<CoEdgeId, BTreeSet<EdgeId>>,
    edge_cofaces: HashMap<EdgeId, BTreeSet<CoFaceId>>,
    coface_faces: HashMap<CoFaceId, BTreeSet<FaceId>>,
    face_blocks: HashMap<FaceId, BTreeSet<BlockId>>,
}

impl TopoEntity for VertexId {
    type Props = VertexProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.vertices
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.vertices
    }

    fn index_links(_: &mut Incidence, _: Self, _: &Self::Props, _: bool) {}
}

impl TopoEntity for CoEdgeId {
    type Props = CoEdgeProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.coedges
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.coedges
    }

    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool) {
        for &v in &props.vertices {
            toggle(&mut inc.vertex_coedges, v, id, on);
        }
    }
}

impl TopoEntity for EdgeId {
    type Props = EdgeProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.edges
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.edges
    }

    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool) {
        for &ce in &props.coedges {
            toggle(&mut inc.coedge_edges, ce, id, on);
        }
    }
}

impl TopoEntity for CoFaceId {
    type Props = CoFaceProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.cofaces
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.cofaces
    }

    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool) {
        for &e in &props.edges {
            toggle(&mut inc.edge_cofaces, e, id, on);
        }
        for &v in &props.vertices {
            toggle(&mut inc.vertex_cofaces, v, id, on);
        }
    }
}

impl TopoEntity for FaceId {
    type Props = FaceProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.faces
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.faces
    }

    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool) {
        for &cf in &props.cofaces {
            toggle(&mut inc.coface_faces, cf, id, on);
        }
    }
}

impl TopoEntity for BlockId {
    type Props = BlockProps;

    fn arena(graph: &TopoGraph) -> &Arena<Self, Self::Props> {
        &graph.blocks
    }

    fn arena_mut(graph: &mut TopoGraph) -> &mut Arena<Self, Self::Props> {
        &mut graph.blocks
    }

    fn index_links(inc: &mut Incidence, id: Self, props: &Self::Props, on: bool) {
        for &f in &props.faces {
            toggle(&mut inc.face_blocks, f, id, on);
        }
        for &v in &props.vertices {
            toggle(&mut inc.vertex_blocks, v, id, on);
        }
    }
}

/// Arena-backed graph of vertices, coedges, edges, cofaces, faces and blocks.
#[derive(Clone, Debug)]
pub struct TopoGraph {
    vertices: Arena<VertexId, VertexProps>,
    coedges: Arena<CoEdgeId, CoEdgeProps>,
    edges: Arena<EdgeId, EdgeProps>,
    cofaces: Arena<CoFaceId, CoFaceProps>,
    faces: Arena<FaceId, FaceProps>,
    blocks: Arena<BlockId, BlockProps>,
    incidence: Incidence,
}

impl Default for TopoGraph {
    fn default() -> Self {
        TopoGraph::new(&NamePrefixes::default())
    }
}

impl TopoGraph {
    pub fn new(names: &NamePrefixes) -> Self {
        TopoGraph {
            vertices: Arena::new(names.vertex.as_str()),
            coedges: Arena::new(names.coedge.as_str()),
            edges: Arena::new(names.edge.as_str()),
            cofaces: Arena::new(names.coface.as_str()),
            faces: Arena::new(names.face.as_str()),
            blocks: Arena::new(names.block.as_str()),
            incidence: Incidence::default(),
        }
    }

    // ---- raw state ----------------------------------------------------------

    pub fn slot<I: TopoEntity>(&self, id: I) -> &Slot<I::Props> {
        I::arena(self).slot(id)
    }

    pub fn state<I: TopoEntity>(&self, id: I) -> &EntityState<I::Props> {
        &self.slot(id).state
    }

    pub fn contains<I: TopoEntity>(&self, id: I) -> bool {
        I::arena(self).contains(id)
    }

    pub fn is_live<I: TopoEntity>(&self, id: I) -> bool {
        I::arena(self).is_live(id)
    }

    pub fn name<I: TopoEntity>(&self, id: I) -> &str {
        &self.slot(id).name
    }

    /// Properties of a live entity.
    ///
    /// # Panics
    /// Navigation reaching a destroyed or purged entity is a consistency
    /// defect and panics.
    pub fn get<I: TopoEntity>(&self, id: I) -> &I::Props {
        let slot = self.slot(id);
        if slot.state.destroyed {
            panic!("[defect] navigation reached destroyed {} `{}`", I::KIND, slot.name);
        }
        &slot.state.props
    }

    pub fn vertex(&self, id: VertexId) -> &VertexProps {
        self.get(id)
    }

    pub fn coedge(&self, id: CoEdgeId) -> &CoEdgeProps {
        self.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> &EdgeProps {
        self.get(id)
    }

    pub fn coface(&self, id: CoFaceId) -> &CoFaceProps {
        self.get(id)
    }

    pub fn face(&self, id: FaceId) -> &FaceProps {
        self.get(id)
    }

    pub fn block(&self, id: BlockId) -> &BlockProps {
        self.get(id)
    }

    // ---- mutation, reserved to the command engine ---------------------------

    pub(crate) fn insert<I: TopoEntity>(&mut self, props: I::Props) -> I {
        let id = I::arena_mut(self).insert(props);
        let mut inc = std::mem::take(&mut self.incidence);
        I::index_links(&mut inc, id, &I::arena(self).slot(id).state.props, true);
        self.incidence = inc;
        id
    }

    pub(crate) fn replace_state<I: TopoEntity>(
        &mut self,
        id: I,
        state: EntityState<I::Props>,
    ) -> EntityState<I::Props> {
        let old = I::arena_mut(self).replace_state(id, state);
        let mut inc = std::mem::take(&mut self.incidence);
        if !old.destroyed {
            I::index_links(&mut inc, id, &old.props, false);
        }
        let current = &I::arena(self).slot(id).state;
        if !current.destroyed {
            I::index_links(&mut inc, id, &current.props, true);
        }
        self.incidence = inc;
        old
    }

    pub(crate) fn purge<I: TopoEntity>(&mut self, id: I) {
        if let Some(slot) = I::arena_mut(self).purge(id) {
            if !slot.state.destroyed {
                I::index_links(&mut self.incidence, id, &slot.state.props, false);
            }
        }
    }

    // ---- listings ------------------------------------------------------------

    /// Live entities of one kind, sorted by id.
    pub fn live<I: TopoEntity>(&self) -> Vec<I> {
        I::arena(self).live_ids()
    }

    pub fn nb_live<I: TopoEntity>(&self) -> usize {
        I::arena(self).nb_live()
    }

    /// Stored entities of one kind (destroyed ones included), sorted by id.
    pub fn stored<I: TopoEntity>(&self) -> Vec<I> {
        I::arena(self).ids().collect()
    }

    pub(crate) fn arena<I: TopoEntity>(&self) -> &Arena<I, I::Props> {
        I::arena(self)
    }

    // ---- upward incidence ----------------------------------------------------

    pub fn vertex_coedges(&self, v: VertexId) -> Vec<CoEdgeId> {
        parents(&self.incidence.vertex_coedges, &v)
    }

    pub fn vertex_cofaces(&self, v: VertexId) -> Vec<CoFaceId> {
        parents(&self.incidence.vertex_cofaces, &v)
    }

    pub fn vertex_blocks(&self, v: VertexId) -> Vec<BlockId> {
        parents(&self.incidence.vertex_blocks, &v)
    }

    pub fn coedge_edges(&self, ce: CoEdgeId) -> Vec<EdgeId> {
        parents(&self.incidence.coedge_edges, &ce)
    }

    pub fn edge_cofaces(&self, e: EdgeId) -> Vec<CoFaceId> {
        parents(&self.incidence.edge_cofaces, &e)
    }

    pub fn coface_faces(&self, cf: CoFaceId) -> Vec<FaceId> {
        parents(&self.incidence.coface_faces, &cf)
    }

    pub fn face_blocks(&self, f: FaceId) -> Vec<BlockId> {
        parents(&self.incidence.face_blocks, &f)
    }

    pub fn coedge_cofaces(&self, ce: CoEdgeId) -> Vec<CoFaceId> {
        let set: BTreeSet<CoFaceId> = self
            .coedge_edges(ce)
            .into_iter()
            .flat_map(|e| self.edge_cofaces(e))
            .collect();
        set.into_iter().collect()
    }

    pub fn coface_blocks(&self, cf: CoFaceId) -> Vec<BlockId> {
        let set: BTreeSet<BlockId> = self
            .coface_faces(cf)
            .into_iter()
            .flat_map(|f| self.face_blocks(f))
            .collect();
        set.into_iter().collect()
    }

    pub fn coedge_blocks(&self, ce: CoEdgeId) -> Vec<BlockId> {
        let set: BTreeSet<BlockId> = self
            .coedge_cofaces(ce)
            .into_iter()
            .flat_map(|cf| self.coface_blocks(cf))
            .collect();
        set.into_iter().collect()
    }

    /// `true` when no live entity refers to `v`.
    pub fn is_vertex_unused(&self, v: VertexId) -> bool {
        !self.incidence.vertex_coedges.contains_key(&v)
            && !self.incidence.vertex_cofaces.contains_key(&v)
            && !self.incidence.vertex_blocks.contains_key(&v)
    }

    pub fn is_coedge_unused(&self, ce: CoEdgeId) -> bool {
        !self.incidence.coedge_edges.contains_key(&ce)
    }

    pub fn is_edge_unused(&self, e: EdgeId) -> bool {
        !self.incidence.edge_cofaces.contains_key(&e)
    }

    pub fn is_coface_unused(&self, cf: CoFaceId) -> bool {
        !self.incidence.coface_faces.contains_key(&cf)
    }

    pub fn is_face_unused(&self, f: FaceId) -> bool {
        !self.incidence.face_blocks.contains_key(&f)
    }

    /// `true` when the incidence index matches the live property blocks.
    pub fn incidence_is_consistent(&self) -> bool {
        fn add<I: TopoEntity>(g: &TopoGraph, inc: &mut Incidence) {
            for id in g.live::<I>() {
                I::index_links(inc, id, g.get(id), true);
            }
        }
        let mut fresh = Incidence::default();
        add::<VertexId>(self, &mut fresh);
        add::<CoEdgeId>(self, &mut fresh);
        add::<EdgeId>(self, &mut fresh);
        add::<CoFaceId>(self, &mut fresh);
        add::<FaceId>(self, &mut fresh);
        add::<BlockId>(self, &mut fresh);
        fresh == self.incidence
    }

    // ---- comparison ----------------------------------------------------------

    /// Names and properties of every live entity, for whole-graph comparison.
    pub fn snapshot(&self) -> GraphSnapshot {
        fn collect<I: TopoEntity>(g: &TopoGraph) -> Vec<(I, String, I::Props)> {
            g.live::<I>()
                .into_iter()
                .map(|id| (id, g.name(id).to_owned(), g.get(id).clone()))
                .collect()
        }
        GraphSnapshot {
            vertices: collect(self),
            coedges: collect(self),
            edges: collect(self),
            cofaces: collect(self),
            faces: collect(self),
            blocks: collect(self),
        }
    }
}

/// Live content of a [`TopoGraph`], comparable with `==`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<(VertexId, String, VertexProps)>,
    pub coedges: Vec<(CoEdgeId, String, CoEdgeProps)>,
    pub edges: Vec<(EdgeId, String, EdgeProps)>,
    pub cofaces: Vec<(CoFaceId, String, CoFaceProps)>,
    pub faces: Vec<(FaceId, String, FaceProps)>,
    pub blocks: Vec<(BlockId, String, BlockProps)>,
}
