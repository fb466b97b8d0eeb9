//! The edit transaction: the only way a command mutates the graph.
//!
//! Before an entity is modified for the first time, its whole state is saved
//! in the [`ChangeSet`]. An entity created by the transaction is saved as
//! destroyed, so undoing and redoing a committed command are the same
//! operation: swapping saved and current states ([`ChangeSet::permute`]).

use crate::config::TopoConfig;
use crate::geometry::kernel::{GeomFailure, GeomModel, GeomRef};
use crate::geometry::point::Point;
use crate::topo_error::TopoError;
use crate::topology::arena::EntityState;
use crate::topology::entity::{
    BlockProps, CoEdgeProps, CoFaceProps, EdgeProps, FaceProps, VertexProps,
};
use crate::topology::graph::{TopoEntity, TopoGraph};
use crate::topology::id::{
    AnyId, BlockId, CoEdgeId, CoFaceId, EdgeId, EntityId, EntityKind, FaceId, VertexId,
};
use log::trace;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Saved states of the entities touched by one command.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    vertices: BTreeMap<VertexId, EntityState<VertexProps>>,
    coedges: BTreeMap<CoEdgeId, EntityState<CoEdgeProps>>,
    edges: BTreeMap<EdgeId, EntityState<EdgeProps>>,
    cofaces: BTreeMap<CoFaceId, EntityState<CoFaceProps>>,
    faces: BTreeMap<FaceId, EntityState<FaceProps>>,
    blocks: BTreeMap<BlockId, EntityState<BlockProps>>,
}

/// Entity kinds whose states a [`ChangeSet`] can hold.
pub trait Tracked: TopoEntity {
    fn saved(cs: &ChangeSet) -> &BTreeMap<Self, EntityState<Self::Props>>;
    fn saved_mut(cs: &mut ChangeSet) -> &mut BTreeMap<Self, EntityState<Self::Props>>;
}

macro_rules! tracked {
    ($id:ty, $field:ident) => {
        impl Tracked for $id {
            fn saved(cs: &ChangeSet) -> &BTreeMap<Self, EntityState<Self::Props>> {
                &cs.$field
            }

            fn saved_mut(cs: &mut ChangeSet) -> &mut BTreeMap<Self, EntityState<Self::Props>> {
                &mut cs.$field
            }
        }
    };
}

tracked!(VertexId, vertices);
tracked!(CoEdgeId, coedges);
tracked!(EdgeId, edges);
tracked!(CoFaceId, cofaces);
tracked!(FaceId, faces);
tracked!(BlockId, blocks);

impl ChangeSet {
    fn permute_kind<I: Tracked>(&mut self, graph: &mut TopoGraph) {
        for (&id, state) in I::saved_mut(self).iter_mut() {
            let current = graph.replace_state(id, state.clone());
            *state = current;
        }
    }

    /// Swaps every saved state with the current one. Applied once it undoes
    /// the command, applied again it redoes it.
    pub fn permute(&mut self, graph: &mut TopoGraph) {
        self.permute_kind::<VertexId>(graph);
        self.permute_kind::<CoEdgeId>(graph);
        self.permute_kind::<EdgeId>(graph);
        self.permute_kind::<CoFaceId>(graph);
        self.permute_kind::<FaceId>(graph);
        self.permute_kind::<BlockId>(graph);
    }

    /// Every entity with a saved state.
    pub fn ids(&self) -> Vec<AnyId> {
        fn add<I: Tracked>(cs: &ChangeSet, out: &mut Vec<AnyId>) {
            out.extend(I::saved(cs).keys().map(|id| id.any()));
        }
        let mut out = Vec::new();
        add::<VertexId>(self, &mut out);
        add::<CoEdgeId>(self, &mut out);
        add::<EdgeId>(self, &mut out);
        add::<CoFaceId>(self, &mut out);
        add::<FaceId>(self, &mut out);
        add::<BlockId>(self, &mut out);
        out
    }

    pub fn references(&self, id: AnyId) -> bool {
        match id {
            AnyId::Vertex(v) => self.vertices.contains_key(&v),
            AnyId::CoEdge(ce) => self.coedges.contains_key(&ce),
            AnyId::Edge(e) => self.edges.contains_key(&e),
            AnyId::CoFace(cf) => self.cofaces.contains_key(&cf),
            AnyId::Face(f) => self.faces.contains_key(&f),
            AnyId::Block(b) => self.blocks.contains_key(&b),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
            + self.coedges.len()
            + self.edges.len()
            + self.cofaces.len()
            + self.faces.len()
            + self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a committed command did, by entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommandReport {
    pub created: Vec<AnyId>,
    pub modified: Vec<AnyId>,
    pub destroyed: Vec<AnyId>,
}

impl CommandReport {
    fn of_kind(list: &[AnyId], kind: EntityKind) -> usize {
        list.iter().filter(|id| id.kind() == kind).count()
    }

    pub fn nb_created(&self, kind: EntityKind) -> usize {
        Self::of_kind(&self.created, kind)
    }

    pub fn nb_modified(&self, kind: EntityKind) -> usize {
        Self::of_kind(&self.modified, kind)
    }

    pub fn nb_destroyed(&self, kind: EntityKind) -> usize {
        Self::of_kind(&self.destroyed, kind)
    }

    pub fn created_blocks(&self) -> Vec<BlockId> {
        self.created
            .iter()
            .filter_map(|id| match id {
                AnyId::Block(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn created_vertices(&self) -> Vec<VertexId> {
        self.created
            .iter()
            .filter_map(|id| match id {
                AnyId::Vertex(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn created_coedges(&self) -> Vec<CoEdgeId> {
        self.created
            .iter()
            .filter_map(|id| match id {
                AnyId::CoEdge(ce) => Some(*ce),
                _ => None,
            })
            .collect()
    }

    pub fn created_cofaces(&self) -> Vec<CoFaceId> {
        self.created
            .iter()
            .filter_map(|id| match id {
                AnyId::CoFace(cf) => Some(*cf),
                _ => None,
            })
            .collect()
    }
}

/// Mutation surface handed to a command while it executes.
pub struct EditTx<'a> {
    graph: &'a mut TopoGraph,
    geom: &'a dyn GeomModel,
    config: &'a TopoConfig,
    changes: ChangeSet,
    created: BTreeSet<AnyId>,
}

impl<'a> EditTx<'a> {
    pub(crate) fn new(
        graph: &'a mut TopoGraph,
        geom: &'a dyn GeomModel,
        config: &'a TopoConfig,
    ) -> Self {
        EditTx { graph, geom, config, changes: ChangeSet::default(), created: BTreeSet::new() }
    }

    pub fn graph(&self) -> &TopoGraph {
        self.graph
    }

    pub fn geom(&self) -> &dyn GeomModel {
        self.geom
    }

    pub fn config(&self) -> &TopoConfig {
        self.config
    }

    /// `true` when the entity was created by this transaction.
    pub fn is_created<I: EntityId>(&self, id: I) -> bool {
        self.created.contains(&id.any())
    }

    pub fn create<I: Tracked>(&mut self, props: I::Props) -> I {
        let id: I = self.graph.insert(props.clone());
        I::saved_mut(&mut self.changes).insert(id, EntityState { destroyed: true, props });
        self.created.insert(id.any());
        trace!("create {} `{}`", I::KIND, self.graph.name(id));
        id
    }

    fn save<I: Tracked>(&mut self, id: I) {
        if !I::saved(&self.changes).contains_key(&id) {
            let state = self.graph.state(id).clone();
            I::saved_mut(&mut self.changes).insert(id, state);
        }
    }

    /// Applies `f` to the properties of a live entity.
    pub fn update<I: Tracked>(&mut self, id: I, f: impl FnOnce(&mut I::Props)) {
        self.save(id);
        let mut state = self.graph.state(id).clone();
        if state.destroyed {
            panic!("[defect] update of destroyed {} `{}`", I::KIND, self.graph.name(id));
        }
        f(&mut state.props);
        self.graph.replace_state(id, state);
    }

    pub fn set<I: Tracked>(&mut self, id: I, props: I::Props) {
        self.update(id, |p| *p = props);
    }

    /// Marks a live entity destroyed. Destroying twice is a no-op.
    pub fn destroy<I: Tracked>(&mut self, id: I) {
        if !self.graph.is_live(id) {
            return;
        }
        self.save(id);
        let mut state = self.graph.state(id).clone();
        state.destroyed = true;
        trace!("destroy {} `{}`", I::KIND, self.graph.name(id));
        self.graph.replace_state(id, state);
    }

    /// Projects `p` on `entity`, translating a kernel failure.
    pub fn project(&self, entity: GeomRef, p: Point, owner: &str) -> Result<Point, TopoError> {
        self.geom.project(entity, p).map_err(|source| geometry_error(owner, "project", source))
    }

    fn purge_scratch<I: Tracked>(&mut self) {
        let scratch: Vec<I> = I::saved(&self.changes)
            .keys()
            .copied()
            .filter(|&id| self.created.contains(&id.any()) && !self.graph.is_live(id))
            .collect();
        for id in scratch {
            trace!("drop scratch {} {:?}", I::KIND, id);
            I::saved_mut(&mut self.changes).remove(&id);
            self.created.remove(&id.any());
            self.graph.purge(id);
        }
    }

    fn report_kind<I: Tracked>(&self, report: &mut CommandReport) {
        for (&id, saved) in I::saved(&self.changes) {
            let current = self.graph.state(id);
            if self.created.contains(&id.any()) {
                report.created.push(id.any());
            } else if current.destroyed && !saved.destroyed {
                report.destroyed.push(id.any());
            } else if current != saved {
                report.modified.push(id.any());
            }
        }
    }

    /// Entities to check before committing: everything touched plus the
    /// parents whose invariants depend on a touched child.
    fn validation_set(&self) -> BTreeSet<AnyId> {
        let mut ids: BTreeSet<AnyId> = self.changes.ids().into_iter().collect();
        for id in self.changes.ids() {
            match id {
                AnyId::CoEdge(ce) if self.graph.is_live(ce) => {
                    ids.extend(self.graph.coedge_edges(ce).into_iter().map(AnyId::from));
                    ids.extend(self.graph.coedge_cofaces(ce).into_iter().map(AnyId::from));
                }
                AnyId::Face(f) if self.graph.is_live(f) => {
                    ids.extend(self.graph.face_blocks(f).into_iter().map(AnyId::from));
                }
                _ => {}
            }
        }
        ids
    }

    /// Drops scratch entities, checks invariants and hands back the change set.
    /// On an invariant violation the transaction is rolled back.
    pub(crate) fn commit(mut self) -> Result<(ChangeSet, CommandReport), TopoError> {
        self.purge_scratch::<BlockId>();
        self.purge_scratch::<FaceId>();
        self.purge_scratch::<CoFaceId>();
        self.purge_scratch::<EdgeId>();
        self.purge_scratch::<CoEdgeId>();
        self.purge_scratch::<VertexId>();

        if self.config.check_invariants {
            let ids = self.validation_set();
            if let Err(e) = self.graph.validate_entities(&ids) {
                self.rollback();
                return Err(e);
            }
        }

        let mut report = CommandReport::default();
        self.report_kind::<VertexId>(&mut report);
        self.report_kind::<CoEdgeId>(&mut report);
        self.report_kind::<EdgeId>(&mut report);
        self.report_kind::<CoFaceId>(&mut report);
        self.report_kind::<FaceId>(&mut report);
        self.report_kind::<BlockId>(&mut report);
        Ok((self.changes, report))
    }

    fn rollback_kind<I: Tracked>(&mut self) {
        let saved = std::mem::take(I::saved_mut(&mut self.changes));
        for (id, state) in saved {
            if self.created.contains(&id.any()) {
                self.graph.purge(id);
            } else {
                self.graph.replace_state(id, state);
            }
        }
    }

    /// Restores every saved state and forgets created entities.
    pub(crate) fn rollback(mut self) {
        self.rollback_kind::<BlockId>();
        self.rollback_kind::<FaceId>();
        self.rollback_kind::<CoFaceId>();
        self.rollback_kind::<EdgeId>();
        self.rollback_kind::<CoEdgeId>();
        self.rollback_kind::<VertexId>();
        self.created.clear();
    }
}

pub(crate) fn geometry_error(entity: &str, operation: &'static str, source: GeomFailure) -> TopoError {
    TopoError::Geometry { entity: entity.to_owned(), operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::kernel::NullModel;
    use crate::topology::entity::Discretization;

    fn vertex(x: f64) -> VertexProps {
        VertexProps { coord: Point::new(x, 0.0, 0.0), geom: None }
    }

    #[test]
    fn rollback_restores_and_forgets() {
        let mut graph = TopoGraph::default();
        let cfg = TopoConfig::default();
        let (a, b) = {
            let mut tx = EditTx::new(&mut graph, &NullModel, &cfg);
            let a: VertexId = tx.create(vertex(0.0));
            let b: VertexId = tx.create(vertex(1.0));
            tx.commit().unwrap();
            (a, b)
        };
        let before = graph.snapshot();

        let mut tx = EditTx::new(&mut graph, &NullModel, &cfg);
        let ce: CoEdgeId = tx.create(CoEdgeProps {
            vertices: [a, b],
            discretization: Discretization::uniform(3),
            geom: None,
        });
        tx.update(a, |p| p.coord.y = 5.0);
        tx.destroy(b);
        assert_eq!(tx.graph().vertex_coedges(a), vec![ce]);
        tx.rollback();

        assert_eq!(graph.snapshot(), before);
        assert!(!graph.contains(ce));
        assert!(graph.vertex_coedges(a).is_empty());
    }

    #[test]
    fn permute_twice_is_identity() {
        let mut graph = TopoGraph::default();
        let cfg = TopoConfig::default();
        let mut tx = EditTx::new(&mut graph, &NullModel, &cfg);
        let a: VertexId = tx.create(vertex(0.0));
        let (mut changes, report) = tx.commit().unwrap();
        assert_eq!(report.created, vec![AnyId::Vertex(a)]);
        let after = graph.snapshot();

        changes.permute(&mut graph);
        assert!(!graph.is_live(a));
        assert_eq!(graph.name(a), "Som0000");
        changes.permute(&mut graph);
        assert_eq!(graph.snapshot(), after);
    }

    #[test]
    fn scratch_entities_are_purged_on_commit() {
        let mut graph = TopoGraph::default();
        let cfg = TopoConfig::default();
        let mut tx = EditTx::new(&mut graph, &NullModel, &cfg);
        let keep: VertexId = tx.create(vertex(0.0));
        let tmp: VertexId = tx.create(vertex(1.0));
        tx.destroy(tmp);
        let (changes, report) = tx.commit().unwrap();
        assert_eq!(report.created, vec![AnyId::Vertex(keep)]);
        assert_eq!(changes.len(), 1);
        assert!(!graph.contains(tmp));
    }

    #[test]
    fn invariant_violation_rolls_back() {
        let mut graph = TopoGraph::default();
        let cfg = TopoConfig::default();
        let mut tx = EditTx::new(&mut graph, &NullModel, &cfg);
        let a: VertexId = tx.create(vertex(0.0));
        let _: CoEdgeId = tx.create(CoEdgeProps {
            vertices: [a, a],
            discretization: Discretization::uniform(1),
            geom: None,
        });
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, TopoError::Internal(_)), "{err}");
        assert_eq!(graph.nb_vertices(), 0);
        assert_eq!(graph.nb_coedges(), 0);
    }
}
