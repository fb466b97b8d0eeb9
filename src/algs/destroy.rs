//! Removal of topological entities with everything built on them.
//!
//! Destroying an entity destroys every entity above it: a vertex takes its
//! coedges, a coedge its cofaces, a coface its blocks. With propagation the
//! entities below that nothing else uses go as well; without it only the
//! faces and edges left empty are removed.

use crate::algs::edit::{release_block, release_coedge, release_coface};
use crate::algs::{require_live, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::TopoCommand;
use crate::topo_error::{TopoError, invalid_argument, topology};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{AnyId, BlockId, CoEdgeId, CoFaceId, VertexId};
use log::debug;
use serde_json::json;
use std::collections::BTreeSet;

/// Destroys vertices, coedges, cofaces and blocks.
#[derive(Clone, Debug)]
pub struct DestroyEntities {
    targets: Vec<AnyId>,
    propagate: bool,
}

fn require_live_any(graph: &TopoGraph, id: AnyId) -> Result<(), TopoError> {
    match id {
        AnyId::Vertex(v) => require_live(graph, v),
        AnyId::CoEdge(ce) => require_live(graph, ce),
        AnyId::CoFace(cf) => require_live(graph, cf),
        AnyId::Block(b) => require_live(graph, b),
        AnyId::Edge(_) | AnyId::Face(_) => {
            Err(invalid_argument(format!("a {} is destroyed through its coedges or cofaces", id.kind())))
        }
    }
}

pub(crate) fn any_name(graph: &TopoGraph, id: AnyId) -> String {
    let name = match id {
        AnyId::Vertex(v) => graph.name(v),
        AnyId::CoEdge(ce) => graph.name(ce),
        AnyId::Edge(e) => graph.name(e),
        AnyId::CoFace(cf) => graph.name(cf),
        AnyId::Face(f) => graph.name(f),
        AnyId::Block(b) => graph.name(b),
    };
    name.to_owned()
}

/// Targets and every entity depending on them, by kind.
#[derive(Default)]
struct Closure {
    vertices: BTreeSet<VertexId>,
    coedges: BTreeSet<CoEdgeId>,
    cofaces: BTreeSet<CoFaceId>,
    blocks: BTreeSet<BlockId>,
}

impl Closure {
    fn of(graph: &TopoGraph, targets: &[AnyId]) -> Self {
        let mut c = Closure::default();
        for &id in targets {
            match id {
                AnyId::Vertex(v) => {
                    c.vertices.insert(v);
                    c.coedges.extend(graph.vertex_coedges(v));
                    c.cofaces.extend(graph.vertex_cofaces(v));
                    c.blocks.extend(graph.vertex_blocks(v));
                }
                AnyId::CoEdge(ce) => {
                    c.coedges.insert(ce);
                }
                AnyId::CoFace(cf) => {
                    c.cofaces.insert(cf);
                }
                AnyId::Block(b) => {
                    c.blocks.insert(b);
                }
                AnyId::Edge(_) | AnyId::Face(_) => {}
            }
        }
        let coedges: Vec<CoEdgeId> = c.coedges.iter().copied().collect();
        for ce in coedges {
            c.cofaces.extend(graph.coedge_cofaces(ce));
        }
        let cofaces: Vec<CoFaceId> = c.cofaces.iter().copied().collect();
        for cf in cofaces {
            c.blocks.extend(graph.coface_blocks(cf));
        }
        c
    }
}

impl DestroyEntities {
    pub fn new(graph: &TopoGraph, targets: &[AnyId], propagate: bool) -> Result<Self, TopoError> {
        let targets = selection(targets, "entities to destroy")?;
        for &id in &targets {
            require_live_any(graph, id)?;
        }
        Ok(DestroyEntities { targets, propagate })
    }

    fn destroy_block(&self, tx: &mut EditTx<'_>, b: BlockId) {
        if self.propagate {
            return release_block(tx, b);
        }
        let faces = tx.graph().block(b).faces.clone();
        tx.destroy(b);
        for f in faces {
            if tx.graph().is_face_unused(f) {
                tx.destroy(f);
            }
        }
    }

    fn destroy_coface(&self, tx: &mut EditTx<'_>, cf: CoFaceId) {
        if self.propagate {
            return release_coface(tx, cf);
        }
        if !tx.graph().is_live(cf) || !tx.graph().is_coface_unused(cf) {
            return;
        }
        let edges = tx.graph().coface(cf).edges.clone();
        tx.destroy(cf);
        for e in edges {
            if tx.graph().is_edge_unused(e) {
                tx.destroy(e);
            }
        }
    }

    fn destroy_coedge(&self, tx: &mut EditTx<'_>, ce: CoEdgeId) {
        if self.propagate {
            release_coedge(tx, ce);
        } else if tx.graph().is_live(ce) && tx.graph().is_coedge_unused(ce) {
            tx.destroy(ce);
        }
    }
}

impl TopoCommand for DestroyEntities {
    fn name(&self) -> &'static str {
        "DestroyEntities"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        for &id in &self.targets {
            require_live_any(graph, id)?;
        }
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let closure = Closure::of(tx.graph(), &self.targets);
        for &b in &closure.blocks {
            self.destroy_block(tx, b);
        }
        for &cf in &closure.cofaces {
            self.destroy_coface(tx, cf);
        }
        for &ce in &closure.coedges {
            self.destroy_coedge(tx, ce);
        }
        for &v in &closure.vertices {
            if tx.graph().is_live(v) && tx.graph().is_vertex_unused(v) {
                tx.destroy(v);
            }
        }
        let g = tx.graph();
        let left = closure
            .cofaces
            .iter()
            .find(|&&cf| g.is_live(cf))
            .map(|&cf| AnyId::CoFace(cf))
            .or_else(|| closure.coedges.iter().find(|&&ce| g.is_live(ce)).map(|&ce| AnyId::CoEdge(ce)))
            .or_else(|| closure.vertices.iter().find(|&&v| g.is_live(v)).map(|&v| AnyId::Vertex(v)));
        if let Some(id) = left {
            return Err(topology(format!("{} `{}` is still in use", id.kind(), any_name(g, id))));
        }
        debug!(
            "destroyed {} blocks, {} cofaces, {} coedges and {} vertices (propagate: {})",
            closure.blocks.len(),
            closure.cofaces.len(),
            closure.coedges.len(),
            closure.vertices.len(),
            self.propagate
        );
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: self.targets.iter().map(|&id| any_name(graph, id)).collect(),
            parameters: json!({ "propagate": self.propagate }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlock, NewBlockGrid};
    use crate::command::Session;
    use crate::config::TopoConfig;
    use crate::debug_invariants::DebugInvariants;
    use crate::geometry::point::Point;
    use crate::topology::id::EntityKind;

    fn pair() -> Session {
        let mut s = Session::new(TopoConfig::default()).unwrap();
        s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2]).unwrap()).unwrap();
        s
    }

    #[test]
    fn block_alone_leaves_its_cofaces() {
        let mut s = Session::new(TopoConfig::default()).unwrap();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        let b = s.graph().live_blocks()[0];
        let report = s.execute(DestroyEntities::new(s.graph(), &[b.into()], false).unwrap()).unwrap();
        assert_eq!(report.nb_destroyed(EntityKind::Block), 1);
        assert_eq!(report.nb_destroyed(EntityKind::Face), 6);
        let g = s.graph();
        assert_eq!(g.live_cofaces().len(), 6);
        assert_eq!(g.live_vertices().len(), 8);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn propagation_keeps_what_the_neighbor_uses() {
        let mut s = pair();
        let blocks = s.graph().live_blocks();
        s.execute(DestroyEntities::new(s.graph(), &[blocks[0].into()], true).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.live_blocks(), vec![blocks[1]]);
        assert_eq!(g.live_cofaces().len(), 6);
        assert_eq!(g.live_coedges().len(), 12);
        assert_eq!(g.live_vertices().len(), 8);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn vertex_takes_everything_above_it() {
        let mut s = pair();
        let g = s.graph();
        let corner = g.live_vertices().into_iter().find(|&v| g.vertex(v).coord == Point::ORIGIN).unwrap();
        let report = s.execute(DestroyEntities::new(s.graph(), &[corner.into()], false).unwrap()).unwrap();
        assert_eq!(report.nb_destroyed(EntityKind::Block), 1);
        assert_eq!(report.nb_destroyed(EntityKind::CoEdge), 3);
        assert_eq!(report.nb_destroyed(EntityKind::CoFace), 3);
        assert_eq!(report.nb_destroyed(EntityKind::Vertex), 1);
        let g = s.graph();
        assert!(!g.is_live(corner));
        assert_eq!(g.live_blocks().len(), 1);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn edges_and_dead_entities_are_rejected() {
        let mut s = pair();
        let e = s.graph().live::<crate::topology::id::EdgeId>()[0];
        assert!(DestroyEntities::new(s.graph(), &[e.into()], true).unwrap_err().is_precondition());
        assert!(DestroyEntities::new(s.graph(), &[], true).unwrap_err().is_precondition());
        let b = s.graph().live_blocks()[0];
        let cmd = DestroyEntities::new(s.graph(), &[b.into()], true).unwrap();
        s.execute(DestroyEntities::new(s.graph(), &[b.into()], true).unwrap()).unwrap();
        let e = s.execute(cmd).unwrap_err();
        assert!(matches!(e, TopoError::IsDestroyed { kind: EntityKind::Block, .. }));
    }
}
