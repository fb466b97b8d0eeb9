//! O-grid split of a coface selection: a ring of quadrangles along the
//! outline and the selected cofaces rebuilt on the inner copies.

use crate::algs::edit::release_coface;
use crate::algs::nb_edges::rebalance;
use crate::algs::ogrid::{OgridFilter, OgridTag, ShellBuilder, ogrid_point};
use crate::algs::{require_live, require_ratio, require_structured_coface, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::kernel::GeomRef;
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, invalid_argument, topology};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId, VertexId};
use log::debug;
use serde_json::json;

fn coface_center(graph: &TopoGraph, cf: CoFaceId) -> Option<(Point, Option<GeomRef>)> {
    let props = graph.coface(cf);
    Point::barycenter(props.vertices.iter().map(|&v| graph.vertex(v).coord)).map(|c| (c, props.geom))
}

fn placement(graph: &TopoGraph, filter: &OgridFilter, v: VertexId) -> Result<(Point, Option<GeomRef>), TopoError> {
    let inside: Vec<CoEdgeId> = graph
        .vertex_coedges(v)
        .into_iter()
        .filter(|&ce| filter.coedge(ce) == Some(OgridTag::Inside))
        .collect();
    let selected = filter.selected_cofaces();
    let holder = selected
        .iter()
        .copied()
        .find(|&cf| graph.coface_all_vertices(cf).contains(&v))
        .ok_or_else(|| topology(format!("vertex {} is in no selected coface", graph.name(v))))?;
    let in_holder = || {
        coface_center(graph, holder).ok_or_else(|| topology(format!("coface {} has no vertex", graph.name(holder))))
    };
    match inside.as_slice() {
        [] => in_holder(),
        [ce] => {
            let props = graph.coedge(*ce);
            let [a, b] = props.vertices;
            Ok((graph.vertex(a).coord.lerp(graph.vertex(b).coord, 0.5), props.geom))
        }
        [a, b, ..] => {
            let common = graph
                .coedge_cofaces(*a)
                .into_iter()
                .find(|cf| selected.contains(cf) && graph.coedge_cofaces(*b).contains(cf));
            match common.and_then(|cf| coface_center(graph, cf)) {
                Some(found) => Ok(found),
                None => in_holder(),
            }
        }
    }
}

/// Splits structured cofaces that no block uses with an O-grid.
#[derive(Clone, Debug)]
pub struct SplitFacesWithOgrid {
    cofaces: Vec<CoFaceId>,
    coedges: Vec<CoEdgeId>,
    ratio: f64,
    nb_bras: u32,
}

impl SplitFacesWithOgrid {
    /// `coedges` are the open outline coedges; `ratio` must be in `(0, 1)`.
    pub fn new(
        graph: &TopoGraph,
        cofaces: &[CoFaceId],
        coedges: &[CoEdgeId],
        ratio: f64,
        nb_bras: u32,
    ) -> Result<Self, TopoError> {
        require_ratio(ratio, true)?;
        if nb_bras == 0 {
            return Err(TopoError::InvalidCount { what: "segments across the o-grid", value: 0 });
        }
        let cofaces = selection(cofaces, "cofaces to split with an o-grid")?;
        for &cf in &cofaces {
            require_structured_coface(graph, cf)?;
            if !graph.coface_blocks(cf).is_empty() {
                return Err(invalid_argument(format!("coface {} belongs to a block", graph.name(cf))));
            }
        }
        for &ce in coedges {
            require_live(graph, ce)?;
        }
        let mut open = coedges.to_vec();
        open.sort_unstable();
        open.dedup();
        Ok(SplitFacesWithOgrid { cofaces, coedges: open, ratio, nb_bras })
    }
}

impl TopoCommand for SplitFacesWithOgrid {
    fn name(&self) -> &'static str {
        "SplitFacesWithOgrid"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = SplitFacesWithOgrid::new(graph, &self.cofaces, &self.coedges, self.ratio, self.nb_bras)?;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let filter = OgridFilter::for_cofaces(tx.graph(), &self.cofaces, &self.coedges)?;
        if let Some(cf) = filter.selected_cofaces().into_iter().find(|&cf| !tx.graph().coface_blocks(cf).is_empty()) {
            return Err(invalid_argument(format!(
                "coface {} reached by the selection belongs to a block",
                tx.graph().name(cf)
            )));
        }

        let mut placements = Vec::new();
        for v in filter.vertices_tagged(OgridTag::Boundary) {
            let (c, geom) = placement(tx.graph(), &filter, v)?;
            placements.push((v, ogrid_point(c, tx.graph().vertex(v).coord, self.ratio), geom));
        }
        let mut shell = ShellBuilder::planar(self.nb_bras);
        for (v, p, geom) in placements {
            shell.place(tx, v, p, geom);
        }

        let rebuilt: Vec<CoFaceId> = filter
            .selected_cofaces()
            .into_iter()
            .filter(|&cf| matches!(filter.coface(cf), Some(OgridTag::Boundary | OgridTag::Inside)))
            .collect();
        let mut nb_rings = 0;
        for &cf in &rebuilt {
            for e in tx.graph().coface(cf).edges.clone() {
                if filter.edge(e) != Some(OgridTag::Boundary) {
                    continue;
                }
                let start = tx.graph().edge(e).vertices[0];
                let chain = tx.graph().edge_walk(e, start)?;
                for piece in ShellBuilder::segments(&filter, &chain) {
                    shell.ring(tx, &filter, &piece)?;
                    nb_rings += 1;
                }
            }
        }
        for &cf in &rebuilt {
            shell.mirror(tx, &filter, cf)?;
        }
        for &cf in &rebuilt {
            release_coface(tx, cf);
        }
        let created = shell.created_cofaces().to_vec();
        rebalance(tx, &created)?;
        debug!(
            "o-grid: {} inner vertices, {nb_rings} ring cofaces, {} cofaces rebuilt",
            shell.nb_inner_vertices(),
            rebuilt.len()
        );
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        let mut entities = names(graph, &self.cofaces);
        entities.extend(names(graph, &self.coedges));
        CommandTrace {
            entities,
            parameters: json!({ "ratio": self.ratio, "nb_bras": self.nb_bras }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlock, NewFaceGrid};
    use crate::command::Session;
    use crate::debug_invariants::DebugInvariants;
    use crate::topology::id::EntityKind;

    fn grid(counts: [usize; 2], nb: [u32; 2]) -> Session {
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::ORIGIN, [1.0, 1.0], counts, nb).unwrap()).unwrap();
        s
    }

    fn has_vertex_at(g: &TopoGraph, p: Point) -> bool {
        g.live_vertices().into_iter().any(|v| g.vertex(v).coord.is_near(p, 1e-9))
    }

    #[test]
    fn single_coface_gets_a_ring() {
        let mut s = grid([1, 1], [4, 4]);
        let cf = s.graph().live_cofaces()[0];
        let report = s.execute(SplitFacesWithOgrid::new(s.graph(), &[cf], &[], 0.5, 2).unwrap()).unwrap();
        assert_eq!(report.nb_created(EntityKind::Vertex), 4);
        assert_eq!(report.nb_created(EntityKind::CoEdge), 8);
        let g = s.graph();
        assert_eq!(g.nb_cofaces(), 5);
        assert!(!g.is_live(cf));
        assert!(has_vertex_at(g, Point::new(0.25, 0.25, 0.0)));
        assert!(has_vertex_at(g, Point::new(0.75, 0.75, 0.0)));
        let radial = g.live_coedges().into_iter().filter(|&ce| g.coedge(ce).nb_edges() == 2).count();
        assert_eq!(radial, 4);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn open_side_keeps_its_line() {
        let mut s = grid([1, 1], [2, 2]);
        let g = s.graph();
        let cf = g.live_cofaces()[0];
        let bottom = g.coface_side(cf, 0).unwrap()[0].coedge;
        s.execute(SplitFacesWithOgrid::new(s.graph(), &[cf], &[bottom], 0.5, 1).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_cofaces(), 4);
        assert!(!g.is_live(bottom));
        assert!(has_vertex_at(g, Point::new(0.25, 0.0, 0.0)));
        assert!(has_vertex_at(g, Point::new(0.75, 0.0, 0.0)));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn shared_coedge_end_slides_along_it() {
        let mut s = grid([2, 1], [2, 2]);
        let cofaces = s.graph().live_cofaces();
        let report = s.execute(SplitFacesWithOgrid::new(s.graph(), &cofaces, &[], 0.5, 1).unwrap()).unwrap();
        assert_eq!(report.nb_created(EntityKind::Vertex), 6);
        let g = s.graph();
        assert!(has_vertex_at(g, Point::new(1.0, 0.25, 0.0)));
        // six outline rings and the two rebuilt cofaces
        assert_eq!(g.nb_cofaces(), 8);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn cofaces_of_blocks_are_rejected() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        let cf = s.graph().live_cofaces()[0];
        let e = SplitFacesWithOgrid::new(s.graph(), &[cf], &[], 0.5, 1).unwrap_err();
        assert!(e.is_precondition());
    }

    #[test]
    fn undo_restores_the_cofaces() {
        let mut s = grid([2, 2], [1, 1]);
        let before = s.graph().snapshot();
        let cofaces = s.graph().live_cofaces();
        s.execute(SplitFacesWithOgrid::new(s.graph(), &cofaces[..1], &[], 0.4, 2).unwrap()).unwrap();
        s.undo().unwrap();
        assert_eq!(s.graph().snapshot(), before);
        s.redo().unwrap();
        assert_eq!(s.graph().nb_cofaces(), 3 + 5);
    }
}
