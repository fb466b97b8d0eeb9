//! Splitting a single coedge.

use crate::algs::edit::split_coedge;
use crate::algs::{require_live, require_ratio};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::point::Point;
use crate::topo_error::TopoError;
use crate::topology::graph::TopoGraph;
use crate::topology::id::CoEdgeId;
use serde_json::json;

/// Node index of `ratio` on a discretization of `nb_edges` segments, kept
/// strictly inside: `0` maps to `1` and `nb_edges` to `nb_edges - 1`.
pub fn split_index(ratio: f64, nb_edges: u32) -> u32 {
    if nb_edges < 2 {
        return nb_edges.min(1);
    }
    let t = (ratio * nb_edges as f64).round();
    num_traits::clamp(t, 1.0, (nb_edges - 1) as f64) as u32
}

/// Cuts a coedge in two at a discretization node.
#[derive(Clone, Debug)]
pub struct SplitEdge {
    coedge: CoEdgeId,
    ratio: f64,
    point: Option<Point>,
}

impl SplitEdge {
    /// Split at `ratio` in the open interval `(0, 1)`, from `vertices[0]`.
    pub fn new(graph: &TopoGraph, coedge: CoEdgeId, ratio: f64) -> Result<Self, TopoError> {
        require_live(graph, coedge)?;
        require_ratio(ratio, true)?;
        Self::check_splittable(graph, coedge)?;
        Ok(SplitEdge { coedge, ratio, point: None })
    }

    /// Split at the node nearest to `point`.
    pub fn at_point(graph: &TopoGraph, coedge: CoEdgeId, point: Point) -> Result<Self, TopoError> {
        require_live(graph, coedge)?;
        Self::check_splittable(graph, coedge)?;
        let ratio = graph.nearest_node_ratio(coedge, point);
        Ok(SplitEdge { coedge, ratio, point: Some(point) })
    }

    fn check_splittable(graph: &TopoGraph, coedge: CoEdgeId) -> Result<(), TopoError> {
        let n = graph.coedge(coedge).nb_edges();
        if n < 2 {
            return Err(TopoError::InvalidCount { what: "segments of a coedge to split", value: n });
        }
        Ok(())
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl TopoCommand for SplitEdge {
    fn name(&self) -> &'static str {
        "SplitEdge"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        let point = self.point;
        *self = match point {
            Some(p) => SplitEdge::at_point(graph, self.coedge, p)?,
            None => SplitEdge::new(graph, self.coedge, self.ratio)?,
        };
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let n = tx.graph().coedge(self.coedge).nb_edges();
        split_coedge(tx, self.coedge, split_index(self.ratio, n))?;
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: names(graph, &[self.coedge]),
            parameters: json!({ "ratio": self.ratio, "point": self.point }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::NewBlock;
    use crate::command::Session;
    use crate::debug_invariants::DebugInvariants;
    use proptest::prelude::*;

    fn session() -> Session {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [4, 4, 4]).unwrap()).unwrap();
        s
    }

    #[test]
    fn split_edge_replaces_it_everywhere() {
        let mut s = session();
        let ce = s.graph().live_coedges()[0];
        let edges = s.graph().coedge_edges(ce);
        assert_eq!(edges.len(), 2);
        let cmd = SplitEdge::new(s.graph(), ce, 0.25).unwrap();
        let report = s.execute(cmd).unwrap();
        let g = s.graph();
        assert!(!g.is_live(ce));
        assert_eq!(report.created_coedges().len(), 2);
        for e in edges {
            assert_eq!(g.edge(e).coedges.len(), 2);
            assert_eq!(g.edge_length(e), 4);
        }
        let v = report.created_vertices()[0];
        let a = g.coedge(report.created_coedges()[0]).vertices;
        assert!(a.contains(&v));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn open_interval_is_enforced() {
        let s = session();
        let ce = s.graph().live_coedges()[0];
        for ratio in [0.0, 1.0, -0.2, 1.5] {
            let e = SplitEdge::new(s.graph(), ce, ratio).unwrap_err();
            assert!(matches!(e, TopoError::RatioOutOfRange { .. }), "{e}");
        }
    }

    #[test]
    fn single_segment_cannot_be_split() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        let ce = s.graph().live_coedges()[0];
        let e = SplitEdge::new(s.graph(), ce, 0.5).unwrap_err();
        assert!(e.is_precondition());
    }

    #[test]
    fn point_form_picks_nearest_node() {
        let mut s = session();
        let ce = s.graph().live_coedges()[0];
        let [a, b] = s.graph().coedge(ce).vertices;
        let pa = s.graph().vertex(a).coord;
        let pb = s.graph().vertex(b).coord;
        let cmd = SplitEdge::at_point(s.graph(), ce, pa.lerp(pb, 0.7)).unwrap();
        assert_eq!(cmd.ratio(), 0.75);
        let report = s.execute(cmd).unwrap();
        let v = report.created_vertices()[0];
        assert!(s.graph().vertex(v).coord.is_near(pa.lerp(pb, 0.75), 1e-12));
    }

    #[test]
    fn extreme_ratios_clamp_inside() {
        assert_eq!(split_index(0.01, 10), 1);
        assert_eq!(split_index(0.99, 10), 9);
        assert_eq!(split_index(0.5, 10), 5);
        assert_eq!(split_index(0.0, 4), 1);
        assert_eq!(split_index(1.0, 4), 3);
    }

    proptest! {
        #[test]
        fn split_index_is_interior(ratio in 0.0f64..=1.0, n in 2u32..200) {
            let t = split_index(ratio, n);
            prop_assert!(t >= 1 && t <= n - 1);
        }
    }
}
