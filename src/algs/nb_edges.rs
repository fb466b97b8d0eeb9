//! Changing the number of segments of a coedge while keeping every
//! structured coface balanced.

use crate::algs::require_live;
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::topo_error::{TopoError, invalid_argument, topology};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId};
use log::{debug, trace, warn};
use serde_json::json;
use std::collections::{BTreeSet, VecDeque};

/// Adds `delta` segments to each seed and to the coedges facing it across
/// structured quadrangles, transitively. Frozen coedges never change; a
/// coface whose balance would need one is a topology error. `scope`, when
/// given, restricts the cofaces crossed.
pub(crate) fn balance(
    tx: &mut EditTx<'_>,
    seeds: &[(CoEdgeId, i64)],
    frozen: &BTreeSet<CoEdgeId>,
    scope: Option<&BTreeSet<CoFaceId>>,
) -> Result<usize, TopoError> {
    let cap = 2 * tx.graph().nb_coedges() + seeds.len();
    let mut queue: VecDeque<(CoEdgeId, i64)> = seeds.iter().copied().collect();
    let mut done = BTreeSet::new();
    while let Some((ce, delta)) = queue.pop_front() {
        if delta == 0 || !done.insert(ce) {
            continue;
        }
        if done.len() > cap {
            return Err(topology("segment count propagation does not terminate"));
        }
        let nb = i64::from(tx.graph().coedge(ce).nb_edges()) + delta;
        let nb = u32::try_from(nb)
            .ok()
            .filter(|&n| n >= 1)
            .ok_or(TopoError::InvalidCount { what: "segments of a coedge", value: nb.max(0) as u32 })?;
        tx.update(ce, |p| p.discretization = p.discretization.with_nb_edges(nb));
        trace!("coedge `{}` now has {nb} segments", tx.graph().name(ce));

        for cf in tx.graph().coedge_cofaces(ce) {
            if scope.is_some_and(|s| !s.contains(&cf)) {
                continue;
            }
            let props = tx.graph().coface(cf);
            if !props.structured || props.nb_sides() != 4 {
                continue;
            }
            let Some(opposite) = tx.graph().opposite_coedge(cf, ce) else { continue };
            if done.contains(&opposite) {
                continue;
            }
            if frozen.contains(&opposite) {
                return Err(topology(format!(
                    "coface {} cannot stay balanced: coedge {} is frozen",
                    tx.graph().name(cf),
                    tx.graph().name(opposite)
                )));
            }
            queue.push_back((opposite, delta));
        }
    }
    Ok(done.len())
}

/// Restores equal segment counts on opposite sides of the given structured
/// quadrangles by lengthening the shorter side, and whatever faces it
/// elsewhere. Returns the number of coedges changed.
pub(crate) fn rebalance(tx: &mut EditTx<'_>, cofaces: &[CoFaceId]) -> Result<usize, TopoError> {
    let mut changed = 0;
    for &cf in cofaces {
        if !tx.graph().is_live(cf) {
            continue;
        }
        let props = tx.graph().coface(cf);
        if !props.structured || props.nb_sides() != 4 {
            continue;
        }
        for k in 0..2 {
            let (a, b) = (tx.graph().coface_side_length(cf, k), tx.graph().coface_side_length(cf, k + 2));
            if a == b {
                continue;
            }
            warn!("coface `{}` has {a} and {b} segments on opposite sides, rebalancing", tx.graph().name(cf));
            let short = if a < b { k } else { k + 2 };
            let Some(first) = tx.graph().coface_side(cf, short)?.first().copied() else { continue };
            let scope: BTreeSet<CoFaceId> = tx.graph().live_cofaces().into_iter().filter(|&c| c != cf).collect();
            let delta = i64::from(a.abs_diff(b));
            changed += balance(tx, &[(first.coedge, delta)], &BTreeSet::new(), Some(&scope))?;
        }
    }
    Ok(changed)
}

/// Sets the segment count of a coedge and propagates the difference.
#[derive(Clone, Debug)]
pub struct SetNbMeshingEdges {
    coedge: CoEdgeId,
    nb_edges: u32,
    frozen: Vec<CoEdgeId>,
    scope: Option<Vec<CoFaceId>>,
}

impl SetNbMeshingEdges {
    pub fn new(graph: &TopoGraph, coedge: CoEdgeId, nb_edges: u32, frozen: &[CoEdgeId]) -> Result<Self, TopoError> {
        require_live(graph, coedge)?;
        if nb_edges == 0 {
            return Err(TopoError::InvalidCount { what: "segments of a coedge", value: 0 });
        }
        for &ce in frozen {
            require_live(graph, ce)?;
        }
        if frozen.contains(&coedge) {
            return Err(invalid_argument(format!("coedge {} is itself frozen", graph.name(coedge))));
        }
        Ok(SetNbMeshingEdges { coedge, nb_edges, frozen: frozen.to_vec(), scope: None })
    }

    /// Only crosses `cofaces` while propagating.
    pub fn within(mut self, graph: &TopoGraph, cofaces: &[CoFaceId]) -> Result<Self, TopoError> {
        for &cf in cofaces {
            require_live(graph, cf)?;
        }
        self.scope = Some(cofaces.to_vec());
        Ok(self)
    }
}

impl TopoCommand for SetNbMeshingEdges {
    fn name(&self) -> &'static str {
        "SetNbMeshingEdges"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        let mut cmd = SetNbMeshingEdges::new(graph, self.coedge, self.nb_edges, &self.frozen)?;
        if let Some(scope) = &self.scope {
            cmd = cmd.within(graph, scope)?;
        }
        *self = cmd;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let delta = i64::from(self.nb_edges) - i64::from(tx.graph().coedge(self.coedge).nb_edges());
        let frozen: BTreeSet<CoEdgeId> = self.frozen.iter().copied().collect();
        let scope: Option<BTreeSet<CoFaceId>> = self.scope.as_ref().map(|s| s.iter().copied().collect());
        let changed = balance(tx, &[(self.coedge, delta)], &frozen, scope.as_ref())?;
        debug!("{changed} coedges changed by {delta} segments");
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        let mut entities = names(graph, &[self.coedge]);
        entities.extend(names(graph, &self.frozen));
        CommandTrace {
            entities,
            parameters: json!({
                "nb_edges": self.nb_edges,
                "nb_frozen": self.frozen.len(),
                "scope": self.scope.as_ref().map(|s| names(graph, s)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlockGrid, NewFaceGrid, build_face_grid};
    use crate::command::Session;
    use crate::config::TopoConfig;
    use crate::geometry::kernel::NullModel;
    use crate::debug_invariants::DebugInvariants;
    use crate::geometry::point::Point;
    use crate::topo_error::ErrorCategory;

    fn grid() -> Session {
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::ORIGIN, [1.0, 1.0], [2, 2], [3, 3]).unwrap()).unwrap();
        s
    }

    /// Bottom coedge of the first coface, along x.
    fn bottom(s: &Session) -> CoEdgeId {
        let cf = s.graph().live_cofaces()[0];
        s.graph().coface_side(cf, 0).unwrap()[0].coedge
    }

    #[test]
    fn count_propagates_across_the_column() {
        let mut s = grid();
        let ce = bottom(&s);
        let report = s.execute(SetNbMeshingEdges::new(s.graph(), ce, 5, &[]).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.coedge(ce).nb_edges(), 5);
        // bottom, middle and top coedges of the first column
        assert_eq!(report.modified.len(), 3);
        let fives = g.live_coedges().into_iter().filter(|&c| g.coedge(c).nb_edges() == 5).count();
        assert_eq!(fives, 3);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn frozen_coedge_blocks_the_change() {
        let mut s = grid();
        let ce = bottom(&s);
        let cf = s.graph().live_cofaces()[0];
        let opposite = s.graph().opposite_coedge(cf, ce).unwrap();
        let before = s.graph().snapshot();
        let e = s.execute(SetNbMeshingEdges::new(s.graph(), ce, 4, &[opposite]).unwrap()).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Topology);
        assert_eq!(s.graph().snapshot(), before);
    }

    #[test]
    fn zero_segments_are_rejected() {
        let s = grid();
        let e = SetNbMeshingEdges::new(s.graph(), bottom(&s), 0, &[]).unwrap_err();
        assert_eq!(e, TopoError::InvalidCount { what: "segments of a coedge", value: 0 });
    }

    #[test]
    fn blocks_stay_structured() {
        let mut s = Session::default();
        s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2]).unwrap())
            .unwrap();
        let b = s.graph().live_blocks()[0];
        let (_, _, line) = s
            .graph()
            .block_coedges(b)
            .into_iter()
            .find_map(|ce| s.graph().block_line_of(b, ce).filter(|(dir, _, _)| *dir == 1))
            .unwrap();
        let ce = line[0].coedge;
        s.execute(SetNbMeshingEdges::new(s.graph(), ce, 6, &[]).unwrap()).unwrap();
        for b in s.graph().live_blocks() {
            assert_eq!(s.graph().block_nb_edges(b, 1).unwrap(), 6);
        }
        s.graph().validate_invariants().unwrap();
    }

    #[test]
    fn rebalance_lengthens_the_short_side() {
        let config = TopoConfig::default();
        let mut graph = TopoGraph::new(&config.names);
        let mut tx = EditTx::new(&mut graph, &NullModel, &config);
        let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [3, 3]).unwrap();
        let cf = grid.coface(0, 0);
        let bottom = tx.graph().coface_side(cf, 0).unwrap()[0].coedge;
        tx.update(bottom, |p| p.discretization = p.discretization.with_nb_edges(5));
        assert_eq!(rebalance(&mut tx, &[cf]).unwrap(), 1);
        assert_eq!(tx.graph().coface_side_length(cf, 2), 5);
        assert_eq!(tx.graph().coface_side_length(cf, 1), 3);
        // balanced cofaces are left alone
        assert_eq!(rebalance(&mut tx, &[cf]).unwrap(), 0);
    }
}
