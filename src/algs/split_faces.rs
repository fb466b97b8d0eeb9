//! Structured split of cofaces, the two-dimensional counterpart of
//! [`split_blocks`](crate::algs::split_blocks).

use crate::algs::edge_split::split_index;
use crate::algs::edit::cut_coface;
use crate::algs::{require_live, require_ratio, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::point::Point;
use crate::topo_error::TopoError;
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId, EntityKind};
use log::{debug, trace, warn};
use serde_json::json;
use std::collections::BTreeSet;

/// Side and offset at which `cf` continues a cut through `marked`: a marked
/// coedge, foreign to `cf`, ends strictly inside one of its sides.
pub(crate) fn continued_coface_cut(
    graph: &TopoGraph,
    cf: CoFaceId,
    marked: &BTreeSet<CoEdgeId>,
) -> Option<(usize, u32)> {
    if !graph.is_live(cf) || graph.coface(cf).nb_sides() != 4 {
        return None;
    }
    let own: BTreeSet<CoEdgeId> = graph.coface_coedges(cf).into_iter().collect();
    for k in 0..4 {
        let Ok(side) = graph.coface_side(cf, k) else { continue };
        let mut offset = 0;
        for step in side.iter().take(side.len().saturating_sub(1)) {
            offset += graph.coedge(step.coedge).nb_edges();
            let reached = marked
                .iter()
                .any(|ce| !own.contains(ce) && graph.coedge(*ce).vertices.contains(&step.to));
            if reached {
                return Some((k, offset));
            }
        }
    }
    None
}

/// Cuts the selected structured cofaces along one logical direction.
#[derive(Clone, Debug)]
pub struct SplitFaces {
    cofaces: Vec<CoFaceId>,
    coedge: CoEdgeId,
    ratio: f64,
    point: Option<Point>,
    first: CoFaceId,
    side: usize,
    offset: u32,
    allow_partial: bool,
}

impl SplitFaces {
    /// Cuts `cofaces` starting with the first one bounded by `coedge`, at
    /// `ratio` in `[0, 1]` of `coedge`. Non-structured cofaces are skipped.
    pub fn new(graph: &TopoGraph, cofaces: &[CoFaceId], coedge: CoEdgeId, ratio: f64) -> Result<Self, TopoError> {
        require_ratio(ratio, false)?;
        Self::build(graph, cofaces, coedge, ratio, None)
    }

    pub fn at_point(graph: &TopoGraph, cofaces: &[CoFaceId], coedge: CoEdgeId, point: Point) -> Result<Self, TopoError> {
        require_live(graph, coedge)?;
        let ratio = graph.nearest_node_ratio(coedge, point);
        Self::build(graph, cofaces, coedge, ratio, Some(point))
    }

    /// Every live coface; the split is partial.
    pub fn all_cofaces(graph: &TopoGraph, coedge: CoEdgeId, ratio: f64) -> Result<Self, TopoError> {
        Ok(Self::new(graph, &graph.live_cofaces(), coedge, ratio)?.allow_partial(true))
    }

    fn build(
        graph: &TopoGraph,
        cofaces: &[CoFaceId],
        coedge: CoEdgeId,
        ratio: f64,
        point: Option<Point>,
    ) -> Result<Self, TopoError> {
        let mut kept = Vec::new();
        for cf in selection(cofaces, "cofaces to split")? {
            require_live(graph, cf)?;
            let props = graph.coface(cf);
            if props.structured && props.nb_sides() == 4 {
                kept.push(cf);
            } else {
                warn!("coface `{}` is not structured and is not split", graph.name(cf));
            }
        }
        if kept.is_empty() {
            return Err(TopoError::EmptySelection("structured cofaces to split"));
        }
        require_live(graph, coedge)?;
        let (first, side) = kept
            .iter()
            .find_map(|&cf| {
                let props = graph.coface(cf);
                (0..4)
                    .find(|&k| graph.edge(props.edges[k]).coedges.contains(&coedge))
                    .map(|k| (cf, k))
            })
            .ok_or_else(|| {
                TopoError::InvalidArgument(format!(
                    "coedge {} bounds none of the selected cofaces",
                    graph.name(coedge)
                ))
            })?;

        let walk = graph.coface_side(first, side)?;
        let nb = graph.coedge(coedge).nb_edges();
        let t = if ratio <= 0.0 {
            0
        } else if ratio >= 1.0 {
            nb
        } else {
            split_index(ratio, nb)
        };
        let mut start = 0;
        let mut forward = true;
        for step in &walk {
            if step.coedge == coedge {
                forward = step.from == graph.coedge(coedge).vertices[0];
                break;
            }
            start += graph.coedge(step.coedge).nb_edges();
        }
        let offset = if forward { start + t } else { start + nb - t };
        if offset == 0 || offset >= graph.chain_length(&walk) {
            return Err(TopoError::CutOnBorder { kind: EntityKind::CoFace, name: graph.name(first).to_owned() });
        }
        Ok(SplitFaces { cofaces: kept, coedge, ratio, point, first, side, offset, allow_partial: false })
    }

    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    pub fn cofaces(&self) -> &[CoFaceId] {
        &self.cofaces
    }
}

impl TopoCommand for SplitFaces {
    fn name(&self) -> &'static str {
        "SplitFaces"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = SplitFaces::build(graph, &self.cofaces, self.coedge, self.ratio, self.point)?
            .allow_partial(self.allow_partial);
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let mut remaining: BTreeSet<CoFaceId> = self.cofaces.iter().copied().collect();
        remaining.remove(&self.first);
        let cut = cut_coface(tx, self.first, self.side, self.offset)?;
        let mut marked = BTreeSet::from([cut.coedge]);
        let mut count = 1;
        loop {
            let next = remaining
                .iter()
                .find_map(|&cf| continued_coface_cut(tx.graph(), cf, &marked).map(|(k, o)| (cf, k, o)));
            let Some((cf, k, o)) = next else { break };
            remaining.remove(&cf);
            trace!("propagate cut to `{}`", tx.graph().name(cf));
            let cut = cut_coface(tx, cf, k, o)?;
            marked.insert(cut.coedge);
            count += 1;
        }
        if !remaining.is_empty() {
            if !self.allow_partial {
                return Err(TopoError::PropagationExhausted { split: count, expected: self.cofaces.len() });
            }
            warn!("split reached {count} of {} cofaces", self.cofaces.len());
        }
        debug!("split {count} cofaces");
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        let mut entities = names(graph, &self.cofaces);
        entities.extend(names(graph, &[self.coedge]));
        CommandTrace {
            entities,
            parameters: json!({
                "ratio": self.ratio,
                "point": self.point,
                "allow_partial": self.allow_partial,
            }),
        }
    }
}
