//! Structured split of blocks along one logical direction, propagated to
//! the blocks the cut plane runs into.
//!
//! A block is cut at a segment offset along one of its directions: a vertex
//! is placed on each of the four edge lines of that direction, the four side
//! faces are cut by walking their cofaces from one line to the other, and the
//! resulting loop bounds a new interface coface shared by the two new blocks.
//!
//! Propagation keeps the coedges of every cut made so far. A block of the
//! selection is split next when one of those coedges leaves one of its edge
//! lines from an interior vertex: that vertex gives the direction and offset
//! of the continued cut.

use crate::algs::edit::{cut_coface, ensure_vertex_on_chain, new_block, new_quad, release_block};
use crate::algs::edge_split::split_index;
use crate::algs::{require_live, require_ratio, require_structured_block, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, topology};
use crate::topology::entity::FaceLaw;
use crate::topology::graph::TopoGraph;
use crate::topology::hexa;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EntityKind, FaceId, VertexId};
use crate::topology::traverse::{Chain, ChainStep, chain_vertices, reversed};
use log::{debug, trace, warn};
use serde_json::json;
use std::collections::BTreeSet;

/// Walks face `f` from the end of `start` (a vertex on one edge line, reached
/// from the low side) to `target` on the opposite line, cutting every coface
/// the path crosses. Returns the path.
pub(crate) fn cut_face(
    tx: &mut EditTx<'_>,
    f: FaceId,
    start: ChainStep,
    target: VertexId,
) -> Result<Chain, TopoError> {
    let mut path = Chain::new();
    let mut visited: BTreeSet<CoFaceId> = BTreeSet::new();
    let mut x = start.to;
    let mut lo_ce = start.coedge;
    let limit = tx.graph().face(f).cofaces.len() + 1;

    for _ in 0..limit {
        let g = tx.graph();
        let cofaces = &g.face(f).cofaces;
        let next = g
            .coedge_cofaces(lo_ce)
            .into_iter()
            .find(|cf| cofaces.contains(cf) && !visited.contains(cf));
        let Some(d) = next else {
            if x == target {
                return Ok(path);
            }
            return Err(topology(format!(
                "cut of face {} reaches {} instead of {}",
                g.name(f),
                g.name(x),
                g.name(target)
            )));
        };
        let props = g.coface(d);
        if props.nb_sides() != 4 {
            return Err(topology(format!("cut crosses triangular coface {}", g.name(d))));
        }
        let j = (0..4)
            .find(|&k| g.edge(props.edges[k]).coedges.contains(&lo_ce))
            .ok_or_else(|| topology(format!("coface {} lost a side coedge", g.name(d))))?;
        let side = g.coface_side(d, j)?;
        let verts = chain_vertices(&side);
        let pos = verts
            .iter()
            .position(|&v| v == x)
            .ok_or_else(|| topology(format!("{} is not on a side of coface {}", g.name(x), g.name(d))))?;

        if pos > 0 && pos + 1 < verts.len() {
            // x inside side j: cut d through to side j + 2
            let o = g.chain_length(&side[..pos]);
            let low_side = side[..pos].iter().any(|s| s.coedge == lo_ce);
            let cut = cut_coface(tx, d, j, o)?;
            visited.insert(cut.low);
            visited.insert(cut.high);
            path.push(ChainStep { coedge: cut.coedge, from: x, to: cut.to });
            let g = tx.graph();
            let next_ce = if low_side {
                g.coface_side(cut.low, 2)?.first().map(|s| s.coedge)
            } else {
                g.coface_side(cut.high, 2)?.last().map(|s| s.coedge)
            };
            lo_ce = next_ce.ok_or_else(|| topology("empty side after a coface cut"))?;
            x = cut.to;
        } else {
            // x is a corner of d: the path follows its transverse side
            visited.insert(d);
            let (transverse, next_ce) = if pos + 1 == verts.len() {
                let t = g.coface_side(d, j + 1)?;
                (t, g.coface_side(d, j + 2)?.first().map(|s| s.coedge))
            } else {
                let t = reversed(&g.coface_side(d, j + 3)?);
                (t, g.coface_side(d, j + 2)?.last().map(|s| s.coedge))
            };
            let end = transverse
                .last()
                .map(|s| s.to)
                .ok_or_else(|| topology(format!("coface {} has an empty side", g.name(d))))?;
            lo_ce = next_ce.ok_or_else(|| topology(format!("coface {} has an empty side", g.name(d))))?;
            path.extend(transverse);
            x = end;
        }
    }
    Err(topology(format!("cut of face {} does not terminate", tx.graph().name(f))))
}

/// Cofaces of `f` reachable from `seed` without crossing `barrier`.
fn face_part(graph: &TopoGraph, f: FaceId, seed: CoFaceId, barrier: &BTreeSet<CoEdgeId>) -> Vec<CoFaceId> {
    let cofaces: BTreeSet<CoFaceId> = graph.face(f).cofaces.iter().copied().collect();
    let mut part = BTreeSet::from([seed]);
    let mut stack = vec![seed];
    while let Some(cf) = stack.pop() {
        for ce in graph.coface_coedges(cf) {
            if barrier.contains(&ce) {
                continue;
            }
            for other in graph.coedge_cofaces(ce) {
                if cofaces.contains(&other) && part.insert(other) {
                    stack.push(other);
                }
            }
        }
    }
    part.into_iter().collect()
}

/// Outcome of one block split.
#[derive(Clone, Debug)]
pub(crate) struct BlockSplit {
    /// Part holding the side 0 face of the cut direction.
    pub low: BlockId,
    pub high: BlockId,
    pub interface: CoFaceId,
    /// Coedges bounding the interface.
    pub cut_coedges: BTreeSet<CoEdgeId>,
}

/// Splits block `b` in direction `dir` at segment offset `offset`.
pub(crate) fn split_block(
    tx: &mut EditTx<'_>,
    b: BlockId,
    dir: usize,
    offset: u32,
) -> Result<BlockSplit, TopoError> {
    let props = tx.graph().block(b).clone();
    let n = tx.graph().block_nb_edges(b, dir)?;
    if offset == 0 || offset >= n {
        return Err(TopoError::CutOnBorder { kind: EntityKind::Block, name: tx.graph().name(b).to_owned() });
    }
    debug!("split block `{}` in direction {dir} at {offset}/{n}", tx.graph().name(b));

    let lines = hexa::EDGE_LINES[dir];
    let mut cut = Vec::with_capacity(4);
    for &(lo, hi) in &lines {
        let chain = tx.graph().block_line_chain(b, lo, hi)?;
        cut.push(ensure_vertex_on_chain(tx, &chain, offset)?);
    }

    let side_slots: Vec<usize> = (0..6).filter(|&s| hexa::face_dir_side(s).0 != dir).collect();
    let lines_on = |slot: usize| -> Vec<usize> {
        (0..4)
            .filter(|&l| hexa::is_on_face(lines[l].0, slot) && hexa::is_on_face(lines[l].1, slot))
            .collect()
    };

    let mut paths: Vec<(usize, usize, Chain)> = Vec::with_capacity(4);
    let mut barrier = BTreeSet::new();
    for &slot in &side_slots {
        let on = lines_on(slot);
        let (la, lb) = (on[0], on[1]);
        let chain = tx.graph().block_line_chain(b, lines[la].0, lines[la].1)?;
        let start = chain
            .iter()
            .copied()
            .find(|s| s.to == cut[la])
            .ok_or_else(|| topology("cut vertex missing on its edge line"))?;
        let path = cut_face(tx, props.faces[slot], start, cut[lb])?;
        trace!("face slot {slot}: cut path of {} coedges", path.len());
        barrier.extend(path.iter().map(|s| s.coedge));
        paths.push((la, lb, path));
    }

    // interface, oriented like the side 1 face of the low part
    let line_of = |c: usize| lines.iter().position(|&(lo, hi)| lo == c || hi == c).unwrap_or(0);
    let corners = hexa::FACE_CORNERS[hexa::face_index(dir, 1)];
    let quad = corners.map(|c| cut[line_of(c)]);
    let mut sides = Vec::with_capacity(4);
    for k in 0..4 {
        let (la, lb) = (line_of(corners[k]), line_of(corners[(k + 1) % 4]));
        let side = paths
            .iter()
            .find_map(|(a, b, p)| {
                if (*a, *b) == (la, lb) {
                    Some(p.clone())
                } else if (*a, *b) == (lb, la) {
                    Some(reversed(p))
                } else {
                    None
                }
            })
            .ok_or_else(|| topology("no cut path joins two interface corners"))?;
        sides.push(side);
    }
    let interface = new_quad(tx, quad, [&sides[0], &sides[1], &sides[2], &sides[3]], FaceLaw::Transfinite, None)?;

    let mut low_cofaces: [Vec<CoFaceId>; 6] = Default::default();
    let mut high_cofaces: [Vec<CoFaceId>; 6] = Default::default();
    low_cofaces[hexa::face_index(dir, 0)] = tx.graph().face(props.faces[hexa::face_index(dir, 0)]).cofaces.clone();
    low_cofaces[hexa::face_index(dir, 1)] = vec![interface];
    high_cofaces[hexa::face_index(dir, 0)] = vec![interface];
    high_cofaces[hexa::face_index(dir, 1)] = tx.graph().face(props.faces[hexa::face_index(dir, 1)]).cofaces.clone();
    for &slot in &side_slots {
        let g = tx.graph();
        let f = props.faces[slot];
        let la = lines_on(slot)[0];
        let chain = g.block_line_chain(b, lines[la].0, lines[la].1)?;
        let first = chain.first().ok_or_else(|| topology("empty edge line"))?.coedge;
        let seed = g
            .coedge_cofaces(first)
            .into_iter()
            .find(|cf| g.face(f).cofaces.contains(cf))
            .ok_or_else(|| topology(format!("face {} lost its corner coface", g.name(f))))?;
        let low = face_part(g, f, seed, &barrier);
        let high: Vec<CoFaceId> = g.face(f).cofaces.iter().copied().filter(|cf| !low.contains(cf)).collect();
        if high.is_empty() {
            return Err(topology(format!("cut leaves face {} whole", g.name(f))));
        }
        low_cofaces[slot] = low;
        high_cofaces[slot] = high;
    }

    let mut low_vertices: [VertexId; 8] = props
        .vertices
        .as_slice()
        .try_into()
        .map_err(|_| topology("block without eight corners"))?;
    let mut high_vertices = low_vertices;
    for (l, &(lo, hi)) in lines.iter().enumerate() {
        low_vertices[hi] = cut[l];
        high_vertices[lo] = cut[l];
    }
    let low = new_block(tx, low_vertices, low_cofaces, props.law, props.geom);
    let high = new_block(tx, high_vertices, high_cofaces, props.law, props.geom);
    release_block(tx, b);
    Ok(BlockSplit { low, high, interface, cut_coedges: barrier })
}

/// Direction and offset at which `b` continues a cut through `marked`.
pub(crate) fn continued_cut(
    graph: &TopoGraph,
    b: BlockId,
    marked: &BTreeSet<CoEdgeId>,
) -> Option<(usize, u32)> {
    if !graph.is_live(b) {
        return None;
    }
    let near: BTreeSet<CoEdgeId> = graph.block_coedges(b).into_iter().filter(|ce| marked.contains(ce)).collect();
    if near.is_empty() {
        return None;
    }
    for dir in 0..3 {
        for &(lo, hi) in &hexa::EDGE_LINES[dir] {
            let Ok(chain) = graph.block_line_chain(b, lo, hi) else { continue };
            let on_line: BTreeSet<CoEdgeId> = chain.iter().map(|s| s.coedge).collect();
            let mut offset = 0;
            for step in chain.iter().take(chain.len().saturating_sub(1)) {
                offset += graph.coedge(step.coedge).nb_edges();
                let leaves = near.iter().any(|&ce| {
                    !on_line.contains(&ce) && graph.coedge(ce).vertices.contains(&step.to)
                });
                if leaves {
                    return Some((dir, offset));
                }
            }
        }
    }
    None
}

/// Splits the first block, then propagates through `blocks`. Returns the
/// number of blocks split.
pub(crate) fn propagate_split(
    tx: &mut EditTx<'_>,
    first: BlockId,
    dir: usize,
    offset: u32,
    blocks: &[BlockId],
    allow_partial: bool,
) -> Result<usize, TopoError> {
    let mut remaining: BTreeSet<BlockId> = blocks.iter().copied().collect();
    remaining.remove(&first);
    let split = split_block(tx, first, dir, offset)?;
    let mut marked = split.cut_coedges;
    let mut count = 1;

    loop {
        let next = remaining
            .iter()
            .find_map(|&b| continued_cut(tx.graph(), b, &marked).map(|(d, s)| (b, d, s)));
        let Some((b, d, s)) = next else { break };
        remaining.remove(&b);
        trace!("propagate split to `{}`", tx.graph().name(b));
        let split = split_block(tx, b, d, s)?;
        marked.extend(split.cut_coedges);
        count += 1;
    }

    if !remaining.is_empty() {
        if !allow_partial {
            return Err(TopoError::PropagationExhausted { split: count, expected: blocks.len() });
        }
        warn!("split reached {count} of {} blocks", blocks.len());
    }
    Ok(count)
}

/// Segment offset along the edge line of `b` holding `coedge`, for a cut at
/// `ratio` of the coedge from its `vertices[0]`.
fn offset_on_line(graph: &TopoGraph, b: BlockId, coedge: CoEdgeId, ratio: f64) -> Result<(usize, u32), TopoError> {
    let (dir, _, chain) = graph.block_line_of(b, coedge).ok_or_else(|| {
        TopoError::InvalidArgument(format!(
            "coedge {} is not on an edge line of block {}",
            graph.name(coedge),
            graph.name(b)
        ))
    })?;
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
    for step in &chain {
        if step.coedge == coedge {
            forward = step.from == graph.coedge(coedge).vertices[0];
            break;
        }
        start += graph.coedge(step.coedge).nb_edges();
    }
    let offset = if forward { start + t } else { start + nb - t };
    let n = graph.block_nb_edges(b, dir)?;
    if offset == 0 || offset >= n {
        return Err(TopoError::CutOnBorder { kind: EntityKind::Block, name: graph.name(b).to_owned() });
    }
    Ok((dir, offset))
}

/// Structured split of a set of blocks, started at a coedge of one of them.
#[derive(Clone, Debug)]
pub struct SplitBlocks {
    blocks: Vec<BlockId>,
    coedge: CoEdgeId,
    ratio: f64,
    point: Option<Point>,
    first: BlockId,
    dir: usize,
    offset: u32,
    allow_partial: bool,
}

impl SplitBlocks {
    /// Splits `blocks`, starting with the first of them holding `coedge`,
    /// at `ratio` in `[0, 1]` of `coedge`.
    pub fn new(graph: &TopoGraph, blocks: &[BlockId], coedge: CoEdgeId, ratio: f64) -> Result<Self, TopoError> {
        require_ratio(ratio, false)?;
        Self::build(graph, blocks, coedge, ratio, None)
    }

    /// Same as [`new`](Self::new) with the ratio of the node of `coedge`
    /// nearest to `point`.
    pub fn at_point(graph: &TopoGraph, blocks: &[BlockId], coedge: CoEdgeId, point: Point) -> Result<Self, TopoError> {
        require_live(graph, coedge)?;
        let ratio = graph.nearest_node_ratio(coedge, point);
        Self::build(graph, blocks, coedge, ratio, Some(point))
    }

    /// Every live structured block, reached or not: the split is partial.
    pub fn all_blocks(graph: &TopoGraph, coedge: CoEdgeId, ratio: f64) -> Result<Self, TopoError> {
        let blocks: Vec<BlockId> = graph
            .live_blocks()
            .into_iter()
            .filter(|&b| require_structured_block(graph, b).is_ok())
            .collect();
        Ok(Self::new(graph, &blocks, coedge, ratio)?.allow_partial(true))
    }

    fn build(
        graph: &TopoGraph,
        blocks: &[BlockId],
        coedge: CoEdgeId,
        ratio: f64,
        point: Option<Point>,
    ) -> Result<Self, TopoError> {
        let blocks = selection(blocks, "blocks to split")?;
        for &b in &blocks {
            require_structured_block(graph, b)?;
        }
        require_live(graph, coedge)?;
        let first = blocks
            .iter()
            .copied()
            .find(|&b| graph.block_line_of(b, coedge).is_some())
            .ok_or_else(|| {
                TopoError::InvalidArgument(format!(
                    "coedge {} is on no edge line of the selected blocks",
                    graph.name(coedge)
                ))
            })?;
        let (dir, offset) = offset_on_line(graph, first, coedge, ratio)?;
        Ok(SplitBlocks { blocks, coedge, ratio, point, first, dir, offset, allow_partial: false })
    }

    /// Accepts a propagation that stops before every block is split.
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Logical direction and segment offset of the first cut.
    pub fn first_cut(&self) -> (BlockId, usize, u32) {
        (self.first, self.dir, self.offset)
    }
}

impl TopoCommand for SplitBlocks {
    fn name(&self) -> &'static str {
        "SplitBlocks"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = SplitBlocks::build(graph, &self.blocks, self.coedge, self.ratio, self.point)?
            .allow_partial(self.allow_partial);
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let count = propagate_split(tx, self.first, self.dir, self.offset, &self.blocks, self.allow_partial)?;
        debug!("split {count} blocks");
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        let mut entities = names(graph, &self.blocks);
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
