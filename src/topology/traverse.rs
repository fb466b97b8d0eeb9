//! Read-only navigation over the entity graph.
//!
//! Chains are oriented walks along coedges. Every query here is non-mutating
//! and returns entities sorted by id unless the result is a walk, in which
//! case it is ordered along the walk.

use crate::geometry::point::Point;
use crate::topo_error::{TopoError, topology};
use crate::topology::graph::TopoGraph;
use crate::topology::hexa;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};
use hashbrown::HashMap;
use itertools::Itertools;
use std::collections::BTreeSet;

/// One coedge traversed from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainStep {
    pub coedge: CoEdgeId,
    pub from: VertexId,
    pub to: VertexId,
}

pub type Chain = Vec<ChainStep>;

/// Reverses a chain in place of walking it again from the other end.
pub fn reversed(chain: &[ChainStep]) -> Chain {
    chain
        .iter()
        .rev()
        .map(|s| ChainStep { coedge: s.coedge, from: s.to, to: s.from })
        .collect()
}

/// Vertices met along a chain, both ends included.
pub fn chain_vertices(chain: &[ChainStep]) -> Vec<VertexId> {
    let mut out = Vec::with_capacity(chain.len() + 1);
    if let Some(first) = chain.first() {
        out.push(first.from);
    }
    out.extend(chain.iter().map(|s| s.to));
    out
}

impl TopoGraph {
    /// Coedge joining `a` and `b`, smallest id first.
    pub fn find_coedge(&self, a: VertexId, b: VertexId) -> Option<CoEdgeId> {
        self.vertex_coedges(a)
            .into_iter()
            .find(|&ce| self.coedge(ce).opposite(a) == Some(b))
    }

    pub fn chain_length(&self, chain: &[ChainStep]) -> u32 {
        chain.iter().map(|s| self.coedge(s.coedge).nb_edges()).sum()
    }

    /// Segment offset of `v` along `chain`, `None` when `v` is not on it.
    pub fn offset_on_chain(&self, chain: &[ChainStep], v: VertexId) -> Option<u32> {
        let mut acc = 0;
        if chain.first().map(|s| s.from) == Some(v) {
            return Some(0);
        }
        for step in chain {
            acc += self.coedge(step.coedge).nb_edges();
            if step.to == v {
                return Some(acc);
            }
        }
        None
    }

    /// Walk of edge `e` starting from its end `from`.
    pub fn edge_walk(&self, e: EdgeId, from: VertexId) -> Result<Chain, TopoError> {
        let edge = self.edge(e);
        let mut cur = edge.vertices[0];
        let mut chain = Vec::with_capacity(edge.coedges.len());
        for &ce in &edge.coedges {
            let next = self.coedge(ce).opposite(cur).ok_or_else(|| {
                topology(format!(
                    "coedges of edge {} are not contiguous at {}",
                    self.name(e),
                    self.name(cur)
                ))
            })?;
            chain.push(ChainStep { coedge: ce, from: cur, to: next });
            cur = next;
        }
        if cur != edge.vertices[1] {
            return Err(topology(format!(
                "edge {} does not end at {}",
                self.name(e),
                self.name(edge.vertices[1])
            )));
        }
        if from == edge.vertices[0] {
            Ok(chain)
        } else if from == edge.vertices[1] {
            Ok(reversed(&chain))
        } else {
            Err(topology(format!(
                "{} is not an end of edge {}",
                self.name(from),
                self.name(e)
            )))
        }
    }

    pub fn edge_length(&self, e: EdgeId) -> u32 {
        self.edge(e).coedges.iter().map(|&ce| self.coedge(ce).nb_edges()).sum()
    }

    /// Side `k` of a coface walked from `vertices[k]`.
    pub fn coface_side(&self, cf: CoFaceId, k: usize) -> Result<Chain, TopoError> {
        let props = self.coface(cf);
        let n = props.vertices.len();
        self.edge_walk(props.edges[k % n], props.vertices[k % n])
    }

    pub fn coface_side_length(&self, cf: CoFaceId, k: usize) -> u32 {
        let props = self.coface(cf);
        self.edge_length(props.edges[k % props.edges.len()])
    }

    pub fn coface_coedges(&self, cf: CoFaceId) -> Vec<CoEdgeId> {
        self.coface(cf)
            .edges
            .iter()
            .flat_map(|&e| self.edge(e).coedges.iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    /// Corners plus intermediate vertices of the sides of a coface.
    pub fn coface_all_vertices(&self, cf: CoFaceId) -> Vec<VertexId> {
        self.coface_coedges(cf)
            .into_iter()
            .flat_map(|ce| self.coedge(ce).vertices)
            .sorted()
            .dedup()
            .collect()
    }

    /// Cofaces sharing at least one coedge with `cf`.
    pub fn coface_neighbours(&self, cf: CoFaceId) -> Vec<CoFaceId> {
        self.coface_coedges(cf)
            .into_iter()
            .flat_map(|ce| self.coedge_cofaces(ce))
            .filter(|&other| other != cf)
            .sorted()
            .dedup()
            .collect()
    }

    /// Coedge of the side opposite to the one holding `ce`, facing its middle.
    pub fn opposite_coedge(&self, cf: CoFaceId, ce: CoEdgeId) -> Option<CoEdgeId> {
        let props = self.coface(cf);
        if props.nb_sides() != 4 {
            return None;
        }
        let k = (0..4).find(|&k| self.edge(props.edges[k]).coedges.contains(&ce))?;
        let side = self.coface_side(cf, k).ok()?;
        let mut start = 0;
        for step in &side {
            if step.coedge == ce {
                break;
            }
            start += self.coedge(step.coedge).nb_edges();
        }
        let mid2 = 2 * start + self.coedge(ce).nb_edges();
        // the opposite side is walked from the corner facing vertices[k]
        let opposite = self.edge_walk(props.edges[(k + 2) % 4], props.vertices[(k + 3) % 4]).ok()?;
        let mut acc = 0;
        for step in &opposite {
            let n = self.coedge(step.coedge).nb_edges();
            if 2 * (acc + n) > mid2 {
                return Some(step.coedge);
            }
            acc += n;
        }
        opposite.last().map(|s| s.coedge)
    }

    /// Coedges shared by the cofaces of `a` and those of `b`.
    pub fn common_coedges(&self, a: &[CoFaceId], b: &[CoFaceId]) -> Vec<CoEdgeId> {
        let left: BTreeSet<CoEdgeId> = a.iter().flat_map(|&cf| self.coface_coedges(cf)).collect();
        let right: BTreeSet<CoEdgeId> = b.iter().flat_map(|&cf| self.coface_coedges(cf)).collect();
        left.intersection(&right).copied().collect()
    }

    // ---- faces --------------------------------------------------------------

    pub fn face_coedges(&self, f: FaceId) -> Vec<CoEdgeId> {
        self.face(f)
            .cofaces
            .iter()
            .flat_map(|&cf| self.coface_coedges(cf))
            .sorted()
            .dedup()
            .collect()
    }

    /// Coedges on the outline of a composite face: those used by exactly one
    /// of its cofaces.
    pub fn face_boundary_coedges(&self, f: FaceId) -> Vec<CoEdgeId> {
        let mut count: HashMap<CoEdgeId, usize> = HashMap::new();
        for &cf in &self.face(f).cofaces {
            for ce in self.coface_coedges(cf) {
                *count.entry(ce).or_default() += 1;
            }
        }
        count.into_iter().filter(|&(_, n)| n == 1).map(|(ce, _)| ce).sorted().collect()
    }

    /// Outline walk of a composite face between two adjacent corners.
    pub fn face_side_chain(&self, f: FaceId, a: VertexId, b: VertexId) -> Result<Chain, TopoError> {
        if a == b {
            return Ok(Vec::new());
        }
        let boundary = self.face_boundary_coedges(f);
        let mut at: HashMap<VertexId, Vec<CoEdgeId>> = HashMap::new();
        for &ce in &boundary {
            for v in self.coedge(ce).vertices {
                at.entry(v).or_default().push(ce);
            }
        }
        let corners = &self.face(f).vertices;
        let starts = at.get(&a).cloned().unwrap_or_default();
        for start in starts {
            let mut chain = Vec::new();
            let mut cur = a;
            let mut ce = start;
            for _ in 0..=boundary.len() {
                let Some(next) = self.coedge(ce).opposite(cur) else { break };
                chain.push(ChainStep { coedge: ce, from: cur, to: next });
                if next == b {
                    return Ok(chain);
                }
                if corners.contains(&next) {
                    break;
                }
                let around = at.get(&next).map(Vec::as_slice).unwrap_or(&[]);
                match around.iter().copied().find(|&other| other != ce) {
                    Some(other) if around.len() == 2 => {
                        cur = next;
                        ce = other;
                    }
                    _ => break,
                }
            }
        }
        Err(topology(format!(
            "no outline of face {} joins {} to {}",
            self.name(f),
            self.name(a),
            self.name(b)
        )))
    }

    // ---- blocks -------------------------------------------------------------

    pub fn block_cofaces(&self, b: BlockId) -> Vec<CoFaceId> {
        self.block(b)
            .faces
            .iter()
            .flat_map(|&f| self.face(f).cofaces.iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn block_coedges(&self, b: BlockId) -> Vec<CoEdgeId> {
        self.block_cofaces(b)
            .into_iter()
            .flat_map(|cf| self.coface_coedges(cf))
            .sorted()
            .dedup()
            .collect()
    }

    /// Corners plus every vertex of the block outline.
    pub fn block_all_vertices(&self, b: BlockId) -> Vec<VertexId> {
        self.block_coedges(b)
            .into_iter()
            .flat_map(|ce| self.coedge(ce).vertices)
            .chain(self.block(b).vertices.iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    /// Blocks sharing a coface with `b`.
    pub fn block_neighbours(&self, b: BlockId) -> Vec<BlockId> {
        self.block_cofaces(b)
            .into_iter()
            .flat_map(|cf| self.coface_blocks(cf))
            .filter(|&other| other != b)
            .sorted()
            .dedup()
            .collect()
    }

    /// Cofaces shared by two blocks.
    pub fn common_cofaces(&self, a: BlockId, b: BlockId) -> Vec<CoFaceId> {
        let right: BTreeSet<CoFaceId> = self.block_cofaces(b).into_iter().collect();
        self.block_cofaces(a).into_iter().filter(|cf| right.contains(cf)).collect()
    }

    /// Coedge walk along the block edge line joining corners `lo` and `hi`.
    pub fn block_line_chain(&self, b: BlockId, lo: usize, hi: usize) -> Result<Chain, TopoError> {
        let props = self.block(b);
        let (va, vb) = (props.vertices[lo], props.vertices[hi]);
        if va == vb {
            return Ok(Vec::new());
        }
        let mut last = None;
        for face in hexa::faces_of_line(lo, hi) {
            let f = props.faces[face];
            if self.face(f).cofaces.is_empty() {
                continue;
            }
            match self.face_side_chain(f, va, vb) {
                Ok(chain) => return Ok(chain),
                Err(e) => last = Some(e),
            }
        }
        Err(last.unwrap_or_else(|| {
            topology(format!("block {} has no face along line {lo}-{hi}", self.name(b)))
        }))
    }

    /// The four line chains of direction `dir`, in [`hexa::EDGE_LINES`] order.
    pub fn block_lines(&self, b: BlockId, dir: usize) -> Result<Vec<Chain>, TopoError> {
        hexa::EDGE_LINES[dir]
            .iter()
            .map(|&(lo, hi)| self.block_line_chain(b, lo, hi))
            .collect()
    }

    /// Common segment count of the lines of direction `dir`.
    pub fn block_nb_edges(&self, b: BlockId, dir: usize) -> Result<u32, TopoError> {
        let lengths: Vec<u32> = self
            .block_lines(b, dir)?
            .iter()
            .map(|c| self.chain_length(c))
            .filter(|&n| n > 0)
            .dedup()
            .collect();
        match lengths.as_slice() {
            [n] => Ok(*n),
            [] => Err(topology(format!(
                "block {} is collapsed in direction {dir}",
                self.name(b)
            ))),
            _ => Err(topology(format!(
                "block {} has unequal segment counts {:?} in direction {dir}",
                self.name(b),
                lengths
            ))),
        }
    }

    /// Direction and line index of the block line holding `ce`.
    pub fn block_line_of(&self, b: BlockId, ce: CoEdgeId) -> Option<(usize, usize, Chain)> {
        for dir in 0..3 {
            for (line, &(lo, hi)) in hexa::EDGE_LINES[dir].iter().enumerate() {
                if let Ok(chain) = self.block_line_chain(b, lo, hi) {
                    if chain.iter().any(|s| s.coedge == ce) {
                        return Some((dir, line, chain));
                    }
                }
            }
        }
        None
    }

    // ---- positions ------------------------------------------------------------

    /// Straight-line positions of the nodes of a coedge, from `vertices[0]`.
    pub fn coedge_nodes(&self, ce: CoEdgeId) -> Vec<Point> {
        let props = self.coedge(ce);
        let a = self.vertex(props.vertices[0]).coord;
        let b = self.vertex(props.vertices[1]).coord;
        props.discretization.parameters().into_iter().map(|t| a.lerp(b, t)).collect()
    }

    /// Ratio of the node of `ce` nearest to `p`.
    ///
    /// Near an end, the straight-line projection of `p` is used instead, so the
    /// caller can still clamp it to the first interior node.
    pub fn nearest_node_ratio(&self, ce: CoEdgeId, p: Point) -> f64 {
        let nodes = self.coedge_nodes(ce);
        let n = nodes.len().saturating_sub(1).max(1);
        let best = nodes
            .iter()
            .enumerate()
            .map(|(i, q)| (i, q.distance(p)))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        if best != 0 && best != n {
            return best as f64 / n as f64;
        }
        let (a, b) = (nodes[0], nodes[n]);
        let ab = b - a;
        let len2 = ab.norm2();
        if len2 <= f64::EPSILON {
            return best as f64 / n as f64;
        }
        num_traits::clamp((p - a).dot(ab) / len2, 0.0, 1.0)
    }
}
