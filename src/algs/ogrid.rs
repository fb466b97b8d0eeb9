//! Shared machinery of the O-grid splits: the selection filter and the
//! construction of the buffer shell.
//!
//! The filter tags every entity reached from the selection:
//!
//! | tag        | vertices                  | coedges, cofaces, blocks               |
//! |------------|---------------------------|----------------------------------------|
//! | `Boundary` | gets an inner counterpart | on the outer border of the selection   |
//! | `Inside`   | stays in place            | inside, touching a boundary vertex     |
//! | `Central`  |                           | inside, untouched by the split         |
//! | `Ignored`  | on a border, no copy      |                                        |
//!
//! Boundary entities are kept and become the outer side of the shell;
//! `Inside` ones are rebuilt around the inner counterparts and released.

use crate::algs::edit::{new_coedge, new_quad, new_vertex};
use crate::command::tx::EditTx;
use crate::geometry::kernel::GeomRef;
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, topology};
use crate::topology::entity::{Discretization, FaceLaw};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};
use crate::topology::traverse::{Chain, ChainStep, reversed};
use itertools::Itertools;
use log::{trace, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Role of an entity in an O-grid split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum OgridTag {
    Boundary = 1,
    Inside = 2,
    Central = 3,
    Ignored = 5,
}

/// Tags of the entities reached from an O-grid selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OgridFilter {
    vertices: BTreeMap<VertexId, OgridTag>,
    coedges: BTreeMap<CoEdgeId, OgridTag>,
    edges: BTreeMap<EdgeId, OgridTag>,
    cofaces: BTreeMap<CoFaceId, OgridTag>,
    faces: BTreeMap<FaceId, OgridTag>,
    blocks: BTreeMap<BlockId, OgridTag>,
}

fn tagged<I: Copy>(map: &BTreeMap<I, OgridTag>, tag: OgridTag) -> Vec<I> {
    map.iter().filter(|&(_, &t)| t == tag).map(|(&id, _)| id).collect()
}

/// Cofaces having `v` as a corner or on a side.
pub(crate) fn cofaces_around(graph: &TopoGraph, v: VertexId) -> Vec<CoFaceId> {
    graph
        .vertex_coedges(v)
        .into_iter()
        .flat_map(|ce| graph.coedge_cofaces(ce))
        .chain(graph.vertex_cofaces(v))
        .sorted()
        .dedup()
        .collect()
}

impl OgridFilter {
    pub fn vertex(&self, v: VertexId) -> Option<OgridTag> {
        self.vertices.get(&v).copied()
    }

    pub fn coedge(&self, ce: CoEdgeId) -> Option<OgridTag> {
        self.coedges.get(&ce).copied()
    }

    pub fn edge(&self, e: EdgeId) -> Option<OgridTag> {
        self.edges.get(&e).copied()
    }

    pub fn coface(&self, cf: CoFaceId) -> Option<OgridTag> {
        self.cofaces.get(&cf).copied()
    }

    pub fn face(&self, f: FaceId) -> Option<OgridTag> {
        self.faces.get(&f).copied()
    }

    pub fn block(&self, b: BlockId) -> Option<OgridTag> {
        self.blocks.get(&b).copied()
    }

    pub fn vertices_tagged(&self, tag: OgridTag) -> Vec<VertexId> {
        tagged(&self.vertices, tag)
    }

    pub fn coedges_tagged(&self, tag: OgridTag) -> Vec<CoEdgeId> {
        tagged(&self.coedges, tag)
    }

    pub fn cofaces_tagged(&self, tag: OgridTag) -> Vec<CoFaceId> {
        tagged(&self.cofaces, tag)
    }

    pub fn blocks_tagged(&self, tag: OgridTag) -> Vec<BlockId> {
        tagged(&self.blocks, tag)
    }

    /// Blocks of the selection, including neighbours pulled in by open cofaces.
    pub fn selected_blocks(&self) -> Vec<BlockId> {
        self.blocks.keys().copied().collect()
    }

    pub fn selected_cofaces(&self) -> Vec<CoFaceId> {
        self.cofaces.keys().copied().collect()
    }

    /// Vertices where the split starts a chain segment.
    pub(crate) fn is_marked(&self, v: VertexId) -> bool {
        matches!(self.vertex(v), Some(OgridTag::Boundary | OgridTag::Inside))
    }

    /// Filter of a block selection. `open` cofaces of the selection outline
    /// get no shell; when such a coface is shared with an unselected block,
    /// that block joins the selection if `propagate` holds and the coface is
    /// ignored otherwise. With `internal_vertices`, every vertex of a
    /// boundary coface gets an inner counterpart; without, only the corners
    /// of boundary faces and the vertices an inner coedge reaches.
    pub fn for_blocks(
        graph: &TopoGraph,
        blocks: &[BlockId],
        open: &[CoFaceId],
        internal_vertices: bool,
        propagate: bool,
    ) -> Result<Self, TopoError> {
        let mut selected: BTreeSet<BlockId> = blocks.iter().copied().collect();
        let mut opened = BTreeSet::new();
        for &cf in open {
            let around = graph.coface_blocks(cf);
            let inside = around.iter().filter(|b| selected.contains(b)).count();
            match (around.len(), inside) {
                (1, 1) => {
                    opened.insert(cf);
                }
                (2, 1) if propagate => {
                    let other = around.iter().copied().find(|b| !selected.contains(b));
                    if let Some(other) = other {
                        let props = graph.block(other);
                        if !props.structured || props.is_degenerate() {
                            return Err(topology(format!(
                                "block {} reached through coface {} cannot be split with an o-grid",
                                graph.name(other),
                                graph.name(cf)
                            )));
                        }
                        trace!("o-grid selection extended to `{}`", graph.name(other));
                        selected.insert(other);
                    }
                }
                _ => warn!("coface `{}` is not on the outline of the selection and is ignored", graph.name(cf)),
            }
        }

        let mut filter = OgridFilter::default();
        let mut uses: BTreeMap<CoFaceId, usize> = BTreeMap::new();
        for &b in &selected {
            for cf in graph.block_cofaces(b) {
                *uses.entry(cf).or_default() += 1;
            }
            for v in graph.block_all_vertices(b) {
                filter.vertices.insert(v, OgridTag::Inside);
            }
        }
        for (&cf, &n) in &uses {
            let tag = if n == 1 && !opened.contains(&cf) { OgridTag::Boundary } else { OgridTag::Inside };
            filter.cofaces.insert(cf, tag);
        }

        let boundary_coedges: BTreeSet<CoEdgeId> = filter
            .cofaces_tagged(OgridTag::Boundary)
            .into_iter()
            .flat_map(|cf| graph.coface_coedges(cf))
            .collect();

        for &b in &selected {
            for &f in &graph.block(b).faces {
                let cofaces = &graph.face(f).cofaces;
                let outer = cofaces.iter().filter(|&&cf| filter.coface(cf) == Some(OgridTag::Boundary)).count();
                let tag = match outer {
                    0 => OgridTag::Inside,
                    n if n == cofaces.len() => OgridTag::Boundary,
                    _ => {
                        return Err(topology(format!(
                            "face {} of block {} is partly on the outline of the selection",
                            graph.name(f),
                            graph.name(b)
                        )));
                    }
                };
                filter.faces.insert(f, tag);
            }
        }

        if internal_vertices {
            for cf in filter.cofaces_tagged(OgridTag::Boundary) {
                for v in graph.coface_all_vertices(cf) {
                    filter.vertices.insert(v, OgridTag::Boundary);
                }
            }
        } else {
            let inner_coedge = |v: VertexId| {
                graph
                    .vertex_coedges(v)
                    .into_iter()
                    .any(|ce| !boundary_coedges.contains(&ce) && graph.coedge_blocks(ce).iter().any(|b| selected.contains(b)))
            };
            let outer_faces: Vec<FaceId> = tagged(&filter.faces, OgridTag::Boundary);
            for f in outer_faces {
                let corners = &graph.face(f).vertices;
                for cf in graph.face(f).cofaces.clone() {
                    for v in graph.coface_all_vertices(cf) {
                        let tag = if corners.contains(&v) || inner_coedge(v) {
                            OgridTag::Boundary
                        } else if filter.vertex(v) == Some(OgridTag::Boundary) {
                            continue;
                        } else {
                            OgridTag::Ignored
                        };
                        filter.vertices.insert(v, tag);
                    }
                }
            }
        }

        for &b in &selected {
            for ce in graph.block_coedges(b) {
                let tag = if boundary_coedges.contains(&ce) {
                    OgridTag::Boundary
                } else if graph.coedge(ce).vertices.iter().any(|&v| filter.vertex(v) == Some(OgridTag::Boundary)) {
                    OgridTag::Inside
                } else {
                    OgridTag::Central
                };
                filter.coedges.insert(ce, tag);
            }
        }
        let inside: Vec<CoFaceId> = filter.cofaces_tagged(OgridTag::Inside);
        for cf in inside {
            if !graph.coface_all_vertices(cf).into_iter().any(|v| filter.vertex(v) == Some(OgridTag::Boundary)) {
                filter.cofaces.insert(cf, OgridTag::Central);
            }
        }
        for &b in &selected {
            let touches_outline =
                graph.block(b).faces.iter().any(|&f| filter.face(f) == Some(OgridTag::Boundary));
            let tag = if touches_outline {
                OgridTag::Boundary
            } else if graph.block_all_vertices(b).into_iter().any(|v| filter.vertex(v) == Some(OgridTag::Boundary)) {
                OgridTag::Inside
            } else {
                OgridTag::Central
            };
            filter.blocks.insert(b, tag);
        }
        Ok(filter)
    }

    /// Filter of a coface selection, the two-dimensional counterpart of
    /// [`for_blocks`](Self::for_blocks): `open` coedges get no shell, and a
    /// coedge shared with an unselected coface pulls that coface in.
    pub fn for_cofaces(graph: &TopoGraph, cofaces: &[CoFaceId], open: &[CoEdgeId]) -> Result<Self, TopoError> {
        let mut selected: BTreeSet<CoFaceId> = cofaces.iter().copied().collect();
        let mut opened = BTreeSet::new();
        for &ce in open {
            let around = graph.coedge_cofaces(ce);
            let inside = around.iter().filter(|cf| selected.contains(cf)).count();
            match (around.len(), inside) {
                (1, 1) => {
                    opened.insert(ce);
                }
                (2, 1) => {
                    if let Some(other) = around.iter().copied().find(|cf| !selected.contains(cf)) {
                        let props = graph.coface(other);
                        if !props.structured || props.nb_sides() != 4 {
                            return Err(topology(format!(
                                "coface {} reached through coedge {} cannot be split with an o-grid",
                                graph.name(other),
                                graph.name(ce)
                            )));
                        }
                        selected.insert(other);
                    }
                }
                _ => warn!("coedge `{}` is not on the outline of the selection and is ignored", graph.name(ce)),
            }
        }

        let mut filter = OgridFilter::default();
        let mut uses: BTreeMap<CoEdgeId, usize> = BTreeMap::new();
        for &cf in &selected {
            for ce in graph.coface_coedges(cf) {
                *uses.entry(ce).or_default() += 1;
            }
            for v in graph.coface_all_vertices(cf) {
                filter.vertices.insert(v, OgridTag::Inside);
            }
        }
        for (&ce, &n) in &uses {
            let tag = if n == 1 && !opened.contains(&ce) { OgridTag::Boundary } else { OgridTag::Inside };
            filter.coedges.insert(ce, tag);
        }

        for &cf in &selected {
            for &e in &graph.coface(cf).edges {
                let coedges = &graph.edge(e).coedges;
                let outer = coedges.iter().filter(|&&ce| filter.coedge(ce) == Some(OgridTag::Boundary)).count();
                let tag = match outer {
                    0 => OgridTag::Inside,
                    n if n == coedges.len() => OgridTag::Boundary,
                    _ => {
                        return Err(topology(format!(
                            "side {} of coface {} is partly on the outline of the selection",
                            graph.name(e),
                            graph.name(cf)
                        )));
                    }
                };
                filter.edges.insert(e, tag);
            }
        }

        let inner_coedge = |v: VertexId| {
            graph.vertex_coedges(v).into_iter().any(|ce| filter.coedge(ce) == Some(OgridTag::Inside))
        };
        let mut tags = Vec::new();
        for e in tagged(&filter.edges, OgridTag::Boundary) {
            let ends = graph.edge(e).vertices;
            for step in graph.edge_walk(e, ends[0])? {
                for v in [step.from, step.to] {
                    let tag = if ends.contains(&v) || inner_coedge(v) { OgridTag::Boundary } else { OgridTag::Ignored };
                    tags.push((v, tag));
                }
            }
        }
        for (v, tag) in tags {
            if filter.vertex(v) != Some(OgridTag::Boundary) {
                filter.vertices.insert(v, tag);
            }
        }

        let inside: Vec<CoEdgeId> = filter.coedges_tagged(OgridTag::Inside);
        for ce in inside {
            if !graph.coedge(ce).vertices.iter().any(|&v| filter.vertex(v) == Some(OgridTag::Boundary)) {
                filter.coedges.insert(ce, OgridTag::Central);
            }
        }
        for &cf in &selected {
            let props = graph.coface(cf);
            let tag = if props.edges.iter().any(|&e| filter.edge(e) == Some(OgridTag::Boundary)) {
                OgridTag::Boundary
            } else if graph.coface_all_vertices(cf).into_iter().any(|v| filter.vertex(v) == Some(OgridTag::Boundary)) {
                OgridTag::Inside
            } else {
                OgridTag::Central
            };
            filter.cofaces.insert(cf, tag);
        }
        Ok(filter)
    }
}

/// `c + (p - c) * ratio`: the inner counterpart of `p` toward `c`.
pub fn ogrid_point(c: Point, p: Point, ratio: f64) -> Point {
    c + (p - c) * ratio
}

/// Entities created while building a shell, keyed by what they mirror.
#[derive(Debug)]
pub(crate) struct ShellBuilder {
    nb_bras: u32,
    /// Cofaces and their rebuilt copies lie on the same surface.
    planar: bool,
    inner_vertex: BTreeMap<VertexId, VertexId>,
    radial: BTreeMap<VertexId, CoEdgeId>,
    inner_coedge: BTreeMap<(VertexId, VertexId), CoEdgeId>,
    ring: BTreeMap<(VertexId, VertexId), CoFaceId>,
    mirror: BTreeMap<CoFaceId, CoFaceId>,
    created: Vec<CoFaceId>,
}

fn key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl ShellBuilder {
    pub(crate) fn new(nb_bras: u32) -> Self {
        ShellBuilder {
            nb_bras,
            planar: false,
            inner_vertex: BTreeMap::new(),
            radial: BTreeMap::new(),
            inner_coedge: BTreeMap::new(),
            ring: BTreeMap::new(),
            mirror: BTreeMap::new(),
            created: Vec::new(),
        }
    }

    /// Builder of a coface split, where rings stay on the split cofaces.
    pub(crate) fn planar(nb_bras: u32) -> Self {
        ShellBuilder { planar: true, ..Self::new(nb_bras) }
    }

    /// Inner counterpart of `v`, `v` itself when it does not move.
    pub(crate) fn inner(&self, v: VertexId) -> VertexId {
        self.inner_vertex.get(&v).copied().unwrap_or(v)
    }

    /// Cofaces built so far, in creation order.
    pub(crate) fn created_cofaces(&self) -> &[CoFaceId] {
        &self.created
    }

    pub(crate) fn nb_inner_vertices(&self) -> usize {
        self.inner_vertex.len()
    }

    /// Creates the inner counterpart of `v` at `p`, and the radial coedge
    /// joining them.
    pub(crate) fn place(&mut self, tx: &mut EditTx<'_>, v: VertexId, p: Point, geom: Option<GeomRef>) {
        let inner = new_vertex(tx, p, geom);
        let radial = new_coedge(tx, v, inner, Discretization::uniform(self.nb_bras), geom);
        self.inner_vertex.insert(v, inner);
        self.radial.insert(v, radial);
        trace!("o-grid counterpart of `{}` is `{}`", tx.graph().name(v), tx.graph().name(inner));
    }

    fn radial_step(&self, v: VertexId) -> Result<ChainStep, TopoError> {
        let coedge = self.radial.get(&v).copied().ok_or_else(|| topology("o-grid vertex without radial coedge"))?;
        Ok(ChainStep { coedge, from: v, to: self.inner(v) })
    }

    /// Pieces of `chain` between consecutive marked vertices.
    pub(crate) fn segments(filter: &OgridFilter, chain: &[ChainStep]) -> Vec<Chain> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        for (i, step) in chain.iter().enumerate() {
            current.push(*step);
            if i + 1 == chain.len() || filter.is_marked(step.to) {
                out.push(std::mem::take(&mut current));
            }
        }
        out
    }

    /// Inner counterpart of a piece running between two marked vertices.
    fn inner_segment(&mut self, tx: &mut EditTx<'_>, filter: &OgridFilter, piece: &[ChainStep]) -> Result<Chain, TopoError> {
        let (Some(first), Some(last)) = (piece.first(), piece.last()) else {
            return Ok(Vec::new());
        };
        let (p, q) = (first.from, last.to);
        if self.inner(p) == p && self.inner(q) == q {
            return Ok(piece.to_vec());
        }
        let k = key(p, q);
        let coedge = match self.inner_coedge.get(&k) {
            Some(&ce) => ce,
            None => {
                let ce = if let [single] = piece {
                    let props = tx.graph().coedge(single.coedge).clone();
                    let geom = match filter.coedge(single.coedge) {
                        Some(OgridTag::Inside) => props.geom,
                        _ => None,
                    };
                    let [a, b] = props.vertices;
                    new_coedge(tx, self.inner(a), self.inner(b), props.discretization, geom)
                } else {
                    let nb = tx.graph().chain_length(piece);
                    new_coedge(tx, self.inner(p), self.inner(q), Discretization::uniform(nb), None)
                };
                self.inner_coedge.insert(k, ce);
                ce
            }
        };
        Ok(vec![ChainStep { coedge, from: self.inner(p), to: self.inner(q) }])
    }

    /// Inner counterpart of a whole chain.
    pub(crate) fn inner_chain(&mut self, tx: &mut EditTx<'_>, filter: &OgridFilter, chain: &[ChainStep]) -> Result<Chain, TopoError> {
        let mut out = Vec::new();
        for piece in Self::segments(filter, chain) {
            out.extend(self.inner_segment(tx, filter, &piece)?);
        }
        Ok(out)
    }

    /// Quadrangle swept by a piece of the outline toward its inner
    /// counterpart.
    pub(crate) fn ring(
        &mut self,
        tx: &mut EditTx<'_>,
        filter: &OgridFilter,
        piece: &[ChainStep],
    ) -> Result<CoFaceId, TopoError> {
        let (Some(first), Some(last)) = (piece.first(), piece.last()) else {
            return Err(topology("empty o-grid segment"));
        };
        let (p, q) = (first.from, last.to);
        if let Some(&cf) = self.ring.get(&key(p, q)) {
            return Ok(cf);
        }
        let inner = self.inner_segment(tx, filter, piece)?;
        let outer = piece.to_vec();
        let down_q = vec![self.radial_step(q)?];
        let back = reversed(&inner);
        let up_p = reversed(&[self.radial_step(p)?]);
        let geom = self.ring_geometry(tx.graph(), filter, piece);
        let cf = new_quad(
            tx,
            [p, q, self.inner(q), self.inner(p)],
            [&outer, &down_q, &back, &up_p],
            FaceLaw::Transfinite,
            geom,
        )?;
        self.ring.insert(key(p, q), cf);
        self.created.push(cf);
        Ok(cf)
    }

    /// Surface of the inside coface the ring lies on, when there is one.
    fn ring_geometry(&self, graph: &TopoGraph, filter: &OgridFilter, piece: &[ChainStep]) -> Option<GeomRef> {
        let first = piece.first()?.coedge;
        let holders: Vec<CoFaceId> = graph
            .coedge_cofaces(first)
            .into_iter()
            .filter(|&cf| match filter.coface(cf) {
                Some(OgridTag::Inside) => true,
                Some(_) => self.planar,
                None => false,
            })
            .filter(|&cf| {
                let own = graph.coface_coedges(cf);
                piece.iter().all(|s| own.contains(&s.coedge))
            })
            .collect();
        match holders.as_slice() {
            [single] => graph.coface(*single).geom,
            _ => None,
        }
    }

    /// Coface rebuilt around the inner counterparts of its vertices; the
    /// coface itself when none of them moves.
    pub(crate) fn mirror(&mut self, tx: &mut EditTx<'_>, filter: &OgridFilter, cf: CoFaceId) -> Result<CoFaceId, TopoError> {
        if let Some(&m) = self.mirror.get(&cf) {
            return Ok(m);
        }
        let g = tx.graph();
        if g.coface_all_vertices(cf).into_iter().all(|v| self.inner(v) == v) {
            return Ok(cf);
        }
        let props = g.coface(cf).clone();
        let corners: [VertexId; 4] = props
            .vertices
            .iter()
            .map(|&v| self.inner(v))
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| topology(format!("coface {} is not a quadrangle", g.name(cf))))?;
        let mut sides = Vec::with_capacity(4);
        for k in 0..4 {
            let side = tx.graph().coface_side(cf, k)?;
            sides.push(self.inner_chain(tx, filter, &side)?);
        }
        let geom = match filter.coface(cf) {
            Some(OgridTag::Boundary) if !self.planar => None,
            _ => props.geom,
        };
        let m = new_quad(tx, corners, [&sides[0], &sides[1], &sides[2], &sides[3]], props.law, geom)?;
        self.mirror.insert(cf, m);
        self.created.push(m);
        Ok(m)
    }

    /// Single inner quadrangle facing a whole outline given by its corners
    /// and side chains.
    pub(crate) fn mirror_outline(
        &mut self,
        tx: &mut EditTx<'_>,
        filter: &OgridFilter,
        corners: [VertexId; 4],
        sides: &[Chain; 4],
    ) -> Result<CoFaceId, TopoError> {
        let inner_corners = corners.map(|v| self.inner(v));
        let mut inner_sides = Vec::with_capacity(4);
        for side in sides {
            inner_sides.push(self.inner_chain(tx, filter, side)?);
        }
        let m = new_quad(
            tx,
            inner_corners,
            [&inner_sides[0], &inner_sides[1], &inner_sides[2], &inner_sides[3]],
            FaceLaw::Transfinite,
            None,
        )?;
        self.created.push(m);
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlock, NewBlockGrid, NewFaceGrid};
    use crate::command::Session;

    #[test]
    fn lone_block_is_all_outline() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
        let g = s.graph();
        let b = g.live_blocks()[0];
        let f = OgridFilter::for_blocks(g, &[b], &[], true, true).unwrap();
        assert_eq!(f.block(b), Some(OgridTag::Boundary));
        assert_eq!(f.cofaces_tagged(OgridTag::Boundary).len(), 6);
        assert_eq!(f.vertices_tagged(OgridTag::Boundary).len(), 8);
        assert_eq!(f.coedges_tagged(OgridTag::Boundary).len(), 12);
    }

    #[test]
    fn shared_face_is_inside() {
        let mut s = Session::default();
        s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2]).unwrap())
            .unwrap();
        let g = s.graph();
        let blocks = g.live_blocks();
        let shared = g.common_cofaces(blocks[0], blocks[1])[0];
        let f = OgridFilter::for_blocks(g, &blocks, &[], true, true).unwrap();
        assert_eq!(f.coface(shared), Some(OgridTag::Inside));
        assert_eq!(f.cofaces_tagged(OgridTag::Boundary).len(), 10);

        // an open coface toward an unselected neighbour pulls it in
        let f = OgridFilter::for_blocks(g, &blocks[..1], &[shared], true, true).unwrap();
        assert_eq!(f.selected_blocks(), blocks);
        let f = OgridFilter::for_blocks(g, &blocks[..1], &[shared], true, false).unwrap();
        assert_eq!(f.selected_blocks(), vec![blocks[0]]);
        assert_eq!(f.coface(shared), Some(OgridTag::Boundary));
    }

    #[test]
    fn open_side_of_a_strip() {
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::ORIGIN, [1.0, 1.0], [1, 1], [2, 2]).unwrap()).unwrap();
        let g = s.graph();
        let cf = g.live_cofaces()[0];
        let bottom = g.coface_side(cf, 0).unwrap()[0].coedge;
        let f = OgridFilter::for_cofaces(g, &[cf], &[bottom]).unwrap();
        assert_eq!(f.coedge(bottom), Some(OgridTag::Inside));
        assert_eq!(f.coedges_tagged(OgridTag::Boundary).len(), 3);
        assert_eq!(f.coface(cf), Some(OgridTag::Boundary));
    }

    #[test]
    fn segments_stop_at_marked_vertices() {
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::ORIGIN, [1.0, 1.0], [2, 1], [1, 1]).unwrap()).unwrap();
        let g = s.graph();
        let cofaces = g.live_cofaces();
        let f = OgridFilter::for_cofaces(g, &cofaces, &[]).unwrap();
        // the bottom edge of the union has its middle vertex on an inner coedge
        let side = g.coface_side(cofaces[0], 0).unwrap();
        assert_eq!(ShellBuilder::segments(&f, &side).len(), 1);
        assert_eq!(f.vertices_tagged(OgridTag::Boundary).len(), 6);
        assert!(f.vertices_tagged(OgridTag::Ignored).is_empty());
    }

    #[test]
    fn placement_interpolates() {
        let p = ogrid_point(Point::new(0.5, 0.5, 0.5), Point::ORIGIN, 0.3);
        assert!(p.is_near(Point::new(0.35, 0.35, 0.35), 1e-12));
    }
}
