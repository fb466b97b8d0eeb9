//! Elementary edits shared by the commands: entity construction, coedge
//! splitting, coface cutting, replacement in parents and release of entities
//! nothing uses any more.

use crate::command::tx::EditTx;
use crate::geometry::kernel::GeomRef;
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, topology};
use crate::topology::entity::{
    BlockLaw, BlockProps, CoEdgeProps, CoFaceProps, Discretization, EdgeProps, FaceLaw,
    FaceProps, VertexProps,
};
use crate::topology::hexa;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, EntityKind, FaceId, VertexId};
use crate::topology::traverse::{Chain, chain_vertices};
use log::trace;

// ---- construction ----------------------------------------------------------

pub(crate) fn new_vertex(tx: &mut EditTx<'_>, coord: Point, geom: Option<GeomRef>) -> VertexId {
    tx.create(VertexProps { coord, geom })
}

pub(crate) fn new_coedge(
    tx: &mut EditTx<'_>,
    a: VertexId,
    b: VertexId,
    discretization: Discretization,
    geom: Option<GeomRef>,
) -> CoEdgeId {
    tx.create(CoEdgeProps { vertices: [a, b], discretization, geom })
}

pub(crate) fn new_edge(tx: &mut EditTx<'_>, a: VertexId, b: VertexId, coedges: Vec<CoEdgeId>) -> EdgeId {
    tx.create(EdgeProps { vertices: [a, b], coedges })
}

pub(crate) fn edge_from_chain(tx: &mut EditTx<'_>, chain: &Chain) -> Result<EdgeId, TopoError> {
    let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
        return Err(topology("cannot build an edge from an empty chain"));
    };
    Ok(new_edge(tx, first.from, last.to, chain.iter().map(|s| s.coedge).collect()))
}

/// Structured quadrangle whose side `k` walks `sides[k]` from `vertices[k]`
/// to `vertices[k + 1]`.
pub(crate) fn new_quad(
    tx: &mut EditTx<'_>,
    vertices: [VertexId; 4],
    sides: [&Chain; 4],
    law: FaceLaw,
    geom: Option<GeomRef>,
) -> Result<CoFaceId, TopoError> {
    let mut edges = Vec::with_capacity(4);
    for (k, side) in sides.iter().enumerate() {
        let ends = chain_vertices(side);
        if ends.first() != Some(&vertices[k]) || ends.last() != Some(&vertices[(k + 1) % 4]) {
            return Err(topology(format!("side {k} of a new coface does not join its corners")));
        }
        edges.push(edge_from_chain(tx, side)?);
    }
    Ok(tx.create(CoFaceProps {
        vertices: vertices.to_vec(),
        edges,
        structured: true,
        law,
        geom,
    }))
}

/// Triangle with the same side convention as [`new_quad`], never structured.
pub(crate) fn new_triangle(
    tx: &mut EditTx<'_>,
    vertices: [VertexId; 3],
    sides: [&Chain; 3],
    geom: Option<GeomRef>,
) -> Result<CoFaceId, TopoError> {
    let mut edges = Vec::with_capacity(3);
    for side in sides {
        edges.push(edge_from_chain(tx, side)?);
    }
    Ok(tx.create(CoFaceProps {
        vertices: vertices.to_vec(),
        edges,
        structured: false,
        law: FaceLaw::Transfinite,
        geom,
    }))
}

/// Block whose face slot `s` holds `cofaces[s]`; corners of each face follow
/// [`hexa::FACE_CORNERS`].
pub(crate) fn new_block(
    tx: &mut EditTx<'_>,
    vertices: [VertexId; 8],
    cofaces: [Vec<CoFaceId>; 6],
    law: BlockLaw,
    geom: Option<GeomRef>,
) -> BlockId {
    let faces: Vec<FaceId> = cofaces
        .into_iter()
        .enumerate()
        .map(|(slot, cofaces)| {
            let corners = hexa::FACE_CORNERS[slot].iter().map(|&c| vertices[c]).collect();
            tx.create(FaceProps { vertices: corners, cofaces })
        })
        .collect();
    let block: BlockId = tx.create(BlockProps {
        vertices: vertices.to_vec(),
        faces,
        structured: true,
        law,
        geom,
    });
    trace!("new block `{}`", tx.graph().name(block));
    block
}

// ---- replacement in parents ---------------------------------------------------

/// Replaces `old` by `by` in every edge using it. `by` runs from
/// `old.vertices[0]` to `old.vertices[1]` and is reversed where an edge walks
/// `old` the other way.
pub(crate) fn replace_coedge(tx: &mut EditTx<'_>, old: CoEdgeId, by: &[CoEdgeId]) -> Result<(), TopoError> {
    let start = tx.graph().coedge(old).vertices[0];
    for e in tx.graph().coedge_edges(old) {
        let walk = tx.graph().edge_walk(e, tx.graph().edge(e).vertices[0])?;
        let mut coedges = Vec::with_capacity(walk.len() + by.len());
        for step in walk {
            if step.coedge != old {
                coedges.push(step.coedge);
            } else if step.from == start {
                coedges.extend_from_slice(by);
            } else {
                coedges.extend(by.iter().rev());
            }
        }
        tx.update(e, |p| p.coedges = coedges);
    }
    Ok(())
}

/// Replaces `old` by `by` in every face using it.
pub(crate) fn replace_coface(tx: &mut EditTx<'_>, old: CoFaceId, by: &[CoFaceId]) {
    for f in tx.graph().coface_faces(old) {
        tx.update(f, |p| {
            let mut cofaces = Vec::with_capacity(p.cofaces.len() + by.len());
            for &cf in &p.cofaces {
                let news: &[CoFaceId] = if cf == old { by } else { std::slice::from_ref(&cf) };
                for &n in news {
                    if !cofaces.contains(&n) {
                        cofaces.push(n);
                    }
                }
            }
            p.cofaces = cofaces;
        });
    }
}

// ---- splitting ---------------------------------------------------------------

/// Node `t` of a coedge (counted from `vertices[0]`), projected on the
/// coedge's geometry when it has one.
pub(crate) fn coedge_node(tx: &EditTx<'_>, ce: CoEdgeId, t: u32) -> Result<Point, TopoError> {
    let g = tx.graph();
    let props = g.coedge(ce);
    let params = props.discretization.parameters();
    let a = g.vertex(props.vertices[0]).coord;
    let b = g.vertex(props.vertices[1]).coord;
    let p = a.lerp(b, params[t as usize]);
    match props.geom {
        Some(geom) => tx.project(geom, p, g.name(ce)),
        None => Ok(p),
    }
}

/// Cuts `ce` at node `t` (from `vertices[0]`, `0 < t < nb_edges`). The two
/// halves replace it everywhere.
pub(crate) fn split_coedge(
    tx: &mut EditTx<'_>,
    ce: CoEdgeId,
    t: u32,
) -> Result<(VertexId, CoEdgeId, CoEdgeId), TopoError> {
    let props = tx.graph().coedge(ce).clone();
    let n = props.nb_edges();
    if t == 0 || t >= n {
        return Err(TopoError::CutOnBorder {
            kind: EntityKind::CoEdge,
            name: tx.graph().name(ce).to_owned(),
        });
    }
    let p = coedge_node(tx, ce, t)?;
    let v = new_vertex(tx, p, props.geom);
    let first = new_coedge(tx, props.vertices[0], v, props.discretization.with_nb_edges(t), props.geom);
    let second =
        new_coedge(tx, v, props.vertices[1], props.discretization.with_nb_edges(n - t), props.geom);
    replace_coedge(tx, ce, &[first, second])?;
    tx.destroy(ce);
    trace!("split coedge `{}` at {t}/{n}", tx.graph().name(ce));
    Ok((v, first, second))
}

/// Vertex at segment offset `offset` along edge `e` walked from `from`,
/// splitting a coedge when the offset falls inside one.
pub(crate) fn ensure_vertex_on_edge(
    tx: &mut EditTx<'_>,
    e: EdgeId,
    from: VertexId,
    offset: u32,
) -> Result<VertexId, TopoError> {
    if offset == 0 {
        return Ok(from);
    }
    let chain = tx.graph().edge_walk(e, from)?;
    let mut acc = 0;
    for step in chain {
        let props = tx.graph().coedge(step.coedge);
        let n = props.nb_edges();
        if offset == acc + n {
            return Ok(step.to);
        }
        if offset < acc + n {
            let local = offset - acc;
            let t = if step.from == props.vertices[0] { local } else { n - local };
            return split_coedge(tx, step.coedge, t).map(|(v, _, _)| v);
        }
        acc += n;
    }
    Err(topology(format!(
        "offset {offset} is beyond edge {} ({acc} segments)",
        tx.graph().name(e)
    )))
}

/// Same as [`ensure_vertex_on_edge`] on a chain of coedges.
pub(crate) fn ensure_vertex_on_chain(
    tx: &mut EditTx<'_>,
    chain: &Chain,
    offset: u32,
) -> Result<VertexId, TopoError> {
    let Some(first) = chain.first() else {
        return Err(topology("cannot place a vertex on an empty chain"));
    };
    if offset == 0 {
        return Ok(first.from);
    }
    let mut acc = 0;
    for step in chain {
        let props = tx.graph().coedge(step.coedge);
        let n = props.nb_edges();
        if offset == acc + n {
            return Ok(step.to);
        }
        if offset < acc + n {
            let local = offset - acc;
            let t = if step.from == props.vertices[0] { local } else { n - local };
            return split_coedge(tx, step.coedge, t).map(|(v, _, _)| v);
        }
        acc += n;
    }
    Err(topology(format!("offset {offset} is beyond a chain of {acc} segments")))
}

pub(crate) fn rotate_face_law(law: FaceLaw, by: usize) -> FaceLaw {
    let turn = |dir: u8| ((dir as usize + by) % 2) as u8;
    match law {
        FaceLaw::Transfinite => FaceLaw::Transfinite,
        FaceLaw::Directional { dir } => FaceLaw::Directional { dir: turn(dir) },
        FaceLaw::Orthogonal { dir, nb_layers } => FaceLaw::Orthogonal { dir: turn(dir), nb_layers },
    }
}

/// Result of cutting a coface in two.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CofaceCut {
    /// Part holding `vertices[j]` of the original coface.
    pub low: CoFaceId,
    pub high: CoFaceId,
    pub coedge: CoEdgeId,
    /// Cut vertex on side `j`.
    pub from: VertexId,
    /// Cut vertex on side `j + 2`.
    pub to: VertexId,
}

/// Cuts a structured quadrangle from side `j` to side `j + 2`, at segment
/// offset `o` from `vertices[j]` (and from `vertices[j + 3]` on the other
/// side). The two halves replace it in every face.
pub(crate) fn cut_coface(tx: &mut EditTx<'_>, cf: CoFaceId, j: usize, o: u32) -> Result<CofaceCut, TopoError> {
    let props = tx.graph().coface(cf).clone();
    let name = tx.graph().name(cf).to_owned();
    if props.nb_sides() != 4 {
        return Err(topology(format!("coface {name} is not a quadrangle and cannot be cut")));
    }
    let v = |k: usize| props.vertices[k % 4];
    let e = |k: usize| props.edges[k % 4];
    let len = tx.graph().edge_length(e(j));
    if o == 0 || o >= len {
        return Err(TopoError::CutOnBorder { kind: EntityKind::CoFace, name });
    }

    let x = ensure_vertex_on_edge(tx, e(j), v(j), o)?;
    let y = ensure_vertex_on_edge(tx, e(j + 2), v(j + 3), o)?;
    let nb = tx.graph().edge_length(e(j + 1));

    let chain_j = tx.graph().edge_walk(e(j), v(j))?;
    let chain_y = tx.graph().edge_walk(e(j + 2), v(j + 3))?;
    let split_at = |chain: &Chain, at: VertexId| -> Result<(Chain, Chain), TopoError> {
        let idx = chain
            .iter()
            .position(|s| s.to == at)
            .ok_or_else(|| topology(format!("cut vertex missing on a side of coface {name}")))?;
        Ok((chain[..=idx].to_vec(), chain[idx + 1..].to_vec()))
    };
    let (low_j, high_j) = split_at(&chain_j, x)?;
    let (low_y, high_y) = split_at(&chain_y, y)?;

    let cut = new_coedge(tx, x, y, Discretization::uniform(nb), props.geom);
    let e_low_j = edge_from_chain(tx, &low_j)?;
    let e_high_j = edge_from_chain(tx, &high_j)?;
    let e_low_y = edge_from_chain(tx, &low_y)?;
    let e_high_y = edge_from_chain(tx, &high_y)?;
    let e_cut_low = new_edge(tx, x, y, vec![cut]);
    let e_cut_high = new_edge(tx, x, y, vec![cut]);

    let law = rotate_face_law(props.law, j);
    let low: CoFaceId = tx.create(CoFaceProps {
        vertices: vec![v(j), x, y, v(j + 3)],
        edges: vec![e_low_j, e_cut_low, e_low_y, e(j + 3)],
        structured: props.structured,
        law,
        geom: props.geom,
    });
    let high: CoFaceId = tx.create(CoFaceProps {
        vertices: vec![x, v(j + 1), v(j + 2), y],
        edges: vec![e_high_j, e(j + 1), e_high_y, e_cut_high],
        structured: props.structured,
        law,
        geom: props.geom,
    });
    replace_coface(tx, cf, &[low, high]);
    tx.destroy(cf);
    for k in [j, j + 2] {
        if tx.graph().is_edge_unused(e(k)) {
            tx.destroy(e(k));
        }
    }
    trace!("cut coface `{}` from side {j} at {o}", tx.graph().name(cf));
    Ok(CofaceCut { low, high, coedge: cut, from: x, to: y })
}

// ---- release ------------------------------------------------------------------

/// Destroys a coedge nothing uses, then its vertices if they became unused.
pub(crate) fn release_coedge(tx: &mut EditTx<'_>, ce: CoEdgeId) {
    if !tx.graph().is_live(ce) || !tx.graph().is_coedge_unused(ce) {
        return;
    }
    let vertices = tx.graph().coedge(ce).vertices;
    tx.destroy(ce);
    for v in vertices {
        release_vertex(tx, v);
    }
}

pub(crate) fn release_vertex(tx: &mut EditTx<'_>, v: VertexId) {
    if tx.graph().is_live(v) && tx.graph().is_vertex_unused(v) {
        tx.destroy(v);
    }
}

pub(crate) fn release_edge(tx: &mut EditTx<'_>, e: EdgeId) {
    if !tx.graph().is_live(e) || !tx.graph().is_edge_unused(e) {
        return;
    }
    let coedges = tx.graph().edge(e).coedges.clone();
    tx.destroy(e);
    for ce in coedges {
        release_coedge(tx, ce);
    }
}

pub(crate) fn release_coface(tx: &mut EditTx<'_>, cf: CoFaceId) {
    if !tx.graph().is_live(cf) || !tx.graph().is_coface_unused(cf) {
        return;
    }
    let props = tx.graph().coface(cf).clone();
    tx.destroy(cf);
    for e in props.edges {
        release_edge(tx, e);
    }
    for v in props.vertices {
        release_vertex(tx, v);
    }
}

pub(crate) fn release_face(tx: &mut EditTx<'_>, f: FaceId) {
    if !tx.graph().is_live(f) || !tx.graph().is_face_unused(f) {
        return;
    }
    let cofaces = tx.graph().face(f).cofaces.clone();
    tx.destroy(f);
    for cf in cofaces {
        release_coface(tx, cf);
    }
}

/// Destroys a block with whatever below it is no longer used.
pub(crate) fn release_block(tx: &mut EditTx<'_>, b: BlockId) {
    if !tx.graph().is_live(b) {
        return;
    }
    let props = tx.graph().block(b).clone();
    tx.destroy(b);
    for f in props.faces {
        release_face(tx, f);
    }
    for v in props.vertices {
        release_vertex(tx, v);
    }
}
