//! Fusion of blocks and vertices, and gluing of coincident block faces.

use crate::algs::edit::{new_block, release_block, release_coface, replace_coedge, replace_coface};
use crate::algs::{require_live, require_structured_block};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, invalid_argument, topology};
use crate::topology::graph::TopoGraph;
use crate::topology::hexa;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};
use itertools::Itertools;
use log::{debug, trace};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

// ---- vertex merge ---------------------------------------------------------------

/// Redirects every reference to `drop` toward `keep`, destroys `drop`, then
/// merges the coedges of `keep` that became parallel.
pub(crate) fn merge_vertex(tx: &mut EditTx<'_>, keep: VertexId, drop: VertexId) -> Result<(), TopoError> {
    if keep == drop {
        return Ok(());
    }
    let swap = |v: &mut VertexId| {
        if *v == drop {
            *v = keep;
        }
    };
    let g = tx.graph();
    let coedges = g.vertex_coedges(drop);
    let edges: BTreeSet<EdgeId> = coedges
        .iter()
        .flat_map(|&ce| g.coedge_edges(ce))
        .filter(|&e| g.edge(e).vertices.contains(&drop))
        .collect();
    let cofaces = g.vertex_cofaces(drop);
    let blocks = g.vertex_blocks(drop);
    let faces: BTreeSet<FaceId> = blocks
        .iter()
        .flat_map(|&b| g.block(b).faces.clone())
        .filter(|&f| g.face(f).vertices.contains(&drop))
        .collect();

    for ce in coedges {
        if tx.graph().coedge(ce).vertices.contains(&keep) {
            return Err(topology(format!(
                "merging {} into {} would collapse coedge {}",
                tx.graph().name(drop),
                tx.graph().name(keep),
                tx.graph().name(ce)
            )));
        }
        tx.update(ce, |p| p.vertices.iter_mut().for_each(swap));
    }
    for e in edges {
        tx.update(e, |p| p.vertices.iter_mut().for_each(swap));
        if tx.graph().edge(e).vertices[0] == tx.graph().edge(e).vertices[1] {
            return Err(topology(format!("merging vertices collapses edge {}", tx.graph().name(e))));
        }
    }
    for cf in cofaces {
        tx.update(cf, |p| p.vertices.iter_mut().for_each(swap));
    }
    for f in faces {
        tx.update(f, |p| p.vertices.iter_mut().for_each(swap));
    }
    for b in blocks {
        tx.update(b, |p| p.vertices.iter_mut().for_each(swap));
    }
    if tx.graph().vertex(keep).geom.is_none() {
        let geom = tx.graph().vertex(drop).geom;
        tx.update(keep, |p| p.geom = geom);
    }
    tx.destroy(drop);
    trace!("merged vertex `{}` into `{}`", tx.graph().name(drop), tx.graph().name(keep));
    merge_parallel_coedges(tx, keep)
}

/// Merges coedges of `v` joining the same pair of vertices; the one with the
/// smallest id is kept.
pub(crate) fn merge_parallel_coedges(tx: &mut EditTx<'_>, v: VertexId) -> Result<(), TopoError> {
    let mut by_end: BTreeMap<VertexId, Vec<CoEdgeId>> = BTreeMap::new();
    for ce in tx.graph().vertex_coedges(v) {
        if let Some(other) = tx.graph().coedge(ce).opposite(v) {
            by_end.entry(other).or_default().push(ce);
        }
    }
    for (_, group) in by_end {
        let Some((&keep, rest)) = group.split_first() else { continue };
        for &ce in rest {
            let (a, b) = (tx.graph().coedge(keep).nb_edges(), tx.graph().coedge(ce).nb_edges());
            if a != b {
                return Err(topology(format!(
                    "coedges {} and {} join the same vertices with {a} and {b} segments",
                    tx.graph().name(keep),
                    tx.graph().name(ce)
                )));
            }
            replace_coedge(tx, ce, &[keep])?;
            let geom = tx.graph().coedge(ce).geom;
            if tx.graph().coedge(keep).geom.is_none() && geom.is_some() {
                tx.update(keep, |p| p.geom = geom);
            }
            tx.destroy(ce);
        }
    }
    Ok(())
}

/// Merges vertex `b` into vertex `a`.
#[derive(Clone, Debug)]
pub struct Fuse2Vertices {
    a: VertexId,
    b: VertexId,
}

impl Fuse2Vertices {
    pub fn new(graph: &TopoGraph, a: VertexId, b: VertexId) -> Result<Self, TopoError> {
        require_live(graph, a)?;
        require_live(graph, b)?;
        if a == b {
            return Err(invalid_argument(format!("cannot fuse {} with itself", graph.name(a))));
        }
        if let Some(ce) = graph.find_coedge(a, b) {
            return Err(invalid_argument(format!(
                "{} and {} are joined by coedge {}",
                graph.name(a),
                graph.name(b),
                graph.name(ce)
            )));
        }
        let in_b = graph.vertex_blocks(b);
        if let Some(blk) = graph.vertex_blocks(a).into_iter().find(|blk| in_b.contains(blk)) {
            return Err(invalid_argument(format!(
                "{} and {} are both corners of block {}",
                graph.name(a),
                graph.name(b),
                graph.name(blk)
            )));
        }
        Ok(Fuse2Vertices { a, b })
    }
}

impl TopoCommand for Fuse2Vertices {
    fn name(&self) -> &'static str {
        "Fuse2Vertices"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = Fuse2Vertices::new(graph, self.a, self.b)?;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        merge_vertex(tx, self.a, self.b)
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace { entities: names(graph, &[self.a, self.b]), parameters: json!({}) }
    }
}

// ---- block fusion --------------------------------------------------------------

fn sorted_corners(graph: &TopoGraph, f: FaceId) -> Vec<VertexId> {
    graph.face(f).vertices.iter().copied().sorted().dedup().collect()
}

/// Face slots of `a` and `b` whose faces have the same corners.
fn common_face(graph: &TopoGraph, a: BlockId, b: BlockId) -> Option<(usize, usize)> {
    let fa = &graph.block(a).faces;
    let fb = &graph.block(b).faces;
    (0..6)
        .cartesian_product(0..6)
        .find(|&(sa, sb)| sorted_corners(graph, fa[sa]) == sorted_corners(graph, fb[sb]))
}

/// Merges two structured blocks sharing a face into one block.
#[derive(Clone, Debug)]
pub struct Fuse2Blocks {
    a: BlockId,
    b: BlockId,
}

impl Fuse2Blocks {
    pub fn new(graph: &TopoGraph, a: BlockId, b: BlockId) -> Result<Self, TopoError> {
        require_structured_block(graph, a)?;
        require_structured_block(graph, b)?;
        if a == b {
            return Err(invalid_argument(format!("cannot fuse {} with itself", graph.name(a))));
        }
        if graph.block(a).geom != graph.block(b).geom {
            return Err(invalid_argument(format!(
                "{} and {} are associated to different volumes",
                graph.name(a),
                graph.name(b)
            )));
        }
        Ok(Fuse2Blocks { a, b })
    }
}

impl TopoCommand for Fuse2Blocks {
    fn name(&self) -> &'static str {
        "Fuse2Blocks"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = Fuse2Blocks::new(graph, self.a, self.b)?;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let (a, b) = (self.a, self.b);
        let g = tx.graph();
        let (sa, sb) = common_face(g, a, b).ok_or_else(|| {
            topology(format!("blocks {} and {} share no face", g.name(a), g.name(b)))
        })?;
        let pa = g.block(a).clone();
        let pb = g.block(b).clone();
        let shared_a: Vec<CoFaceId> = g.face(pa.faces[sa]).cofaces.iter().copied().sorted().collect();
        let shared_b: Vec<CoFaceId> = g.face(pb.faces[sb]).cofaces.iter().copied().sorted().collect();
        if shared_a != shared_b {
            return Err(topology(format!(
                "faces {} and {} have the same corners but different cofaces",
                g.name(pa.faces[sa]),
                g.name(pb.faces[sb])
            )));
        }

        let (da, side_a) = hexa::face_dir_side(sa);
        let (db, _) = hexa::face_dir_side(sb);
        let corner_in_b = |v: VertexId| pb.vertices.iter().position(|&w| w == v);
        let mut vertices: [VertexId; 8] =
            pa.vertices.as_slice().try_into().map_err(|_| topology("block without eight corners"))?;
        for c in hexa::FACE_CORNERS[sa] {
            let cb = corner_in_b(pa.vertices[c]).ok_or_else(|| topology("shared corner missing in the second block"))?;
            vertices[c] = pb.vertices[hexa::flip(cb, db)];
        }

        let mut cofaces: [Vec<CoFaceId>; 6] = Default::default();
        let far_b = hexa::face_index(db, 1 - hexa::face_dir_side(sb).1);
        cofaces[sa] = g.face(pb.faces[far_b]).cofaces.clone();
        cofaces[hexa::face_index(da, 1 - side_a)] = g.face(pa.faces[hexa::face_index(da, 1 - side_a)]).cofaces.clone();
        for slot in (0..6).filter(|&s| hexa::face_dir_side(s).0 != da) {
            let wanted: Vec<VertexId> = hexa::FACE_CORNERS[slot]
                .iter()
                .filter(|&&c| hexa::is_on_face(c, sa))
                .flat_map(|&c| {
                    let v = pa.vertices[c];
                    let far = corner_in_b(v).map(|cb| pb.vertices[hexa::flip(cb, db)]);
                    std::iter::once(v).chain(far)
                })
                .sorted()
                .dedup()
                .collect();
            let tb = (0..6)
                .filter(|&t| hexa::face_dir_side(t).0 != db)
                .find(|&t| sorted_corners(g, pb.faces[t]) == wanted)
                .ok_or_else(|| topology(format!("no face of {} continues slot {slot} of {}", g.name(b), g.name(a))))?;
            let mut list = g.face(pa.faces[slot]).cofaces.clone();
            let extra: Vec<CoFaceId> =
                g.face(pb.faces[tb]).cofaces.iter().copied().filter(|cf| !list.contains(cf)).collect();
            list.extend(extra);
            cofaces[slot] = list;
        }

        let fused = new_block(tx, vertices, cofaces, pa.law, pa.geom);
        release_block(tx, a);
        release_block(tx, b);
        debug!("fused {} and {} into {}", tx.graph().name(a), tx.graph().name(b), tx.graph().name(fused));
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace { entities: names(graph, &[self.a, self.b]), parameters: json!({}) }
    }
}

// ---- gluing ----------------------------------------------------------------------

/// Glues two blocks along a pair of faces whose corners coincide: the
/// vertices, coedges and cofaces of the second face are merged into the
/// first.
#[derive(Clone, Debug)]
pub struct Glue2Blocks {
    a: BlockId,
    b: BlockId,
}

impl Glue2Blocks {
    pub fn new(graph: &TopoGraph, a: BlockId, b: BlockId) -> Result<Self, TopoError> {
        require_structured_block(graph, a)?;
        require_structured_block(graph, b)?;
        if a == b {
            return Err(invalid_argument(format!("cannot glue {} to itself", graph.name(a))));
        }
        Ok(Glue2Blocks { a, b })
    }
}

fn face_points(graph: &TopoGraph, f: FaceId) -> Vec<(VertexId, Point)> {
    graph
        .face_coedges(f)
        .into_iter()
        .flat_map(|ce| graph.coedge(ce).vertices)
        .chain(graph.face(f).vertices.iter().copied())
        .sorted()
        .dedup()
        .map(|v| (v, graph.vertex(v).coord))
        .collect()
}

/// Faces of `a` and `b` whose corners coincide within `tol`.
fn coincident_faces(graph: &TopoGraph, a: BlockId, b: BlockId, tol: f64) -> Option<(FaceId, FaceId)> {
    let corners = |f: FaceId| -> Vec<Point> {
        graph.face(f).vertices.iter().unique().map(|&v| graph.vertex(v).coord).collect()
    };
    for &fa in &graph.block(a).faces {
        let pa = corners(fa);
        for &fb in &graph.block(b).faces {
            let pb = corners(fb);
            if pa.len() == pb.len() && pa.iter().all(|p| pb.iter().any(|q| p.is_near(*q, tol))) {
                return Some((fa, fb));
            }
        }
    }
    None
}

impl TopoCommand for Glue2Blocks {
    fn name(&self) -> &'static str {
        "Glue2Blocks"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = Glue2Blocks::new(graph, self.a, self.b)?;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let tol = tx.config().tolerance;
        let g = tx.graph();
        let (fa, fb) = coincident_faces(g, self.a, self.b, tol).ok_or_else(|| {
            topology(format!(
                "no face of {} coincides with a face of {}",
                g.name(self.a),
                g.name(self.b)
            ))
        })?;
        let targets = face_points(g, fa);
        let mut pairs = Vec::new();
        for (vb, p) in face_points(g, fb) {
            let va = targets
                .iter()
                .find(|(_, q)| p.is_near(*q, tol))
                .map(|&(v, _)| v)
                .ok_or_else(|| {
                    topology(format!("vertex {} of face {} has no counterpart", g.name(vb), g.name(fb)))
                })?;
            pairs.push((va, vb));
        }
        if pairs.len() != targets.len() {
            return Err(topology(format!(
                "faces {} and {} are not discretized alike",
                g.name(fa),
                g.name(fb)
            )));
        }
        for (va, vb) in pairs {
            merge_vertex(tx, va, vb)?;
        }

        // cofaces of the second face now bounded by coedges of the first
        let g = tx.graph();
        let own: Vec<(CoFaceId, Vec<CoEdgeId>)> =
            g.face(fa).cofaces.iter().map(|&cf| (cf, g.coface_coedges(cf))).collect();
        let mut glued = Vec::new();
        for &cf in &g.face(fb).cofaces {
            if own.iter().any(|(c, _)| *c == cf) {
                continue;
            }
            let coedges = g.coface_coedges(cf);
            let twin = own
                .iter()
                .find(|(_, ces)| *ces == coedges)
                .map(|&(c, _)| c)
                .ok_or_else(|| topology(format!("coface {} has no twin on face {}", g.name(cf), g.name(fa))))?;
            glued.push((cf, twin));
        }
        for (cf, twin) in glued {
            replace_coface(tx, cf, &[twin]);
            release_coface(tx, cf);
        }
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace { entities: names(graph, &[self.a, self.b]), parameters: json!({}) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlock, NewBlockGrid};
    use crate::command::Session;
    use crate::debug_invariants::DebugInvariants;
    use crate::topo_error::ErrorCategory;

    fn pair() -> Session {
        let mut s = Session::default();
        s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 3, 4]).unwrap())
            .unwrap();
        s
    }

    #[test]
    fn fused_block_spans_both() {
        let mut s = pair();
        let blocks = s.graph().live_blocks();
        let cmd = Fuse2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap();
        s.execute(cmd).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_blocks(), 1);
        assert!(blocks.iter().all(|&b| !g.is_live(b)));
        let b = g.live_blocks()[0];
        assert_eq!(g.block(b).faces.len(), 6);
        assert_eq!(g.nb_cofaces(), 10);
        assert!(g.live_cofaces().into_iter().all(|cf| !g.coface_faces(cf).is_empty()));
        // side faces hold the cofaces of both blocks
        let sides = g.block(b).faces.iter().filter(|&&f| g.face(f).cofaces.len() == 2).count();
        assert_eq!(sides, 4);
        assert_eq!(g.block_nb_edges(b, 0).unwrap(), 4);
        assert_eq!(g.block_nb_edges(b, 2).unwrap(), 4);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn fuse_needs_a_common_face() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        s.execute(NewBlock::new(Point::new(2.0, 0.0, 0.0), Point::new(3.0, 1.0, 1.0), [1, 1, 1]).unwrap())
            .unwrap();
        let blocks = s.graph().live_blocks();
        let e = s.execute(Fuse2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap()).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Topology);
        assert_eq!(s.graph().nb_blocks(), 2);
    }

    #[test]
    fn vertices_joined_by_a_coedge_are_not_fused() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        let ce = s.graph().live_coedges()[0];
        let [a, b] = s.graph().coedge(ce).vertices;
        let e = Fuse2Vertices::new(s.graph(), a, b).unwrap_err();
        assert!(e.is_precondition());
        assert!(Fuse2Vertices::new(s.graph(), a, a).unwrap_err().is_precondition());
    }

    #[test]
    fn corners_of_one_block_are_not_fused() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        let b = s.graph().live_blocks()[0];
        let corners = s.graph().block(b).vertices.clone();
        let e = Fuse2Vertices::new(s.graph(), corners[0], corners[7]).unwrap_err();
        assert!(e.is_precondition());
        assert!(e.to_string().contains("corners of block"), "{e}");
        assert_eq!(s.graph().block(b).nb_distinct_vertices(), 8);
    }

    #[test]
    fn glue_merges_coincident_faces() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
        s.execute(NewBlock::new(Point::new(1.0, 0.0, 0.0), Point::new(2.0, 1.0, 1.0), [3, 2, 2]).unwrap())
            .unwrap();
        assert_eq!(s.graph().nb_vertices(), 16);
        let blocks = s.graph().live_blocks();
        s.execute(Glue2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_vertices(), 12);
        assert_eq!(g.nb_coedges(), 20);
        assert_eq!(g.nb_cofaces(), 11);
        assert_eq!(g.common_cofaces(blocks[0], blocks[1]).len(), 1);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn glue_rejects_mismatched_discretization() {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
        s.execute(NewBlock::new(Point::new(1.0, 0.0, 0.0), Point::new(2.0, 1.0, 1.0), [2, 3, 2]).unwrap())
            .unwrap();
        let before = s.graph().snapshot();
        let blocks = s.graph().live_blocks();
        let e = s.execute(Glue2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap()).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Topology);
        assert_eq!(s.graph().snapshot(), before);
    }
}
