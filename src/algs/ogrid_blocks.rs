//! O-grid split of a block selection.
//!
//! Every outline unit of the selection (a boundary coface, or a boundary
//! face when internal vertices are not created) gets a shell block between
//! itself and an inner copy; the selected blocks are rebuilt on the inner
//! copies. With `ratio` the fraction of the distance from a placement center
//! at which the inner copy of a vertex is put and `nb_bras` the segment count
//! of the radial coedges.

use crate::algs::edit::{new_block, release_block};
use crate::algs::nb_edges::rebalance;
use crate::algs::ogrid::{OgridFilter, OgridTag, ShellBuilder, cofaces_around, ogrid_point};
use crate::algs::{require_live, require_ratio, require_structured_block, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::kernel::GeomRef;
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, topology};
use crate::topology::entity::BlockLaw;
use crate::topology::graph::TopoGraph;
use crate::topology::id::{BlockId, CoFaceId, FaceId, VertexId};
use crate::topology::traverse::Chain;
use log::{debug, trace};
use serde_json::json;
use std::collections::BTreeMap;

/// Outer part of a shell block: four corners in cycle, the chains joining
/// them and the cofaces covering them.
struct Unit {
    corners: [VertexId; 4],
    sides: [Chain; 4],
    cofaces: Vec<CoFaceId>,
    owner: Option<BlockId>,
    face: Option<FaceId>,
}

/// Face slot of the shell block holding side `k` of its unit.
const SIDE_SLOT: [usize; 4] = [0, 2, 1, 3];

/// Splits blocks with an O-grid.
#[derive(Clone, Debug)]
pub struct SplitBlocksWithOgrid {
    blocks: Vec<BlockId>,
    cofaces: Vec<CoFaceId>,
    ratio: f64,
    nb_bras: u32,
    internal_vertices: bool,
    propagate: bool,
}

impl SplitBlocksWithOgrid {
    /// `cofaces` are the open outline cofaces; `ratio` must be in `(0, 1)`.
    pub fn new(
        graph: &TopoGraph,
        blocks: &[BlockId],
        cofaces: &[CoFaceId],
        ratio: f64,
        nb_bras: u32,
    ) -> Result<Self, TopoError> {
        require_ratio(ratio, true)?;
        if nb_bras == 0 {
            return Err(TopoError::InvalidCount { what: "segments across the o-grid", value: 0 });
        }
        let blocks = selection(blocks, "blocks to split with an o-grid")?;
        for &b in &blocks {
            require_structured_block(graph, b)?;
        }
        for &cf in cofaces {
            require_live(graph, cf)?;
        }
        let mut open = cofaces.to_vec();
        open.sort_unstable();
        open.dedup();
        Ok(SplitBlocksWithOgrid {
            blocks,
            cofaces: open,
            ratio,
            nb_bras,
            internal_vertices: true,
            propagate: true,
        })
    }

    /// Whether every vertex of a boundary coface gets an inner copy (the
    /// default), or only the corners of boundary faces.
    pub fn create_internal_vertices(mut self, yes: bool) -> Self {
        self.internal_vertices = yes;
        self
    }

    /// Whether an open coface shared with an unselected block pulls that
    /// block into the selection (the default).
    pub fn propagate_neighbor_block(mut self, yes: bool) -> Self {
        self.propagate = yes;
        self
    }

    fn units(&self, graph: &TopoGraph, filter: &OgridFilter) -> Result<Vec<Unit>, TopoError> {
        let owner = |blocks: Vec<BlockId>| blocks.into_iter().find(|&b| filter.block(b).is_some());
        let mut units = Vec::new();
        if self.internal_vertices {
            for cf in filter.cofaces_tagged(OgridTag::Boundary) {
                let props = graph.coface(cf);
                let corners: [VertexId; 4] = props
                    .vertices
                    .clone()
                    .try_into()
                    .map_err(|_| topology(format!("coface {} is not a quadrangle", graph.name(cf))))?;
                let sides = [
                    graph.coface_side(cf, 0)?,
                    graph.coface_side(cf, 1)?,
                    graph.coface_side(cf, 2)?,
                    graph.coface_side(cf, 3)?,
                ];
                units.push(Unit { corners, sides, cofaces: vec![cf], owner: owner(graph.coface_blocks(cf)), face: None });
            }
        } else {
            let faces: Vec<FaceId> = filter
                .selected_blocks()
                .into_iter()
                .flat_map(|b| graph.block(b).faces.clone())
                .filter(|&f| filter.face(f) == Some(OgridTag::Boundary))
                .collect();
            for f in faces {
                let props = graph.face(f);
                let corners: [VertexId; 4] = props
                    .vertices
                    .clone()
                    .try_into()
                    .map_err(|_| topology(format!("face {} is not a quadrangle", graph.name(f))))?;
                let side = |k: usize| graph.face_side_chain(f, corners[k], corners[(k + 1) % 4]);
                let sides = [side(0)?, side(1)?, side(2)?, side(3)?];
                let on_sides: Vec<VertexId> = sides.iter().flatten().flat_map(|s| [s.from, s.to]).collect();
                let interior = props
                    .cofaces
                    .iter()
                    .flat_map(|&cf| graph.coface_all_vertices(cf))
                    .find(|v| !on_sides.contains(v) && filter.vertex(*v) == Some(OgridTag::Boundary));
                if let Some(v) = interior {
                    return Err(topology(format!(
                        "vertex {} inside face {} would need an inner copy",
                        graph.name(v),
                        graph.name(f)
                    )));
                }
                units.push(Unit {
                    corners,
                    sides,
                    cofaces: props.cofaces.clone(),
                    owner: owner(graph.face_blocks(f)),
                    face: Some(f),
                });
            }
        }
        Ok(units)
    }
}

fn block_center(graph: &TopoGraph, b: BlockId) -> Option<Point> {
    Point::barycenter(graph.block(b).vertices.iter().map(|&v| graph.vertex(v).coord))
}

/// Center toward which the inner copy of `v` is placed, and the geometry
/// the copy lies on.
fn placement(graph: &TopoGraph, filter: &OgridFilter, v: VertexId) -> Result<(Point, Option<GeomRef>), TopoError> {
    let around = cofaces_around(graph, v);
    let inside: Vec<CoFaceId> =
        around.iter().copied().filter(|&cf| filter.coface(cf) == Some(OgridTag::Inside)).collect();
    let outside = around.iter().filter(|&&cf| filter.coface(cf) == Some(OgridTag::Boundary)).count();
    let holder = filter
        .selected_blocks()
        .into_iter()
        .find(|&b| graph.block_all_vertices(b).contains(&v))
        .ok_or_else(|| topology(format!("vertex {} is in no selected block", graph.name(v))))?;
    let in_holder = || {
        block_center(graph, holder)
            .map(|c| (c, None::<GeomRef>))
            .ok_or_else(|| topology(format!("block {} has no vertex", graph.name(holder))))
    };
    let along_coedge = || {
        let coedge = graph
            .vertex_coedges(v)
            .into_iter()
            .find(|&ce| filter.coedge(ce) == Some(OgridTag::Inside));
        match coedge {
            Some(ce) => {
                let props = graph.coedge(ce);
                let [a, b] = props.vertices;
                Ok((graph.vertex(a).coord.lerp(graph.vertex(b).coord, 0.5), props.geom))
            }
            None => in_holder(),
        }
    };
    match inside.as_slice() {
        [] => in_holder(),
        [cf] => {
            let props = graph.coface(*cf);
            let c = Point::barycenter(props.vertices.iter().map(|&u| graph.vertex(u).coord))
                .ok_or_else(|| topology(format!("coface {} has no vertex", graph.name(*cf))))?;
            Ok((c, props.geom))
        }
        [a, b] if outside != 1 => {
            let common = graph
                .coface_blocks(*a)
                .into_iter()
                .find(|blk| filter.block(*blk).is_some() && graph.coface_blocks(*b).contains(blk));
            match common.and_then(|blk| block_center(graph, blk)) {
                Some(c) => Ok((c, None)),
                None => along_coedge(),
            }
        }
        _ => along_coedge(),
    }
}

impl TopoCommand for SplitBlocksWithOgrid {
    fn name(&self) -> &'static str {
        "SplitBlocksWithOgrid"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        *self = SplitBlocksWithOgrid::new(graph, &self.blocks, &self.cofaces, self.ratio, self.nb_bras)?
            .create_internal_vertices(self.internal_vertices)
            .propagate_neighbor_block(self.propagate);
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let filter =
            OgridFilter::for_blocks(tx.graph(), &self.blocks, &self.cofaces, self.internal_vertices, self.propagate)?;
        let units = self.units(tx.graph(), &filter)?;

        let mut placements = Vec::new();
        for v in filter.vertices_tagged(OgridTag::Boundary) {
            let (c, geom) = placement(tx.graph(), &filter, v)?;
            placements.push((v, ogrid_point(c, tx.graph().vertex(v).coord, self.ratio), geom));
        }
        let mut shell = ShellBuilder::new(self.nb_bras);
        for (v, p, geom) in placements {
            shell.place(tx, v, p, geom);
        }

        let mut face_mirrors: BTreeMap<FaceId, CoFaceId> = BTreeMap::new();
        let mut nb_shells = 0;
        for unit in &units {
            let [c0, c1, c2, c3] = unit.corners;
            let inner = match unit.face {
                Some(f) => {
                    let m = shell.mirror_outline(tx, &filter, unit.corners, &unit.sides)?;
                    face_mirrors.insert(f, m);
                    m
                }
                None => shell.mirror(tx, &filter, unit.cofaces[0])?,
            };
            let mut slots: [Vec<CoFaceId>; 6] = Default::default();
            slots[4] = unit.cofaces.clone();
            slots[5] = vec![inner];
            for (k, side) in unit.sides.iter().enumerate() {
                for piece in ShellBuilder::segments(&filter, side) {
                    let ring = shell.ring(tx, &filter, &piece)?;
                    slots[SIDE_SLOT[k]].push(ring);
                }
            }
            let vertices = [c1, c2, c0, c3, shell.inner(c1), shell.inner(c2), shell.inner(c0), shell.inner(c3)];
            let geom = unit.owner.and_then(|b| tx.graph().block(b).geom);
            let b = new_block(tx, vertices, slots, BlockLaw::Transfinite, geom);
            trace!("o-grid shell block `{}`", tx.graph().name(b));
            nb_shells += 1;
        }

        let rebuilt: Vec<BlockId> = filter
            .selected_blocks()
            .into_iter()
            .filter(|&b| matches!(filter.block(b), Some(OgridTag::Boundary | OgridTag::Inside)))
            .collect();
        for &b in &rebuilt {
            let props = tx.graph().block(b).clone();
            let mut slots: [Vec<CoFaceId>; 6] = Default::default();
            for (slot, &f) in props.faces.iter().enumerate() {
                if let Some(&m) = face_mirrors.get(&f) {
                    slots[slot] = vec![m];
                    continue;
                }
                for cf in tx.graph().face(f).cofaces.clone() {
                    slots[slot].push(shell.mirror(tx, &filter, cf)?);
                }
            }
            let corners: Vec<VertexId> = props.vertices.iter().map(|&v| shell.inner(v)).collect();
            let vertices: [VertexId; 8] = corners
                .try_into()
                .map_err(|_| topology(format!("block {} has no 8 corners", tx.graph().name(b))))?;
            new_block(tx, vertices, slots, props.law, props.geom);
        }
        for &b in &rebuilt {
            release_block(tx, b);
        }
        let created = shell.created_cofaces().to_vec();
        rebalance(tx, &created)?;
        debug!(
            "o-grid: {} inner vertices, {nb_shells} shell blocks, {} blocks rebuilt",
            shell.nb_inner_vertices(),
            rebuilt.len()
        );
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        let mut entities = names(graph, &self.blocks);
        entities.extend(names(graph, &self.cofaces));
        CommandTrace {
            entities,
            parameters: json!({
                "ratio": self.ratio,
                "nb_bras": self.nb_bras,
                "create_internal_vertices": self.internal_vertices,
                "propagate_neighbor_block": self.propagate,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::{NewBlock, NewBlockGrid};
    use crate::command::Session;
    use crate::debug_invariants::DebugInvariants;
    use crate::topology::id::EntityKind;

    fn cube(nb: u32) -> Session {
        let mut s = Session::default();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [nb; 3]).unwrap()).unwrap();
        s
    }

    fn vertex_at(g: &TopoGraph, p: Point) -> VertexId {
        g.live_vertices().into_iter().find(|&v| g.vertex(v).coord.is_near(p, 1e-9)).unwrap()
    }

    #[test]
    fn single_block_gets_six_shells() {
        let mut s = cube(4);
        let b = s.graph().live_blocks()[0];
        let report = s.execute(SplitBlocksWithOgrid::new(s.graph(), &[b], &[], 0.3, 3).unwrap()).unwrap();
        assert_eq!(report.nb_created(EntityKind::Vertex), 8);
        assert_eq!(report.nb_created(EntityKind::CoEdge), 20);
        assert_eq!(report.created_blocks().len(), 7);
        let g = s.graph();
        assert_eq!(g.nb_blocks(), 7);
        assert_eq!(g.nb_cofaces(), 24);
        assert!(!g.is_live(b));
        vertex_at(g, Point::new(0.35, 0.35, 0.35));
        vertex_at(g, Point::new(0.65, 0.65, 0.65));
        let radial = g.live_coedges().into_iter().filter(|&ce| g.coedge(ce).nb_edges() == 3).count();
        assert_eq!(radial, 8);
        for b in g.live_blocks() {
            for dir in 0..3 {
                let n = g.block_nb_edges(b, dir).unwrap();
                assert!(n == 3 || n == 4);
            }
        }
        g.validate_invariants().unwrap();
    }

    #[test]
    fn open_coface_stays_flat() {
        let mut s = cube(2);
        let g = s.graph();
        let b = g.live_blocks()[0];
        let top = g
            .block_cofaces(b)
            .into_iter()
            .find(|&cf| g.coface(cf).vertices.iter().all(|&v| g.vertex(v).coord.z == 1.0))
            .unwrap();
        let report = s.execute(SplitBlocksWithOgrid::new(s.graph(), &[b], &[top], 0.5, 2).unwrap()).unwrap();
        assert_eq!(report.created_blocks().len(), 6);
        let g = s.graph();
        assert!(!g.is_live(top));
        let on_top = report
            .created_vertices()
            .into_iter()
            .filter(|&v| g.vertex(v).coord.z == 1.0)
            .count();
        assert_eq!(on_top, 4);
        vertex_at(g, Point::new(0.25, 0.25, 1.0));
        vertex_at(g, Point::new(0.25, 0.25, 0.25));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn two_blocks_share_the_inner_copy() {
        let mut s = Session::default();
        s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2]).unwrap())
            .unwrap();
        let blocks = s.graph().live_blocks();
        let report = s.execute(SplitBlocksWithOgrid::new(s.graph(), &blocks, &[], 0.5, 1).unwrap()).unwrap();
        assert_eq!(report.created_blocks().len(), 12);
        assert_eq!(report.nb_created(EntityKind::Vertex), 12);
        let g = s.graph();
        // the corner on the shared face moves toward its center, in its plane
        vertex_at(g, Point::new(1.0, 0.25, 0.25));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn face_mode_without_inner_coedges_matches_coface_mode() {
        let mut s = cube(2);
        let b = s.graph().live_blocks()[0];
        let cmd = SplitBlocksWithOgrid::new(s.graph(), &[b], &[], 0.5, 2).unwrap().create_internal_vertices(false);
        let report = s.execute(cmd).unwrap();
        assert_eq!(report.created_blocks().len(), 7);
        s.graph().validate_invariants().unwrap();
    }

    #[test]
    fn ratio_must_be_strictly_inside() {
        let s = cube(1);
        let b = s.graph().live_blocks()[0];
        for ratio in [0.0, 1.0, -0.5] {
            let e = SplitBlocksWithOgrid::new(s.graph(), &[b], &[], ratio, 1).unwrap_err();
            assert!(matches!(e, TopoError::RatioOutOfRange { .. }));
        }
        let e = SplitBlocksWithOgrid::new(s.graph(), &[b], &[], 0.5, 0).unwrap_err();
        assert!(e.is_precondition());
    }

    #[test]
    fn undo_restores_the_block() {
        let mut s = cube(2);
        let before = s.graph().snapshot();
        let b = s.graph().live_blocks()[0];
        s.execute(SplitBlocksWithOgrid::new(s.graph(), &[b], &[], 0.5, 2).unwrap()).unwrap();
        s.undo().unwrap();
        assert_eq!(s.graph().snapshot(), before);
    }
}
