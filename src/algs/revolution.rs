//! Blocks built by revolving the 2-D topology around the X axis.
//!
//! The cofaces no block uses are copied at each angular station of the
//! [`Portion`] and every sector between two stations becomes a layer of
//! blocks. Vertices on the axis are shared by all the copies; a coface with
//! a side on the axis gives degenerate wedge blocks, unless the side facing
//! the axis belongs to the o-grid trace, in which case one central block
//! spans the whole portion and the trace vertices are pushed outward on the
//! scaled stations.

use crate::algs::edit::{new_block, new_coedge, new_quad, new_triangle, new_vertex, release_coface};
use crate::algs::{require_live, require_ratio};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::kernel::GeomRef;
use crate::geometry::rotation::{Portion, axis_distance, rotate_x, scale_from_axis};
use crate::topo_error::{TopoError, invalid_argument, topology};
use crate::topology::entity::{BlockLaw, Discretization, FaceLaw};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId, EntityKind, VertexId};
use crate::topology::traverse::{Chain, ChainStep, reversed};
use log::{debug, trace};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Face slot of a block holding side `k` of its base quadrangle.
pub(crate) const SIDE_SLOT: [usize; 4] = [0, 2, 1, 3];

/// Block corners of a base quadrangle `q` and its top `t`.
pub(crate) fn hexa_corners(q: [VertexId; 4], t: [VertexId; 4]) -> [VertexId; 8] {
    [q[1], q[2], q[0], q[3], t[1], t[2], t[0], t[3]]
}

/// Revolves the free cofaces of the graph.
#[derive(Clone, Debug)]
pub struct MakeBlocksByRevol {
    cofaces: Vec<CoFaceId>,
    trace: Vec<CoEdgeId>,
    portion: Portion,
    ratio_ogrid: f64,
}

impl MakeBlocksByRevol {
    /// `trace` lists the coedges of the o-grid trace, possibly none;
    /// `ratio_ogrid` in `[0, 1]` sets how far its vertices are pushed toward
    /// the corners of the central blocks.
    pub fn new(graph: &TopoGraph, trace: &[CoEdgeId], portion: Portion, ratio_ogrid: f64) -> Result<Self, TopoError> {
        require_ratio(ratio_ogrid, false)?;
        for &ce in trace {
            require_live(graph, ce)?;
        }
        let cofaces: Vec<CoFaceId> =
            graph.live_cofaces().into_iter().filter(|&cf| graph.coface_blocks(cf).is_empty()).collect();
        if cofaces.is_empty() {
            return Err(TopoError::EmptySelection("cofaces to revolve"));
        }
        for &cf in &cofaces {
            let props = graph.coface(cf);
            if !props.structured || props.nb_sides() != 4 {
                return Err(TopoError::NotStructured {
                    kind: EntityKind::CoFace,
                    name: graph.name(cf).to_owned(),
                });
            }
            for v in graph.coface_all_vertices(cf) {
                let p = graph.vertex(v).coord;
                if p.z.abs() > 1e-9 || p.y < -1e-9 {
                    return Err(invalid_argument(format!(
                        "vertex {} at {p} is not in the half plane z = 0, y >= 0",
                        graph.name(v)
                    )));
                }
            }
        }
        let mut trace = trace.to_vec();
        trace.sort_unstable();
        trace.dedup();
        Ok(MakeBlocksByRevol { cofaces, trace, portion, ratio_ogrid })
    }
}

/// Role of a coface in the revolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Ring,
    /// A side lies on the axis.
    Wedge,
    /// Side `axis` lies on the axis and the facing side on the trace.
    Central { axis: usize },
}

/// Copies of the 2-D entities at each station and the swept entities of
/// each sector.
struct Sweep {
    portion: Portion,
    stations: Vec<f64>,
    tol: f64,
    scale: f64,
    base: u32,
    trace_vertices: BTreeSet<VertexId>,
    vertices: BTreeMap<(VertexId, usize), VertexId>,
    coedges: BTreeMap<(CoEdgeId, usize), CoEdgeId>,
    cofaces: BTreeMap<(CoFaceId, usize), CoFaceId>,
    angular: BTreeMap<(VertexId, usize), CoEdgeId>,
    swept: BTreeMap<(CoEdgeId, usize), Option<CoFaceId>>,
    sections: BTreeMap<(VertexId, VertexId), CoFaceId>,
}

impl Sweep {
    fn on_axis(&self, graph: &TopoGraph, v: VertexId) -> bool {
        axis_distance(graph.vertex(v).coord) <= self.tol
    }

    fn next(&self, station: usize) -> usize {
        (station + 1) % self.stations.len()
    }

    fn swept_geom(&self, tx: &EditTx<'_>, geom: Option<GeomRef>) -> Option<GeomRef> {
        geom.and_then(|g| tx.geom().swept(g, self.portion))
    }

    fn vertex(&mut self, tx: &mut EditTx<'_>, v: VertexId, k: usize) -> VertexId {
        if self.on_axis(tx.graph(), v) {
            return v;
        }
        let scaled = self.trace_vertices.contains(&v) && self.portion.is_scaled_station(k);
        if self.stations[k] == 0.0 && !scaled {
            return v;
        }
        if let Some(&copy) = self.vertices.get(&(v, k)) {
            return copy;
        }
        let props = tx.graph().vertex(v).clone();
        let mut p = props.coord;
        if scaled {
            p = scale_from_axis(p, self.scale);
        }
        let geom = self.swept_geom(tx, props.geom);
        let copy = new_vertex(tx, rotate_x(p, self.stations[k]), geom);
        self.vertices.insert((v, k), copy);
        copy
    }

    fn coedge(&mut self, tx: &mut EditTx<'_>, ce: CoEdgeId, k: usize) -> CoEdgeId {
        if let Some(&copy) = self.coedges.get(&(ce, k)) {
            return copy;
        }
        let props = tx.graph().coedge(ce).clone();
        let [a, b] = props.vertices;
        let (ak, bk) = (self.vertex(tx, a, k), self.vertex(tx, b, k));
        let copy = if ak == a && bk == b {
            ce
        } else {
            let geom = self.swept_geom(tx, props.geom);
            new_coedge(tx, ak, bk, props.discretization, geom)
        };
        self.coedges.insert((ce, k), copy);
        copy
    }

    fn chain(&mut self, tx: &mut EditTx<'_>, chain: &[ChainStep], k: usize) -> Chain {
        chain
            .iter()
            .map(|s| ChainStep {
                coedge: self.coedge(tx, s.coedge, k),
                from: self.vertex(tx, s.from, k),
                to: self.vertex(tx, s.to, k),
            })
            .collect()
    }

    fn coface(&mut self, tx: &mut EditTx<'_>, cf: CoFaceId, k: usize) -> Result<CoFaceId, TopoError> {
        if let Some(&copy) = self.cofaces.get(&(cf, k)) {
            return Ok(copy);
        }
        let props = tx.graph().coface(cf).clone();
        let mut sides = Vec::with_capacity(4);
        let mut unchanged = true;
        for j in 0..4 {
            let side = tx.graph().coface_side(cf, j)?;
            let copy = self.chain(tx, &side, k);
            unchanged &= side.iter().zip(&copy).all(|(a, b)| a.coedge == b.coedge);
            sides.push(copy);
        }
        let corners = [0, 1, 2, 3].map(|j| self.vertex(tx, props.vertices[j], k));
        let copy = if unchanged {
            cf
        } else {
            let geom = self.swept_geom(tx, props.geom);
            new_quad(tx, corners, [&sides[0], &sides[1], &sides[2], &sides[3]], props.law, geom)?
        };
        self.cofaces.insert((cf, k), copy);
        Ok(copy)
    }

    /// Coedge from the copy of `v` at station `k` to the next station.
    fn angular(&mut self, tx: &mut EditTx<'_>, v: VertexId, k: usize) -> ChainStep {
        let k1 = self.next(k);
        let (from, to) = (self.vertex(tx, v, k), self.vertex(tx, v, k1));
        let coedge = match self.angular.get(&(v, k)) {
            Some(&ce) => ce,
            None => {
                let nb = self.portion.sector_factors()[k] * self.base;
                let geom = self.swept_geom(tx, tx.graph().vertex(v).geom);
                let ce = new_coedge(tx, from, to, Discretization::uniform(nb), geom);
                self.angular.insert((v, k), ce);
                ce
            }
        };
        ChainStep { coedge, from, to }
    }

    /// Surface swept by a coedge through sector `k`; nothing for a coedge on
    /// the axis, a triangle when one end is on it.
    fn swept(&mut self, tx: &mut EditTx<'_>, ce: CoEdgeId, k: usize) -> Result<Option<CoFaceId>, TopoError> {
        if let Some(&cf) = self.swept.get(&(ce, k)) {
            return Ok(cf);
        }
        let k1 = self.next(k);
        let props = tx.graph().coedge(ce).clone();
        let [a, b] = props.vertices;
        let geom = self.swept_geom(tx, props.geom);
        let here = ChainStep { coedge: self.coedge(tx, ce, k), from: self.vertex(tx, a, k), to: self.vertex(tx, b, k) };
        let there = ChainStep { coedge: self.coedge(tx, ce, k1), from: self.vertex(tx, a, k1), to: self.vertex(tx, b, k1) };
        let cf = match (self.on_axis(tx.graph(), a), self.on_axis(tx.graph(), b)) {
            (true, true) => None,
            (true, false) => {
                let turn = self.angular(tx, b, k);
                Some(new_triangle(tx, [a, here.to, there.to], [&vec![here], &vec![turn], &reversed(&[there])], geom)?)
            }
            (false, true) => {
                let turn = self.angular(tx, a, k);
                Some(new_triangle(
                    tx,
                    [b, there.from, here.from],
                    [&reversed(&[there]), &reversed(&[turn]), &vec![here]],
                    geom,
                )?)
            }
            (false, false) => {
                let (ta, tb) = (self.angular(tx, a, k), self.angular(tx, b, k));
                Some(new_quad(
                    tx,
                    [here.from, here.to, there.to, there.from],
                    [&vec![here], &vec![tb], &reversed(&[there]), &reversed(&[ta])],
                    FaceLaw::Transfinite,
                    geom,
                )?)
            }
        };
        self.swept.insert((ce, k), cf);
        Ok(cf)
    }

    fn swept_chain(&mut self, tx: &mut EditTx<'_>, chain: &[ChainStep], k: usize) -> Result<Vec<CoFaceId>, TopoError> {
        let mut out = Vec::new();
        for step in chain {
            out.extend(self.swept(tx, step.coedge, k)?);
        }
        Ok(out)
    }

    /// Layer of `cf` between station `k` and the next one.
    fn sweep_coface(&mut self, tx: &mut EditTx<'_>, cf: CoFaceId, k: usize) -> Result<(), TopoError> {
        let k1 = self.next(k);
        let props = tx.graph().coface(cf).clone();
        let base = [0, 1, 2, 3].map(|j| self.vertex(tx, props.vertices[j], k));
        let top = [0, 1, 2, 3].map(|j| self.vertex(tx, props.vertices[j], k1));
        let mut slots: [Vec<CoFaceId>; 6] = Default::default();
        slots[4] = vec![self.coface(tx, cf, k)?];
        slots[5] = vec![self.coface(tx, cf, k1)?];
        for j in 0..4 {
            let side = tx.graph().coface_side(cf, j)?;
            slots[SIDE_SLOT[j]] = self.swept_chain(tx, &side, k)?;
        }
        let geom = self.swept_geom(tx, props.geom);
        let b = new_block(tx, hexa_corners(base, top), slots, BlockLaw::Transfinite, geom);
        trace!("block `{}` sweeps `{}` through sector {k}", tx.graph().name(b), tx.graph().name(cf));
        Ok(())
    }

    /// Cross section of the central blocks through the radial chain `radial`
    /// joining axis vertex `x` to trace vertex `t`: corners and side chains.
    fn section(
        &mut self,
        tx: &mut EditTx<'_>,
        x: VertexId,
        t: VertexId,
        radial: &[ChainStep],
    ) -> Result<([VertexId; 4], [Chain; 4]), TopoError> {
        let n = self.stations.len();
        let points: Vec<VertexId> = (0..n).map(|k| self.vertex(tx, t, k)).collect();
        if n == 3 {
            let r0 = self.chain(tx, radial, 0);
            let r2 = self.chain(tx, radial, 2);
            let sides = [r0, vec![self.angular(tx, t, 0)], vec![self.angular(tx, t, 1)], reversed(&r2)];
            return Ok(([x, points[0], points[1], points[2]], sides));
        }
        let corners = [points[0], points[1], points[2], points[3]];
        let last = if self.portion.is_cyclic() {
            vec![self.angular(tx, t, 3)]
        } else {
            let mut through_axis = reversed(&self.chain(tx, radial, 3));
            through_axis.extend(self.chain(tx, radial, 0));
            through_axis
        };
        let sides = [vec![self.angular(tx, t, 0)], vec![self.angular(tx, t, 1)], vec![self.angular(tx, t, 2)], last];
        Ok((corners, sides))
    }

    fn section_coface(
        &mut self,
        tx: &mut EditTx<'_>,
        x: VertexId,
        t: VertexId,
        radial: &[ChainStep],
    ) -> Result<([VertexId; 4], CoFaceId), TopoError> {
        let (corners, sides) = self.section(tx, x, t, radial)?;
        if let Some(&cf) = self.sections.get(&(x, t)) {
            return Ok((corners, cf));
        }
        let cf = new_quad(
            tx,
            corners,
            [&sides[0], &sides[1], &sides[2], &sides[3]],
            FaceLaw::Transfinite,
            None,
        )?;
        self.sections.insert((x, t), cf);
        Ok((corners, cf))
    }

    /// Single block of a central coface whose side `axis` is on the axis.
    fn central_block(&mut self, tx: &mut EditTx<'_>, cf: CoFaceId, axis: usize) -> Result<(), TopoError> {
        let props = tx.graph().coface(cf).clone();
        let corner = |j: usize| props.vertices[(axis + j) % 4];
        let (a, b, tb, ta) = (corner(0), corner(1), corner(2), corner(3));
        let radial_a = reversed(&tx.graph().coface_side(cf, (axis + 3) % 4)?);
        let radial_b = tx.graph().coface_side(cf, (axis + 1) % 4)?;
        let trace_side = reversed(&tx.graph().coface_side(cf, (axis + 2) % 4)?);

        let (qa, section_a) = self.section_coface(tx, a, ta, &radial_a)?;
        let (qb, section_b) = self.section_coface(tx, b, tb, &radial_b)?;
        let n = self.stations.len();
        let mut lateral: Vec<Vec<CoFaceId>> = Vec::with_capacity(4);
        if n == 3 {
            lateral.push(vec![self.coface(tx, cf, 0)?]);
            lateral.push(self.swept_chain(tx, &trace_side, 0)?);
            lateral.push(self.swept_chain(tx, &trace_side, 1)?);
            lateral.push(vec![self.coface(tx, cf, 2)?]);
        } else {
            for k in 0..3 {
                lateral.push(self.swept_chain(tx, &trace_side, k)?);
            }
            if self.portion.is_cyclic() {
                lateral.push(self.swept_chain(tx, &trace_side, 3)?);
            } else {
                lateral.push(vec![self.coface(tx, cf, 3)?, self.coface(tx, cf, 0)?]);
            }
        }
        let mut slots: [Vec<CoFaceId>; 6] = Default::default();
        slots[4] = vec![section_a];
        slots[5] = vec![section_b];
        for (i, faces) in lateral.into_iter().enumerate() {
            slots[SIDE_SLOT[i]] = faces;
        }
        let geom = self.swept_geom(tx, props.geom);
        let block = new_block(tx, hexa_corners(qa, qb), slots, BlockLaw::Transfinite, geom);
        trace!("central block `{}` revolves `{}`", tx.graph().name(block), tx.graph().name(cf));
        Ok(())
    }
}

impl MakeBlocksByRevol {
    fn classify(&self, graph: &TopoGraph, tol: f64) -> Result<BTreeMap<CoFaceId, Kind>, TopoError> {
        let trace: BTreeSet<CoEdgeId> = self.trace.iter().copied().collect();
        let mut used = BTreeSet::new();
        let mut kinds = BTreeMap::new();
        for &cf in &self.cofaces {
            let on_axis: BTreeSet<VertexId> = graph
                .coface_all_vertices(cf)
                .into_iter()
                .filter(|&v| axis_distance(graph.vertex(v).coord) <= tol)
                .collect();
            if on_axis.is_empty() {
                kinds.insert(cf, Kind::Ring);
                continue;
            }
            let mut axis = None;
            for j in 0..4 {
                let side = graph.coface_side(cf, j)?;
                let ends: BTreeSet<VertexId> = side.iter().flat_map(|s| [s.from, s.to]).collect();
                if ends == on_axis {
                    axis = Some(j);
                }
            }
            let Some(axis) = axis else {
                return Err(topology(format!("coface {} touches the axis outside of one side", graph.name(cf))));
            };
            let facing: Vec<CoEdgeId> = graph.coface_side(cf, (axis + 2) % 4)?.iter().map(|s| s.coedge).collect();
            if !trace.is_empty() && facing.iter().all(|ce| trace.contains(ce)) {
                used.extend(facing);
                kinds.insert(cf, Kind::Central { axis });
            } else {
                kinds.insert(cf, Kind::Wedge);
            }
        }
        if let Some(ce) = trace.difference(&used).next() {
            return Err(topology(format!("coedge {} of the o-grid trace faces no coface on the axis", graph.name(*ce))));
        }
        Ok(kinds)
    }
}

impl TopoCommand for MakeBlocksByRevol {
    fn name(&self) -> &'static str {
        "MakeBlocksByRevol"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        // the free cofaces are collected again
        *self = MakeBlocksByRevol::new(graph, &self.trace, self.portion, self.ratio_ogrid)?;
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let tol = tx.config().tolerance;
        let kinds = self.classify(tx.graph(), tol)?;

        let mut base = None;
        let mut trace_vertices = BTreeSet::new();
        for (&cf, kind) in &kinds {
            let Kind::Central { axis } = *kind else { continue };
            for j in [(axis + 1) % 4, (axis + 3) % 4] {
                let n = tx.graph().coface_side_length(cf, j);
                if base.is_some_and(|b| b != n) {
                    return Err(topology(format!(
                        "radial sides of the central cofaces have {} and {n} segments",
                        base.unwrap_or(n)
                    )));
                }
                base = Some(n);
            }
            let facing = tx.graph().coface_side(cf, (axis + 2) % 4)?;
            trace_vertices.extend(facing.iter().flat_map(|s| [s.from, s.to]));
        }

        let mut sweep = Sweep {
            portion: self.portion,
            stations: self.portion.stations().to_vec(),
            tol,
            scale: self.portion.ogrid_scale(self.ratio_ogrid),
            base: base.unwrap_or(tx.config().default_nb_edges),
            trace_vertices,
            vertices: BTreeMap::new(),
            coedges: BTreeMap::new(),
            cofaces: BTreeMap::new(),
            angular: BTreeMap::new(),
            swept: BTreeMap::new(),
            sections: BTreeMap::new(),
        };
        let mut nb_central = 0;
        for (&cf, &kind) in &kinds {
            match kind {
                Kind::Central { axis } => {
                    sweep.central_block(tx, cf, axis)?;
                    nb_central += 1;
                }
                Kind::Ring | Kind::Wedge => {
                    for k in 0..self.portion.nb_sectors() {
                        sweep.sweep_coface(tx, cf, k)?;
                    }
                }
            }
        }
        if self.portion.stations()[0] != 0.0 {
            for &cf in &self.cofaces {
                release_coface(tx, cf);
            }
        }
        debug!(
            "revolution by {:?}: {} cofaces, {nb_central} central blocks, {} angular coedges",
            self.portion,
            kinds.len(),
            sweep.angular.len()
        );
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: names(graph, &self.trace),
            parameters: json!({
                "portion": self.portion,
                "ratio_ogrid": self.ratio_ogrid,
                "cofaces": names(graph, &self.cofaces),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::NewFaceGrid;
    use crate::algs::snap::SnapVertices;
    use crate::command::Session;
    use crate::config::TopoConfig;
    use crate::debug_invariants::DebugInvariants;
    use crate::geometry::analytic::{AnalyticModel, Shape};
    use crate::geometry::point::Point;
    use crate::topology::id::EntityKind;

    fn strip(origin_y: f64, rows: usize) -> Session {
        let config = TopoConfig { default_nb_edges: 4, ..Default::default() };
        let mut s = Session::new(config).unwrap();
        s.execute(NewFaceGrid::new(Point::new(0.0, origin_y, 0.0), [1.0, 1.0], [1, rows], [2, 2]).unwrap()).unwrap();
        s
    }

    fn has_vertex_at(g: &TopoGraph, p: Point) -> bool {
        g.live_vertices().into_iter().any(|v| g.vertex(v).coord.is_near(p, 1e-9))
    }

    /// Coedge at height `y` of the strip.
    fn coedge_at_height(g: &TopoGraph, y: f64) -> CoEdgeId {
        g.live_coedges()
            .into_iter()
            .find(|&ce| g.coedge(ce).vertices.iter().all(|&v| (g.vertex(v).coord.y - y).abs() < 1e-12))
            .unwrap()
    }

    #[test]
    fn quarter_turn_off_the_axis() {
        let mut s = strip(1.0, 1);
        let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[], Portion::Quarter, 0.0).unwrap()).unwrap();
        assert_eq!(report.created_blocks().len(), 2);
        assert_eq!(report.nb_created(EntityKind::Vertex), 8);
        let g = s.graph();
        assert!(has_vertex_at(g, Point::new(0.0, 0.0, 1.0)));
        assert!(has_vertex_at(g, Point::new(1.0, 0.0, 2.0)));
        let angular = report
            .created_coedges()
            .into_iter()
            .filter(|&ce| (g.vertex(g.coedge(ce).vertices[0]).coord.x - g.vertex(g.coedge(ce).vertices[1]).coord.x).abs() < 1e-12)
            .filter(|&ce| g.coedge(ce).nb_edges() == 4)
            .count();
        assert_eq!(angular, 8);
        for b in g.live_blocks() {
            assert!(!g.block(b).is_degenerate());
        }
        g.validate_invariants().unwrap();
    }

    #[test]
    fn axis_cofaces_become_wedges() {
        let mut s = strip(0.0, 1);
        let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[], Portion::Quarter, 0.0).unwrap()).unwrap();
        let g = s.graph();
        let blocks = report.created_blocks();
        assert_eq!(blocks.len(), 2);
        for b in blocks {
            assert!(g.block(b).is_degenerate());
            assert_eq!(g.block(b).nb_distinct_vertices(), 6);
        }
        let triangles = g.live_cofaces().into_iter().filter(|&cf| g.coface(cf).nb_sides() == 3).count();
        assert_eq!(triangles, 4);
        assert_eq!(g.nb_vertices(), 2 + 2 * 3);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn whole_turn_consumes_the_profile() {
        let mut s = strip(1.0, 1);
        let profile = s.graph().live_cofaces();
        let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[], Portion::Whole, 0.0).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(report.created_blocks().len(), 4);
        assert!(!g.is_live(profile[0]));
        assert_eq!(g.nb_vertices(), 16);
        assert!(!has_vertex_at(g, Point::new(0.0, 1.0, 0.0)));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn trace_gives_one_central_block() {
        let mut s = strip(0.0, 2);
        let trace = coedge_at_height(s.graph(), 1.0);
        let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[trace], Portion::Quarter, 0.5).unwrap()).unwrap();
        let g = s.graph();
        let blocks = report.created_blocks();
        assert_eq!(blocks.len(), 3);
        for &b in &blocks {
            assert!(!g.block(b).is_degenerate());
        }
        // the trace vertex on the mid station is pushed toward the corner
        let r = Portion::Quarter.ogrid_scale(0.5);
        let c = std::f64::consts::FRAC_1_SQRT_2 * r;
        assert!(has_vertex_at(g, Point::new(0.0, c, c)));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn half_and_whole_turns_with_trace() {
        for (portion, expected) in [(Portion::Half, 1 + 3), (Portion::Whole, 1 + 4)] {
            let mut s = strip(0.0, 2);
            let trace = coedge_at_height(s.graph(), 1.0);
            let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[trace], portion, 1.0).unwrap()).unwrap();
            assert_eq!(report.created_blocks().len(), expected, "{portion:?}");
            s.graph().validate_invariants().unwrap();
        }
        // a whole turn leaves nothing on the axis
        let mut s = strip(0.0, 2);
        let trace = coedge_at_height(s.graph(), 1.0);
        s.execute(MakeBlocksByRevol::new(s.graph(), &[trace], Portion::Whole, 0.0).unwrap()).unwrap();
        let g = s.graph();
        assert!(g.live_vertices().into_iter().all(|v| axis_distance(g.vertex(v).coord) > 1e-9));
    }

    #[test]
    fn trace_must_face_the_axis() {
        let mut s = strip(0.0, 2);
        let top = coedge_at_height(s.graph(), 2.0);
        let before = s.graph().snapshot();
        let e = s.execute(MakeBlocksByRevol::new(s.graph(), &[top], Portion::Quarter, 0.5).unwrap()).unwrap_err();
        assert!(matches!(e, TopoError::Topology(_)));
        assert_eq!(s.graph().snapshot(), before);
    }

    #[test]
    fn arguments_are_checked() {
        let s = strip(1.0, 1);
        let e = MakeBlocksByRevol::new(s.graph(), &[], Portion::Half, 1.5).unwrap_err();
        assert!(matches!(e, TopoError::RatioOutOfRange { .. }));
        let empty = Session::default();
        let e = MakeBlocksByRevol::new(empty.graph(), &[], Portion::Half, 0.5).unwrap_err();
        assert!(matches!(e, TopoError::EmptySelection(_)));
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::new(0.0, -1.0, 0.0), [1.0, 1.0], [1, 1], [1, 1]).unwrap()).unwrap();
        let e = MakeBlocksByRevol::new(s.graph(), &[], Portion::Half, 0.5).unwrap_err();
        assert!(e.is_precondition());
    }

    #[test]
    fn sweeps_carry_geometry() {
        let mut model = AnalyticModel::new();
        let point = model.add(Shape::Vertex(Point::new(0.0, 1.0, 0.0)));
        let circle = model.add(Shape::Cylinder { radius: 1.0 });
        model.set_swept(point, circle);
        let mut s = Session::with_geometry(TopoConfig::default(), Box::new(model)).unwrap();
        s.execute(NewFaceGrid::new(Point::new(0.0, 1.0, 0.0), [1.0, 1.0], [1, 1], [1, 1]).unwrap()).unwrap();
        let g = s.graph();
        let v = g.live_vertices().into_iter().find(|&v| g.vertex(v).coord == Point::new(0.0, 1.0, 0.0)).unwrap();
        s.execute(SnapVertices::onto(s.graph(), &[v], point).unwrap()).unwrap();
        let report = s.execute(MakeBlocksByRevol::new(s.graph(), &[], Portion::Quarter, 0.0).unwrap()).unwrap();
        let g = s.graph();
        let carried = report.created_coedges().into_iter().filter(|&ce| g.coedge(ce).geom == Some(circle)).count();
        assert_eq!(carried, 2);
        let copies = report.created_vertices().into_iter().filter(|&u| g.vertex(u).geom == Some(circle)).count();
        assert_eq!(copies, 2);
    }
}
