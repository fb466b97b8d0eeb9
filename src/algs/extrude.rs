//! Blocks built by extruding free cofaces along a vector.
//!
//! Each coface is the bottom of one new block whose top is a translated
//! copy. A rail coedge joins every vertex to its copy and every coedge sweeps
//! one side coface, shared by the blocks of neighboring cofaces.

use crate::algs::edit::{new_block, new_coedge, new_quad, new_vertex};
use crate::algs::revolution::{SIDE_SLOT, hexa_corners};
use crate::algs::{require_structured_coface, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::kernel::{GeomKind, GeomRef};
use crate::geometry::point::Vector;
use crate::topo_error::{TopoError, invalid_argument};
use crate::topology::entity::{BlockLaw, Discretization, FaceLaw};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId, VertexId};
use crate::topology::traverse::{Chain, ChainStep, reversed};
use log::{debug, trace};
use serde_json::json;
use std::collections::BTreeMap;

/// Extrudes free structured cofaces into one layer of blocks.
#[derive(Clone, Debug)]
pub struct ExtrudeFaces {
    cofaces: Vec<CoFaceId>,
    vector: Vector,
    nb_edges: Option<u32>,
}

impl ExtrudeFaces {
    /// `cofaces` must be structured quadrangles that no block uses yet.
    pub fn new(graph: &TopoGraph, cofaces: &[CoFaceId], vector: Vector) -> Result<Self, TopoError> {
        let cofaces = selection(cofaces, "cofaces to extrude")?;
        for &cf in &cofaces {
            require_structured_coface(graph, cf)?;
            if let Some(&b) = graph.coface_blocks(cf).first() {
                return Err(invalid_argument(format!(
                    "coface {} already bounds block {}",
                    graph.name(cf),
                    graph.name(b)
                )));
            }
        }
        let len = vector.norm();
        if !len.is_finite() || len == 0.0 {
            return Err(invalid_argument(format!("cannot extrude along {vector}")));
        }
        Ok(ExtrudeFaces { cofaces, vector, nb_edges: None })
    }

    /// Segments of the rail coedges; the configured default otherwise.
    pub fn with_nb_edges(mut self, nb: u32) -> Result<Self, TopoError> {
        if nb == 0 {
            return Err(TopoError::InvalidCount { what: "segments along the extrusion", value: 0 });
        }
        self.nb_edges = Some(nb);
        Ok(self)
    }
}

/// Translated copies and swept entities shared by the blocks of one
/// extrusion.
struct Extrusion {
    vector: Vector,
    nb_edges: u32,
    vertices: BTreeMap<VertexId, VertexId>,
    coedges: BTreeMap<CoEdgeId, CoEdgeId>,
    rails: BTreeMap<VertexId, CoEdgeId>,
    sides: BTreeMap<CoEdgeId, CoFaceId>,
}

impl Extrusion {
    fn vertex(&mut self, tx: &mut EditTx<'_>, v: VertexId) -> VertexId {
        if let Some(&copy) = self.vertices.get(&v) {
            return copy;
        }
        let p = tx.graph().vertex(v).coord + self.vector;
        let copy = new_vertex(tx, p, None);
        self.vertices.insert(v, copy);
        copy
    }

    fn coedge(&mut self, tx: &mut EditTx<'_>, ce: CoEdgeId) -> CoEdgeId {
        if let Some(&copy) = self.coedges.get(&ce) {
            return copy;
        }
        let props = tx.graph().coedge(ce).clone();
        let [a, b] = props.vertices;
        let (ta, tb) = (self.vertex(tx, a), self.vertex(tx, b));
        let copy = new_coedge(tx, ta, tb, props.discretization, None);
        self.coedges.insert(ce, copy);
        copy
    }

    fn chain(&mut self, tx: &mut EditTx<'_>, chain: &[ChainStep]) -> Chain {
        chain
            .iter()
            .map(|s| ChainStep { coedge: self.coedge(tx, s.coedge), from: self.vertex(tx, s.from), to: self.vertex(tx, s.to) })
            .collect()
    }

    /// Geometry of a vertex a rail may follow: a curve or a surface.
    fn rail_geom(tx: &EditTx<'_>, geom: Option<GeomRef>) -> Option<GeomRef> {
        geom.filter(|&g| matches!(tx.geom().kind(g), Some(GeomKind::Curve | GeomKind::Surface)))
    }

    /// Coedge from `v` to its copy.
    fn rail(&mut self, tx: &mut EditTx<'_>, v: VertexId) -> ChainStep {
        let to = self.vertex(tx, v);
        let coedge = match self.rails.get(&v) {
            Some(&ce) => ce,
            None => {
                let geom = Self::rail_geom(tx, tx.graph().vertex(v).geom);
                let ce = new_coedge(tx, v, to, Discretization::uniform(self.nb_edges), geom);
                self.rails.insert(v, ce);
                ce
            }
        };
        ChainStep { coedge, from: v, to }
    }

    /// Side coface swept by `ce`, running along the rails in direction 1.
    fn side(&mut self, tx: &mut EditTx<'_>, ce: CoEdgeId) -> Result<CoFaceId, TopoError> {
        if let Some(&cf) = self.sides.get(&ce) {
            return Ok(cf);
        }
        let [a, b] = tx.graph().coedge(ce).vertices;
        let here = ChainStep { coedge: ce, from: a, to: b };
        let there = ChainStep { coedge: self.coedge(tx, ce), from: self.vertex(tx, a), to: self.vertex(tx, b) };
        let (ra, rb) = (self.rail(tx, a), self.rail(tx, b));
        let cf = new_quad(
            tx,
            [a, b, there.to, there.from],
            [&vec![here], &vec![rb], &reversed(&[there]), &reversed(&[ra])],
            FaceLaw::Directional { dir: 1 },
            None,
        )?;
        self.sides.insert(ce, cf);
        Ok(cf)
    }

    fn block(&mut self, tx: &mut EditTx<'_>, cf: CoFaceId) -> Result<(), TopoError> {
        let props = tx.graph().coface(cf).clone();
        let base = [0, 1, 2, 3].map(|j| props.vertices[j]);
        let top = base.map(|v| self.vertex(tx, v));
        let mut sides = Vec::with_capacity(4);
        let mut slots: [Vec<CoFaceId>; 6] = Default::default();
        for j in 0..4 {
            let side = tx.graph().coface_side(cf, j)?;
            let mut swept = Vec::with_capacity(side.len());
            for step in &side {
                swept.push(self.side(tx, step.coedge)?);
            }
            slots[SIDE_SLOT[j]] = swept;
            sides.push(self.chain(tx, &side));
        }
        let copy = new_quad(tx, top, [&sides[0], &sides[1], &sides[2], &sides[3]], props.law, None)?;
        slots[4] = vec![cf];
        slots[5] = vec![copy];
        let b = new_block(tx, hexa_corners(base, top), slots, BlockLaw::Directional { dir: 2 }, None);
        trace!("block `{}` extrudes `{}`", tx.graph().name(b), tx.graph().name(cf));
        Ok(())
    }
}

impl TopoCommand for ExtrudeFaces {
    fn name(&self) -> &'static str {
        "ExtrudeFaces"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        let nb_edges = self.nb_edges;
        *self = ExtrudeFaces { nb_edges, ..ExtrudeFaces::new(graph, &self.cofaces, self.vector)? };
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let mut ext = Extrusion {
            vector: self.vector,
            nb_edges: self.nb_edges.unwrap_or(tx.config().default_nb_edges),
            vertices: BTreeMap::new(),
            coedges: BTreeMap::new(),
            rails: BTreeMap::new(),
            sides: BTreeMap::new(),
        };
        for &cf in &self.cofaces {
            ext.block(tx, cf)?;
        }
        debug!(
            "extruded {} cofaces along {}: {} rails, {} side cofaces",
            self.cofaces.len(),
            self.vector,
            ext.rails.len(),
            ext.sides.len()
        );
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: names(graph, &self.cofaces),
            parameters: json!({ "vector": self.vector, "nb_edges": self.nb_edges }),
        }
    }
}
