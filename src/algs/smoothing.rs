//! Smoothing of the vertices of a set of structured cofaces.
//!
//! The command gathers the corners of the selected quadrangles into a
//! [`SmoothingInput`]; vertices on the border of the selection are fixed.
//! The numerical scheme is pluggable through the [`Smoother`] trait, and each
//! moved point is handed back to a projection callback that snaps it onto
//! the vertex geometry.

use crate::algs::require_structured_coface;
use crate::algs::selection;
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::point::Point;
use crate::topo_error::{TopoError, invalid_argument};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{CoEdgeId, CoFaceId, VertexId};
use itertools::Itertools;
use log::debug;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Quadrangle mesh handed to a [`Smoother`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmoothingInput {
    pub points: Vec<Point>,
    /// `true` for points the smoother must leave in place.
    pub fixed: Vec<bool>,
    /// Corner indices of each quadrangle, in cyclic order.
    pub quads: Vec<[usize; 4]>,
}

impl SmoothingInput {
    /// Points sharing a quadrangle side with each point.
    pub fn neighbours(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.points.len()];
        for q in &self.quads {
            for k in 0..4 {
                out[q[k]].push(q[(k + 1) % 4]);
                out[q[k]].push(q[(k + 3) % 4]);
            }
        }
        for list in &mut out {
            list.sort_unstable();
            list.dedup();
        }
        out
    }
}

/// Callback projecting point `i` onto its geometry.
pub type Projection<'a> = dyn FnMut(usize, Point) -> Result<Point, TopoError> + 'a;

/// A smoothing scheme.
pub trait Smoother: fmt::Debug {
    /// New positions of every point of `input`; fixed points are returned
    /// unchanged.
    fn smooth(&self, input: &SmoothingInput, project: &mut Projection<'_>) -> Result<Vec<Point>, TopoError>;
}

/// Jacobi iterations moving each free point toward the barycenter of its
/// neighbours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaplacianSmoother {
    pub iterations: usize,
    /// Fraction of the move applied per iteration, in `(0, 1]`.
    pub relaxation: f64,
}

impl Default for LaplacianSmoother {
    fn default() -> Self {
        LaplacianSmoother { iterations: 10, relaxation: 1.0 }
    }
}

impl Smoother for LaplacianSmoother {
    fn smooth(&self, input: &SmoothingInput, project: &mut Projection<'_>) -> Result<Vec<Point>, TopoError> {
        let neighbours = input.neighbours();
        let mut points = input.points.clone();
        for _ in 0..self.iterations {
            let mut next = points.clone();
            for (i, around) in neighbours.iter().enumerate() {
                if input.fixed[i] {
                    continue;
                }
                let Some(target) = Point::barycenter(around.iter().map(|&j| points[j])) else { continue };
                let moved = points[i] + (target - points[i]) * self.relaxation;
                next[i] = project(i, moved)?;
            }
            points = next;
        }
        Ok(points)
    }
}

/// Smooths the corners of structured cofaces.
#[derive(Debug)]
pub struct SmoothVertices {
    cofaces: Vec<CoFaceId>,
    smoother: Box<dyn Smoother>,
}

impl SmoothVertices {
    pub fn new(graph: &TopoGraph, cofaces: &[CoFaceId], smoother: impl Smoother + 'static) -> Result<Self, TopoError> {
        let cofaces = selection(cofaces, "cofaces to smooth")?;
        for &cf in &cofaces {
            require_structured_coface(graph, cf)?;
        }
        Ok(SmoothVertices { cofaces, smoother: Box::new(smoother) })
    }

    /// Laplacian smoothing of `cofaces` with `iterations` full steps.
    pub fn laplacian(graph: &TopoGraph, cofaces: &[CoFaceId], iterations: usize) -> Result<Self, TopoError> {
        if iterations == 0 {
            return Err(invalid_argument("smoothing needs at least one iteration"));
        }
        Self::new(graph, cofaces, LaplacianSmoother { iterations, ..Default::default() })
    }

    fn input(&self, graph: &TopoGraph) -> (Vec<VertexId>, SmoothingInput) {
        let ids: Vec<VertexId> = self
            .cofaces
            .iter()
            .flat_map(|&cf| graph.coface(cf).vertices.iter().copied())
            .sorted()
            .dedup()
            .collect();
        let index: BTreeMap<VertexId, usize> = ids.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut uses: BTreeMap<CoEdgeId, usize> = BTreeMap::new();
        for &cf in &self.cofaces {
            for ce in graph.coface_coedges(cf) {
                *uses.entry(ce).or_default() += 1;
            }
        }
        let mut fixed = vec![false; ids.len()];
        for (ce, n) in uses {
            if n > 1 {
                continue;
            }
            for v in graph.coedge(ce).vertices {
                if let Some(&i) = index.get(&v) {
                    fixed[i] = true;
                }
            }
        }
        let quads = self
            .cofaces
            .iter()
            .map(|&cf| {
                let v = &graph.coface(cf).vertices;
                [index[&v[0]], index[&v[1]], index[&v[2]], index[&v[3]]]
            })
            .collect();
        let points = ids.iter().map(|&v| graph.vertex(v).coord).collect();
        (ids, SmoothingInput { points, fixed, quads })
    }
}

impl TopoCommand for SmoothVertices {
    fn name(&self) -> &'static str {
        "SmoothVertices"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        for &cf in &self.cofaces {
            require_structured_coface(graph, cf)?;
        }
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let (ids, input) = self.input(tx.graph());
        let smoothed = {
            let tx: &EditTx<'_> = tx;
            let mut project = |i: usize, p: Point| {
                let v = ids[i];
                match tx.graph().vertex(v).geom {
                    Some(geom) => tx.project(geom, p, tx.graph().name(v)),
                    None => Ok(p),
                }
            };
            self.smoother.smooth(&input, &mut project)?
        };
        if smoothed.len() != ids.len() {
            return Err(TopoError::Internal(format!(
                "smoother returned {} points for {}",
                smoothed.len(),
                ids.len()
            )));
        }
        let tol = tx.config().tolerance;
        let mut moved = 0;
        for (i, (&v, p)) in ids.iter().zip(smoothed).enumerate() {
            if input.fixed[i] || p.is_near(input.points[i], tol) {
                continue;
            }
            tx.update(v, |props| props.coord = p);
            moved += 1;
        }
        debug!("smoothing moved {moved} of {} vertices", ids.len());
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: names(graph, &self.cofaces),
            parameters: json!({ "smoother": format!("{:?}", self.smoother) }),
        }
    }
}
