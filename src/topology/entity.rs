//! Property blocks of the six entity kinds.
//!
//! Each entity's mutable state is one value-type struct. Commands snapshot
//! the whole struct before touching an entity and undo/redo swap snapshots
//! in place, so every link, meshing law and geometric association lives here.
//!
//! # Orientation conventions
//! - `EdgeProps::coedges` is ordered from `vertices[0]` to `vertices[1]`.
//! - `CoFaceProps::edges[k]` joins `vertices[k]` to `vertices[k + 1]`
//!   (cyclic), so edges `0`/`2` and `1`/`3` are opposite sides.
//! - `BlockProps::vertices[i + 2j + 4k]` is the corner at logical position
//!   `(i, j, k)`, and `faces[2 * dir + side]` is the side `side` of the block
//!   in direction `dir` (see [`hexa`](crate::topology::hexa)).

use crate::geometry::kernel::GeomRef;
use crate::geometry::point::Point;
use crate::topology::id::{CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexProps {
    pub coord: Point,
    pub geom: Option<GeomRef>,
}

/// Distribution law of the mesh nodes along a coedge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeLaw {
    Uniform,
    /// Segment sizes follow a geometric progression of the given ratio.
    Geometric { ratio: f64 },
    /// Nodes interpolated from neighbouring edges; placed uniformly here.
    Interpolated,
}

/// Discretization of a coedge: segment count, law and direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Discretization {
    pub nb_edges: u32,
    pub law: EdgeLaw,
    /// The law starts from `vertices[1]` instead of `vertices[0]`.
    pub reversed: bool,
}

impl Discretization {
    pub fn uniform(nb_edges: u32) -> Self {
        Discretization { nb_edges, law: EdgeLaw::Uniform, reversed: false }
    }

    pub fn geometric(nb_edges: u32, ratio: f64) -> Self {
        Discretization { nb_edges, law: EdgeLaw::Geometric { ratio }, reversed: false }
    }

    /// Normalized abscissae of the `nb_edges + 1` nodes, from `vertices[0]`.
    pub fn parameters(&self) -> Vec<f64> {
        let n = self.nb_edges.max(1) as usize;
        let mut t: Vec<f64> = match self.law {
            EdgeLaw::Geometric { ratio } if ratio > 0.0 && (ratio - 1.0).abs() > 1e-12 => {
                let mut acc = Vec::with_capacity(n + 1);
                let mut sum = 0.0;
                let mut size = 1.0;
                acc.push(0.0);
                for _ in 0..n {
                    sum += size;
                    acc.push(sum);
                    size *= ratio;
                }
                acc.iter().map(|s| s / sum).collect()
            }
            _ => (0..=n).map(|i| i as f64 / n as f64).collect(),
        };
        if self.reversed {
            t = t.iter().rev().map(|s| 1.0 - s).collect();
        }
        t
    }

    /// Same law with another segment count. Interpolated laws become uniform.
    pub fn with_nb_edges(&self, nb_edges: u32) -> Self {
        let law = match self.law {
            EdgeLaw::Interpolated => EdgeLaw::Uniform,
            other => other,
        };
        Discretization { nb_edges, law, reversed: self.reversed }
    }

    /// Law seen from the other end.
    pub fn flipped(&self) -> Self {
        Discretization { reversed: !self.reversed, ..*self }
    }
}

/// Meshing law of a coface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceLaw {
    Transfinite,
    /// Sweep along logical direction `dir` (0 or 1).
    Directional { dir: u8 },
    Orthogonal { dir: u8, nb_layers: u32 },
}

/// Meshing law of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockLaw {
    Transfinite,
    /// Sweep along logical direction `dir` (0, 1 or 2).
    Directional { dir: u8 },
    Orthogonal { dir: u8, nb_layers: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoEdgeProps {
    pub vertices: [VertexId; 2],
    pub discretization: Discretization,
    pub geom: Option<GeomRef>,
}

impl CoEdgeProps {
    pub fn nb_edges(&self) -> u32 {
        self.discretization.nb_edges
    }

    /// The other end of the coedge, `None` if `v` is not an end.
    pub fn opposite(&self, v: VertexId) -> Option<VertexId> {
        if self.vertices[0] == v {
            Some(self.vertices[1])
        } else if self.vertices[1] == v {
            Some(self.vertices[0])
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeProps {
    pub vertices: [VertexId; 2],
    pub coedges: Vec<CoEdgeId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoFaceProps {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
    pub structured: bool,
    pub law: FaceLaw,
    pub geom: Option<GeomRef>,
}

impl CoFaceProps {
    pub fn nb_sides(&self) -> usize {
        self.edges.len()
    }

    /// Side index holding `edge`.
    pub fn side_of(&self, edge: EdgeId) -> Option<usize> {
        self.edges.iter().position(|&e| e == edge)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceProps {
    /// Corners in the order given by the owning block's face table.
    pub vertices: Vec<VertexId>,
    /// Empty for a side collapsed to a segment on a degenerate block.
    pub cofaces: Vec<CoFaceId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockProps {
    pub vertices: Vec<VertexId>,
    pub faces: Vec<FaceId>,
    pub structured: bool,
    pub law: BlockLaw,
    pub geom: Option<GeomRef>,
}

impl BlockProps {
    /// Number of distinct corners (8 unless degenerate).
    pub fn nb_distinct_vertices(&self) -> usize {
        let mut v = self.vertices.clone();
        v.sort_unstable();
        v.dedup();
        v.len()
    }

    pub fn is_degenerate(&self) -> bool {
        self.nb_distinct_vertices() < 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_parameters() {
        let d = Discretization::uniform(4);
        assert_eq!(d.parameters(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn geometric_parameters_grow() {
        let d = Discretization::geometric(3, 2.0);
        let t = d.parameters();
        assert_eq!(t.len(), 4);
        assert!((t[1] - 1.0 / 7.0).abs() < 1e-12);
        assert!((t[2] - 3.0 / 7.0).abs() < 1e-12);
        let r = d.flipped().parameters();
        assert!((r[1] - 4.0 / 7.0).abs() < 1e-12);
        assert_eq!(r[3], 1.0);
    }

    #[test]
    fn interpolated_becomes_uniform_on_resize() {
        let d = Discretization { nb_edges: 6, law: EdgeLaw::Interpolated, reversed: false };
        assert_eq!(d.with_nb_edges(2).law, EdgeLaw::Uniform);
    }
}
