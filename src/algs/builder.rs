//! Construction of box-shaped structured topologies.
//!
//! [`NewBlockGrid`] lays out `nx * ny * nz` conforming blocks: coedges and
//! cofaces between neighbouring blocks are shared. [`NewBlock`] is the
//! single-block case and [`NewFaceGrid`] builds a 2-D grid of cofaces in the
//! `z = 0` plane, the usual input of a revolution.

use crate::algs::edit::{new_block, new_coedge, new_quad, new_vertex};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::TopoCommand;
use crate::geometry::kernel::GeomRef;
use crate::geometry::point::{Point, Vector};
use crate::topo_error::{TopoError, invalid_argument};
use crate::topology::entity::{BlockLaw, Discretization, FaceLaw};
use crate::topology::graph::TopoGraph;
use crate::topology::hexa;
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, VertexId};
use crate::topology::traverse::ChainStep;
use serde_json::json;
use std::collections::BTreeMap;

fn check_counts(nb_edges: &[u32]) -> Result<(), TopoError> {
    match nb_edges.iter().find(|&&n| n == 0) {
        Some(&n) => Err(TopoError::InvalidCount { what: "segments per direction", value: n }),
        None => Ok(()),
    }
}

fn check_cell(cell: &[f64]) -> Result<(), TopoError> {
    if cell.iter().any(|&d| !(d > 0.0) || !d.is_finite()) {
        return Err(invalid_argument(format!("cell sizes must be positive, got {cell:?}")));
    }
    Ok(())
}

/// Entities of a block grid, indexed by logical position.
#[derive(Clone, Debug, Default)]
pub struct BlockGrid {
    pub counts: [usize; 3],
    pub vertices: Vec<VertexId>,
    pub blocks: Vec<BlockId>,
}

impl BlockGrid {
    pub fn vertex(&self, i: usize, j: usize, k: usize) -> VertexId {
        let [nx, ny, _] = self.counts;
        self.vertices[i + (nx + 1) * (j + (ny + 1) * k)]
    }

    pub fn block(&self, i: usize, j: usize, k: usize) -> BlockId {
        let [nx, ny, _] = self.counts;
        self.blocks[i + nx * (j + ny * k)]
    }
}

pub(crate) fn build_block_grid(
    tx: &mut EditTx<'_>,
    origin: Point,
    cell: Vector,
    counts: [usize; 3],
    nb_edges: [u32; 3],
    geom: Option<GeomRef>,
) -> Result<BlockGrid, TopoError> {
    let [nx, ny, nz] = counts;
    let size = [cell.x, cell.y, cell.z];
    let mut grid = BlockGrid { counts, ..Default::default() };

    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                let p = origin + Point::new(i as f64 * size[0], j as f64 * size[1], k as f64 * size[2]);
                grid.vertices.push(new_vertex(tx, p, None));
            }
        }
    }

    // coedges keyed by direction and low grid position
    let mut coedges: BTreeMap<(usize, [usize; 3]), CoEdgeId> = BTreeMap::new();
    for dir in 0..3 {
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    let pos = [i, j, k];
                    if pos[dir] == counts[dir] {
                        continue;
                    }
                    let mut hi = pos;
                    hi[dir] += 1;
                    let a = grid.vertex(i, j, k);
                    let b = grid.vertex(hi[0], hi[1], hi[2]);
                    let ce = new_coedge(tx, a, b, Discretization::uniform(nb_edges[dir]), None);
                    coedges.insert((dir, pos), ce);
                }
            }
        }
    }
    let step = |coedges: &BTreeMap<(usize, [usize; 3]), CoEdgeId>,
                grid: &BlockGrid,
                a: [usize; 3],
                b: [usize; 3]|
     -> Result<Vec<ChainStep>, TopoError> {
        let dir = (0..3)
            .find(|&d| a[d] != b[d])
            .ok_or_else(|| invalid_argument("degenerate grid side"))?;
        let low = if a[dir] < b[dir] { a } else { b };
        let ce = coedges
            .get(&(dir, low))
            .copied()
            .ok_or_else(|| invalid_argument("missing grid coedge"))?;
        Ok(vec![ChainStep {
            coedge: ce,
            from: grid.vertex(a[0], a[1], a[2]),
            to: grid.vertex(b[0], b[1], b[2]),
        }])
    };

    // cofaces keyed by normal direction and low grid position of their plane
    let mut cofaces: BTreeMap<(usize, [usize; 3]), CoFaceId> = BTreeMap::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let base = [i, j, k];
                let mut slots: [Vec<CoFaceId>; 6] = Default::default();
                for (slot, cofaces_of_slot) in slots.iter_mut().enumerate() {
                    let (dir, side) = hexa::face_dir_side(slot);
                    let mut key = base;
                    key[dir] += side;
                    if let Some(&cf) = cofaces.get(&(dir, key)) {
                        cofaces_of_slot.push(cf);
                        continue;
                    }
                    // corners of the low face of direction `dir`, moved to the plane
                    let corners: Vec<[usize; 3]> = hexa::FACE_CORNERS[hexa::face_index(dir, 0)]
                        .iter()
                        .map(|&c| {
                            let off = hexa::corner_position(c);
                            let mut p = [base[0] + off[0], base[1] + off[1], base[2] + off[2]];
                            p[dir] = key[dir];
                            p
                        })
                        .collect();
                    let sides = [
                        step(&coedges, &grid, corners[0], corners[1])?,
                        step(&coedges, &grid, corners[1], corners[2])?,
                        step(&coedges, &grid, corners[2], corners[3])?,
                        step(&coedges, &grid, corners[3], corners[0])?,
                    ];
                    let vertices = [0, 1, 2, 3].map(|n| {
                        let p = corners[n];
                        grid.vertex(p[0], p[1], p[2])
                    });
                    let cf = new_quad(
                        tx,
                        vertices,
                        [&sides[0], &sides[1], &sides[2], &sides[3]],
                        FaceLaw::Transfinite,
                        None,
                    )?;
                    cofaces.insert((dir, key), cf);
                    cofaces_of_slot.push(cf);
                }
                let vertices = [0, 1, 2, 3, 4, 5, 6, 7].map(|c| {
                    let off = hexa::corner_position(c);
                    grid.vertex(i + off[0], j + off[1], k + off[2])
                });
                let b = new_block(tx, vertices, slots, BlockLaw::Transfinite, geom);
                grid.blocks.push(b);
            }
        }
    }
    Ok(grid)
}

/// Entities of a coface grid, indexed by logical position.
#[derive(Clone, Debug, Default)]
pub struct FaceGrid {
    pub counts: [usize; 2],
    pub vertices: Vec<VertexId>,
    pub cofaces: Vec<CoFaceId>,
}

impl FaceGrid {
    pub fn vertex(&self, i: usize, j: usize) -> VertexId {
        self.vertices[i + (self.counts[0] + 1) * j]
    }

    pub fn coface(&self, i: usize, j: usize) -> CoFaceId {
        self.cofaces[i + self.counts[0] * j]
    }
}

pub(crate) fn build_face_grid(
    tx: &mut EditTx<'_>,
    origin: Point,
    cell: [f64; 2],
    counts: [usize; 2],
    nb_edges: [u32; 2],
) -> Result<FaceGrid, TopoError> {
    let [nx, ny] = counts;
    let mut grid = FaceGrid { counts, ..Default::default() };
    for j in 0..=ny {
        for i in 0..=nx {
            let p = origin + Point::new(i as f64 * cell[0], j as f64 * cell[1], 0.0);
            grid.vertices.push(new_vertex(tx, p, None));
        }
    }
    let mut along_x = BTreeMap::new();
    let mut along_y = BTreeMap::new();
    for j in 0..=ny {
        for i in 0..=nx {
            if i < nx {
                let ce = new_coedge(
                    tx,
                    grid.vertex(i, j),
                    grid.vertex(i + 1, j),
                    Discretization::uniform(nb_edges[0]),
                    None,
                );
                along_x.insert((i, j), ce);
            }
            if j < ny {
                let ce = new_coedge(
                    tx,
                    grid.vertex(i, j),
                    grid.vertex(i, j + 1),
                    Discretization::uniform(nb_edges[1]),
                    None,
                );
                along_y.insert((i, j), ce);
            }
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            let v = [grid.vertex(i, j), grid.vertex(i + 1, j), grid.vertex(i + 1, j + 1), grid.vertex(i, j + 1)];
            let side = |ce: Option<&CoEdgeId>, from: VertexId, to: VertexId| -> Result<Vec<ChainStep>, TopoError> {
                let coedge = ce.copied().ok_or_else(|| invalid_argument("missing grid coedge"))?;
                Ok(vec![ChainStep { coedge, from, to }])
            };
            let sides = [
                side(along_x.get(&(i, j)), v[0], v[1])?,
                side(along_y.get(&(i + 1, j)), v[1], v[2])?,
                side(along_x.get(&(i, j + 1)), v[2], v[3])?,
                side(along_y.get(&(i, j)), v[3], v[0])?,
            ];
            let cf = new_quad(tx, v, [&sides[0], &sides[1], &sides[2], &sides[3]], FaceLaw::Transfinite, None)?;
            grid.cofaces.push(cf);
        }
    }
    Ok(grid)
}

/// Creates one box block between two opposite corners.
#[derive(Clone, Debug)]
pub struct NewBlock {
    min: Point,
    max: Point,
    nb_edges: [u32; 3],
    geom: Option<GeomRef>,
}

impl NewBlock {
    pub fn new(min: Point, max: Point, nb_edges: [u32; 3]) -> Result<Self, TopoError> {
        check_counts(&nb_edges)?;
        check_cell(&[max.x - min.x, max.y - min.y, max.z - min.z])?;
        Ok(NewBlock { min, max, nb_edges, geom: None })
    }

    /// Associates the block with a volume of the geometric model.
    pub fn with_geometry(mut self, geom: GeomRef) -> Self {
        self.geom = Some(geom);
        self
    }
}

impl TopoCommand for NewBlock {
    fn name(&self) -> &'static str {
        "NewBlock"
    }

    fn revalidate(&mut self, _graph: &TopoGraph) -> Result<(), TopoError> {
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        build_block_grid(tx, self.min, self.max - self.min, [1, 1, 1], self.nb_edges, self.geom)?;
        Ok(())
    }

    fn trace(&self, _graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: Vec::new(),
            parameters: json!({ "min": self.min, "max": self.max, "nb_edges": self.nb_edges }),
        }
    }
}

/// Creates `nx * ny * nz` conforming box blocks.
#[derive(Clone, Debug)]
pub struct NewBlockGrid {
    origin: Point,
    cell: Vector,
    counts: [usize; 3],
    nb_edges: [u32; 3],
    geom: Option<GeomRef>,
}

impl NewBlockGrid {
    pub fn new(origin: Point, cell: Vector, counts: [usize; 3], nb_edges: [u32; 3]) -> Result<Self, TopoError> {
        check_counts(&nb_edges)?;
        check_cell(&[cell.x, cell.y, cell.z])?;
        if counts.contains(&0) {
            return Err(TopoError::EmptySelection("block grid with no cell"));
        }
        Ok(NewBlockGrid { origin, cell, counts, nb_edges, geom: None })
    }

    pub fn with_geometry(mut self, geom: GeomRef) -> Self {
        self.geom = Some(geom);
        self
    }
}

impl TopoCommand for NewBlockGrid {
    fn name(&self) -> &'static str {
        "NewBlockGrid"
    }

    fn revalidate(&mut self, _graph: &TopoGraph) -> Result<(), TopoError> {
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        build_block_grid(tx, self.origin, self.cell, self.counts, self.nb_edges, self.geom)?;
        Ok(())
    }

    fn trace(&self, _graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: Vec::new(),
            parameters: json!({
                "origin": self.origin,
                "cell": self.cell,
                "counts": self.counts,
                "nb_edges": self.nb_edges,
            }),
        }
    }
}

/// Creates an `nx * ny` grid of structured cofaces in the `z = 0` plane.
#[derive(Clone, Debug)]
pub struct NewFaceGrid {
    origin: Point,
    cell: [f64; 2],
    counts: [usize; 2],
    nb_edges: [u32; 2],
}

impl NewFaceGrid {
    pub fn new(origin: Point, cell: [f64; 2], counts: [usize; 2], nb_edges: [u32; 2]) -> Result<Self, TopoError> {
        check_counts(&nb_edges)?;
        check_cell(&cell)?;
        if counts.contains(&0) {
            return Err(TopoError::EmptySelection("face grid with no cell"));
        }
        Ok(NewFaceGrid { origin, cell, counts, nb_edges })
    }
}

impl TopoCommand for NewFaceGrid {
    fn name(&self) -> &'static str {
        "NewFaceGrid"
    }

    fn revalidate(&mut self, _graph: &TopoGraph) -> Result<(), TopoError> {
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        build_face_grid(tx, self.origin, self.cell, self.counts, self.nb_edges)?;
        Ok(())
    }

    fn trace(&self, _graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: Vec::new(),
            parameters: json!({
                "origin": self.origin,
                "cell": self.cell,
                "counts": self.counts,
                "nb_edges": self.nb_edges,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Session;
    use crate::debug_invariants::DebugInvariants;
    use crate::topology::id::EntityKind;

    #[test]
    fn single_block_counts() {
        let mut s = Session::default();
        let cmd = NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 3, 4]).unwrap();
        let report = s.execute(cmd).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_vertices(), 8);
        assert_eq!(g.nb_coedges(), 12);
        assert_eq!(g.nb_cofaces(), 6);
        assert_eq!(g.nb_blocks(), 1);
        assert_eq!(report.nb_created(EntityKind::Face), 6);
        let b = g.live_blocks()[0];
        assert_eq!(g.block_nb_edges(b, 0).unwrap(), 2);
        assert_eq!(g.block_nb_edges(b, 2).unwrap(), 4);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn grid_shares_interfaces() {
        let mut s = Session::default();
        let cmd = NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2]).unwrap();
        s.execute(cmd).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_blocks(), 2);
        assert_eq!(g.nb_vertices(), 12);
        assert_eq!(g.nb_cofaces(), 11);
        let blocks = g.live_blocks();
        assert_eq!(g.common_cofaces(blocks[0], blocks[1]).len(), 1);
        assert_eq!(g.block_neighbours(blocks[0]), vec![blocks[1]]);
        g.validate_invariants().unwrap();
    }

    #[test]
    fn face_grid_in_plane() {
        let mut s = Session::default();
        s.execute(NewFaceGrid::new(Point::ORIGIN, [1.0, 2.0], [3, 2], [4, 5]).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.nb_cofaces(), 6);
        assert_eq!(g.nb_vertices(), 12);
        assert_eq!(g.nb_coedges(), 17);
        assert!(g.live_vertices().iter().all(|&v| g.vertex(v).coord.z == 0.0));
        g.validate_invariants().unwrap();
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let e = NewBlock::new(Point::ORIGIN, Point::new(1.0, 0.0, 1.0), [1, 1, 1]).unwrap_err();
        assert!(e.is_precondition());
        let e = NewFaceGrid::new(Point::ORIGIN, [1.0, 1.0], [1, 1], [0, 2]).unwrap_err();
        assert_eq!(e, TopoError::InvalidCount { what: "segments per direction", value: 0 });
    }
}
