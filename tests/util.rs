#![allow(dead_code)]
use mesh_topo::prelude::*;

/// Session holding one box block `[0, 1]^3` with `nb` segments per direction.
pub fn cube(nb: u32) -> (Session, BlockId) {
    let mut s = Session::default();
    s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [nb; 3]).unwrap()).unwrap();
    let b = s.graph().live_blocks()[0];
    (s, b)
}

/// Session holding a conforming grid of unit blocks.
pub fn block_grid(counts: [usize; 3], nb: [u32; 3]) -> Session {
    let mut s = Session::default();
    s.execute(NewBlockGrid::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), counts, nb).unwrap()).unwrap();
    s
}

/// Session holding a grid of unit cofaces in the z = 0 plane.
pub fn face_grid(origin: Point, counts: [usize; 2], nb: [u32; 2]) -> Session {
    let mut s = Session::default();
    s.execute(NewFaceGrid::new(origin, [1.0, 1.0], counts, nb).unwrap()).unwrap();
    s
}

/// First coedge of the block line joining corners `lo` and `hi`.
pub fn line_coedge(s: &Session, b: BlockId, lo: usize, hi: usize) -> CoEdgeId {
    s.graph().block_line_chain(b, lo, hi).unwrap()[0].coedge
}

pub fn vertex_at(g: &TopoGraph, p: Point) -> Option<VertexId> {
    g.live_vertices().into_iter().find(|&v| g.vertex(v).coord.is_near(p, 1e-9))
}

/// Assert two id lists hold the same elements (order-agnostic).
pub fn assert_same_set<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not the same set\n got={:?}\nwant={:?}", got, want);
}
