#![cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]

use crate::algs::builder::{build_block_grid, build_face_grid};
use crate::command::tx::EditTx;
use crate::config::TopoConfig;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::kernel::NullModel;
use crate::geometry::point::{Point, Vector};
use crate::topology::entity::Discretization;
use crate::topology::graph::TopoGraph;

#[test]
fn valid_grid_passes() {
    let config = TopoConfig::default();
    let mut graph = TopoGraph::new(&config.names);
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    build_block_grid(&mut tx, Point::ORIGIN, Vector::new(1.0, 1.0, 1.0), [2, 1, 1], [2, 2, 2], None).unwrap();
    tx.graph().debug_assert_invariants();
}

#[test]
#[should_panic]
fn unbalanced_coface_panics() {
    let config = TopoConfig::default();
    let mut graph = TopoGraph::new(&config.names);
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [2, 2]).unwrap();
    let ce = tx.graph().coface_side(grid.coface(0, 0), 0).unwrap()[0].coedge;
    tx.update(ce, |p| p.discretization = Discretization::uniform(7));
    tx.graph().debug_assert_invariants();
}

#[test]
#[should_panic]
fn swapped_block_corners_panic() {
    let config = TopoConfig::default();
    let mut graph = TopoGraph::new(&config.names);
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_block_grid(&mut tx, Point::ORIGIN, Vector::new(1.0, 1.0, 1.0), [1, 1, 1], [1, 1, 1], None).unwrap();
    tx.update(grid.block(0, 0, 0), |p| p.vertices.swap(0, 7));
    tx.graph().debug_assert_invariants();
}
