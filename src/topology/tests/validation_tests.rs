use crate::algs::builder::{build_block_grid, build_face_grid};
use crate::command::tx::EditTx;
use crate::config::TopoConfig;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::kernel::NullModel;
use crate::geometry::point::{Point, Vector};
use crate::topo_error::TopoError;
use crate::topology::entity::Discretization;
use crate::topology::graph::TopoGraph;
use crate::topology::id::EntityId;

fn fresh() -> (TopoConfig, TopoGraph) {
    let config = TopoConfig::default();
    let graph = TopoGraph::new(&config.names);
    (config, graph)
}

#[test]
fn block_grid_is_valid() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    build_block_grid(&mut tx, Point::ORIGIN, Vector::new(1.0, 2.0, 3.0), [2, 2, 1], [3, 2, 1], None).unwrap();
    tx.graph().validate_invariants().unwrap();
    assert!(tx.graph().incidence_is_consistent());
}

#[test]
fn opposite_sides_must_match() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [4, 4]).unwrap();
    let cf = grid.coface(0, 0);
    let top = tx.graph().coface_side(cf, 2).unwrap()[0].coedge;
    tx.update(top, |p| p.discretization = Discretization::uniform(3));
    let e = tx.graph().validate_entity(cf.any()).unwrap_err();
    assert!(matches!(e, TopoError::Internal(_)));
    assert!(e.to_string().contains("opposite sides"), "{e}");
}

#[test]
fn unstructured_coface_may_be_unbalanced() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [4, 4]).unwrap();
    let cf = grid.coface(0, 0);
    let top = tx.graph().coface_side(cf, 2).unwrap()[0].coedge;
    tx.update(cf, |p| p.structured = false);
    tx.update(top, |p| p.discretization = Discretization::uniform(3));
    tx.graph().validate_entity(cf.any()).unwrap();
}

#[test]
fn coedge_loop_is_rejected() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [1, 1]).unwrap();
    let ce = tx.graph().coface_side(grid.coface(0, 0), 0).unwrap()[0].coedge;
    let v = grid.vertex(0, 0);
    tx.update(ce, |p| p.vertices = [v, v]);
    let e = tx.graph().validate_entity(ce.any()).unwrap_err();
    assert!(e.to_string().contains("itself"), "{e}");
}

#[test]
fn face_slots_follow_the_corner_numbering() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_block_grid(&mut tx, Point::ORIGIN, Vector::new(1.0, 1.0, 1.0), [1, 1, 1], [1, 1, 1], None).unwrap();
    let b = grid.block(0, 0, 0);
    tx.update(b, |p| p.faces.swap(0, 1));
    let e = tx.graph().validate_entity(b.any()).unwrap_err();
    assert!(e.to_string().contains("wrong corners"), "{e}");
}

#[test]
fn destroyed_child_is_reported() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_face_grid(&mut tx, Point::ORIGIN, [1.0, 1.0], [1, 1], [1, 1]).unwrap();
    let v = grid.vertex(1, 1);
    tx.destroy(v);
    let e = tx.graph().validate_invariants().unwrap_err();
    assert!(e.to_string().contains("destroyed"), "{e}");
}

#[test]
fn corners_only_coincide_along_an_edge_line() {
    let (config, mut graph) = fresh();
    let mut tx = EditTx::new(&mut graph, &NullModel, &config);
    let grid = build_block_grid(&mut tx, Point::ORIGIN, Vector::new(1.0, 1.0, 1.0), [1, 1, 1], [1, 1, 1], None).unwrap();
    let b = grid.block(0, 0, 0);
    let v0 = tx.graph().block(b).vertices[0];
    tx.update(b, |p| p.vertices[7] = v0);
    let e = tx.graph().validate_entity(b.any()).unwrap_err();
    assert!(matches!(e, TopoError::Internal(_)));
    assert!(e.to_string().contains("corners 0 and 7"), "{e}");
}
