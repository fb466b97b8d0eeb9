mod util;
use util::*;
use mesh_topo::prelude::*;

#[test]
fn glued_blocks_then_split_across_both() {
    let mut s = Session::default();
    s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
    s.execute(NewBlock::new(Point::new(1.0, 0.0, 0.0), Point::new(2.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
    let blocks = s.graph().live_blocks();
    s.execute(Glue2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap()).unwrap();
    let ce = line_coedge(&s, blocks[0], 0, 2);
    s.execute(SplitBlocks::new(s.graph(), &blocks, ce, 0.5).unwrap()).unwrap();
    assert_eq!(s.graph().nb_blocks(), 4);
    s.graph().validate_invariants().unwrap();
}

#[test]
fn segment_count_follows_structured_rows() {
    let mut s = block_grid([1, 2, 1], [2, 2, 2]);
    let b = s.graph().live_blocks()[0];
    let ce = line_coedge(&s, b, 0, 1);
    s.execute(SetNbMeshingEdges::new(s.graph(), ce, 5, &[]).unwrap()).unwrap();
    let g = s.graph();
    for b in g.live_blocks() {
        assert_eq!(g.block_nb_edges(b, 0).unwrap(), 5);
        assert_eq!(g.block_nb_edges(b, 1).unwrap(), 2);
    }
    g.validate_invariants().unwrap();
}

#[test]
fn split_faces_of_a_grid() {
    let mut s = face_grid(Point::ORIGIN, [2, 2], [4, 4]);
    let cofaces = s.graph().live_cofaces();
    let g = s.graph();
    let ce = g.coface_side(cofaces[0], 0).unwrap()[0].coedge;
    let e = s.execute(SplitFaces::new(s.graph(), &cofaces, ce, 0.5).unwrap()).unwrap_err();
    assert!(matches!(e, TopoError::PropagationExhausted { .. }), "{e}");
    s.execute(SplitFaces::all_cofaces(s.graph(), ce, 0.5).unwrap()).unwrap();
    assert_eq!(s.graph().nb_cofaces(), 6);
    s.undo().unwrap();
    assert_eq!(s.graph().nb_cofaces(), 4);
}

#[test]
fn fused_vertex_takes_over_references() {
    let mut s = Session::default();
    s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
    s.execute(NewBlock::new(Point::new(2.0, 0.0, 0.0), Point::new(3.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
    let g = s.graph();
    let a = vertex_at(g, Point::new(1.0, 0.0, 0.0)).unwrap();
    let b = vertex_at(g, Point::new(2.0, 0.0, 0.0)).unwrap();
    let uses = g.vertex_coedges(b);
    s.execute(Fuse2Vertices::new(s.graph(), a, b).unwrap()).unwrap();
    let g = s.graph();
    assert!(!g.is_live(b));
    assert_eq!(g.vertex_coedges(a).len(), 6);
    assert!(uses.iter().all(|&ce| !g.is_live(ce) || g.coedge(ce).vertices.contains(&a)));
}

#[test]
fn extruded_layer_splits_and_loses_a_corner() {
    let mut s = face_grid(Point::ORIGIN, [2, 2], [2, 2]);
    let cofaces = s.graph().live_cofaces();
    s.execute(ExtrudeFaces::new(s.graph(), &cofaces, Point::new(0.0, 0.0, 1.0)).unwrap()).unwrap();
    let blocks = s.graph().live_blocks();
    assert_eq!(blocks.len(), 4);
    s.graph().validate_invariants().unwrap();
    let extruded = s.graph().snapshot();

    let rail = line_coedge(&s, blocks[0], 0, 4);
    s.execute(SplitBlocks::new(s.graph(), &blocks, rail, 0.5).unwrap()).unwrap();
    assert_eq!(s.graph().nb_blocks(), 8);
    assert!(vertex_at(s.graph(), Point::new(2.0, 2.0, 0.5)).is_some());

    let corner = vertex_at(s.graph(), Point::ORIGIN).unwrap();
    let report = s.execute(DestroyEntities::new(s.graph(), &[corner.into()], true).unwrap()).unwrap();
    assert_eq!(report.nb_destroyed(EntityKind::Block), 1);
    assert!(vertex_at(s.graph(), Point::ORIGIN).is_none());
    s.graph().validate_invariants().unwrap();

    s.undo().unwrap();
    s.undo().unwrap();
    assert_eq!(s.graph().snapshot(), extruded);
}
