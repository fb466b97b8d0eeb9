mod util;
use util::*;
use mesh_topo::prelude::*;

#[test]
fn split_single_block_at_mid_edge() {
    let (mut s, b) = cube(2);
    let ce = line_coedge(&s, b, 0, 1);
    let name = s.graph().name(b).to_owned();
    let report = s.execute(SplitBlocks::new(s.graph(), &[b], ce, 0.5).unwrap()).unwrap();
    let g = s.graph();
    assert_eq!(g.nb_blocks(), 2);
    assert!(!g.is_live(b));
    assert!(matches!(g.lookup_block(&name), Err(TopoError::IsDestroyed { .. })));
    assert_eq!(report.nb_created(EntityKind::Vertex), 4);
    let halves = report.created_blocks();
    assert_eq!(halves.len(), 2);
    let mid = g.common_cofaces(halves[0], halves[1]);
    assert_eq!(mid.len(), 1);
    for v in &g.coface(mid[0]).vertices {
        assert!((g.vertex(*v).coord.x - 0.5).abs() < 1e-12);
    }
    g.validate_invariants().unwrap();
}

#[test]
fn fuse_two_blocks_sharing_a_face() {
    let mut s = block_grid([2, 1, 1], [2, 2, 2]);
    let blocks = s.graph().live_blocks();
    let shared = s.graph().common_cofaces(blocks[0], blocks[1]);
    s.execute(Fuse2Blocks::new(s.graph(), blocks[0], blocks[1]).unwrap()).unwrap();
    let g = s.graph();
    assert_eq!(g.nb_blocks(), 1);
    assert!(blocks.iter().all(|&b| !g.is_live(b)));
    assert!(shared.iter().all(|&cf| !g.is_live(cf)));
    let fused = g.live_blocks()[0];
    assert_eq!(g.block(fused).faces.len(), 6);
    // no coface is left outside a block
    assert!(g.live_cofaces().into_iter().all(|cf| !g.coface_blocks(cf).is_empty()));
    g.validate_invariants().unwrap();
}

#[test]
fn fusing_vertices_of_one_coedge_is_rejected_up_front() {
    let (s, _) = cube(1);
    let before = s.graph().snapshot();
    let ce = s.graph().live_coedges()[0];
    let [a, b] = s.graph().coedge(ce).vertices;
    let e = Fuse2Vertices::new(s.graph(), a, b).unwrap_err();
    assert!(e.is_precondition(), "{e}");
    assert_eq!(s.graph().snapshot(), before);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn ogrid_in_a_single_block() {
    let (mut s, b) = cube(3);
    let old_vertices = s.graph().live_vertices();
    let report = s.execute(SplitBlocksWithOgrid::new(s.graph(), &[b], &[], 0.3, 3).unwrap()).unwrap();
    let g = s.graph();
    assert!(!g.is_live(b));

    let inner = report.created_vertices();
    assert_eq!(inner.len(), 8);
    for &v in &inner {
        let p = g.vertex(v).coord;
        for c in [p.x, p.y, p.z] {
            assert!((c - 0.35).abs() < 1e-9 || (c - 0.65).abs() < 1e-9, "{p}");
        }
    }
    let created = report.created_coedges();
    assert!(created.iter().all(|&ce| g.coedge(ce).nb_edges() == 3));
    let radial: Vec<CoEdgeId> = created
        .iter()
        .copied()
        .filter(|&ce| g.coedge(ce).vertices.iter().any(|v| old_vertices.contains(v)))
        .collect();
    assert_eq!(radial.len(), 8);
    assert_eq!(created.len() - radial.len(), 12);

    let blocks = report.created_blocks();
    assert_eq!(blocks.len(), 7);
    let central: Vec<BlockId> = blocks
        .iter()
        .copied()
        .filter(|&nb| g.block(nb).vertices.iter().all(|v| inner.contains(v)))
        .collect();
    assert_eq!(central.len(), 1);
    g.validate_invariants().unwrap();
}
