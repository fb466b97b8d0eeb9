mod util;
use util::*;
use mesh_topo::prelude::*;
use mesh_topo::topo_error::ErrorCategory;

#[test]
fn names_resolve_to_live_or_destroyed_entities() {
    let (mut s, b) = cube(2);
    let name = s.graph().name(b).to_owned();
    assert!(name.starts_with("Bl"));
    assert_eq!(s.graph().lookup_block(&name).unwrap(), b);

    let ce = line_coedge(&s, b, 0, 1);
    s.execute(SplitBlocks::new(s.graph(), &[b], ce, 0.5).unwrap()).unwrap();
    let e = s.graph().lookup_block(&name).unwrap_err();
    assert_eq!(e, TopoError::IsDestroyed { kind: EntityKind::Block, name: name.clone() });
    assert_eq!(e.category(), ErrorCategory::Lookup);
    assert_eq!(s.graph().lookup_opt::<BlockId>(&name), None);
    assert_eq!(s.graph().lookup_any_state::<BlockId>(&name), Some(b));

    let e = s.graph().lookup_vertex("Som9999").unwrap_err();
    assert!(matches!(e, TopoError::NotFound { kind: EntityKind::Vertex, .. }));

    s.undo().unwrap();
    assert_eq!(s.graph().lookup_block(&name).unwrap(), b);
}

#[test]
fn names_follow_the_configured_prefixes() {
    let config = TopoConfig::from_json_str(r#"{ "names": { "block": "Blk", "vertex": "P" } }"#).unwrap();
    let mut s = Session::new(config).unwrap();
    s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
    let g = s.graph();
    assert!(g.live_blocks().iter().all(|&b| g.name(b).starts_with("Blk")));
    assert!(g.live_vertices().iter().all(|&v| g.name(v).starts_with('P')));
    let mut names: Vec<&str> = g.live_vertices().into_iter().map(|v| g.name(v)).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 8);
}

#[test]
fn garbage_collection_spares_the_history() {
    let config = TopoConfig { max_undo: Some(1), ..Default::default() };
    let mut s = Session::new(config).unwrap();
    s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [2, 2, 2]).unwrap()).unwrap();
    let b = s.graph().live_blocks()[0];
    let name = s.graph().name(b).to_owned();
    let ce = line_coedge(&s, b, 0, 1);
    s.execute(SplitBlocks::new(s.graph(), &[b], ce, 0.5).unwrap()).unwrap();
    // the split can still be undone: nothing it destroyed may go
    assert_eq!(s.collect_garbage(), 0);

    let half = s.graph().live_blocks()[0];
    let ce = line_coedge(&s, half, 0, 2);
    s.execute(SplitBlocks::new(s.graph(), &[half], ce, 0.5).unwrap()).unwrap();
    assert!(s.collect_garbage() > 0);
    assert!(matches!(s.graph().lookup_block(&name), Err(TopoError::NotFound { .. })));
    // the latest split survives the collection
    s.undo().unwrap();
    assert!(s.graph().is_live(half));
    assert!(!s.can_undo());
    s.graph().validate_invariants().unwrap();
}

#[test]
fn bad_configuration_is_reported() {
    for json in [r#"{ "default_nb_edges": 0 }"#, r#"{ "tolerance": -1.0 }"#, r#"{ "max_undo": 0 }"#, "not json"] {
        let e = TopoConfig::from_json_str(json).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Config, "{json}");
    }
}
