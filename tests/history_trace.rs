mod util;
use util::*;
use mesh_topo::command::TraceAction;
use mesh_topo::prelude::*;

#[test]
fn trace_records_do_undo_redo() {
    let (mut s, b) = cube(2);
    let ce = line_coedge(&s, b, 0, 1);
    let block_name = s.graph().name(b).to_owned();
    s.execute(SplitBlocks::new(s.graph(), &[b], ce, 0.5).unwrap()).unwrap();
    s.undo().unwrap();
    s.redo().unwrap();

    let records = s.history().records();
    let actions: Vec<TraceAction> = records.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![TraceAction::Do, TraceAction::Do, TraceAction::Undo, TraceAction::Redo]);
    assert_eq!(records[0].command, "NewBlock");
    assert!(records[1..].iter().all(|r| r.command == "SplitBlocks" && r.seq == records[1].seq));
    assert_eq!(records[1].entities[0], block_name);

    let json: serde_json::Value = serde_json::from_str(&s.history().to_json().unwrap()).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 4);
    assert_eq!(list[1]["command"], "SplitBlocks");
    assert_eq!(list[1]["parameters"]["ratio"], 0.5);
    assert_eq!(list[2]["action"], "Undo");
}

#[test]
fn failed_commands_leave_no_record() {
    let (mut s, b) = cube(1);
    let other = {
        s.execute(NewBlock::new(Point::new(3.0, 0.0, 0.0), Point::new(4.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        s.graph().live_blocks().into_iter().find(|&x| x != b).unwrap()
    };
    let n = s.history().len();
    assert!(s.execute(Fuse2Blocks::new(s.graph(), b, other).unwrap()).is_err());
    assert_eq!(s.history().len(), n);
    assert_eq!(s.last_state(), Some(CommandState::RolledBack));
}

#[test]
fn undo_depth_is_bounded() {
    let config = TopoConfig { max_undo: Some(2), ..Default::default() };
    let mut s = Session::new(config).unwrap();
    for i in 0..4 {
        let x = 2.0 * i as f64;
        s.execute(NewBlock::new(Point::new(x, 0.0, 0.0), Point::new(x + 1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
    }
    assert_eq!(s.history().undo_len(), 2);
    s.undo().unwrap();
    s.undo().unwrap();
    assert!(!s.can_undo());
    assert_eq!(s.graph().nb_blocks(), 2);
    assert_eq!(s.history().len(), 6);
}
