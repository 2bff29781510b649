use rustc_hash::FxHashSet;

use super::dominance::*;
use crate::{BasicBlockId, MirFunction, MirType, Terminator, Value};

fn bb(index: usize) -> BasicBlockId {
    BasicBlockId::new(index)
}

/// entry -> {left, right} -> merge
fn diamond() -> MirFunction {
    let mut function = MirFunction::new("diamond".to_string());
    let left = function.add_basic_block();
    let right = function.add_basic_block();
    let merge = function.add_basic_block();
    let entry = function.entry_block;

    let cond = function.new_typed_value_id(MirType::Bool);
    function.basic_blocks[entry].terminator = Terminator::branch(Value::operand(cond), left, right);
    function.basic_blocks[left].terminator = Terminator::jump(merge);
    function.basic_blocks[right].terminator = Terminator::jump(merge);
    function.basic_blocks[merge].terminator = Terminator::return_void();

    function
}

/// entry -> header; header -> {body, exit}; body -> header
fn simple_loop() -> MirFunction {
    let mut function = MirFunction::new("loop".to_string());
    let header = function.add_basic_block();
    let body = function.add_basic_block();
    let exit = function.add_basic_block();
    let entry = function.entry_block;

    let cond = function.new_typed_value_id(MirType::Bool);
    function.basic_blocks[entry].terminator = Terminator::jump(header);
    function.basic_blocks[header].terminator = Terminator::branch(Value::operand(cond), body, exit);
    function.basic_blocks[body].terminator = Terminator::jump(header);
    function.basic_blocks[exit].terminator = Terminator::return_void();

    function
}

#[test]
fn test_diamond_immediate_dominators() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);

    assert_eq!(dt.entry(), function.entry_block);
    assert_eq!(dt.immediate_dominator(bb(0)), None);
    assert_eq!(dt.immediate_dominator(bb(1)), Some(bb(0)));
    assert_eq!(dt.immediate_dominator(bb(2)), Some(bb(0)));
    // The merge block is dominated by the entry, not by either arm
    assert_eq!(dt.immediate_dominator(bb(3)), Some(bb(0)));
}

#[test]
fn test_diamond_dominance_queries() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);

    assert!(dt.dominates(bb(0), bb(3)));
    assert!(dt.strictly_dominates(bb(0), bb(1)));
    assert!(!dt.strictly_dominates(bb(1), bb(3)));
    assert!(!dt.dominates(bb(1), bb(2)));
    assert!(dt.dominates(bb(2), bb(2)));
    assert!(!dt.strictly_dominates(bb(2), bb(2)));
}

#[test]
fn test_diamond_frontiers() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);
    let frontiers = compute_dominance_frontiers(&function, &dt);

    // Each arm's frontier is the merge block; entry and merge have none
    assert!(frontiers[&bb(0)].is_empty());
    assert_eq!(frontiers[&bb(1)], FxHashSet::from_iter([bb(3)]));
    assert_eq!(frontiers[&bb(2)], FxHashSet::from_iter([bb(3)]));
    assert!(frontiers[&bb(3)].is_empty());
}

#[test]
fn test_loop_dominators_and_frontiers() {
    let function = simple_loop();
    let dt = compute_dominator_tree(&function);

    assert_eq!(dt.immediate_dominator(bb(1)), Some(bb(0)));
    assert_eq!(dt.immediate_dominator(bb(2)), Some(bb(1)));
    assert_eq!(dt.immediate_dominator(bb(3)), Some(bb(1)));

    let frontiers = compute_dominance_frontiers(&function, &dt);

    // The header is its own frontier through the back edge
    assert_eq!(frontiers[&bb(1)], FxHashSet::from_iter([bb(1)]));
    assert_eq!(frontiers[&bb(2)], FxHashSet::from_iter([bb(1)]));
}

#[test]
fn test_unreachable_block_is_not_dominated() {
    let mut function = MirFunction::new("unreachable".to_string());
    let dead = function.add_basic_block();
    function.basic_blocks[function.entry_block].terminator = Terminator::return_void();
    function.basic_blocks[dead].terminator = Terminator::return_void();

    let dt = compute_dominator_tree(&function);

    assert_eq!(dt.immediate_dominator(dead), None);
    assert!(!dt.dominates(function.entry_block, dead));
}

#[test]
fn test_instruction_dominance_within_block() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);

    assert!(dt.dominates_instruction((bb(0), 0), (bb(0), 1)));
    assert!(!dt.dominates_instruction((bb(0), 1), (bb(0), 1)));
    assert!(!dt.dominates_instruction((bb(0), 2), (bb(0), 1)));
    assert!(dt.dominates_instruction((bb(0), 5), (bb(3), 0)));
    assert!(!dt.dominates_instruction((bb(1), 0), (bb(2), 0)));
}

#[test]
fn test_idf_of_diamond_arms() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);
    let frontiers = compute_dominance_frontiers(&function, &dt);

    let defs = FxHashSet::from_iter([bb(1), bb(2)]);
    let live_in = FxHashSet::from_iter([bb(3)]);

    let idf = compute_iterated_dominance_frontier(&frontiers, &defs, &live_in);
    assert_eq!(idf, vec![bb(3)]);
}

#[test]
fn test_idf_respects_live_in_restriction() {
    let function = diamond();
    let dt = compute_dominator_tree(&function);
    let frontiers = compute_dominance_frontiers(&function, &dt);

    let defs = FxHashSet::from_iter([bb(1), bb(2)]);
    let live_in = FxHashSet::default();

    let idf = compute_iterated_dominance_frontier(&frontiers, &defs, &live_in);
    assert!(idf.is_empty());
}

#[test]
fn test_idf_iterates_through_new_phis() {
    // entry -> {a, d}; a -> {b, c}; b -> j1; c -> j1; j1 -> j2; d -> j2
    // A definition in `b` alone forces a phi at j1, and that phi is a new
    // definition whose frontier forces a second phi at j2.
    let mut function = MirFunction::new("idf_chain".to_string());
    let a = function.add_basic_block();
    let d = function.add_basic_block();
    let b = function.add_basic_block();
    let c = function.add_basic_block();
    let j1 = function.add_basic_block();
    let j2 = function.add_basic_block();
    let entry = function.entry_block;

    let cond = function.new_typed_value_id(MirType::Bool);
    function.basic_blocks[entry].terminator = Terminator::branch(Value::operand(cond), a, d);
    function.basic_blocks[a].terminator = Terminator::branch(Value::operand(cond), b, c);
    function.basic_blocks[b].terminator = Terminator::jump(j1);
    function.basic_blocks[c].terminator = Terminator::jump(j1);
    function.basic_blocks[j1].terminator = Terminator::jump(j2);
    function.basic_blocks[d].terminator = Terminator::jump(j2);
    function.basic_blocks[j2].terminator = Terminator::return_void();

    let dt = compute_dominator_tree(&function);
    let frontiers = compute_dominance_frontiers(&function, &dt);

    let defs = FxHashSet::from_iter([b]);
    let live_in = FxHashSet::from_iter([j1, j2]);

    let idf = compute_iterated_dominance_frontier(&frontiers, &defs, &live_in);
    assert_eq!(idf, vec![j1, j2]);
}
