//! # Control Flow Graph Utilities
//!
//! Common queries over the CFG structure of a function: successor and
//! predecessor edges, and deduplication helpers for traversals.
//!
//! Predecessors are derived from terminators rather than cached on blocks, so
//! they can never go stale while a pass rewrites the function.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{BasicBlockId, MirFunction, Terminator};

/// Get all successor slots of a given block, in slot order
///
/// Duplicate targets are preserved; each entry is one CFG edge.
pub fn successors(function: &MirFunction, block_id: BasicBlockId) -> Vec<BasicBlockId> {
    function
        .basic_blocks
        .get(block_id)
        .map(|block| block.terminator.target_blocks())
        .unwrap_or_default()
}

/// Get the distinct successors of a terminator, preserving first-seen order
pub fn distinct_successors(terminator: &Terminator) -> Vec<BasicBlockId> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    for target in terminator.target_blocks() {
        if seen.insert(target) {
            result.push(target);
        }
    }
    result
}

/// Count the edges from `pred` to `succ`
///
/// A switch whose cases share a target contributes one edge per case slot;
/// phi operands are counted against this edge count.
pub fn edge_count(function: &MirFunction, pred: BasicBlockId, succ: BasicBlockId) -> usize {
    successors(function, pred)
        .into_iter()
        .filter(|&t| t == succ)
        .count()
}

/// Build the predecessor map of a function
///
/// The result maps each block to the multiset of its predecessors: a block
/// appears once per edge, in block-then-slot order, so the list is
/// deterministic and its length equals the block's incoming edge count.
pub fn predecessor_map(function: &MirFunction) -> FxHashMap<BasicBlockId, Vec<BasicBlockId>> {
    let mut predecessors: FxHashMap<BasicBlockId, Vec<BasicBlockId>> = FxHashMap::default();

    for (block_id, block) in function.basic_blocks.iter_enumerated() {
        for successor in block.terminator.target_blocks() {
            predecessors.entry(successor).or_default().push(block_id);
        }
    }

    predecessors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicBlock, MirFunction, MirType, Terminator, Value};

    fn create_diamond_cfg() -> MirFunction {
        let mut function = MirFunction::new("test_diamond".to_string());

        // Entry, Left, Right, Merge
        let left = function.add_basic_block();
        let right = function.add_basic_block();
        let merge = function.add_basic_block();
        let entry = function.entry_block;

        let cond = function.new_typed_value_id(MirType::Bool);
        function.basic_blocks[entry].terminator =
            Terminator::branch(Value::operand(cond), left, right);
        function.basic_blocks[left].terminator = Terminator::jump(merge);
        function.basic_blocks[right].terminator = Terminator::jump(merge);
        function.basic_blocks[merge].terminator = Terminator::return_void();

        function
    }

    #[test]
    fn test_successors() {
        let function = create_diamond_cfg();
        let entry = function.entry_block;

        let entry_succs = successors(&function, entry);
        assert_eq!(entry_succs.len(), 2);

        let merge_succs = successors(&function, BasicBlockId::new(3));
        assert!(merge_succs.is_empty());
    }

    #[test]
    fn test_predecessor_map() {
        let function = create_diamond_cfg();
        let preds = predecessor_map(&function);

        assert!(preds.get(&function.entry_block).is_none());

        let merge_preds = &preds[&BasicBlockId::new(3)];
        assert_eq!(merge_preds.len(), 2);
        assert!(merge_preds.contains(&BasicBlockId::new(1)));
        assert!(merge_preds.contains(&BasicBlockId::new(2)));
    }

    #[test]
    fn test_duplicate_switch_edges() {
        let mut function = MirFunction::new("test_switch".to_string());
        let target = function.add_basic_block();
        let default = function.add_basic_block();
        let entry = function.entry_block;

        let scrutinee = function.new_typed_value_id(MirType::Int);
        function.basic_blocks[entry].terminator = Terminator::switch(
            Value::operand(scrutinee),
            vec![(1, target), (2, target)],
            default,
        );
        function.basic_blocks[target].terminator = Terminator::return_void();
        function.basic_blocks[default].terminator = Terminator::return_void();

        assert_eq!(edge_count(&function, entry, target), 2);
        assert_eq!(edge_count(&function, entry, default), 1);
        assert_eq!(
            function.basic_blocks[entry].terminator.successor_count(),
            3
        );

        let preds = predecessor_map(&function);
        assert_eq!(preds[&target], vec![entry, entry]);

        let distinct = distinct_successors(&function.basic_blocks[entry].terminator);
        assert_eq!(distinct, vec![target, default]);
    }

    #[test]
    fn test_successors_of_empty_block() {
        let mut function = MirFunction::new("test_empty".to_string());
        function.basic_blocks.push(BasicBlock::new());

        // Unreachable placeholder terminator has no successors
        assert!(successors(&function, BasicBlockId::new(1)).is_empty());
    }
}
