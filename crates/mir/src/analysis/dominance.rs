//! # Dominance Analysis
//!
//! Dominator tree, dominance frontiers, and the iterated dominance frontier
//! (IDF) over a function's CFG — the machinery phi placement is built on.
//!
//! The tree follows Cooper, Harvey and Kennedy's "A Simple, Fast Dominance
//! Algorithm": immediate dominators converge over a few reverse-postorder
//! sweeps, and every other dominance query walks the resulting parent
//! chains. Frontiers fall out of the join blocks: a join lands in the
//! frontier of every block between one of its predecessors and its own
//! immediate dominator, which is where competing definitions first meet.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cfg::predecessor_map;
use crate::{BasicBlockId, MirFunction};

/// Dominance frontiers represented as a mapping from each block to its
/// frontier set
pub type DominanceFrontiers = FxHashMap<BasicBlockId, FxHashSet<BasicBlockId>>;

/// The dominator tree of a function
///
/// Stored as a mapping from each block to its immediate dominator. The entry
/// block and unreachable blocks have no immediate dominator; no block
/// dominates an unreachable block (nor does an unreachable block dominate
/// anything), which keeps unreachable code out of every dominance-guided
/// rewrite.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    idom: FxHashMap<BasicBlockId, BasicBlockId>,
    entry: BasicBlockId,
}

impl DominatorTree {
    /// The entry block the tree is rooted at
    pub const fn entry(&self) -> BasicBlockId {
        self.entry
    }

    /// Returns the immediate dominator of a block, if it has one
    pub fn immediate_dominator(&self, block: BasicBlockId) -> Option<BasicBlockId> {
        self.idom.get(&block).copied()
    }

    /// Checks whether `a` dominates `b` (reflexive)
    pub fn dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        a == b || self.strictly_dominates(a, b)
    }

    /// Checks whether `a` strictly dominates `b`
    pub fn strictly_dominates(&self, a: BasicBlockId, b: BasicBlockId) -> bool {
        let mut current = b;
        while let Some(idom) = self.immediate_dominator(current) {
            if idom == a {
                return true;
            }
            current = idom;
        }
        false
    }

    /// Checks whether the instruction at `def` dominates the one at `use_site`
    ///
    /// Positions are `(block, index)` pairs; within one block the earlier
    /// instruction dominates the later one.
    pub fn dominates_instruction(
        &self,
        def: (BasicBlockId, usize),
        use_site: (BasicBlockId, usize),
    ) -> bool {
        if def.0 == use_site.0 {
            def.1 < use_site.1
        } else {
            self.strictly_dominates(def.0, use_site.0)
        }
    }
}

/// Computes the dominator tree for a function
///
/// Implements the iterative algorithm from "A Simple, Fast Dominance
/// Algorithm" (Cooper, Harvey, Kennedy): immediate dominators are refined in
/// reverse postorder, merging predecessor chains with [`intersect`] until a
/// fixed point is reached. Unreachable blocks never appear in the postorder
/// and therefore never receive an immediate dominator.
pub fn compute_dominator_tree(function: &MirFunction) -> DominatorTree {
    let entry = function.entry_block;
    let predecessors = predecessor_map(function);

    let postorder = compute_postorder(function, entry);
    let postorder_number: FxHashMap<BasicBlockId, usize> = postorder
        .iter()
        .enumerate()
        .map(|(number, &block)| (block, number))
        .collect();

    // The root is its own dominator while the fixpoint runs; stripped below.
    let mut idom: FxHashMap<BasicBlockId, BasicBlockId> = FxHashMap::default();
    idom.insert(entry, entry);

    let mut changed = true;
    while changed {
        changed = false;

        for &block in postorder.iter().rev() {
            if block == entry {
                continue;
            }

            // Merge the dominator chains of all predecessors processed so
            // far. The reverse postorder guarantees at least one on the
            // first sweep; unreachable predecessors never qualify.
            let Some(preds) = predecessors.get(&block) else {
                continue;
            };
            let mut merged: Option<BasicBlockId> = None;
            for &pred in preds {
                if !idom.contains_key(&pred) {
                    continue;
                }
                merged = Some(match merged {
                    None => pred,
                    Some(current) => intersect(pred, current, &idom, &postorder_number),
                });
            }

            if let Some(merged) = merged {
                if idom.get(&block) != Some(&merged) {
                    idom.insert(block, merged);
                    changed = true;
                }
            }
        }
    }

    idom.remove(&entry);
    DominatorTree { idom, entry }
}

/// Depth-first postorder of the blocks reachable from `entry`
fn compute_postorder(function: &MirFunction, entry: BasicBlockId) -> Vec<BasicBlockId> {
    let mut postorder = Vec::new();
    let mut visited = FxHashSet::default();
    // Each block is pushed twice: once to expand its successors, once (after
    // they are done) to take its place in the order.
    let mut stack = vec![(entry, false)];

    while let Some((block, expanded)) = stack.pop() {
        if expanded {
            postorder.push(block);
            continue;
        }
        if !visited.insert(block) {
            continue;
        }
        stack.push((block, true));
        for successor in function.basic_blocks[block].terminator.target_blocks() {
            if !visited.contains(&successor) {
                stack.push((successor, false));
            }
        }
    }

    postorder
}

/// Walks two dominator chains up to their common ancestor
///
/// The chain with the smaller postorder number is strictly deeper, so
/// advancing it can never step past the meeting point.
fn intersect(
    mut a: BasicBlockId,
    mut b: BasicBlockId,
    idom: &FxHashMap<BasicBlockId, BasicBlockId>,
    postorder_number: &FxHashMap<BasicBlockId, usize>,
) -> BasicBlockId {
    while a != b {
        while postorder_number[&a] < postorder_number[&b] {
            a = idom[&a];
        }
        while postorder_number[&b] < postorder_number[&a] {
            b = idom[&b];
        }
    }
    a
}

/// Computes dominance frontiers from the dominator tree
///
/// Standard runner formulation: for each join block B, walk each predecessor's
/// immediate-dominator chain up to (but excluding) idom(B), adding B to the
/// frontier of every block passed.
pub fn compute_dominance_frontiers(
    function: &MirFunction,
    dom_tree: &DominatorTree,
) -> DominanceFrontiers {
    let mut frontiers: DominanceFrontiers = FxHashMap::default();
    for block_id in 0..function.basic_blocks.len() {
        frontiers.insert(BasicBlockId::new(block_id), FxHashSet::default());
    }

    let predecessors = predecessor_map(function);

    for (block_id, preds) in &predecessors {
        let unique_preds: FxHashSet<BasicBlockId> = preds.iter().copied().collect();
        if unique_preds.len() < 2 {
            continue;
        }
        let Some(idom) = dom_tree.immediate_dominator(*block_id) else {
            continue;
        };

        for &pred in &unique_preds {
            let mut runner = pred;
            while runner != idom {
                frontiers.entry(runner).or_default().insert(*block_id);
                match dom_tree.immediate_dominator(runner) {
                    Some(next) => runner = next,
                    None => break,
                }
            }
        }
    }

    frontiers
}

/// Computes the iterated dominance frontier of a definition set
///
/// This is the phi-placement primitive of SSA construction: given the blocks
/// containing definitions and the blocks the value is live into, it returns
/// the blocks that need a phi. The frontier is closed transitively (a placed
/// phi is itself a definition), restricted to live-in blocks, and the result
/// is sorted by block number so placement order is deterministic.
pub fn compute_iterated_dominance_frontier(
    frontiers: &DominanceFrontiers,
    def_blocks: &FxHashSet<BasicBlockId>,
    live_in_blocks: &FxHashSet<BasicBlockId>,
) -> Vec<BasicBlockId> {
    let mut phi_blocks: FxHashSet<BasicBlockId> = FxHashSet::default();
    let mut worklist: Vec<BasicBlockId> = def_blocks.iter().copied().collect();

    while let Some(block) = worklist.pop() {
        let Some(frontier) = frontiers.get(&block) else {
            continue;
        };
        for &candidate in frontier {
            if !live_in_blocks.contains(&candidate) {
                continue;
            }
            if phi_blocks.insert(candidate) && !def_blocks.contains(&candidate) {
                // The new phi is a definition too; chase its frontier
                worklist.push(candidate);
            }
        }
    }

    let mut result: Vec<BasicBlockId> = phi_blocks.into_iter().collect();
    result.sort_unstable_by_key(|b| b.index());
    result
}
