//! # Analysis Module
//!
//! Analyses performed on MIR, currently dominance information and the
//! iterated dominance frontier used for SSA construction.

pub mod dominance;

#[cfg(test)]
mod tests;

pub use dominance::{
    compute_dominance_frontiers, compute_dominator_tree, compute_iterated_dominance_frontier,
    DominanceFrontiers, DominatorTree,
};
