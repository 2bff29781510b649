//! # MIR Terminators
//!
//! This module defines terminators, which end basic blocks and transfer
//! control flow. Every basic block must end with exactly one terminator.

use rustc_hash::FxHashSet;

use crate::value_visitor::{replace_value, visit_value};
use crate::{BasicBlockId, PrettyPrint, Value};

/// A terminator ends a basic block and transfers control
///
/// Terminators are the only instructions that can change control flow, and
/// each one names its target blocks explicitly. A `Switch` may name the same
/// target from several case slots; such duplicate slots are distinct CFG
/// edges and phi operands are counted per slot, not per unique target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump: `jump target`
    Jump { target: BasicBlockId },

    /// Conditional branch: `if condition then jump then_target else jump else_target`
    If {
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    },

    /// Multi-way branch: `switch value [case -> target, ...], default`
    Switch {
        value: Value,
        cases: Vec<(i64, BasicBlockId)>,
        default: BasicBlockId,
    },

    /// Function return: `return value?`
    Return { value: Option<Value> },

    /// Unreachable code: indicates this point should never be reached
    Unreachable,
}

impl Terminator {
    /// Creates a new jump terminator
    pub const fn jump(target: BasicBlockId) -> Self {
        Self::Jump { target }
    }

    /// Creates a new conditional branch terminator
    pub const fn branch(
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    ) -> Self {
        Self::If {
            condition,
            then_target,
            else_target,
        }
    }

    /// Creates a new switch terminator
    pub const fn switch(value: Value, cases: Vec<(i64, BasicBlockId)>, default: BasicBlockId) -> Self {
        Self::Switch {
            value,
            cases,
            default,
        }
    }

    /// Creates a new return terminator with a value
    pub const fn return_value(value: Value) -> Self {
        Self::Return { value: Some(value) }
    }

    /// Creates a new void return terminator
    pub const fn return_void() -> Self {
        Self::Return { value: None }
    }

    /// Returns the successor slots of this terminator, in slot order
    ///
    /// Duplicate targets are preserved: a switch with two cases aimed at one
    /// block yields that block twice. Each entry is one CFG edge.
    pub fn target_blocks(&self) -> Vec<BasicBlockId> {
        match self {
            Self::Jump { target } => vec![*target],
            Self::If {
                then_target,
                else_target,
                ..
            } => vec![*then_target, *else_target],
            Self::Switch { cases, default, .. } => {
                let mut targets: Vec<BasicBlockId> = cases.iter().map(|(_, t)| *t).collect();
                targets.push(*default);
                targets
            }
            Self::Return { .. } | Self::Unreachable => vec![],
        }
    }

    /// Returns all values used by this terminator
    pub fn used_values(&self) -> FxHashSet<crate::ValueId> {
        let mut used = FxHashSet::default();

        match self {
            Self::If { condition, .. } => {
                visit_value(condition, |id| {
                    used.insert(id);
                });
            }

            Self::Switch { value, .. } => {
                visit_value(value, |id| {
                    used.insert(id);
                });
            }

            Self::Return { value: Some(value) } => {
                visit_value(value, |id| {
                    used.insert(id);
                });
            }

            Self::Jump { .. } | Self::Return { value: None } | Self::Unreachable => {}
        }

        used
    }

    /// Replace all uses of `from` in this terminator with the value `to`
    pub fn replace_uses_with(&mut self, from: crate::ValueId, to: Value) {
        match self {
            Self::If { condition, .. } => replace_value(condition, from, to),
            Self::Switch { value, .. } => replace_value(value, from, to),
            Self::Return { value: Some(value) } => replace_value(value, from, to),
            Self::Jump { .. } | Self::Return { value: None } | Self::Unreachable => {}
        }
    }

    /// Returns the number of successor slots
    pub fn successor_count(&self) -> usize {
        match self {
            Self::Jump { .. } => 1,
            Self::If { .. } => 2,
            Self::Switch { cases, .. } => cases.len() + 1,
            Self::Return { .. } | Self::Unreachable => 0,
        }
    }
}

impl PrettyPrint for Terminator {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::Jump { target } => {
                format!("jump bb{}", target.index())
            }

            Self::If {
                condition,
                then_target,
                else_target,
            } => {
                format!(
                    "if {} then jump bb{} else jump bb{}",
                    condition.pretty_print(0),
                    then_target.index(),
                    else_target.index()
                )
            }

            Self::Switch {
                value,
                cases,
                default,
            } => {
                let cases_str = cases
                    .iter()
                    .map(|(case, target)| format!("{} -> bb{}", case, target.index()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "switch {} [{}], default bb{}",
                    value.pretty_print(0),
                    cases_str,
                    default.index()
                )
            }

            Self::Return { value: Some(value) } => {
                format!("return {}", value.pretty_print(0))
            }

            Self::Return { value: None } => "return".to_string(),

            Self::Unreachable => "unreachable".to_string(),
        }
    }
}
