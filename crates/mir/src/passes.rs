//! # MIR Optimization Passes
//!
//! This module defines the pass framework and the passes that run inside it.
//! The main transformation is [`mem2reg::Mem2Reg`], which promotes stack
//! cells to SSA registers.

pub mod mem2reg;

pub use mem2reg::{promote_mem_to_reg, Mem2Reg};

use crate::cfg::predecessor_map;
use crate::{InstructionKind, MirError, MirFunction, MirModule, MirResult};
use rustc_hash::FxHashSet;

/// A trait for MIR optimization passes
pub trait MirPass {
    /// Apply this pass to a MIR function
    /// Returns true if the function was modified
    fn run(&mut self, function: &mut MirFunction) -> bool;

    /// Get the name of this pass for debugging
    fn name(&self) -> &'static str;
}

/// Analyzes a MIR function to determine if it uses stack memory operations
/// that make the promotion pass worth running.
pub fn uses_stack_memory(function: &MirFunction) -> bool {
    for block in function.basic_blocks.iter() {
        for instruction in &block.instructions {
            match &instruction.kind {
                InstructionKind::StackAlloc { .. }
                | InstructionKind::Load { .. }
                | InstructionKind::Store { .. }
                | InstructionKind::GetElementPtr { .. }
                | InstructionKind::AddressOf { .. } => {
                    return true;
                }
                _ => continue,
            }
        }
    }
    false
}

/// A wrapper for conditional pass execution
///
/// This allows passes to be skipped based on function characteristics,
/// improving compilation performance for functions that don't need certain
/// optimizations.
pub struct ConditionalPass {
    pass: Box<dyn MirPass>,
    condition: fn(&MirFunction) -> bool,
}

impl ConditionalPass {
    /// Create a new conditional pass
    pub fn new(pass: Box<dyn MirPass>, condition: fn(&MirFunction) -> bool) -> Self {
        Self { pass, condition }
    }
}

impl MirPass for ConditionalPass {
    fn run(&mut self, function: &mut MirFunction) -> bool {
        if (self.condition)(function) {
            self.pass.run(function)
        } else {
            false
        }
    }

    fn name(&self) -> &'static str {
        self.pass.name()
    }
}

/// MIR Validation Pass
///
/// Checks the invariants the rest of the pipeline relies on. Validation never
/// modifies the function; failures are reported through `log` when run as a
/// pass, or as a `MirError` through [`Validation::check`].
#[derive(Debug, Default)]
pub struct Validation;

impl Validation {
    /// Create a new validation pass
    pub const fn new() -> Self {
        Self
    }

    /// Run all checks against a function
    pub fn check(function: &MirFunction) -> MirResult<()> {
        function.validate()?;
        Self::check_phi_arity(function)?;
        Self::check_single_definition(function)?;
        Self::check_defined_uses(function)?;
        Ok(())
    }

    /// Every phi must carry exactly one operand per incoming edge
    fn check_phi_arity(function: &MirFunction) -> MirResult<()> {
        let predecessors = predecessor_map(function);

        for (block_id, block) in function.basic_blocks() {
            let edge_count = predecessors.get(&block_id).map_or(0, Vec::len);
            for instruction in block.phi_instructions() {
                let Some(sources) = instruction.phi_operands() else {
                    continue;
                };
                if sources.len() != edge_count {
                    return Err(MirError::validation_in(
                        &function.name,
                        Some(block_id),
                        format!(
                            "phi {} has {} operands for {} incoming edges",
                            instruction
                                .destination()
                                .map_or_else(|| "?".to_string(), |d| format!("%{}", d.index())),
                            sources.len(),
                            edge_count
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Each value must be defined exactly once (SSA invariant)
    fn check_single_definition(function: &MirFunction) -> MirResult<()> {
        let mut defined = FxHashSet::default();

        for &param in &function.parameters {
            if !defined.insert(param) {
                return Err(MirError::validation_in(
                    &function.name,
                    None,
                    format!("value %{} defined more than once as a parameter", param.index()),
                ));
            }
        }

        for (block_id, block) in function.basic_blocks() {
            for instruction in block.instructions() {
                if let Some(dest) = instruction.destination() {
                    if !defined.insert(dest) {
                        return Err(MirError::validation_in(
                            &function.name,
                            Some(block_id),
                            format!("value %{} defined more than once", dest.index()),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Every used value must be a parameter or defined by some instruction
    fn check_defined_uses(function: &MirFunction) -> MirResult<()> {
        let mut defined: FxHashSet<_> = function.parameters.iter().copied().collect();
        for (_, block) in function.basic_blocks() {
            for instruction in &block.instructions {
                if let Some(dest) = instruction.destination() {
                    defined.insert(dest);
                }
            }
        }

        for (block_id, block) in function.basic_blocks() {
            let mut used = FxHashSet::default();
            for instruction in block.instructions() {
                used.extend(instruction.used_values());
            }
            used.extend(block.terminator().used_values());

            for value in used {
                if !defined.contains(&value) {
                    return Err(MirError::validation_in(
                        &function.name,
                        Some(block_id),
                        format!("use of value %{} that is never defined", value.index()),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl MirPass for Validation {
    fn run(&mut self, function: &mut MirFunction) -> bool {
        if let Err(err) = Self::check(function) {
            log::error!("validation failed for function '{}': {err}", function.name);
        }

        let unreachable = function.unreachable_blocks();
        if !unreachable.is_empty() {
            log::warn!(
                "function '{}' contains {} unreachable block(s)",
                function.name,
                unreachable.len()
            );
        }

        false
    }

    fn name(&self) -> &'static str {
        "Validation"
    }
}

/// A pass manager that runs multiple passes in sequence
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn MirPass>>,
}

impl PassManager {
    /// Create a new pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Add a pass to the manager
    pub fn add_pass<P: MirPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Add a conditional pass to the manager
    /// The pass will only run if the condition function returns true
    pub fn add_conditional_pass<P: MirPass + 'static>(
        mut self,
        pass: P,
        condition: fn(&MirFunction) -> bool,
    ) -> Self {
        self.passes
            .push(Box::new(ConditionalPass::new(Box::new(pass), condition)));
        self
    }

    /// Run all passes on the function
    /// Returns true if any pass modified the function
    pub fn run(&mut self, function: &mut MirFunction) -> bool {
        let mut modified = false;

        for pass in &mut self.passes {
            if pass.run(function) {
                modified = true;
                log::debug!(
                    "pass '{}' modified function '{}'",
                    pass.name(),
                    function.name
                );
            }
        }

        modified
    }

    /// Run all passes over every function of a module, in function order
    pub fn run_module(&mut self, module: &mut MirModule) -> bool {
        let mut modified = false;
        for function in module.functions.iter_mut() {
            modified |= self.run(function);
        }
        modified
    }

    /// Create the standard optimization pipeline
    ///
    /// Promotion only runs for functions that actually touch stack memory;
    /// validation always runs afterwards.
    pub fn standard_pipeline() -> Self {
        Self::new()
            .add_conditional_pass(Mem2Reg::new(), uses_stack_memory)
            .add_pass(Validation::new())
    }
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod tests;
