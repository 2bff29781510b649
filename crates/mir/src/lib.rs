//! # Lyra Intermediate Representation (MIR)
//!
//! This crate defines the mid-level intermediate representation of the Lyra
//! compiler together with the analyses and transformations that operate on it.
//! The centerpiece is the memory-to-register promotion pass, which rewrites
//! stack-allocated locals accessed through explicit loads and stores into SSA
//! values with phi instructions at control-flow join points.
//!
//! ## Design Principles
//!
//! 1. **Control Flow Graph (CFG)**: Functions are directed graphs of basic blocks
//! 2. **Three-Address Code (TAC)**: Instructions are simple, atomic operations
//! 3. **Static Single Assignment (SSA)**: Each virtual register is assigned exactly once
//! 4. **Explicit Control Flow**: All control flow goes through terminators
//!
//! ## Architecture
//!
//! ```text
//! MirModule
//! functions: IndexVec<FunctionId, MirFunction>
//!
//! MirFunction
//! basic_blocks: IndexVec<BasicBlockId, BasicBlock>
//! entry_block: BasicBlockId
//!
//! BasicBlock
//! instructions: Vec<Instruction>
//! terminator: Terminator
//! ```

// Re-export commonly used types from submodules
pub use basic_block::BasicBlock;
pub use function::MirFunction;
pub use instruction::{BinaryOp, Instruction, InstructionKind, UnaryOp};
pub use module::MirModule;
pub use passes::{Mem2Reg, MirPass, PassManager, Validation};
pub use terminator::Terminator;
pub use types::MirType;
pub use value::{Literal, Value};

pub mod analysis;
pub mod basic_block;
pub mod cfg;
pub mod function;
pub mod instruction;
pub mod module;
pub mod passes;
pub mod terminator;
pub mod types;
pub mod value;
pub(crate) mod value_visitor;

#[cfg(test)]
pub mod testing;

// --- Core Identifiers ---

index_vec::define_index_type! {
    /// Unique identifier for a function within a MIR module
    pub struct FunctionId = usize;
}

index_vec::define_index_type! {
    /// Unique identifier for a basic block within a function
    ///
    /// The underlying index doubles as the stable block numbering: blocks are
    /// numbered by forward iteration order, and every analysis or pass that
    /// needs a deterministic tie-break sorts on it.
    pub struct BasicBlockId = usize;
}

index_vec::define_index_type! {
    /// Unique identifier for a value (virtual register) within a function
    pub struct ValueId = usize;
}

// --- Error Types ---

/// Represents an error in MIR construction or validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MirError {
    /// Invalid MIR structure (validation error)
    #[error("validation failed{}: {message}", validation_context(.function, .block))]
    Validation {
        message: String,
        function: Option<String>,
        block: Option<BasicBlockId>,
    },

    /// A function name was looked up that the module does not contain
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },
}

fn validation_context(function: &Option<String>, block: &Option<BasicBlockId>) -> String {
    let mut context = String::new();
    if let Some(function) = function {
        context.push_str(&format!(" in '{function}'"));
    }
    if let Some(block) = block {
        context.push_str(&format!(" at bb{}", block.index()));
    }
    context
}

impl MirError {
    /// A validation error with no particular function or block attached
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            function: None,
            block: None,
        }
    }

    /// A validation error located in a function, and optionally a block
    pub(crate) fn validation_in(
        function: &str,
        block: Option<BasicBlockId>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            function: Some(function.to_string()),
            block,
        }
    }
}

/// Result type for MIR operations
pub type MirResult<T> = Result<T, MirError>;

// --- Pretty Printing Support ---

/// Trait for pretty-printing MIR constructs
///
/// All implementations produce deterministic output: blocks in numbering
/// order, operands in operand order, no hash-map iteration. Printed IR is
/// therefore suitable for textual comparison in tests.
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize) -> String;
}

/// Helper function to create indentation
pub(crate) fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}
