//! # MIR Function
//!
//! This module defines the function-level MIR representation, including
//! the Control Flow Graph (CFG) of basic blocks.

use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    indent_str, BasicBlock, BasicBlockId, MirError, MirResult, MirType, PrettyPrint, Value, ValueId,
};

/// The MIR for a single function, laid out as a Control Flow Graph (CFG)
///
/// # Design Notes
///
/// - Basic blocks are stored in an `IndexVec`; a block's index is its stable
///   number for deterministic ordering
/// - Each function has exactly one entry block, which has no predecessors
/// - Value ids are allocated monotonically and never reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirFunction {
    /// The name of the function (for debugging and linking)
    pub name: String,

    /// All basic blocks in this function, forming the CFG
    pub basic_blocks: IndexVec<BasicBlockId, BasicBlock>,

    /// The entry point of the function
    pub entry_block: BasicBlockId,

    /// Function parameters, in signature order
    pub parameters: Vec<ValueId>,

    /// Type information for each value in the function
    pub value_types: FxHashMap<ValueId, MirType>,

    /// Next available value ID for generating new temporaries
    pub(crate) next_value_id: u32,
}

impl MirFunction {
    /// Creates a new empty function with the given name
    pub fn new(name: String) -> Self {
        let mut basic_blocks = IndexVec::new();
        let entry_block = basic_blocks.push(BasicBlock::new());

        Self {
            name,
            basic_blocks,
            entry_block,
            parameters: Vec::new(),
            value_types: FxHashMap::default(),
            next_value_id: 0,
        }
    }

    /// Adds a new basic block and returns its ID
    pub fn add_basic_block(&mut self) -> BasicBlockId {
        self.basic_blocks.push(BasicBlock::new())
    }

    /// Gets a basic block by ID
    pub fn get_basic_block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.basic_blocks.get(id)
    }

    /// Gets a mutable reference to a basic block by ID
    pub fn get_basic_block_mut(&mut self, id: BasicBlockId) -> Option<&mut BasicBlock> {
        self.basic_blocks.get_mut(id)
    }

    /// Generates a new unique value ID within this function
    pub fn new_value_id(&mut self) -> ValueId {
        let id = ValueId::new(self.next_value_id as usize);
        self.next_value_id += 1;
        id
    }

    /// Generates a new unique value ID with type information
    pub fn new_typed_value_id(&mut self, mir_type: MirType) -> ValueId {
        let id = self.new_value_id();
        self.value_types.insert(id, mir_type);
        id
    }

    /// Adds a parameter of the given type and returns its ValueId
    pub fn add_parameter(&mut self, mir_type: MirType) -> ValueId {
        let id = self.new_typed_value_id(mir_type);
        self.parameters.push(id);
        id
    }

    /// Returns true if the given value is a function parameter
    pub fn is_parameter(&self, value_id: ValueId) -> bool {
        self.parameters.contains(&value_id)
    }

    /// Gets the type for a value ID
    pub fn get_value_type(&self, value_id: ValueId) -> Option<&MirType> {
        self.value_types.get(&value_id)
    }

    /// Returns an iterator over all basic blocks
    pub fn basic_blocks(&self) -> impl Iterator<Item = (BasicBlockId, &BasicBlock)> {
        self.basic_blocks.iter_enumerated()
    }

    /// Returns the number of basic blocks in this function
    pub fn block_count(&self) -> usize {
        self.basic_blocks.len()
    }

    /// Replace every use of `from` across the function with the value `to`
    ///
    /// Rewrites operand positions in instructions and terminators alike;
    /// definitions are untouched.
    pub fn replace_all_uses(&mut self, from: ValueId, to: Value) {
        if to == Value::Operand(from) {
            return;
        }

        for block in self.basic_blocks.iter_mut() {
            for instruction in &mut block.instructions {
                instruction.replace_uses_with(from, to);
            }
            block.terminator.replace_uses_with(from, to);
        }
    }

    /// Returns the definition site of a value, if an instruction defines it
    ///
    /// Parameters have no definition site. The returned pair is the block and
    /// the instruction's position within it.
    pub fn definition_site(&self, value_id: ValueId) -> Option<(BasicBlockId, usize)> {
        for (block_id, block) in self.basic_blocks() {
            for (index, instruction) in block.instructions.iter().enumerate() {
                if instruction.destination() == Some(value_id) {
                    return Some((block_id, index));
                }
            }
        }
        None
    }

    /// Returns true if any instruction or terminator uses the value
    pub fn has_uses(&self, value_id: ValueId) -> bool {
        for (_, block) in self.basic_blocks() {
            for instruction in &block.instructions {
                if instruction.used_values().contains(&value_id) {
                    return true;
                }
            }
            if block.terminator.used_values().contains(&value_id) {
                return true;
            }
        }
        false
    }

    /// Validates the function structure
    ///
    /// Checks:
    /// - Entry block exists
    /// - All referenced blocks exist
    /// - Per-block invariants hold
    pub fn validate(&self) -> MirResult<()> {
        if self.basic_blocks.get(self.entry_block).is_none() {
            return Err(MirError::validation_in(
                &self.name,
                Some(self.entry_block),
                "entry block does not exist",
            ));
        }

        for (block_id, block) in self.basic_blocks() {
            if let Err(err) = block.validate() {
                return Err(MirError::validation_in(&self.name, Some(block_id), err));
            }

            for target in block.terminator().target_blocks() {
                if self.basic_blocks.get(target).is_none() {
                    return Err(MirError::validation_in(
                        &self.name,
                        Some(block_id),
                        format!("terminator targets non-existent block bb{}", target.index()),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Checks if a basic block is reachable from the entry block
    pub fn is_block_reachable(&self, target: BasicBlockId) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![self.entry_block];

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }

            if visited.insert(current) {
                if let Some(block) = self.get_basic_block(current) {
                    for successor in block.terminator.target_blocks() {
                        stack.push(successor);
                    }
                }
            }
        }

        false
    }

    /// Returns all unreachable basic blocks
    pub fn unreachable_blocks(&self) -> Vec<BasicBlockId> {
        self.basic_blocks()
            .map(|(id, _)| id)
            .filter(|&id| !self.is_block_reachable(id))
            .collect()
    }
}

impl PrettyPrint for MirFunction {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = String::new();
        let base_indent = indent_str(indent);

        result.push_str(&format!("{}fn {} {{\n", base_indent, self.name));

        if !self.parameters.is_empty() {
            let params = self
                .parameters
                .iter()
                .map(|p| p.pretty_print(0))
                .collect::<Vec<_>>()
                .join(", ");
            result.push_str(&format!("{base_indent}  parameters: {params}\n"));
        }

        result.push_str(&format!(
            "{}  entry: bb{}\n",
            base_indent,
            self.entry_block.index()
        ));
        result.push('\n');

        for (block_id, block) in self.basic_blocks() {
            result.push_str(&format!("{}  bb{}:\n", base_indent, block_id.index()));
            result.push_str(&block.pretty_print(indent + 2));
            result.push('\n');
        }

        result.push_str(&format!("{base_indent}}}\n"));
        result
    }
}
