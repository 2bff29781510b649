//! # Testing Utilities for MIR
//!
//! Builders for constructing MIR functions in unit tests without the
//! ceremony of pushing instructions by hand.

use crate::{
    BasicBlockId, BinaryOp, Instruction, MirFunction, MirType, Terminator, Value, ValueId,
};

/// Builder for creating test MIR functions
pub struct TestFunctionBuilder {
    function: MirFunction,
}

impl TestFunctionBuilder {
    /// Creates a builder around a fresh function with an entry block
    pub fn new(name: &str) -> Self {
        Self {
            function: MirFunction::new(name.to_string()),
        }
    }

    /// The function's entry block
    pub const fn entry(&self) -> BasicBlockId {
        self.function.entry_block
    }

    /// Adds a new basic block and returns its ID
    pub fn add_block(&mut self) -> BasicBlockId {
        self.function.add_basic_block()
    }

    /// Adds a parameter of the given type and returns its ValueId
    pub fn parameter(&mut self, ty: MirType) -> ValueId {
        self.function.add_parameter(ty)
    }

    /// Allocates a stack cell of the given type in `block`
    pub fn stack_alloc(&mut self, block: BasicBlockId, ty: MirType) -> ValueId {
        let cell = self
            .function
            .new_typed_value_id(MirType::pointer(ty.clone()));
        self.function.basic_blocks[block].push_instruction(Instruction::stack_alloc(cell, ty));
        cell
    }

    /// Stores `value` into `cell` in `block`
    pub fn store(&mut self, block: BasicBlockId, cell: ValueId, value: Value, ty: MirType) {
        self.function.basic_blocks[block].push_instruction(Instruction::store(
            Value::operand(cell),
            value,
            ty,
        ));
    }

    /// Loads from `cell` in `block` and returns the loaded value's id
    pub fn load(&mut self, block: BasicBlockId, cell: ValueId, ty: MirType) -> ValueId {
        let dest = self.function.new_typed_value_id(ty.clone());
        self.function.basic_blocks[block].push_instruction(Instruction::load(
            dest,
            ty,
            Value::operand(cell),
        ));
        dest
    }

    /// Adds an assignment in `block`
    pub fn assign(&mut self, block: BasicBlockId, source: Value) -> ValueId {
        let dest = self.function.new_typed_value_id(MirType::Int);
        self.function.basic_blocks[block].push_instruction(Instruction::assign(
            dest,
            source,
            MirType::Int,
        ));
        dest
    }

    /// Adds a binary operation in `block`
    pub fn binary_op(
        &mut self,
        block: BasicBlockId,
        op: BinaryOp,
        left: Value,
        right: Value,
    ) -> ValueId {
        let dest = self.function.new_typed_value_id(op.result_type());
        self.function.basic_blocks[block].push_instruction(Instruction::binary_op(
            op, dest, left, right,
        ));
        dest
    }

    /// Pushes an arbitrary instruction into `block`
    pub fn push(&mut self, block: BasicBlockId, instruction: Instruction) {
        self.function.basic_blocks[block].push_instruction(instruction);
    }

    /// Sets a jump terminator on `block`
    pub fn jump(&mut self, block: BasicBlockId, target: BasicBlockId) {
        self.function.basic_blocks[block].set_terminator(Terminator::jump(target));
    }

    /// Sets a conditional branch terminator on `block`
    pub fn branch(
        &mut self,
        block: BasicBlockId,
        condition: Value,
        then_target: BasicBlockId,
        else_target: BasicBlockId,
    ) {
        self.function.basic_blocks[block]
            .set_terminator(Terminator::branch(condition, then_target, else_target));
    }

    /// Sets a switch terminator on `block`
    pub fn switch(
        &mut self,
        block: BasicBlockId,
        value: Value,
        cases: Vec<(i64, BasicBlockId)>,
        default: BasicBlockId,
    ) {
        self.function.basic_blocks[block].set_terminator(Terminator::switch(value, cases, default));
    }

    /// Sets a return terminator with a value on `block`
    pub fn return_value(&mut self, block: BasicBlockId, value: Value) {
        self.function.basic_blocks[block].set_terminator(Terminator::return_value(value));
    }

    /// Sets a void return terminator on `block`
    pub fn return_void(&mut self, block: BasicBlockId) {
        self.function.basic_blocks[block].set_terminator(Terminator::return_void());
    }

    /// Finishes building and returns the function
    pub fn build(self) -> MirFunction {
        self.function
    }
}

/// Convenience functions for creating test values
pub mod values {
    use super::*;

    /// Creates an integer literal value
    pub fn int(value: i64) -> Value {
        Value::integer(value)
    }

    /// Creates a boolean literal value
    pub fn boolean(value: bool) -> Value {
        Value::boolean(value)
    }

    /// Creates an operand value
    pub fn operand(id: ValueId) -> Value {
        Value::operand(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrettyPrint;

    #[test]
    fn test_builder_straight_line() {
        let mut b = TestFunctionBuilder::new("add");
        let entry = b.entry();
        let lhs = b.parameter(MirType::Int);
        let rhs = b.parameter(MirType::Int);
        let sum = b.binary_op(
            entry,
            BinaryOp::Add,
            values::operand(lhs),
            values::operand(rhs),
        );
        b.return_value(entry, values::operand(sum));
        let function = b.build();

        assert!(function.validate().is_ok());
        assert_eq!(function.block_count(), 1);
        assert_eq!(function.parameters.len(), 2);
    }

    #[test]
    fn test_builder_memory_helpers() {
        let mut b = TestFunctionBuilder::new("mem");
        let entry = b.entry();
        let cell = b.stack_alloc(entry, MirType::Int);
        b.store(entry, cell, values::int(42), MirType::Int);
        let loaded = b.load(entry, cell, MirType::Int);
        b.return_value(entry, values::operand(loaded));
        let function = b.build();

        assert!(function.validate().is_ok());
        assert_eq!(
            function.get_value_type(cell),
            Some(&MirType::pointer(MirType::Int))
        );
        assert_eq!(function.get_value_type(loaded), Some(&MirType::Int));
    }

    #[test]
    fn test_pretty_printing() {
        let mut b = TestFunctionBuilder::new("simple");
        let entry = b.entry();
        let _result = b.assign(entry, values::int(42));
        b.return_void(entry);
        let function = b.build();

        let pretty = function.pretty_print(0);
        assert!(pretty.contains("fn simple"));
        assert!(pretty.contains("42"));
        assert!(pretty.contains("return"));
    }

    #[test]
    fn test_pretty_printing_comments_and_unary_ops() {
        let mut function = MirFunction::new("details".to_string());
        let entry = function.entry_block;
        let seed = function.new_typed_value_id(MirType::Int);
        let negated = function.new_typed_value_id(MirType::Int);

        function.basic_blocks[entry].push_instruction(
            Instruction::assign(seed, Value::integer(3), MirType::Int)
                .with_comment("seed value".to_string()),
        );
        function.basic_blocks[entry].push_instruction(Instruction::unary_op(
            crate::UnaryOp::Neg,
            negated,
            Value::operand(seed),
        ));
        function.basic_blocks[entry].set_terminator(Terminator::return_value(Value::operand(
            negated,
        )));

        let pretty = function.pretty_print(0);
        assert!(pretty.contains("// seed value"));
        assert!(pretty.contains("%1 = -%0"));
    }
}
