use super::*;
use crate::testing::{values, TestFunctionBuilder};
use crate::{
    BasicBlockId, Instruction, MirFunction, MirModule, MirType, PrettyPrint, Terminator, Value,
};

fn memory_function() -> MirFunction {
    let mut b = TestFunctionBuilder::new("memory");
    let entry = b.entry();
    let cell = b.stack_alloc(entry, MirType::Int);
    b.store(entry, cell, values::int(1), MirType::Int);
    let loaded = b.load(entry, cell, MirType::Int);
    b.return_value(entry, values::operand(loaded));
    b.build()
}

#[test]
fn test_uses_stack_memory() {
    assert!(uses_stack_memory(&memory_function()));

    let mut b = TestFunctionBuilder::new("pure");
    let entry = b.entry();
    let value = b.assign(entry, values::int(1));
    b.return_value(entry, values::operand(value));
    assert!(!uses_stack_memory(&b.build()));
}

#[test]
fn test_conditional_pass_skips_memoryless_functions() {
    let mut b = TestFunctionBuilder::new("pure");
    let entry = b.entry();
    let value = b.assign(entry, values::int(1));
    b.return_value(entry, values::operand(value));
    let mut function = b.build();

    let mut pass = ConditionalPass::new(Box::new(Mem2Reg::new()), uses_stack_memory);
    assert!(!pass.run(&mut function));
}

#[test]
fn test_standard_pipeline_promotes() {
    let mut function = memory_function();

    let mut pipeline = PassManager::standard_pipeline();
    assert!(pipeline.run(&mut function));

    // Promotion removed every instruction; only the folded return remains
    assert!(function.basic_blocks[function.entry_block].is_empty());
    assert_eq!(
        function.basic_blocks[function.entry_block].terminator,
        Terminator::return_value(Value::integer(1))
    );

    // A second run has nothing left to do
    assert!(!pipeline.run(&mut function));
}

#[test]
fn test_pipeline_runs_over_module() {
    let mut module = MirModule::new();
    let memory_id = module.add_function(memory_function());
    module.add_function({
        let mut b = TestFunctionBuilder::new("empty");
        let entry = b.entry();
        b.return_void(entry);
        b.build()
    });
    assert_eq!(module.function_count(), 2);

    let mut pipeline = PassManager::standard_pipeline();
    assert!(pipeline.run_module(&mut module));
    assert!(module.validate().is_ok());

    // The memory function was promoted in place
    let promoted = module.get_function(memory_id).expect("function exists");
    assert!(promoted.basic_blocks[promoted.entry_block].is_empty());

    let pretty = module.pretty_print(0);
    assert!(pretty.contains("fn memory"));
    assert!(pretty.contains("fn empty"));
}

#[test]
fn test_module_function_lookup() {
    let mut module = MirModule::new();
    module.add_function(memory_function());

    let id = module.lookup_function("memory").expect("known function");
    assert!(module.lookup_function("missing").is_err());

    // A pass can be pointed at a single function through the mutable accessor
    let mut pass = Mem2Reg::new();
    assert!(pass.run(module.get_function_mut(id).expect("function exists")));
    assert_eq!(pass.stats().cells_promoted, 1);
}

#[test]
fn test_validation_accepts_promoted_function() {
    let mut function = memory_function();
    let mut pass = Mem2Reg::new();
    assert!(pass.run(&mut function));

    assert!(Validation::check(&function).is_ok());
}

#[test]
fn test_validation_rejects_phi_arity_mismatch() {
    let mut b = TestFunctionBuilder::new("bad_phi");
    let entry = b.entry();
    let target = b.add_block();
    b.jump(entry, target);
    b.return_void(target);
    let mut function = b.build();

    // A phi with two operands in a block with a single incoming edge
    let phi = function.new_typed_value_id(MirType::Int);
    function.basic_blocks[target].push_phi_front(Instruction::phi(
        phi,
        MirType::Int,
        vec![
            (function.entry_block, Value::integer(1)),
            (function.entry_block, Value::integer(2)),
        ],
    ));

    assert!(Validation::check(&function).is_err());
}

#[test]
fn test_validation_rejects_double_definition() {
    let mut b = TestFunctionBuilder::new("bad_ssa");
    let entry = b.entry();
    let value = b.assign(entry, values::int(1));
    b.return_value(entry, values::operand(value));
    let mut function = b.build();

    let duplicate = Instruction::assign(value, Value::integer(2), MirType::Int);
    function.basic_blocks[entry].instructions.push(duplicate);

    assert!(Validation::check(&function).is_err());
}

#[test]
fn test_validation_rejects_undefined_use() {
    let mut b = TestFunctionBuilder::new("bad_use");
    let entry = b.entry();
    b.return_value(entry, values::operand(crate::ValueId::new(99)));
    let function = b.build();

    assert!(Validation::check(&function).is_err());
}

#[test]
fn test_validation_rejects_dangling_target() {
    let mut b = TestFunctionBuilder::new("bad_target");
    let entry = b.entry();
    b.jump(entry, BasicBlockId::new(17));
    let function = b.build();

    assert!(Validation::check(&function).is_err());
}
