//! # MIR Instructions
//!
//! This module defines the instruction types for MIR.
//! Instructions perform computations but do not transfer control flow.

use rustc_hash::FxHashSet;

use crate::value_visitor::{replace_value, replace_values, visit_value, visit_values};
use crate::{BasicBlockId, MirType, PrettyPrint, Value, ValueId};

/// Unary operators supported in MIR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
    /// Logical not
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Neg => write!(f, "-"),
            Self::Not => write!(f, "!"),
        }
    }
}

/// Binary operators supported in MIR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic operators
    Add,
    Sub,
    Mul,
    Div,

    // Comparison operators
    Eq,
    Neq,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Logical operators
    And,
    Or,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Eq => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Less => write!(f, "<"),
            Self::Greater => write!(f, ">"),
            Self::LessEqual => write!(f, "<="),
            Self::GreaterEqual => write!(f, ">="),
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
        }
    }
}

impl BinaryOp {
    /// Get the result type of this operation
    pub const fn result_type(&self) -> MirType {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div => MirType::Int,

            Self::Eq
            | Self::Neq
            | Self::Less
            | Self::Greater
            | Self::LessEqual
            | Self::GreaterEqual
            | Self::And
            | Self::Or => MirType::Bool,
        }
    }
}

/// An instruction performs an operation but does NOT transfer control
///
/// Instructions always fall through to the next instruction in the block.
/// Control flow changes are handled exclusively by terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The kind of instruction and its operands
    pub kind: InstructionKind,

    /// Optional comment for debugging
    pub comment: Option<String>,
}

/// The different kinds of instructions available in MIR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    /// Simple assignment: `dest = source`
    Assign {
        dest: ValueId,
        source: Value,
        ty: MirType,
    },

    /// Unary operation: `dest = op source`
    UnaryOp {
        op: UnaryOp,
        dest: ValueId,
        source: Value,
    },

    /// Binary operation: `dest = left op right`
    BinaryOp {
        op: BinaryOp,
        dest: ValueId,
        left: Value,
        right: Value,
    },

    /// Function call: `dest = call callee(args)`
    Call {
        dest: Option<ValueId>,
        callee: crate::FunctionId,
        args: Vec<Value>,
    },

    /// Load from memory: `dest = load ty address`
    Load {
        dest: ValueId,
        ty: MirType,
        address: Value,
    },

    /// Store to memory: `store address, value`
    Store {
        address: Value,
        value: Value,
        ty: MirType,
    },

    /// Allocate a cell in the function's stack frame: `dest = stackalloc ty`
    ///
    /// The destination has type `ty*`; the cell holds a single value of the
    /// allocated type. These are what the promotion pass eliminates.
    StackAlloc { dest: ValueId, ty: MirType },

    /// Take the address of a value: `dest = &operand`
    ///
    /// An address-of applied to a stack cell makes the cell's address
    /// observable and disqualifies it from promotion.
    AddressOf { dest: ValueId, operand: Value },

    /// Get element pointer: `dest = getelementptr base, offset`
    ///
    /// Pointer arithmetic over an aggregate. A cell reached through a GEP is
    /// no longer a whole-cell access and disqualifies promotion.
    GetElementPtr {
        dest: ValueId,
        base: Value,
        offset: Value,
    },

    /// Phi node for SSA form: `dest = φ(block1: value1, block2: value2, ...)`
    ///
    /// A phi conceptually executes at the beginning of a basic block and
    /// selects the value matching the predecessor edge control arrived on.
    /// A predecessor reaching the block through several terminator slots
    /// contributes one source per slot.
    Phi {
        dest: ValueId,
        ty: MirType,
        sources: Vec<(BasicBlockId, Value)>,
    },

    /// No operation
    ///
    /// Used as an in-place erasure placeholder during transformations so
    /// instruction positions stay stable; swept out afterwards.
    Nop,
}

impl Instruction {
    /// Creates a new assignment instruction
    pub const fn assign(dest: ValueId, source: Value, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::Assign { dest, source, ty },
            comment: None,
        }
    }

    /// Creates a new unary operation instruction
    pub const fn unary_op(op: UnaryOp, dest: ValueId, source: Value) -> Self {
        Self {
            kind: InstructionKind::UnaryOp { op, dest, source },
            comment: None,
        }
    }

    /// Creates a new binary operation instruction
    pub const fn binary_op(op: BinaryOp, dest: ValueId, left: Value, right: Value) -> Self {
        Self {
            kind: InstructionKind::BinaryOp {
                op,
                dest,
                left,
                right,
            },
            comment: None,
        }
    }

    /// Creates a new call instruction
    pub const fn call(dest: Option<ValueId>, callee: crate::FunctionId, args: Vec<Value>) -> Self {
        Self {
            kind: InstructionKind::Call { dest, callee, args },
            comment: None,
        }
    }

    /// Creates a new load instruction
    pub const fn load(dest: ValueId, ty: MirType, address: Value) -> Self {
        Self {
            kind: InstructionKind::Load { dest, ty, address },
            comment: None,
        }
    }

    /// Creates a new store instruction
    pub const fn store(address: Value, value: Value, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::Store { address, value, ty },
            comment: None,
        }
    }

    /// Creates a new stack allocation instruction
    pub const fn stack_alloc(dest: ValueId, ty: MirType) -> Self {
        Self {
            kind: InstructionKind::StackAlloc { dest, ty },
            comment: None,
        }
    }

    /// Creates a new address-of instruction
    pub const fn address_of(dest: ValueId, operand: Value) -> Self {
        Self {
            kind: InstructionKind::AddressOf { dest, operand },
            comment: None,
        }
    }

    /// Creates a new get element pointer instruction
    pub const fn get_element_ptr(dest: ValueId, base: Value, offset: Value) -> Self {
        Self {
            kind: InstructionKind::GetElementPtr { dest, base, offset },
            comment: None,
        }
    }

    /// Create a new phi instruction
    pub const fn phi(dest: ValueId, ty: MirType, sources: Vec<(BasicBlockId, Value)>) -> Self {
        Self {
            kind: InstructionKind::Phi { dest, ty, sources },
            comment: None,
        }
    }

    /// Create an empty phi instruction (operands to be filled later)
    pub const fn empty_phi(dest: ValueId, ty: MirType) -> Self {
        Self::phi(dest, ty, Vec::new())
    }

    pub const fn nop() -> Self {
        Self {
            kind: InstructionKind::Nop,
            comment: None,
        }
    }

    /// Sets a comment for this instruction
    pub fn with_comment(mut self, comment: String) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Returns the destination value if this instruction defines one
    pub fn destination(&self) -> Option<ValueId> {
        match &self.kind {
            InstructionKind::Assign { dest, .. }
            | InstructionKind::UnaryOp { dest, .. }
            | InstructionKind::BinaryOp { dest, .. }
            | InstructionKind::Load { dest, .. }
            | InstructionKind::StackAlloc { dest, .. }
            | InstructionKind::AddressOf { dest, .. }
            | InstructionKind::GetElementPtr { dest, .. }
            | InstructionKind::Phi { dest, .. } => Some(*dest),

            InstructionKind::Call { dest, .. } => *dest,

            InstructionKind::Store { .. } | InstructionKind::Nop => None,
        }
    }

    /// Returns all values used by this instruction
    pub fn used_values(&self) -> FxHashSet<ValueId> {
        let mut used = FxHashSet::default();

        match &self.kind {
            InstructionKind::Assign { source, .. }
            | InstructionKind::UnaryOp { source, .. } => {
                visit_value(source, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::BinaryOp { left, right, .. } => {
                visit_value(left, |id| {
                    used.insert(id);
                });
                visit_value(right, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::Call { args, .. } => {
                visit_values(args, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::Load { address, .. } => {
                visit_value(address, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::Store { address, value, .. } => {
                visit_value(address, |id| {
                    used.insert(id);
                });
                visit_value(value, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::AddressOf { operand, .. } => {
                visit_value(operand, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::GetElementPtr { base, offset, .. } => {
                visit_value(base, |id| {
                    used.insert(id);
                });
                visit_value(offset, |id| {
                    used.insert(id);
                });
            }

            InstructionKind::Phi { sources, .. } => {
                for (_, value) in sources {
                    visit_value(value, |id| {
                        used.insert(id);
                    });
                }
            }

            InstructionKind::StackAlloc { .. } | InstructionKind::Nop => {}
        }

        used
    }

    /// Replace all uses of `from` in this instruction with the value `to`
    ///
    /// Only operand positions are rewritten; the destination is left alone.
    pub fn replace_uses_with(&mut self, from: ValueId, to: Value) {
        if to == Value::Operand(from) {
            return; // No-op
        }

        match &mut self.kind {
            InstructionKind::Assign { source, .. }
            | InstructionKind::UnaryOp { source, .. } => {
                replace_value(source, from, to);
            }
            InstructionKind::BinaryOp { left, right, .. } => {
                replace_value(left, from, to);
                replace_value(right, from, to);
            }
            InstructionKind::Call { args, .. } => {
                replace_values(args, from, to);
            }
            InstructionKind::Load { address, .. } => {
                replace_value(address, from, to);
            }
            InstructionKind::Store { address, value, .. } => {
                replace_value(address, from, to);
                replace_value(value, from, to);
            }
            InstructionKind::AddressOf { operand, .. } => {
                replace_value(operand, from, to);
            }
            InstructionKind::GetElementPtr { base, offset, .. } => {
                replace_value(base, from, to);
                replace_value(offset, from, to);
            }
            InstructionKind::Phi { sources, .. } => {
                for (_, value) in sources {
                    replace_value(value, from, to);
                }
            }
            InstructionKind::StackAlloc { .. } | InstructionKind::Nop => {}
        }
    }

    /// Check if this instruction is a phi
    pub const fn is_phi(&self) -> bool {
        matches!(self.kind, InstructionKind::Phi { .. })
    }

    /// Check if this instruction is a nop
    pub const fn is_nop(&self) -> bool {
        matches!(self.kind, InstructionKind::Nop)
    }

    /// Get phi operands if this is a phi instruction
    pub fn phi_operands(&self) -> Option<&[(BasicBlockId, Value)]> {
        if let InstructionKind::Phi { sources, .. } = &self.kind {
            Some(sources)
        } else {
            None
        }
    }

    /// Get phi operands mutably if this is a phi instruction
    pub fn phi_operands_mut(&mut self) -> Option<&mut Vec<(BasicBlockId, Value)>> {
        if let InstructionKind::Phi { sources, .. } = &mut self.kind {
            Some(sources)
        } else {
            None
        }
    }

    /// Add an operand to a phi instruction
    /// Returns true if the operand was added, false if not a phi
    pub fn add_phi_operand(&mut self, block: BasicBlockId, value: Value) -> bool {
        if let Some(sources) = self.phi_operands_mut() {
            sources.push((block, value));
            true
        } else {
            false
        }
    }
}

impl PrettyPrint for Instruction {
    fn pretty_print(&self, _indent: usize) -> String {
        let mut result = String::new();

        if let Some(comment) = &self.comment {
            result.push_str(&format!("// {comment}\n"));
        }

        match &self.kind {
            InstructionKind::Assign { dest, source, ty } => {
                if matches!(ty, MirType::Int) {
                    result.push_str(&format!(
                        "{} = {}",
                        dest.pretty_print(0),
                        source.pretty_print(0),
                    ));
                } else {
                    result.push_str(&format!(
                        "{} = {} ({})",
                        dest.pretty_print(0),
                        source.pretty_print(0),
                        ty
                    ));
                }
            }

            InstructionKind::UnaryOp { op, dest, source } => {
                result.push_str(&format!(
                    "{} = {}{}",
                    dest.pretty_print(0),
                    op,
                    source.pretty_print(0)
                ));
            }

            InstructionKind::BinaryOp {
                op,
                dest,
                left,
                right,
            } => {
                result.push_str(&format!(
                    "{} = {} {} {}",
                    dest.pretty_print(0),
                    left.pretty_print(0),
                    op,
                    right.pretty_print(0)
                ));
            }

            InstructionKind::Call { dest, callee, args } => {
                let args_str = args
                    .iter()
                    .map(|arg| arg.pretty_print(0))
                    .collect::<Vec<_>>()
                    .join(", ");

                match dest {
                    Some(dest) => result.push_str(&format!(
                        "{} = call fn{}({})",
                        dest.pretty_print(0),
                        callee.index(),
                        args_str
                    )),
                    None => {
                        result.push_str(&format!("call fn{}({})", callee.index(), args_str));
                    }
                }
            }

            InstructionKind::Load { dest, ty, address } => {
                result.push_str(&format!(
                    "{} = load {} {}",
                    dest.pretty_print(0),
                    ty,
                    address.pretty_print(0)
                ));
            }

            InstructionKind::Store { address, value, ty } => {
                if matches!(ty, MirType::Int) {
                    result.push_str(&format!(
                        "store {}, {}",
                        address.pretty_print(0),
                        value.pretty_print(0),
                    ));
                } else {
                    result.push_str(&format!(
                        "store {}, {} ({})",
                        address.pretty_print(0),
                        value.pretty_print(0),
                        ty
                    ));
                }
            }

            InstructionKind::StackAlloc { dest, ty } => {
                result.push_str(&format!("{} = stackalloc {}", dest.pretty_print(0), ty));
            }

            InstructionKind::AddressOf { dest, operand } => {
                result.push_str(&format!(
                    "{} = &{}",
                    dest.pretty_print(0),
                    operand.pretty_print(0)
                ));
            }

            InstructionKind::GetElementPtr { dest, base, offset } => {
                result.push_str(&format!(
                    "{} = getelementptr {}, {}",
                    dest.pretty_print(0),
                    base.pretty_print(0),
                    offset.pretty_print(0)
                ));
            }

            InstructionKind::Phi { dest, ty, sources } => {
                let sources_str = sources
                    .iter()
                    .map(|(block, val)| format!("bb{}: {}", block.index(), val.pretty_print(0)))
                    .collect::<Vec<_>>()
                    .join(", ");
                result.push_str(&format!(
                    "{} = φ {} {{ {} }}",
                    dest.pretty_print(0),
                    ty,
                    sources_str
                ));
            }

            InstructionKind::Nop => {
                result.push_str("nop");
            }
        }

        result
    }
}

impl PrettyPrint for ValueId {
    fn pretty_print(&self, _indent: usize) -> String {
        format!("%{}", self.index())
    }
}
