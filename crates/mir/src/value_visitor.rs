//! Value visitor helpers for reducing duplication in instruction and
//! terminator handling
//!
//! These visit and substitute `Value::Operand` references uniformly across
//! the codebase, eliminating repetitive pattern matching. Substitution
//! replaces whole `Value`s, so an operand can be rewritten into a literal or
//! a marker, not just another register.

use crate::{Value, ValueId};

/// Visit a single value and apply a closure if it's an operand
#[inline]
pub(crate) fn visit_value<F>(value: &Value, mut visitor: F)
where
    F: FnMut(ValueId),
{
    if let Value::Operand(id) = value {
        visitor(*id);
    }
}

/// Visit multiple values and apply a closure to each operand
#[inline]
pub(crate) fn visit_values<'a, I, F>(values: I, mut visitor: F)
where
    I: IntoIterator<Item = &'a Value>,
    F: FnMut(ValueId),
{
    for value in values {
        visit_value(value, &mut visitor);
    }
}

/// Replace a matching operand in a mutable value reference
#[inline]
pub(crate) fn replace_value(value: &mut Value, from: ValueId, to: Value) {
    if *value == Value::Operand(from) {
        *value = to;
    }
}

/// Replace matching operands in multiple mutable value references
#[inline]
pub(crate) fn replace_values<'a, I>(values: I, from: ValueId, to: Value)
where
    I: IntoIterator<Item = &'a mut Value>,
{
    for value in values {
        replace_value(value, from, to);
    }
}
