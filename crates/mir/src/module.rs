//! # MIR Module
//!
//! This module defines the top-level container for MIR, representing an
//! entire compilation unit.

use index_vec::IndexVec;
use rustc_hash::FxHashMap;

use crate::{indent_str, FunctionId, MirError, MirFunction, MirResult, PrettyPrint};

/// The MIR for an entire program module (compilation unit)
///
/// Functions are stored in an `IndexVec` for access by `FunctionId`, with a
/// name map for lookup by callers that only know the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirModule {
    /// All functions in this module, indexed by `FunctionId`
    pub functions: IndexVec<FunctionId, MirFunction>,

    /// Mapping from function names to their IDs for lookup
    pub function_names: FxHashMap<String, FunctionId>,
}

impl MirModule {
    /// Creates a new empty MIR module
    pub fn new() -> Self {
        Self {
            functions: IndexVec::new(),
            function_names: FxHashMap::default(),
        }
    }

    /// Adds a function to the module and returns its ID
    pub fn add_function(&mut self, function: MirFunction) -> FunctionId {
        let name = function.name.clone();
        let function_id = self.functions.push(function);
        self.function_names.insert(name, function_id);
        function_id
    }

    /// Gets a function by ID
    pub fn get_function(&self, id: FunctionId) -> Option<&MirFunction> {
        self.functions.get(id)
    }

    /// Gets a mutable reference to a function by ID
    pub fn get_function_mut(&mut self, id: FunctionId) -> Option<&mut MirFunction> {
        self.functions.get_mut(id)
    }

    /// Looks up a function by name
    pub fn lookup_function(&self, name: &str) -> MirResult<FunctionId> {
        self.function_names
            .get(name)
            .copied()
            .ok_or_else(|| MirError::UnknownFunction {
                name: name.to_string(),
            })
    }

    /// Returns an iterator over all functions
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &MirFunction)> {
        self.functions.iter_enumerated()
    }

    /// Returns the number of functions in this module
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Validates the module structure
    pub fn validate(&self) -> MirResult<()> {
        for (name, &func_id) in &self.function_names {
            let function = self.functions.get(func_id).ok_or_else(|| {
                MirError::validation(format!(
                    "function name map references invalid function id for `{name}`"
                ))
            })?;

            if function.name != *name {
                return Err(MirError::validation_in(
                    name,
                    None,
                    format!("name map entry points at function `{}`", function.name),
                ));
            }
        }

        for (_, function) in self.functions() {
            function.validate()?;
        }

        Ok(())
    }
}

impl Default for MirModule {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyPrint for MirModule {
    fn pretty_print(&self, indent: usize) -> String {
        let mut result = String::new();
        let base_indent = indent_str(indent);

        result.push_str(&format!("{base_indent}module {{\n"));
        for (_, function) in self.functions() {
            result.push_str(&function.pretty_print(indent + 1));
        }
        result.push_str(&format!("{base_indent}}}\n"));

        result
    }
}
