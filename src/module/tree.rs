//! Module tree with optional per-module trace state

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};
use crate::trace::{AutoQuantState, OpType};

/// Node of the host module tree
///
/// Children are kept in insertion order; a child's FQN is its parent's FQN
/// joined with its name by `.`. The root's FQN is the empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// Module class, if known
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub module_type: Option<OpType>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    children: IndexMap<String, Module>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_quant_state: Option<AutoQuantState>,
}

impl Module {
    /// Create an empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty module of the given class
    pub fn of_type(module_type: impl Into<OpType>) -> Self {
        Self {
            module_type: Some(module_type.into()),
            ..Self::default()
        }
    }

    /// Attach a trace state (builder style)
    pub fn with_state(mut self, state: AutoQuantState) -> Self {
        self.auto_quant_state = Some(state);
        self
    }

    /// Add a child (builder style)
    pub fn with_child(mut self, name: &str, child: Module) -> FusionResult<Self> {
        self.add_child(name, child)?;
        Ok(self)
    }

    /// Add or replace a child
    ///
    /// Names must be non-empty and must not contain `.`.
    pub fn add_child(&mut self, name: &str, child: Module) -> FusionResult<()> {
        check_name(name)?;
        self.children.insert(name.to_string(), child);
        Ok(())
    }

    /// Attach or replace the trace state
    pub fn set_state(&mut self, state: AutoQuantState) {
        self.auto_quant_state = Some(state);
    }

    /// The trace state, if this module carries one
    pub fn auto_quant_state(&self) -> Option<&AutoQuantState> {
        self.auto_quant_state.as_ref()
    }

    /// Check if this module carries a trace state
    pub fn has_auto_quant_state(&self) -> bool {
        self.auto_quant_state.is_some()
    }

    /// Get a direct child by name
    pub fn child(&self, name: &str) -> Option<&Module> {
        self.children.get(name)
    }

    /// Iterate over direct children in insertion order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Module)> {
        self.children.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Resolve a dotted path relative to this module
    ///
    /// The empty path resolves to `self`.
    pub fn get_submodule(&self, fqn: &str) -> FusionResult<&Module> {
        if fqn.is_empty() {
            return Ok(self);
        }

        fqn.split('.').try_fold(self, |module, name| {
            module
                .child(name)
                .ok_or_else(|| FusionError::ModuleNotFound(fqn.to_string()))
        })
    }

    /// Iterate over `(fqn, module)` pairs in pre-order, starting with `self`
    pub fn named_modules(&self) -> NamedModules<'_> {
        NamedModules::new(self)
    }

    /// Check every child name in the subtree
    ///
    /// Names loaded from external sources bypass [`Module::add_child`].
    pub fn validate_names(&self) -> FusionResult<()> {
        for (_, module) in self.named_modules() {
            for name in module.children.keys() {
                check_name(name)?;
            }
        }
        Ok(())
    }
}

fn check_name(name: &str) -> FusionResult<()> {
    if name.is_empty() || name.contains('.') {
        return Err(FusionError::InvalidModuleName(name.to_string()));
    }
    Ok(())
}

fn join_fqn(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Pre-order traversal of a module tree
pub struct NamedModules<'a> {
    stack: Vec<(String, &'a Module)>,
}

impl<'a> NamedModules<'a> {
    fn new(root: &'a Module) -> Self {
        Self {
            stack: vec![(String::new(), root)],
        }
    }
}

impl<'a> Iterator for NamedModules<'a> {
    type Item = (String, &'a Module);

    fn next(&mut self) -> Option<Self::Item> {
        let (fqn, module) = self.stack.pop()?;

        // Push in reverse so the first child is visited next
        for (name, child) in module.children.iter().rev() {
            self.stack.push((join_fqn(&fqn, name), child));
        }

        Some((fqn, module))
    }
}
