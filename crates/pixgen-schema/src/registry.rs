//! In-memory registry of loaded plugin modules

use ahash::AHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::category::CategoryTree;
use crate::declaration::DeclaredModule;
use crate::errors::DeclarationError;
use crate::module::PluginModule;
use crate::naming::NameAllocator;
use crate::signature::FunctionSignature;

/// Loaded modules in name order, with an index for O(1) lookup
#[derive(Debug, Default)]
pub struct PluginRegistry {
    modules: Vec<PluginModule>,
    /// Runtime only - rebuilt on every insert
    index: AHashMap<Arc<str>, usize>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate declarations in order. A module that fails does not stop the
    /// others; its error is returned alongside the registry.
    pub fn from_declarations(
        declared: &[DeclaredModule],
        names: &mut NameAllocator,
    ) -> (Self, Vec<DeclarationError>) {
        let mut registry = Self::new();
        let mut failures = Vec::new();
        for declaration in declared {
            let result = declaration
                .build(names)
                .and_then(|module| registry.insert(module));
            if let Err(err) = result {
                warn!(module = %declaration.spec.name, error = %err, "Skipping invalid module");
                failures.push(err);
            }
        }
        (registry, failures)
    }

    /// Register a module; a second module with the same name is rejected
    pub fn insert(&mut self, module: PluginModule) -> Result<(), DeclarationError> {
        if self.index.contains_key(&module.name) {
            return Err(DeclarationError::DuplicateModule(module.name.to_string()));
        }
        debug!(module = %module.name, "Registering plugin module");
        let position = self
            .modules
            .binary_search_by(|m| m.name.cmp(&module.name))
            .unwrap_or_else(|pos| pos);
        self.modules.insert(position, module);
        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, module) in self.modules.iter().enumerate() {
            self.index.insert(Arc::clone(&module.name), idx);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PluginModule> {
        self.index.get(name).map(|&idx| &self.modules[idx])
    }

    /// Modules sorted by name
    pub fn modules(&self) -> &[PluginModule] {
        &self.modules
    }

    pub fn into_modules(self) -> Vec<PluginModule> {
        self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules that need generated wrappers
    pub fn native_modules(&self) -> impl Iterator<Item = &PluginModule> {
        self.modules.iter().filter(|m| m.needs_generation())
    }

    /// First function with this name, searching modules in name order
    pub fn find_function(&self, name: &str) -> Option<(&PluginModule, &FunctionSignature)> {
        self.modules
            .iter()
            .find_map(|module| module.find_function(name).map(|f| (module, f)))
    }

    pub fn category_tree(&self) -> CategoryTree<'_> {
        CategoryTree::from_modules(&self.modules)
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::*;

    #[test]
    fn test_modules_are_kept_in_name_order() {
        let mut registry = PluginRegistry::new();
        for name in ["threshold", "arithmetic", "morphology"] {
            assert!(registry.insert(PluginModule::new(name)).is_ok());
        }
        let names: Vec<&str> = registry.modules().iter().map(|m| &*m.name).collect();
        assert_eq!(names, vec!["arithmetic", "morphology", "threshold"]);
        assert!(registry.get("morphology").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_module_is_rejected() {
        let mut registry = PluginRegistry::new();
        assert!(registry.insert(PluginModule::new("threshold")).is_ok());
        let result = registry.insert(PluginModule::new("threshold"));
        assert!(matches!(result, Err(DeclarationError::DuplicateModule(ref name)) if name == "threshold"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_declaration_does_not_block_others() {
        use crate::declaration::{ArgSpec, FunctionSpec, ModuleSpec};

        let mut bad_arg = ArgSpec::new("Choice");
        bad_arg.name = Some("method".to_string());
        let broken = ModuleSpec {
            name: "broken".to_string(),
            functions: vec![FunctionSpec {
                name: "f".to_string(),
                args: vec![bad_arg],
                ..FunctionSpec::default()
            }],
            ..ModuleSpec::default()
        };
        let fine = ModuleSpec {
            name: "fine".to_string(),
            ..ModuleSpec::default()
        };
        let declared = vec![
            DeclaredModule {
                spec: broken,
                path: None,
            },
            DeclaredModule {
                spec: fine,
                path: None,
            },
        ];
        let (registry, failures) =
            PluginRegistry::from_declarations(&declared, &mut NameAllocator::new());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("fine").is_some());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].module_name(), Some("broken"));
    }

    #[test]
    fn test_native_modules_skip_pure() {
        let mut registry = PluginRegistry::new();
        let mut pure = PluginModule::new("pure_io");
        pure.pure = true;
        assert!(registry.insert(pure).is_ok());
        assert!(registry.insert(PluginModule::new("empty")).is_ok());
        assert_eq!(registry.native_modules().count(), 0);
    }
}
