//! Plugin module records

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::signature::FunctionSignature;

/// A named group of functions sharing build metadata
#[derive(Debug, Clone, Serialize)]
pub struct PluginModule {
    pub name: Arc<str>,
    pub category: Option<String>,
    pub cpp_headers: Vec<String>,
    pub cpp_namespaces: Vec<String>,
    /// Extra native sources compiled into the extension, relative to the
    /// declaration's directory
    pub cpp_sources: Vec<String>,
    pub extra_libraries: Vec<String>,
    pub extra_compile_args: Vec<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    /// Logic-only module: nothing is generated for it
    pub pure: bool,
    pub functions: Vec<FunctionSignature>,
    /// Declaration file, used for staleness checks
    pub source: Option<PathBuf>,
}

impl PluginModule {
    pub fn new(name: &str) -> Self {
        PluginModule {
            name: Arc::from(name),
            category: None,
            cpp_headers: Vec::new(),
            cpp_namespaces: Vec::new(),
            cpp_sources: Vec::new(),
            extra_libraries: Vec::new(),
            extra_compile_args: Vec::new(),
            author: None,
            url: None,
            pure: false,
            functions: Vec::new(),
            source: None,
        }
    }

    /// Functions that need a generated wrapper
    pub fn native_functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter().filter(|f| !f.is_pure())
    }

    pub fn needs_generation(&self) -> bool {
        !self.pure && self.native_functions().next().is_some()
    }

    /// Name of the native module: the plugin name with a leading underscore
    pub fn native_name(&self) -> String {
        format!("_{}", self.name)
    }

    /// Fully qualified extension name, e.g. `pixgen.plugins._threshold`
    pub fn extension_name(&self, package: &str) -> String {
        format!("{}.{}", package, self.native_name())
    }

    pub fn source_file_name(&self) -> String {
        format!("{}.cpp", self.native_name())
    }

    /// Directory holding the declaration, used to resolve `cpp_sources`
    pub fn source_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use crate::module::*;
    use crate::naming::NameAllocator;
    use crate::signature::FunctionDeclaration;

    fn function(name: &str, pure: bool) -> FunctionSignature {
        let mut decl = FunctionDeclaration::new(name);
        decl.pure = pure;
        let Ok(sig) = FunctionSignature::build(decl, &mut NameAllocator::new(), None) else {
            panic!("signature should build");
        };
        sig
    }

    #[test]
    fn test_names_derive_from_module_name() {
        let module = PluginModule::new("threshold");
        assert_eq!(module.native_name(), "_threshold");
        assert_eq!(module.source_file_name(), "_threshold.cpp");
        assert_eq!(
            module.extension_name("gamera.plugins"),
            "gamera.plugins._threshold"
        );
    }

    #[test]
    fn test_pure_modules_and_functions_need_no_generation() {
        let mut module = PluginModule::new("io");
        module.functions = vec![function("save", true)];
        assert!(!module.needs_generation());

        module.functions.push(function("load", false));
        assert!(module.needs_generation());
        assert_eq!(module.native_functions().count(), 1);

        module.pure = true;
        assert!(!module.needs_generation());
    }
}
