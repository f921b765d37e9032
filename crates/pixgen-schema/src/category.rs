//! Category tree over plugin functions
//!
//! Categories are slash-separated paths (`Filter/Color`). Children and
//! functions are kept in ordered maps so every traversal is deterministic.

use std::collections::BTreeMap;

use crate::module::PluginModule;
use crate::signature::FunctionSignature;

/// Category used for functions that declare none
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A function placed in the tree together with its owning module
#[derive(Debug, Clone, Copy)]
pub struct CategorizedFunction<'a> {
    pub module: &'a PluginModule,
    pub function: &'a FunctionSignature,
}

#[derive(Debug, Default)]
pub struct CategoryNode<'a> {
    pub children: BTreeMap<String, CategoryNode<'a>>,
    /// Keyed by function name, then module name
    pub functions: BTreeMap<(String, String), CategorizedFunction<'a>>,
}

/// One category path with the functions filed directly under it
#[derive(Debug)]
pub struct CategoryEntry<'a> {
    pub path: String,
    pub depth: usize,
    pub functions: Vec<CategorizedFunction<'a>>,
}

#[derive(Debug, Default)]
pub struct CategoryTree<'a> {
    root: CategoryNode<'a>,
}

impl<'a> CategoryTree<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree over every function of the given modules
    pub fn from_modules<I>(modules: I) -> Self
    where
        I: IntoIterator<Item = &'a PluginModule>,
    {
        let mut tree = Self::new();
        for module in modules {
            for function in &module.functions {
                tree.insert(module, function);
            }
        }
        tree
    }

    pub fn insert(&mut self, module: &'a PluginModule, function: &'a FunctionSignature) {
        let path = function.category().unwrap_or(UNCATEGORIZED);
        let mut node = &mut self.root;
        for segment in split_path(path) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.functions.insert(
            (function.name().to_string(), module.name.to_string()),
            CategorizedFunction { module, function },
        );
    }

    /// Node at an exact path; the empty path is the root
    pub fn node(&self, path: &str) -> Option<&CategoryNode<'a>> {
        let mut node = &self.root;
        for segment in split_path(path) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Every category in pre-order, parents before children
    pub fn entries(&self) -> Vec<CategoryEntry<'a>> {
        let mut out = Vec::new();
        collect_entries(&self.root, "", 0, &mut out);
        out
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').map(str::trim).filter(|s| !s.is_empty())
}

fn collect_entries<'a>(
    node: &CategoryNode<'a>,
    prefix: &str,
    depth: usize,
    out: &mut Vec<CategoryEntry<'a>>,
) {
    for (name, child) in &node.children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        out.push(CategoryEntry {
            path: path.clone(),
            depth,
            functions: child.functions.values().copied().collect(),
        });
        collect_entries(child, &path, depth + 1, out);
    }
}

/// All functions at or below `path`, grouped by category path in
/// lexicographic order and by name within a category. Unknown paths yield
/// an empty list.
pub fn flatten_by_category<'a>(tree: &CategoryTree<'a>, path: &str) -> Vec<CategorizedFunction<'a>> {
    let Some(start) = tree.node(path) else {
        return Vec::new();
    };
    let mut out: Vec<CategorizedFunction<'a>> = start.functions.values().copied().collect();
    let mut below = Vec::new();
    collect_entries(start, "", 0, &mut below);
    below.sort_by(|a, b| a.path.cmp(&b.path));
    for entry in below {
        out.extend(entry.functions);
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::category::*;
    use crate::naming::NameAllocator;
    use crate::signature::FunctionDeclaration;

    fn module_with(name: &str, functions: &[(&str, Option<&str>)]) -> PluginModule {
        let mut module = PluginModule::new(name);
        for (fname, category) in functions {
            let mut decl = FunctionDeclaration::new(*fname);
            decl.category = category.map(str::to_string);
            let Ok(sig) = FunctionSignature::build(decl, &mut NameAllocator::new(), None) else {
                panic!("signature should build");
            };
            module.functions.push(sig);
        }
        module
    }

    fn names(functions: &[CategorizedFunction<'_>]) -> Vec<String> {
        functions.iter().map(|f| f.function.name().to_string()).collect()
    }

    #[test]
    fn test_flatten_groups_by_path_then_name() {
        let filters = module_with(
            "filters",
            &[
                ("sharpen", Some("Filter/Edge")),
                ("blur", Some("Filter")),
                ("invert", Some("Filter/Color")),
                ("desaturate", Some("Filter/Color")),
            ],
        );
        let misc = module_with("misc", &[("area", Some("Analysis")), ("noop", None)]);
        let modules = [filters, misc];
        let tree = CategoryTree::from_modules(&modules);

        assert_eq!(
            names(&flatten_by_category(&tree, "Filter")),
            vec!["blur", "desaturate", "invert", "sharpen"]
        );
        assert_eq!(names(&flatten_by_category(&tree, "Filter/Color")), vec!["desaturate", "invert"]);
        assert_eq!(names(&flatten_by_category(&tree, "Uncategorized")), vec!["noop"]);
        assert_eq!(flatten_by_category(&tree, "").len(), 6);
        assert!(flatten_by_category(&tree, "Filt").is_empty());
    }

    #[test]
    fn test_entries_are_preorder() {
        let module = module_with("m", &[("a", Some("B/C")), ("b", Some("A"))]);
        let modules = [module];
        let tree = CategoryTree::from_modules(&modules);
        let paths: Vec<(String, usize)> = tree
            .entries()
            .into_iter()
            .map(|e| (e.path, e.depth))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("A".to_string(), 0),
                ("B".to_string(), 0),
                ("B/C".to_string(), 1)
            ]
        );
    }
}
