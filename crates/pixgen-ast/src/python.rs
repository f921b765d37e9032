//! Static extraction of Python plugin declarations
//!
//! A Python declaration file holds classes deriving from `PluginFunction`
//! (directly or through a local base class) and one class deriving from
//! `PluginModule` that lists them. Class-level assignments are read with
//! ast-grep; nothing is imported or executed.

use ast_grep_core::AstGrep;
use ast_grep_language::Python;
use pixgen_schema::{ArgSpec, ArgValue, DocExample, FunctionSpec, ModuleSpec, PixelTag, PixelType};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::errors::DiscoveryError;
use crate::expr::{clean_docstring, is_syntax, parse_node, parse_string, PyExpr, PyNode};

const FUNCTION_BASE: &str = "PluginFunction";
const MODULE_BASE: &str = "PluginModule";

/// One class as written, before inheritance is applied
#[derive(Debug, Clone)]
struct ClassDecl {
    name: String,
    bases: SmallVec<[String; 2]>,
    doc: Option<String>,
    /// Attribute values, or the reason they could not be read
    attrs: BTreeMap<String, Result<PyExpr, String>>,
}

fn class_decl(node: &PyNode<'_>) -> Option<ClassDecl> {
    let name = node.field("name")?.text().to_string();
    let bases = node
        .field("superclasses")
        .map(|list| {
            list.children()
                .filter(is_syntax)
                .map(|b| {
                    let text = b.text();
                    text.rsplit('.').next().unwrap_or(&text).trim().to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let mut doc = None;
    let mut attrs = BTreeMap::new();
    if let Some(body) = node.field("body") {
        for (position, statement) in body.children().filter(is_syntax).enumerate() {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(inner) = statement.children().find(|c| c.is_named()) else {
                continue;
            };
            match &*inner.kind() {
                "string" if position == 0 => {
                    doc = parse_string(&inner.text()).ok().map(|d| clean_docstring(&d));
                }
                "assignment" => {
                    let (Some(left), Some(right)) = (inner.field("left"), inner.field("right"))
                    else {
                        continue;
                    };
                    if left.kind() == "identifier" {
                        attrs.insert(left.text().to_string(), parse_node(&right));
                    }
                }
                _ => {}
            }
        }
    }
    Some(ClassDecl {
        name,
        bases,
        doc,
        attrs,
    })
}

/// Classes of one file with inheritance resolved against local bases
struct ClassIndex<'p> {
    path: &'p Path,
    classes: BTreeMap<String, ClassDecl>,
    /// Module-level `alias = Name` bindings
    aliases: BTreeMap<String, String>,
}

/// `alias = Name` statements at module level
fn module_aliases(root: &PyNode<'_>) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    for statement in root.children().filter(is_syntax) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.children().find(is_syntax) else {
            continue;
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        let (Some(left), Some(right)) = (assignment.field("left"), assignment.field("right")) else {
            continue;
        };
        if left.kind() == "identifier" && right.kind() == "identifier" {
            aliases.insert(left.text().to_string(), right.text().to_string());
        }
    }
    aliases
}

impl<'p> ClassIndex<'p> {
    fn new(path: &'p Path, source: &str) -> Self {
        let sg = AstGrep::new(source, Python);
        let root = sg.root();
        let mut classes = BTreeMap::new();
        for class_match in root.find_all("class $NAME($$$BASES): $$$BODY") {
            if let Some(class) = class_decl(class_match.get_node()) {
                classes.entry(class.name.clone()).or_insert(class);
            }
        }
        let aliases = module_aliases(&root);
        ClassIndex {
            path,
            classes,
            aliases,
        }
    }

    /// Class bound to `name`, following module-level aliases
    fn resolve_class<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let mut current = name;
        let mut seen = HashSet::new();
        loop {
            if self.classes.contains_key(current) {
                return Some(current);
            }
            if !seen.insert(current) {
                return None;
            }
            current = self.aliases.get(current).map(String::as_str)?;
        }
    }

    /// Whether `name` derives from `root` through local classes
    fn derives_from(&self, name: &str, root: &str, seen: &mut HashSet<String>) -> bool {
        let Some(class) = self.classes.get(name) else {
            return false;
        };
        if !seen.insert(name.to_string()) {
            return false;
        }
        class
            .bases
            .iter()
            .any(|base| base == root || self.derives_from(base, root, seen))
    }

    fn is_a(&self, name: &str, root: &str) -> bool {
        self.derives_from(name, root, &mut HashSet::new())
    }

    /// Attributes of a class merged over its local bases, nearest class wins
    fn resolved_attrs(
        &self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<BTreeMap<String, Result<PyExpr, String>>, DiscoveryError> {
        if chain.iter().any(|c| c == name) {
            return Err(DiscoveryError::InheritanceCycle {
                path: self.path.to_path_buf(),
                class: name.to_string(),
            });
        }
        let Some(class) = self.classes.get(name) else {
            return Ok(BTreeMap::new());
        };
        chain.push(name.to_string());
        let mut merged = BTreeMap::new();
        // Python's MRO puts earlier bases first, so apply them last
        for base in class.bases.iter().rev() {
            merged.extend(self.resolved_attrs(base, chain)?);
        }
        chain.pop();
        merged.extend(class.attrs.clone());
        Ok(merged)
    }

    fn invalid(&self, class: &str, attribute: &str, reason: impl Into<String>) -> DiscoveryError {
        DiscoveryError::InvalidAttribute {
            path: self.path.to_path_buf(),
            class: class.to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// EXPRESSION CONVERSION
// ============================================================================

/// Literal value of an expression; `None` for Python's `None`
fn value(expr: &PyExpr) -> Result<Option<ArgValue>, String> {
    Ok(Some(match expr {
        PyExpr::None => return Ok(None),
        PyExpr::Bool(b) => ArgValue::Bool(*b),
        PyExpr::Int(i) => ArgValue::Int(*i),
        PyExpr::Float(f) => ArgValue::Float(*f),
        PyExpr::Str(s) => ArgValue::Str(s.clone()),
        PyExpr::List(items) | PyExpr::Tuple(items) => ArgValue::Array(values(items)?),
        // Pixel and point constructors such as RGBPixel(255, 0, 0)
        PyExpr::Call { func, args, kwargs }
            if kwargs.is_empty()
                && (func.ends_with("Pixel") || matches!(func.as_str(), "Point" | "FloatPoint" | "Dim")) =>
        {
            ArgValue::Array(values(args)?)
        }
        PyExpr::Call { func, .. } if func == "CNoneDefault" => ArgValue::Str("None".to_string()),
        other => return Err(format!("expected a literal value, found {:?}", other)),
    }))
}

fn values(items: &[PyExpr]) -> Result<Vec<ArgValue>, String> {
    items
        .iter()
        .map(|item| value(item)?.ok_or_else(|| "None is not allowed here".to_string()))
        .collect()
}

fn text(expr: &PyExpr) -> Result<Option<String>, String> {
    match expr {
        PyExpr::None => Ok(None),
        PyExpr::Str(s) => Ok(Some(s.clone())),
        PyExpr::Name(n) => Ok(Some(n.clone())),
        other => Err(format!("expected text, found {:?}", other)),
    }
}

fn string_list(expr: &PyExpr) -> Result<Vec<String>, String> {
    match expr {
        PyExpr::None => Ok(Vec::new()),
        PyExpr::List(items) | PyExpr::Tuple(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("expected a list of strings, found {:?}", item))
            })
            .collect(),
        other => Err(format!("expected a list of strings, found {:?}", other)),
    }
}

/// Pixel tags from `[ONEBIT, "RGB"]`, `ALL` or `ALL + [COMPLEX]`
fn pixel_tags(expr: &PyExpr, out: &mut Vec<String>) -> Result<(), String> {
    match expr {
        PyExpr::List(items) | PyExpr::Tuple(items) => {
            for item in items {
                pixel_tags(item, out)?;
            }
        }
        PyExpr::Add(left, right) => {
            pixel_tags(left, out)?;
            pixel_tags(right, out)?;
        }
        PyExpr::Name(tag) | PyExpr::Str(tag) => out.push(match tag.parse::<PixelTag>() {
            Ok(PixelTag::Type(pixel_type)) => pixel_type.name().to_string(),
            Ok(PixelTag::All) => "All".to_string(),
            // Left for validation to report against the argument
            Err(_) => tag.clone(),
        }),
        other => return Err(format!("expected pixel types, found {:?}", other)),
    }
    Ok(())
}

/// Positional parameter names of each argument constructor
fn positional_params(constructor: &str) -> Option<&'static [&'static str]> {
    Some(match constructor {
        "Int" | "Real" | "Float" => &["name", "range", "default"],
        "Complex" | "String" | "Point" | "FloatPoint" | "Dim" | "ImageList" | "Pixel" => {
            &["name", "default"]
        }
        "Class" => &["name", "klass", "list_of", "default"],
        "ImageType" => &["pixel_types", "name", "list_of"],
        "Rect" => &["name", "list_of"],
        "Choice" => &["name", "choices", "default"],
        "ChoiceString" => &["name", "choices", "default", "strict"],
        "FileOpen" | "FileSave" | "Directory" => &["name", "default", "extension"],
        "Check" | "Bool" => &["name", "check_box", "default", "enabled"],
        "Region" | "RegionMap" | "ImageInfo" | "PointVector" | "Info" => &["name"],
        "IntVector" | "FloatVector" | "ComplexVector" => &["name", "default", "length"],
        _ => return None,
    })
}

fn arg_spec(expr: &PyExpr) -> Result<ArgSpec, String> {
    let PyExpr::Call { func, args, kwargs } = expr else {
        return Err(format!("expected an argument constructor, found {:?}", expr));
    };
    let params = positional_params(func)
        .ok_or_else(|| format!("unsupported argument constructor '{}'", func))?;
    if args.len() > params.len() {
        return Err(format!("too many positional arguments to {}", func));
    }

    let mut spec = ArgSpec::new(func);
    let named = params.iter().copied().zip(args).chain(
        kwargs.iter().map(|(key, value)| (key.as_str(), value)),
    );
    for (param, expr) in named {
        match param {
            "name" => spec.name = text(expr)?,
            "default" => spec.default = value(expr)?,
            "range" => {
                spec.range = match value(expr)? {
                    Some(ArgValue::Array(bounds)) => Some(bounds),
                    None => None,
                    Some(_) => return Err(format!("{}: range must be a pair", func)),
                }
            }
            "choices" => {
                let items = expr
                    .items()
                    .ok_or_else(|| format!("{}: choices must be a list", func))?;
                spec.choices = Some(values(items)?);
            }
            "strict" => spec.strict = Some(expr.truthy()),
            "pixel_types" => {
                let mut tags = Vec::new();
                pixel_tags(expr, &mut tags)?;
                spec.pixel_types = Some(tags);
            }
            "list_of" => spec.list = expr.truthy(),
            "klass" => spec.klass = text(expr)?,
            "length" => match value(expr)? {
                Some(ArgValue::Int(length)) => spec.length = Some(length),
                None => {}
                Some(_) => return Err(format!("{}: length must be an integer", func)),
            },
            "extension" => spec.extension = text(expr)?,
            "check_box" => spec.label = text(expr)?.filter(|l| !l.is_empty()),
            // Interactive-only options
            "enabled" => {}
            other => return Err(format!("{} has no parameter '{}'", func, other)),
        }
    }
    // Check boxes are often declared with `default=1`
    if matches!(func.as_str(), "Check" | "Bool") {
        if let Some(ArgValue::Int(flag)) = spec.default {
            spec.default = Some(ArgValue::Bool(flag != 0));
        }
    }
    Ok(spec)
}

/// `Args([...])` or a bare list of constructors
fn arg_list(expr: &PyExpr) -> Result<Vec<ArgSpec>, String> {
    let items: &[PyExpr] = match expr {
        PyExpr::None => return Ok(Vec::new()),
        PyExpr::Call { func, args, .. } if func == "Args" => match args.first() {
            Some(PyExpr::None) | None => return Ok(Vec::new()),
            // A single argument stands for a one-item list
            Some(single @ PyExpr::Call { .. }) => std::slice::from_ref(single),
            Some(list) => list
                .items()
                .ok_or_else(|| "Args expects a list".to_string())?,
        },
        PyExpr::List(items) | PyExpr::Tuple(items) => items,
        other => return Err(format!("expected Args([...]), found {:?}", other)),
    };
    items.iter().map(arg_spec).collect()
}

fn doc_examples(function: &str, expr: &PyExpr, has_self: bool) -> Vec<DocExample> {
    let Some(items) = expr.items() else {
        return Vec::new();
    };
    let mut examples = Vec::new();
    for item in items {
        let parts = item.items().unwrap_or(std::slice::from_ref(item));
        let (self_type, rest) = match (has_self, parts.split_first()) {
            (true, Some((PyExpr::Name(tag) | PyExpr::Str(tag), rest))) => {
                match tag.parse::<PixelType>() {
                    Ok(pixel_type) => (Some(pixel_type), rest),
                    Err(_) => {
                        // Example generators are callables; only literal examples are kept
                        debug!(function, example = %tag, "Skipping non-literal example");
                        continue;
                    }
                }
            }
            (true, _) => continue,
            (false, _) => (None, parts),
        };
        match values(rest) {
            Ok(args) => examples.push(DocExample { self_type, args }),
            Err(reason) => debug!(function, %reason, "Skipping example"),
        }
    }
    examples
}

// ============================================================================
// DECLARATION ASSEMBLY
// ============================================================================

type Attrs = BTreeMap<String, Result<PyExpr, String>>;

fn attr<'a>(
    index: &ClassIndex<'_>,
    class: &str,
    attrs: &'a Attrs,
    name: &str,
) -> Result<Option<&'a PyExpr>, DiscoveryError> {
    match attrs.get(name) {
        None => Ok(None),
        Some(Ok(expr)) => Ok(Some(expr)),
        Some(Err(reason)) => Err(index.invalid(class, name, reason.clone())),
    }
}

fn function_spec(index: &ClassIndex<'_>, name: &str) -> Result<FunctionSpec, DiscoveryError> {
    let attrs = index.resolved_attrs(name, &mut Vec::new())?;
    let get = |key: &str| attr(index, name, &attrs, key);

    let self_type = match get("self_type")? {
        None | Some(PyExpr::None) => None,
        Some(expr) => Some(arg_spec(expr).map_err(|reason| index.invalid(name, "self_type", reason))?),
    };
    let return_type = match get("return_type")? {
        None | Some(PyExpr::None) => None,
        Some(expr) => Some(arg_spec(expr).map_err(|reason| index.invalid(name, "return_type", reason))?),
    };
    let args = match get("args")? {
        Some(expr) => arg_list(expr).map_err(|reason| index.invalid(name, "args", reason))?,
        None => Vec::new(),
    };
    let examples = get("doc_examples")?
        .map(|expr| doc_examples(name, expr, self_type.is_some()))
        .unwrap_or_default();
    let optional_text = |key: &str| -> Result<Option<String>, DiscoveryError> {
        match get(key)? {
            Some(expr) => text(expr).map_err(|reason| index.invalid(name, key, reason)),
            None => Ok(None),
        }
    };

    Ok(FunctionSpec {
        name: name.to_string(),
        self_type,
        args,
        return_type,
        category: optional_text("category")?,
        doc: index.classes.get(name).and_then(|c| c.doc.clone()),
        author: optional_text("author")?,
        examples,
        image_types_must_match: get("image_types_must_match")?.is_some_and(PyExpr::truthy),
        progress_bar: optional_text("progress_bar")?.filter(|p| !p.is_empty()),
        pure_python: get("pure_python")?.is_some_and(PyExpr::truthy),
    })
}

/// Extract the module declared in one Python source. Files without a
/// plugin module class yield `None`.
pub fn extract_module(path: &Path, source: &str) -> Result<Option<ModuleSpec>, DiscoveryError> {
    let index = ClassIndex::new(path, source);
    let mut module_classes = index
        .classes
        .keys()
        .filter(|name| index.is_a(name, MODULE_BASE));
    let Some(module_class) = module_classes.next() else {
        debug!(path = %path.display(), "No plugin module class");
        return Ok(None);
    };
    if let Some(second) = module_classes.next() {
        return Err(DiscoveryError::MultipleModules {
            path: path.to_path_buf(),
            first: module_class.clone(),
            second: second.clone(),
        });
    }

    let module_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| module_class.clone());
    let attrs = index.resolved_attrs(module_class, &mut Vec::new())?;
    let get = |key: &str| attr(&index, module_class, &attrs, key);
    let list = |key: &str| -> Result<Vec<String>, DiscoveryError> {
        match get(key)? {
            Some(expr) => string_list(expr).map_err(|reason| index.invalid(module_class, key, reason)),
            None => Ok(Vec::new()),
        }
    };
    let optional_text = |key: &str| -> Result<Option<String>, DiscoveryError> {
        match get(key)? {
            Some(expr) => text(expr).map_err(|reason| index.invalid(module_class, key, reason)),
            None => Ok(None),
        }
    };

    let mut functions = Vec::new();
    if let Some(listed) = get("functions")? {
        let names = listed
            .items()
            .ok_or_else(|| index.invalid(module_class, "functions", "expected a list of function classes"))?;
        for entry in names {
            let PyExpr::Name(listed_name) = entry else {
                return Err(index.invalid(module_class, "functions", format!("expected a class name, found {:?}", entry)));
            };
            let function = match index.resolve_class(listed_name) {
                Some(class) if index.is_a(class, FUNCTION_BASE) => class,
                _ => {
                    return Err(DiscoveryError::UnknownFunction {
                        path: path.to_path_buf(),
                        module: module_name.clone(),
                        function: listed_name.clone(),
                    })
                }
            };
            functions.push(function_spec(&index, function)?);
        }
    }

    debug!(
        path = %path.display(),
        module = %module_name,
        functions = functions.len(),
        "Extracted Python declaration"
    );
    Ok(Some(ModuleSpec {
        name: module_name,
        category: optional_text("category")?,
        cpp_headers: list("cpp_headers")?,
        cpp_namespaces: list("cpp_namespaces")?,
        cpp_sources: list("cpp_sources")?,
        extra_libraries: list("extra_libraries")?,
        extra_compile_args: list("extra_compile_args")?,
        author: optional_text("author")?,
        url: optional_text("url")?,
        pure_python: get("pure_python")?.is_some_and(PyExpr::truthy),
        functions,
    }))
}

#[cfg(test)]
mod tests {
    use crate::python::*;

    const LOGICAL: &str = r#"
from gamera.plugin import *

class _LogicalBase(PluginFunction):
  self_type = ImageType([ONEBIT])
  args = Args([ImageType([ONEBIT], "mask")])
  image_types_must_match = True

class and_image(_LogicalBase):
  """Perform the AND operation on two images.

  Both images must have the same size.
  """
  testable = 1
and_image = and_image()

class erode_dilate(PluginFunction):
  self_type = ImageType([ONEBIT, GREYSCALE])
  args = Args([Int('ntimes', range=(0, 10), default=1),
               Choice('direction', ['dilate', 'erode'], default=0),
               Check('ignore_border', check_box="Ignore border", default=True)])
  return_type = ImageType(ALL + [COMPLEX], "output")
  doc_examples = [(ONEBIT, 5, 0, True), (__example_callable__,)]
  progress_bar = "Eroding"
erode_dilate = erode_dilate()

class LogicalModule(PluginModule):
  category = "Logical"
  cpp_headers = ["logical.hpp"]
  cpp_namespaces = ["Gamera"]
  functions = [and_image, erode_dilate]
  author = "Plugin Author"
  url = "http://example.org/"

module = LogicalModule()
"#;

    fn extract(source: &str) -> Result<Option<ModuleSpec>, DiscoveryError> {
        extract_module(Path::new("plugins/logical.py"), source)
    }

    #[test]
    fn test_module_attributes() {
        let Ok(Some(module)) = extract(LOGICAL) else {
            panic!("module should extract");
        };
        assert_eq!(module.name, "logical");
        assert_eq!(module.category.as_deref(), Some("Logical"));
        assert_eq!(module.cpp_headers, vec!["logical.hpp".to_string()]);
        assert_eq!(module.cpp_namespaces, vec!["Gamera".to_string()]);
        assert_eq!(module.author.as_deref(), Some("Plugin Author"));
        assert!(!module.pure_python);
        let names: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["and_image", "erode_dilate"]);
    }

    #[test]
    fn test_function_inherits_from_local_base() {
        let Ok(Some(module)) = extract(LOGICAL) else {
            panic!("module should extract");
        };
        let and_image = &module.functions[0];
        assert!(and_image.image_types_must_match);
        assert_eq!(
            and_image.self_type.as_ref().and_then(|s| s.pixel_types.clone()),
            Some(vec!["OneBit".to_string()])
        );
        assert_eq!(and_image.args.len(), 1);
        assert_eq!(and_image.args[0].name.as_deref(), Some("mask"));
        assert_eq!(
            and_image.doc.as_deref(),
            Some("Perform the AND operation on two images.\n\nBoth images must have the same size.")
        );
    }

    #[test]
    fn test_constructor_arguments() {
        let Ok(Some(module)) = extract(LOGICAL) else {
            panic!("module should extract");
        };
        let erode = &module.functions[1];
        let ntimes = &erode.args[0];
        assert_eq!(ntimes.kind, "Int");
        assert_eq!(ntimes.range, Some(vec![ArgValue::Int(0), ArgValue::Int(10)]));
        assert_eq!(ntimes.default, Some(ArgValue::Int(1)));

        let direction = &erode.args[1];
        assert_eq!(
            direction.choices,
            Some(vec![ArgValue::Str("dilate".to_string()), ArgValue::Str("erode".to_string())])
        );
        assert_eq!(direction.default, Some(ArgValue::Int(0)));

        let border = &erode.args[2];
        assert_eq!(border.label.as_deref(), Some("Ignore border"));
        assert_eq!(border.default, Some(ArgValue::Bool(true)));

        let Some(ret) = &erode.return_type else {
            panic!("return type should be set");
        };
        assert_eq!(ret.name.as_deref(), Some("output"));
        assert_eq!(
            ret.pixel_types,
            Some(vec!["All".to_string(), "Complex".to_string()])
        );
        assert_eq!(erode.progress_bar.as_deref(), Some("Eroding"));
    }

    #[test]
    fn test_only_literal_examples_are_kept() {
        let Ok(Some(module)) = extract(LOGICAL) else {
            panic!("module should extract");
        };
        let erode = &module.functions[1];
        assert_eq!(
            erode.examples,
            vec![DocExample {
                self_type: Some(PixelType::OneBit),
                args: vec![ArgValue::Int(5), ArgValue::Int(0), ArgValue::Bool(true)],
            }]
        );
    }

    #[test]
    fn test_extracted_module_validates() {
        let Ok(Some(module)) = extract(LOGICAL) else {
            panic!("module should extract");
        };
        let mut names = pixgen_schema::NameAllocator::new();
        let built = module.build(None, &mut names);
        assert!(built.is_ok(), "{:?}", built.err());
    }

    #[test]
    fn test_file_without_module_is_skipped() {
        let source = "class helper(object):\n    pass\n";
        assert!(matches!(extract(source), Ok(None)));
    }

    #[test]
    fn test_unknown_function_is_reported() {
        let source = r#"
class M(PluginModule):
    functions = [missing]
"#;
        assert!(matches!(
            extract(source),
            Err(DiscoveryError::UnknownFunction { function, .. }) if function == "missing"
        ));
    }

    #[test]
    fn test_unsupported_constructor_is_reported() {
        let source = r#"
class f(PluginFunction):
    args = Args([Radio("mode")])

class M(PluginModule):
    functions = [f]
"#;
        assert!(matches!(
            extract(source),
            Err(DiscoveryError::InvalidAttribute { attribute, .. }) if attribute == "args"
        ));
    }

    #[test]
    fn test_continuations_single_args_and_aliases() {
        let source = r#"
class erode_dilate(PluginFunction):
    self_type = ImageType([ONEBIT, GREYSCALE])
    args = Args([Int('ntimes', range=(0, 10), default=1), \
                 Choice('direction', ['dilate', 'erode'])])

class clip_image(PluginFunction):
    self_type = ImageType(ALL)
    args = Args(Rect("other"))
    return_type = ImageType(ALL)

class PNG_info(PluginFunction):
    args = Args([String("image_file_name")])
    return_type = ImageInfo("PNG_info")
PNG_info_class = PNG_info
PNG_info = PNG_info()

class M(PluginModule):
    functions = [erode_dilate, clip_image, \
                 PNG_info_class]
"#;
        let module = match extract(source) {
            Ok(Some(module)) => module,
            other => panic!("module should extract: {:?}", other),
        };
        let names: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["erode_dilate", "clip_image", "PNG_info"]);
        assert_eq!(module.functions[0].args.len(), 2);
        assert_eq!(module.functions[1].args.len(), 1);
        assert_eq!(module.functions[1].args[0].kind, "Rect");
        assert_eq!(module.functions[2].args[0].kind, "String");
    }

    #[test]
    fn test_alias_to_unknown_name_is_reported() {
        let source = r#"
helper_class = helper

class M(PluginModule):
    functions = [helper_class]
"#;
        assert!(matches!(
            extract(source),
            Err(DiscoveryError::UnknownFunction { function, .. }) if function == "helper_class"
        ));
    }

    #[test]
    fn test_inheritance_cycle_is_reported() {
        let source = r#"
class a(b):
    pass

class b(a, PluginFunction):
    pass

class M(PluginModule):
    functions = [b]
"#;
        assert!(matches!(
            extract(source),
            Err(DiscoveryError::InheritanceCycle { .. })
        ));
    }
}
