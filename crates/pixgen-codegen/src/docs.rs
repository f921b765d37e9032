//! reStructuredText documentation sidecar
//!
//! One block per function, one file per top-level category and a table of
//! contents. All traversal goes through the ordered category tree so two
//! runs over the same modules produce identical text.

use pixgen_schema::{
    flatten_by_category, ChoiceDefault, CategoryNode, CategoryTree, FunctionSignature,
    PluginModule, NONE_LABEL,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

const UNDERLINE_LEVELS: [char; 5] = ['=', '-', '`', ':', '\''];

const TOC_FILE: &str = "plugins.rst";

/// A rendered documentation file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocFile {
    pub file_name: String,
    pub contents: String,
}

fn underline(level: usize, text: &str, extra: usize) -> String {
    let c = UNDERLINE_LEVELS[level.min(UNDERLINE_LEVELS.len() - 1)];
    std::iter::repeat(c).take(text.chars().count() + extra).collect()
}

fn file_stem(category: &str) -> String {
    category.to_lowercase().replace(['/', ' '], "_")
}

/// Documentation block for one function at a heading level
pub fn function_doc(module: &PluginModule, function: &FunctionSignature, level: usize) -> String {
    let name = function.name();
    let mut s = String::new();
    let _ = writeln!(s, "``{}``", name);
    let _ = writeln!(s, "{}", underline(level, name, 4));
    s.push('\n');

    if let Some(ret) = function.return_arg() {
        s.push_str(&ret.describe(false));
        s.push(' ');
    }
    let args: Vec<String> = function.params().iter().map(|a| a.describe(true)).collect();
    let _ = writeln!(s, "**{}** ({})", name, args.join(", "));
    s.push('\n');

    if let Some(receiver) = function.self_arg() {
        let _ = writeln!(s, ":Operates on: {}", receiver.describe(false));
    }
    if let Some(ret) = function.return_arg() {
        let _ = writeln!(s, ":Returns: {}", ret.describe(false));
    }
    if let Some(category) = function.category() {
        let _ = writeln!(s, ":Category: {}", category);
    }
    if let Some(file) = module.source.as_deref().and_then(|p| p.file_name()) {
        let _ = writeln!(s, ":Defined in: {}", file.to_string_lossy());
    }
    if let Some(author) = function.author().or(module.author.as_deref()) {
        let _ = writeln!(s, ":Author: {}", author);
    }
    if function.image_types_must_match() {
        s.push_str("\n*All images passed in (including self) must have the same pixel type.*\n\n");
    }
    match function.doc() {
        Some(doc) => {
            let _ = write!(s, "\n{}\n", doc.trim_end());
        }
        None => s.push_str("\n.. warning:: No documentation written.\n\n"),
    }

    if !function.examples().is_empty() {
        s.push_str("\n----------\n\n");
    }
    for (i, example) in function.examples().iter().enumerate() {
        let args: Vec<String> = example.args.iter().map(ToString::to_string).collect();
        let _ = write!(s, "**Example {}:** {}({})", i + 1, name, args.join(", "));
        if let Some(pixel_type) = example.self_type {
            let _ = write!(s, " on a {} image", pixel_type);
        }
        s.push_str("\n\n");
    }
    s
}

/// Every function of one module, headed by the module name
pub fn module_doc(module: &PluginModule) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{}", module.name);
    let _ = writeln!(s, "{}", underline(0, &module.name, 0));
    s.push('\n');
    if let Some(url) = &module.url {
        let _ = writeln!(s, "`{}`__\n\n.. __: {}\n", module.name, url);
    }
    for function in &module.functions {
        s.push_str(&function_doc(module, function, 1));
    }
    s
}

fn write_category(s: &mut String, name: &str, node: &CategoryNode<'_>, level: usize) {
    let _ = write!(s, "\n{}\n{}\n\n", name, underline(level, name, 0));
    // Functions and subcategories share one name-ordered listing
    let mut functions = node.functions.values().peekable();
    let mut children = node.children.iter().peekable();
    loop {
        let take_function = match (functions.peek(), children.peek()) {
            (Some(f), Some((child, _))) => f.function.name() <= child.as_str(),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_function {
            if let Some(entry) = functions.next() {
                s.push_str(&function_doc(entry.module, entry.function, level + 1));
            }
        } else if let Some((child, node)) = children.next() {
            write_category(s, child, node, level + 1);
        }
    }
}

/// One file per top-level category, named after it
pub fn category_docs(tree: &CategoryTree<'_>) -> Vec<DocFile> {
    let Some(root) = tree.node("") else {
        return Vec::new();
    };
    root.children
        .iter()
        .map(|(name, node)| {
            let mut contents = String::new();
            write_category(&mut contents, name, node, 0);
            DocFile {
                file_name: format!("{}.rst", file_stem(name)),
                contents,
            }
        })
        .collect()
}

/// Functions at or below one category path, in a single file
pub fn category_subset_doc(tree: &CategoryTree<'_>, path: &str) -> Option<DocFile> {
    let functions = flatten_by_category(tree, path);
    if functions.is_empty() {
        return None;
    }
    let mut contents = String::new();
    let _ = write!(contents, "{}\n{}\n\n", path, underline(0, path, 0));
    for entry in functions {
        contents.push_str(&function_doc(entry.module, entry.function, 1));
    }
    Some(DocFile {
        file_name: format!("{}.rst", file_stem(path)),
        contents,
    })
}

fn bookmark(name: &str) -> String {
    name.to_lowercase()
        .replace('_', "-")
        .trim_start_matches('-')
        .to_string()
}

struct Toc {
    body: String,
    links: BTreeSet<String>,
    index: Vec<String>,
}

impl Toc {
    fn walk(&mut self, node: &CategoryNode<'_>, level: usize, file: &str) {
        let mut items: Vec<(String, Option<&CategoryNode<'_>>)> = node
            .children
            .iter()
            .map(|(name, child)| (name.clone(), Some(child)))
            .chain(
                node.functions
                    .values()
                    .map(|f| (f.function.name().to_string(), None)),
            )
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.dedup_by(|a, b| a.0 == b.0 && a.1.is_none() && b.1.is_none());

        for (name, child) in items {
            let key = name.trim_start_matches('_');
            let file = match (child, level) {
                (Some(_), 0) => format!("{}.html", file_stem(key)),
                _ => file.to_string(),
            };
            let _ = write!(self.body, "{}- {}_\n\n", "  ".repeat(level), key);
            self.links
                .insert(format!(".. _{}: {}#{}", key, file, bookmark(key)));
            match child {
                Some(child) => self.walk(child, level + 1, &file),
                None => self.index.push(key.to_string()),
            }
        }
    }
}

/// Category table of contents plus an alphabetical index
pub fn table_of_contents(tree: &CategoryTree<'_>) -> DocFile {
    let mut toc = Toc {
        body: String::new(),
        links: BTreeSet::new(),
        index: Vec::new(),
    };
    if let Some(root) = tree.node("") {
        toc.walk(root, 0, "");
    }

    let mut s = String::from("=======\nPlugins\n=======\n\nBy categories\n-------------\n\n");
    s.push_str(&toc.body);
    s.push_str("Alphabetical\n------------\n");

    toc.index
        .sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    toc.index.dedup();
    let mut letter = None;
    for name in &toc.index {
        let initial = name.chars().next().map(|c| c.to_ascii_uppercase());
        if initial != letter {
            letter = initial;
            if let Some(c) = initial {
                let _ = write!(s, "\n\n**{}**\n\n", c);
            }
        } else {
            s.push_str(", ");
        }
        let _ = write!(s, "{}_", name);
    }
    s.push_str("\n\n");
    for link in &toc.links {
        s.push_str(link);
        s.push('\n');
    }
    DocFile {
        file_name: TOC_FILE.to_string(),
        contents: s,
    }
}

/// Recover a choice default from its rendered description, e.g.
/// ``` ``Choice`` [dense|sparse] *mode* = sparse ``` gives index 1.
pub fn parse_choice_default(rendered: &str) -> Option<ChoiceDefault> {
    let rest = rendered.split_once("``Choice`` [")?.1;
    let (choices, tail) = rest.split_once(']')?;
    let value = tail.split_once(" = ")?.1.trim();
    if value.strip_prefix("``").and_then(|v| v.strip_suffix("``")) == Some(NONE_LABEL) {
        return Some(ChoiceDefault::NoneSentinel);
    }
    if let Some(index) = choices.split('|').position(|c| c == value) {
        return Some(ChoiceDefault::Index(index));
    }
    (value == NONE_LABEL).then_some(ChoiceDefault::NoneSentinel)
}

#[cfg(test)]
mod tests {
    use crate::docs::*;
    use pixgen_schema::{
        ArgKind, ArgValue, Argument, DocExample, FunctionDeclaration, NameAllocator,
        NumericRange, PixelType, PixelTypeSet,
    };

    fn image(tags: &[&str]) -> Argument {
        let Ok(pixel_types) = PixelTypeSet::parse(tags) else {
            panic!("bad tags in test");
        };
        let Ok(arg) = Argument::new(
            None,
            ArgKind::Image {
                pixel_types,
                list: false,
            },
        ) else {
            panic!("bad image in test");
        };
        arg
    }

    fn choice(default: Option<ChoiceDefault>) -> Argument {
        let Ok(arg) = Argument::new(
            Some("mode"),
            ArgKind::Choice {
                choices: vec!["dense".to_string(), "sparse".to_string(), "auto".to_string()],
                default,
            },
        ) else {
            panic!("bad choice in test");
        };
        arg
    }

    fn module_with(decls: Vec<FunctionDeclaration>, category: Option<&str>) -> PluginModule {
        let mut names = NameAllocator::new();
        let mut module = PluginModule::new("binarization");
        module.category = category.map(str::to_string);
        module.author = Some("Module Author".to_string());
        for decl in decls {
            let Ok(sig) = FunctionSignature::build(decl, &mut names, category) else {
                panic!("signature should build");
            };
            module.functions.push(sig);
        }
        module
    }

    fn threshold() -> FunctionDeclaration {
        let mut decl = FunctionDeclaration::new("threshold");
        decl.self_type = Some(image(&["GreyScale"]));
        let Ok(level) = Argument::new(
            Some("threshold"),
            ArgKind::Int {
                range: NumericRange::new(0.0, 255.0),
                default: Some(128),
            },
        ) else {
            panic!("bad int in test");
        };
        decl.args = vec![level];
        decl.return_type = Some(image(&["OneBit"]));
        decl.examples = vec![DocExample {
            self_type: Some(PixelType::GreyScale),
            args: vec![ArgValue::Int(200)],
        }];
        decl
    }

    #[test]
    fn test_choice_default_round_trips() {
        for index in 0..3 {
            let rendered = choice(Some(ChoiceDefault::Index(index))).describe(true);
            assert_eq!(parse_choice_default(&rendered), Some(ChoiceDefault::Index(index)));
        }
        let rendered = choice(Some(ChoiceDefault::NoneSentinel)).describe(true);
        assert_eq!(parse_choice_default(&rendered), Some(ChoiceDefault::NoneSentinel));
        assert_eq!(parse_choice_default(&choice(None).describe(true)), None);
    }

    #[test]
    fn test_choice_default_round_trips_with_none_label() {
        let labelled = |default| {
            let Ok(arg) = Argument::new(
                Some("interp_type"),
                ArgKind::Choice {
                    choices: vec!["None".to_string(), "Linear".to_string(), "Spline".to_string()],
                    default: Some(default),
                },
            ) else {
                panic!("bad choice in test");
            };
            arg.describe(true)
        };
        for default in [
            ChoiceDefault::Index(0),
            ChoiceDefault::Index(2),
            ChoiceDefault::NoneSentinel,
        ] {
            assert_eq!(parse_choice_default(&labelled(default)), Some(default));
        }
    }

    #[test]
    fn test_repeated_choice_labels_are_rejected() {
        let result = Argument::new(
            Some("mode"),
            ArgKind::Choice {
                choices: vec!["a".to_string(), "a".to_string()],
                default: Some(ChoiceDefault::Index(1)),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_function_doc_layout() {
        let module = module_with(vec![threshold()], Some("Binarization"));
        let doc = function_doc(&module, &module.functions[0], 1);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines[0], "``threshold``");
        assert_eq!(lines[1], "-".repeat("threshold".len() + 4));
        assert_eq!(
            lines[3],
            "``Image`` [OneBit] **threshold** (int(0, 255) *threshold* = 128)"
        );
        assert!(doc.contains(":Operates on: ``Image`` [GreyScale]\n"));
        assert!(doc.contains(":Returns: ``Image`` [OneBit]\n"));
        assert!(doc.contains(":Category: Binarization\n"));
        assert!(doc.contains(":Author: Module Author\n"));
        assert!(doc.contains(".. warning:: No documentation written."));
        assert!(doc.contains("**Example 1:** threshold(200) on a GreyScale image"));
    }

    #[test]
    fn test_matching_note_and_doc_text() {
        let mut decl = FunctionDeclaration::new("and_image");
        decl.self_type = Some(image(&["OneBit"]));
        decl.image_types_must_match = true;
        decl.doc = Some("Combine two images.".to_string());
        decl.author = Some("Function Author".to_string());
        let module = module_with(vec![decl], None);
        let doc = function_doc(&module, &module.functions[0], 1);
        assert!(doc.contains("*All images passed in (including self) must have the same pixel type.*"));
        assert!(doc.contains("Combine two images."));
        assert!(doc.contains(":Author: Function Author"));
        assert!(!doc.contains("warning"));
        assert!(!doc.contains(":Category:"));
    }

    #[test]
    fn test_docs_are_stable() {
        let module = module_with(vec![threshold()], Some("Binarization/Global"));
        let first = category_docs(&CategoryTree::from_modules([&module]));
        let second = category_docs(&CategoryTree::from_modules([&module]));
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].file_name, "binarization.rst");
        assert!(first[0].contents.starts_with("\nBinarization\n============\n"));
        assert!(first[0].contents.contains("\nGlobal\n------\n"));
    }

    #[test]
    fn test_table_of_contents() {
        let mut other = FunctionDeclaration::new("abutaleb");
        other.self_type = Some(image(&["GreyScale"]));
        let module = module_with(vec![threshold(), other], Some("Binarization"));
        let toc = table_of_contents(&CategoryTree::from_modules([&module]));
        assert_eq!(toc.file_name, "plugins.rst");
        assert!(toc.contents.contains("- Binarization_\n\n  - abutaleb_\n\n  - threshold_\n"));
        assert!(toc.contents.contains("**A**\n\nabutaleb_"));
        assert!(toc.contents.contains(".. _threshold: binarization.html#threshold"));
    }

    #[test]
    fn test_subset_doc_for_unknown_path_is_none() {
        let module = module_with(vec![threshold()], Some("Binarization"));
        let tree = CategoryTree::from_modules([&module]);
        assert!(category_subset_doc(&tree, "Nothing/Here").is_none());
        let Some(doc) = category_subset_doc(&tree, "Binarization") else {
            panic!("category should render");
        };
        assert_eq!(doc.file_name, "binarization.rst");
    }
}
