//! Declarative plugin module descriptions
//!
//! A module declaration is a TOML document:
//!
//! ```toml
//! name = "threshold"
//! category = "Binarization"
//! cpp_headers = ["threshold.hpp"]
//!
//! [[functions]]
//! name = "threshold"
//! self_type = { kind = "ImageType", pixel_types = ["GreyScale"] }
//! return_type = { kind = "ImageType", pixel_types = ["OneBit"] }
//! args = [{ kind = "Int", name = "threshold", range = [0, 255], default = 128 }]
//! ```
//!
//! These declaration types are also the target of the Python declaration parser
//! in `pixgen-ast`, so both front ends share the same validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::args::{
    vector_length, ArgKind, Argument, ChoiceDefault, CompositeKind, FileMode, NumericRange,
    VectorElement,
};
use crate::errors::{ConfigurationError, DeclarationError};
use crate::kinds::{ArgValue, KindTag};
use crate::module::PluginModule;
use crate::naming::{is_identifier, NameAllocator};
use crate::pixel::PixelTypeSet;
use crate::signature::{DocExample, FunctionDeclaration, FunctionSignature};

// =============================================================================
// ARGUMENT SPEC
// =============================================================================

/// One argument exactly as declared; every option is optional until the
/// kind decides what it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ArgValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<ArgValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ArgValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_types: Option<Vec<String>>,
    #[serde(default, alias = "list_of")]
    pub list: bool,
    #[serde(default, alias = "class", skip_serializing_if = "Option::is_none")]
    pub klass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, alias = "check_box", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub variadic: bool,
}

impl ArgSpec {
    pub fn new(kind: &str) -> Self {
        ArgSpec {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Resolve the declared kind name, accepting the usual aliases
    pub fn kind_tag(&self) -> Result<KindTag, ConfigurationError> {
        let tag = match self.kind.as_str() {
            "Int" | "Integer" => KindTag::Int,
            "Real" | "Float" => KindTag::Real,
            "Complex" => KindTag::Complex,
            "String" | "Text" => KindTag::Text,
            "Check" | "Bool" => KindTag::Check,
            "Choice" => KindTag::Choice,
            "ChoiceString" => KindTag::ChoiceString,
            "FileOpen" => KindTag::FileOpen,
            "FileSave" => KindTag::FileSave,
            "Directory" => KindTag::Directory,
            "ImageType" | "Image" => KindTag::Image,
            "ImageList" => KindTag::ImageList,
            "Class" => KindTag::Class,
            "Point" => KindTag::Point,
            "FloatPoint" => KindTag::FloatPoint,
            "Dim" => KindTag::Dim,
            "Rect" => KindTag::Rect,
            "Region" => KindTag::Region,
            "RegionMap" => KindTag::RegionMap,
            "ImageInfo" => KindTag::ImageInfo,
            "PointVector" => KindTag::PointVector,
            "IntVector" => KindTag::IntVector,
            "FloatVector" => KindTag::FloatVector,
            "ComplexVector" => KindTag::ComplexVector,
            "Pixel" => KindTag::Pixel,
            "Info" => KindTag::Info,
            other => {
                return Err(ConfigurationError::UnknownKind {
                    arg: self.label(),
                    kind: other.to_string(),
                })
            }
        };
        Ok(tag)
    }

    /// Build the validated argument
    pub fn build(&self) -> Result<Argument, ConfigurationError> {
        let tag = self.kind_tag()?;
        self.check_options(tag)?;
        let kind = match tag {
            KindTag::Int => ArgKind::Int {
                range: self.numeric_range()?,
                default: self.int_default()?,
            },
            KindTag::Real => ArgKind::Real {
                range: self.numeric_range()?,
                default: self.real_default()?,
            },
            KindTag::Complex => ArgKind::Complex {
                default: self.complex_default()?,
            },
            KindTag::Text => ArgKind::Text {
                default: self.text_default()?,
            },
            KindTag::Check => ArgKind::Check {
                label: self.label.clone().unwrap_or_default(),
                default: self.bool_default()?,
            },
            KindTag::Choice => {
                let choices = self.text_choices()?;
                let default = self.choice_default(&choices)?;
                ArgKind::Choice { choices, default }
            }
            KindTag::ChoiceString => ArgKind::ChoiceString {
                choices: self.text_choices()?,
                default: self.text_default()?,
                strict: self.strict.unwrap_or(true),
            },
            KindTag::FileOpen | KindTag::FileSave | KindTag::Directory => ArgKind::Filename {
                mode: match tag {
                    KindTag::FileOpen => FileMode::Open,
                    KindTag::FileSave => FileMode::Save,
                    _ => FileMode::Directory,
                },
                default: self.text_default()?,
                extension: self.extension.clone().unwrap_or_else(|| "*.*".to_string()),
            },
            KindTag::Image => ArgKind::Image {
                pixel_types: self.pixel_type_set()?,
                list: self.list,
            },
            KindTag::ImageList => ArgKind::ImageList,
            KindTag::Class => ArgKind::Class {
                klass: self.klass.clone(),
                list: self.list,
                default: self.default.as_ref().map(|value| match value {
                    ArgValue::Str(text) => text.clone(),
                    other => other.to_string(),
                }),
            },
            KindTag::Point
            | KindTag::FloatPoint
            | KindTag::Dim
            | KindTag::Rect
            | KindTag::Region
            | KindTag::RegionMap
            | KindTag::ImageInfo
            | KindTag::PointVector => ArgKind::Composite {
                kind: composite_kind(tag),
                default: self.pair_default()?,
            },
            KindTag::IntVector | KindTag::FloatVector | KindTag::ComplexVector => {
                ArgKind::Vector {
                    element: match tag {
                        KindTag::IntVector => VectorElement::Int,
                        KindTag::FloatVector => VectorElement::Float,
                        _ => VectorElement::Complex,
                    },
                    length: vector_length(&self.label(), self.length.unwrap_or(-1))?,
                    default: self.list_default()?,
                }
            }
            KindTag::Pixel => ArgKind::Pixel {
                default: self.default.clone(),
            },
            KindTag::Info => ArgKind::Info,
        };
        Ok(Argument::new(self.name.as_deref(), kind)?.variadic(self.variadic))
    }

    fn check_options(&self, tag: KindTag) -> Result<(), ConfigurationError> {
        let unsupported = |option: &'static str| ConfigurationError::UnsupportedOption {
            arg: self.label(),
            kind: tag.declared_as(),
            option,
        };
        if self.range.is_some() && !matches!(tag, KindTag::Int | KindTag::Real) {
            return Err(unsupported("range"));
        }
        if self.choices.is_some() && !matches!(tag, KindTag::Choice | KindTag::ChoiceString) {
            return Err(unsupported("choices"));
        }
        if self.strict.is_some() && tag != KindTag::ChoiceString {
            return Err(unsupported("strict"));
        }
        if self.pixel_types.is_some() && tag != KindTag::Image {
            return Err(unsupported("pixel_types"));
        }
        if self.length.is_some()
            && !matches!(
                tag,
                KindTag::IntVector | KindTag::FloatVector | KindTag::ComplexVector
            )
        {
            return Err(unsupported("length"));
        }
        if self.default.is_some() && !tag.info().accepts_default {
            return Err(unsupported("default"));
        }
        Ok(())
    }

    fn type_mismatch(&self, expected: &'static str, found: &ArgValue) -> ConfigurationError {
        ConfigurationError::DefaultTypeMismatch {
            arg: self.label(),
            expected,
            found: found.to_string(),
        }
    }

    fn numeric_range(&self) -> Result<NumericRange, ConfigurationError> {
        let Some(bounds) = &self.range else {
            return Ok(NumericRange::DEFAULT);
        };
        match bounds.as_slice() {
            [low, high] => match (low.as_f64(), high.as_f64()) {
                (Some(low), Some(high)) => Ok(NumericRange::new(low, high)),
                _ => Err(ConfigurationError::MalformedRange { arg: self.label() }),
            },
            _ => Err(ConfigurationError::MalformedRange { arg: self.label() }),
        }
    }

    fn int_default(&self) -> Result<Option<i64>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Int(value)) => Ok(Some(*value)),
            Some(other) => Err(self.type_mismatch("an integer", other)),
        }
    }

    fn real_default(&self) -> Result<Option<f64>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Float(value)) => Ok(Some(*value)),
            Some(other) => Err(self.type_mismatch("a floating-point number", other)),
        }
    }

    fn complex_default(&self) -> Result<Option<[f64; 2]>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Int(_) | ArgValue::Float(_)) => {
                Ok(self.default.as_ref().and_then(ArgValue::as_f64).map(|re| [re, 0.0]))
            }
            Some(ArgValue::Array(parts)) => match parts.as_slice() {
                [re, im] => match (re.as_f64(), im.as_f64()) {
                    (Some(re), Some(im)) => Ok(Some([re, im])),
                    _ => Err(self.type_mismatch("a complex number", &ArgValue::Array(parts.clone()))),
                },
                _ => Err(self.type_mismatch("a complex number", &ArgValue::Array(parts.clone()))),
            },
            Some(other) => Err(self.type_mismatch("a complex number", other)),
        }
    }

    fn text_default(&self) -> Result<Option<String>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Str(text)) => Ok(Some(text.clone())),
            Some(other) => Err(self.type_mismatch("a string", other)),
        }
    }

    fn bool_default(&self) -> Result<Option<bool>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(self.type_mismatch("a boolean", other)),
        }
    }

    fn pair_default(&self) -> Result<Option<[f64; 2]>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Array(parts)) => match parts.as_slice() {
                [x, y] => match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => Ok(Some([x, y])),
                    _ => Err(self.type_mismatch("a pair of numbers", &ArgValue::Array(parts.clone()))),
                },
                _ => Err(self.type_mismatch("a pair of numbers", &ArgValue::Array(parts.clone()))),
            },
            Some(other) => Err(self.type_mismatch("a pair of numbers", other)),
        }
    }

    fn list_default(&self) -> Result<Option<Vec<ArgValue>>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Array(items)) => Ok(Some(items.clone())),
            Some(other) => Err(self.type_mismatch("a list", other)),
        }
    }

    fn text_choices(&self) -> Result<Vec<String>, ConfigurationError> {
        let choices = self.choices.as_deref().unwrap_or_default();
        choices
            .iter()
            .enumerate()
            .map(|(index, choice)| match choice {
                ArgValue::Str(text) => Ok(text.clone()),
                _ => Err(ConfigurationError::NonTextChoice {
                    arg: self.label(),
                    index,
                }),
            })
            .collect()
    }

    fn choice_default(&self, choices: &[String]) -> Result<Option<ChoiceDefault>, ConfigurationError> {
        match &self.default {
            None => Ok(None),
            Some(ArgValue::Str(text)) if text == "None" => Ok(Some(ChoiceDefault::NoneSentinel)),
            Some(ArgValue::Int(index)) => match usize::try_from(*index) {
                Ok(index) => Ok(Some(ChoiceDefault::Index(index))),
                Err(_) => Err(ConfigurationError::ChoiceIndexOutOfBounds {
                    arg: self.label(),
                    index: *index,
                    len: choices.len(),
                }),
            },
            Some(ArgValue::Str(text)) => match choices.iter().position(|c| c == text) {
                Some(index) => Ok(Some(ChoiceDefault::Index(index))),
                None => Err(ConfigurationError::ChoiceDefaultNotListed {
                    arg: self.label(),
                    value: text.clone(),
                }),
            },
            Some(other) => Err(self.type_mismatch("a choice index", other)),
        }
    }

    fn pixel_type_set(&self) -> Result<PixelTypeSet, ConfigurationError> {
        let names = self.pixel_types.as_deref().unwrap_or_default();
        PixelTypeSet::parse(names).map_err(|source| ConfigurationError::UnknownPixelType {
            arg: self.label(),
            source,
        })
    }
}

fn composite_kind(tag: KindTag) -> CompositeKind {
    match tag {
        KindTag::Point => CompositeKind::Point,
        KindTag::FloatPoint => CompositeKind::FloatPoint,
        KindTag::Dim => CompositeKind::Dim,
        KindTag::Rect => CompositeKind::Rect,
        KindTag::Region => CompositeKind::Region,
        KindTag::RegionMap => CompositeKind::RegionMap,
        KindTag::ImageInfo => CompositeKind::ImageInfo,
        _ => CompositeKind::PointVector,
    }
}

// =============================================================================
// FUNCTION AND MODULE SPECS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<ArgSpec>,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ArgSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "doc_examples")]
    pub examples: Vec<DocExample>,
    #[serde(default)]
    pub image_types_must_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_bar: Option<String>,
    #[serde(default, alias = "pure")]
    pub pure_python: bool,
}

impl FunctionSpec {
    pub fn build(
        &self,
        module: &str,
        names: &mut NameAllocator,
        module_category: Option<&str>,
    ) -> Result<FunctionSignature, DeclarationError> {
        let configuration = |source: ConfigurationError| DeclarationError::Configuration {
            module: module.to_string(),
            function: self.name.clone(),
            source,
        };
        let build_opt = |spec: &Option<ArgSpec>| -> Result<Option<Argument>, DeclarationError> {
            spec.as_ref()
                .map(ArgSpec::build)
                .transpose()
                .map_err(configuration)
        };

        let decl = FunctionDeclaration {
            name: self.name.clone(),
            self_type: build_opt(&self.self_type)?,
            args: self
                .args
                .iter()
                .map(ArgSpec::build)
                .collect::<Result<Vec<_>, _>>()
                .map_err(configuration)?,
            return_type: build_opt(&self.return_type)?,
            category: self.category.clone(),
            doc: self.doc.clone(),
            author: self.author.clone(),
            examples: self.examples.clone(),
            image_types_must_match: self.image_types_must_match,
            progress_bar: self.progress_bar.clone(),
            pure: self.pure_python,
        };
        FunctionSignature::build(decl, names, module_category).map_err(|source| {
            DeclarationError::Signature {
                module: module.to_string(),
                source,
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub cpp_headers: Vec<String>,
    #[serde(default)]
    pub cpp_namespaces: Vec<String>,
    #[serde(default)]
    pub cpp_sources: Vec<String>,
    #[serde(default)]
    pub extra_libraries: Vec<String>,
    #[serde(default)]
    pub extra_compile_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "pure")]
    pub pure_python: bool,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

impl ModuleSpec {
    /// Validate every function and assemble the module record
    pub fn build(
        &self,
        source: Option<PathBuf>,
        names: &mut NameAllocator,
    ) -> Result<PluginModule, DeclarationError> {
        if !is_identifier(&self.name) {
            return Err(DeclarationError::InvalidModule {
                module: self.name.clone(),
                reason: "name is not a valid identifier".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut functions = Vec::with_capacity(self.functions.len());
        for spec in &self.functions {
            if !seen.insert(spec.name.as_str()) {
                return Err(DeclarationError::InvalidModule {
                    module: self.name.clone(),
                    reason: format!("function '{}' is declared more than once", spec.name),
                });
            }
            functions.push(spec.build(&self.name, names, self.category.as_deref())?);
        }

        let mut module = PluginModule::new(&self.name);
        module.category = self.category.clone();
        module.cpp_headers = self.cpp_headers.clone();
        module.cpp_namespaces = self.cpp_namespaces.clone();
        module.cpp_sources = self.cpp_sources.clone();
        module.extra_libraries = self.extra_libraries.clone();
        module.extra_compile_args = self.extra_compile_args.clone();
        module.author = self.author.clone();
        module.url = self.url.clone();
        module.pure = self.pure_python;
        module.functions = functions;
        module.source = source;
        debug!(
            module = %module.name,
            functions = module.functions.len(),
            pure = module.pure,
            "Built plugin module"
        );
        Ok(module)
    }
}

/// A parsed but not yet validated module, with the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredModule {
    pub spec: ModuleSpec,
    pub path: Option<PathBuf>,
}

impl DeclaredModule {
    pub fn build(&self, names: &mut NameAllocator) -> Result<PluginModule, DeclarationError> {
        self.spec.build(self.path.clone(), names)
    }
}

/// Parse a TOML module declaration without validating it
pub fn parse_module_spec(path: &Path) -> Result<ModuleSpec, DeclarationError> {
    let content = fs::read_to_string(path).map_err(|source| DeclarationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| DeclarationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate one TOML module declaration
pub fn load_module_file(
    path: &Path,
    names: &mut NameAllocator,
) -> Result<PluginModule, DeclarationError> {
    let spec = parse_module_spec(path)?;
    spec.build(Some(path.to_path_buf()), names)
}

#[cfg(test)]
mod tests {
    use crate::args::ChoiceDefault;
    use crate::declaration::*;
    use std::fs;
    use tempfile::TempDir;

    const THRESHOLD: &str = r#"
name = "threshold"
category = "Binarization"
cpp_headers = ["threshold.hpp"]
author = "Plugin Author"

[[functions]]
name = "threshold"
doc = "Creates a binary image by splitting at a given threshold."
self_type = { kind = "ImageType", pixel_types = ["GreyScale", "Grey16", "Float"] }
return_type = { kind = "ImageType", pixel_types = ["OneBit"] }
args = [
    { kind = "Int", name = "threshold", range = [0, 255], default = 128 },
    { kind = "Choice", name = "storage format", choices = ["dense", "rle"], default = "rle" },
]
examples = [{ self_type = "GreyScale", args = [128] }]

[[functions]]
name = "otsu_find_threshold"
category = "Binarization/Automatic"
self_type = { kind = "ImageType", pixel_types = ["GreyScale"] }
return_type = { kind = "Int" }
"#;

    #[test]
    fn test_load_module_file() {
        let Ok(temp_dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let path = temp_dir.path().join("threshold.toml");
        if fs::write(&path, THRESHOLD).is_err() {
            return;
        }

        let mut names = NameAllocator::new();
        let module = match load_module_file(&path, &mut names) {
            Ok(module) => module,
            Err(err) => panic!("declaration should load: {}", err),
        };
        assert_eq!(&*module.name, "threshold");
        assert_eq!(module.functions.len(), 2);
        assert_eq!(module.source.as_deref(), Some(path.as_path()));

        let threshold = &module.functions[0];
        assert_eq!(threshold.category(), Some("Binarization"));
        let storage = &threshold.params()[1];
        assert_eq!(storage.name(), Some("storage_format"));
        assert!(matches!(
            storage.kind(),
            ArgKind::Choice {
                default: Some(ChoiceDefault::Index(1)),
                ..
            }
        ));
        assert_eq!(
            module.functions[1].category(),
            Some("Binarization/Automatic")
        );
    }

    #[test]
    fn test_float_default_for_int_is_rejected() {
        let mut spec = ArgSpec::new("Int");
        spec.name = Some("level".to_string());
        spec.default = Some(ArgValue::Float(2.5));
        assert!(matches!(
            spec.build(),
            Err(ConfigurationError::DefaultTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_non_text_choice_is_rejected() {
        let mut spec = ArgSpec::new("Choice");
        spec.name = Some("method".to_string());
        spec.choices = Some(vec![ArgValue::Str("a".to_string()), ArgValue::Int(3)]);
        assert!(matches!(
            spec.build(),
            Err(ConfigurationError::NonTextChoice { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_kind_and_pixel_type() {
        let spec = ArgSpec::new("Matrix");
        assert!(matches!(spec.build(), Err(ConfigurationError::UnknownKind { .. })));

        let mut spec = ArgSpec::new("ImageType");
        spec.pixel_types = Some(vec!["OneBit".to_string(), "CMYK".to_string()]);
        assert!(matches!(
            spec.build(),
            Err(ConfigurationError::UnknownPixelType { ref source, .. }) if source.tag == "CMYK"
        ));

        let spec = ArgSpec::new("ImageType");
        assert!(matches!(spec.build(), Err(ConfigurationError::EmptyPixelTypes { .. })));
    }

    #[test]
    fn test_option_on_wrong_kind_is_rejected() {
        let mut spec = ArgSpec::new("String");
        spec.range = Some(vec![ArgValue::Int(0), ArgValue::Int(1)]);
        assert!(matches!(
            spec.build(),
            Err(ConfigurationError::UnsupportedOption { option: "range", .. })
        ));
    }

    #[test]
    fn test_configuration_error_names_module_and_function() {
        let mut bad = ArgSpec::new("Int");
        bad.name = Some("level".to_string());
        bad.range = Some(vec![ArgValue::Int(0), ArgValue::Int(10)]);
        bad.default = Some(ArgValue::Int(15));
        let spec = ModuleSpec {
            name: "levels".to_string(),
            functions: vec![FunctionSpec {
                name: "clip".to_string(),
                args: vec![bad],
                ..FunctionSpec::default()
            }],
            ..ModuleSpec::default()
        };
        let Err(err) = spec.build(None, &mut NameAllocator::new()) else {
            panic!("out-of-range default should fail");
        };
        assert_eq!(err.module_name(), Some("levels"));
        assert!(err.to_string().contains("function 'clip'"));
        assert!(err.to_string().contains("argument 'level'"));
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        let spec = ModuleSpec {
            name: "twice".to_string(),
            functions: vec![
                FunctionSpec {
                    name: "f".to_string(),
                    ..FunctionSpec::default()
                },
                FunctionSpec {
                    name: "f".to_string(),
                    ..FunctionSpec::default()
                },
            ],
            ..ModuleSpec::default()
        };
        assert!(matches!(
            spec.build(None, &mut NameAllocator::new()),
            Err(DeclarationError::InvalidModule { .. })
        ));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let Ok(temp_dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let path = temp_dir.path().join("broken.toml");
        if fs::write(&path, "name = [").is_err() {
            return;
        }
        let result = load_module_file(&path, &mut NameAllocator::new());
        assert!(matches!(result, Err(DeclarationError::Parse { .. })));
    }
}
