//! Argument descriptors
//!
//! An [`Argument`] pairs an optional name with a closed [`ArgKind`]. All
//! configuration checks happen in [`Argument::new`]; afterwards an argument is
//! never mutated, only renamed into a fresh value by the signature builder.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{ConfigurationError, ValueError};
use crate::kinds::{ArgValue, KindTag};
use crate::pixel::PixelTypeSet;

/// Symmetric bound used when a numeric argument declares no range
pub const DEFAULT_MAX_ARG_NUMBER: f64 = 1_048_576.0;

// =============================================================================
// CONFIGURATION PIECES
// =============================================================================

/// Inclusive numeric range of an Int or Real argument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub low: f64,
    pub high: f64,
}

impl NumericRange {
    pub const DEFAULT: NumericRange = NumericRange {
        low: -DEFAULT_MAX_ARG_NUMBER,
        high: DEFAULT_MAX_ARG_NUMBER,
    };

    pub fn new(low: f64, high: f64) -> Self {
        NumericRange { low, high }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn is_well_formed(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

impl Default for NumericRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Text of the "no selection" default
pub const NONE_LABEL: &str = "None";

/// Default of a Choice argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceDefault {
    Index(usize),
    /// Explicit "no selection", rendered as `None`
    NoneSentinel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    Open,
    Save,
    Directory,
}

/// Structured values passed as opaque objects across the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeKind {
    Point,
    FloatPoint,
    Dim,
    Rect,
    Region,
    RegionMap,
    ImageInfo,
    PointVector,
}

impl CompositeKind {
    fn accepts_default(self) -> bool {
        matches!(
            self,
            CompositeKind::Point | CompositeKind::FloatPoint | CompositeKind::Dim
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorElement {
    Int,
    Float,
    Complex,
}

// =============================================================================
// ARGUMENT KINDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgKind {
    Int {
        range: NumericRange,
        default: Option<i64>,
    },
    Real {
        range: NumericRange,
        default: Option<f64>,
    },
    Complex {
        default: Option<[f64; 2]>,
    },
    Text {
        default: Option<String>,
    },
    Check {
        label: String,
        default: Option<bool>,
    },
    Choice {
        choices: Vec<String>,
        default: Option<ChoiceDefault>,
    },
    ChoiceString {
        choices: Vec<String>,
        default: Option<String>,
        strict: bool,
    },
    Filename {
        mode: FileMode,
        default: Option<String>,
        extension: String,
    },
    Image {
        pixel_types: PixelTypeSet,
        list: bool,
    },
    ImageList,
    Class {
        klass: Option<String>,
        list: bool,
        default: Option<String>,
    },
    Composite {
        kind: CompositeKind,
        default: Option<[f64; 2]>,
    },
    Vector {
        element: VectorElement,
        /// `None` for variable length
        length: Option<usize>,
        default: Option<Vec<ArgValue>>,
    },
    Pixel {
        default: Option<ArgValue>,
    },
    Info,
}

impl ArgKind {
    pub fn tag(&self) -> KindTag {
        match self {
            ArgKind::Int { .. } => KindTag::Int,
            ArgKind::Real { .. } => KindTag::Real,
            ArgKind::Complex { .. } => KindTag::Complex,
            ArgKind::Text { .. } => KindTag::Text,
            ArgKind::Check { .. } => KindTag::Check,
            ArgKind::Choice { .. } => KindTag::Choice,
            ArgKind::ChoiceString { .. } => KindTag::ChoiceString,
            ArgKind::Filename { mode, .. } => match mode {
                FileMode::Open => KindTag::FileOpen,
                FileMode::Save => KindTag::FileSave,
                FileMode::Directory => KindTag::Directory,
            },
            ArgKind::Image { .. } => KindTag::Image,
            ArgKind::ImageList => KindTag::ImageList,
            ArgKind::Class { .. } => KindTag::Class,
            ArgKind::Composite { kind, .. } => match kind {
                CompositeKind::Point => KindTag::Point,
                CompositeKind::FloatPoint => KindTag::FloatPoint,
                CompositeKind::Dim => KindTag::Dim,
                CompositeKind::Rect => KindTag::Rect,
                CompositeKind::Region => KindTag::Region,
                CompositeKind::RegionMap => KindTag::RegionMap,
                CompositeKind::ImageInfo => KindTag::ImageInfo,
                CompositeKind::PointVector => KindTag::PointVector,
            },
            ArgKind::Vector { element, .. } => match element {
                VectorElement::Int => KindTag::IntVector,
                VectorElement::Float => KindTag::FloatVector,
                VectorElement::Complex => KindTag::ComplexVector,
            },
            ArgKind::Pixel { .. } => KindTag::Pixel,
            ArgKind::Info => KindTag::Info,
        }
    }
}

// =============================================================================
// ARGUMENT
// =============================================================================

/// One declared parameter, self argument or return value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    name: Option<Arc<str>>,
    kind: ArgKind,
    #[serde(default)]
    variadic: bool,
}

impl Argument {
    /// Build an argument, checking the kind's static configuration
    pub fn new(name: Option<&str>, kind: ArgKind) -> Result<Self, ConfigurationError> {
        let label = name.unwrap_or("<unnamed>");
        check_configuration(label, &kind)?;
        Ok(Argument {
            name: name.map(Arc::from),
            kind,
            variadic: false,
        })
    }

    pub fn variadic(mut self, variadic: bool) -> Self {
        self.variadic = variadic;
        self
    }

    /// Same argument under a different name
    pub fn renamed(&self, name: &str) -> Self {
        Argument {
            name: Some(Arc::from(name)),
            kind: self.kind.clone(),
            variadic: self.variadic,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages; unnamed arguments read as `<unnamed>`
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Image argument taking part in pixel-type dispatch
    pub fn dispatch_types(&self) -> Option<&PixelTypeSet> {
        match &self.kind {
            ArgKind::Image {
                pixel_types,
                list: false,
            } => Some(pixel_types),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        match &self.kind {
            ArgKind::Image { list, .. } | ArgKind::Class { list, .. } => *list,
            ArgKind::ImageList | ArgKind::Composite {
                kind: CompositeKind::PointVector,
                ..
            } => true,
            _ => false,
        }
    }

    pub fn has_default(&self) -> bool {
        match &self.kind {
            ArgKind::Int { default, .. } => default.is_some(),
            ArgKind::Real { default, .. } => default.is_some(),
            ArgKind::Complex { default } | ArgKind::Composite { default, .. } => default.is_some(),
            ArgKind::Text { default } => default.is_some(),
            ArgKind::Check { default, .. } => default.is_some(),
            ArgKind::Choice { default, .. } => default.is_some(),
            ArgKind::ChoiceString { default, .. }
            | ArgKind::Filename { default, .. }
            | ArgKind::Class { default, .. } => default.is_some(),
            ArgKind::Vector { default, .. } => default.is_some(),
            ArgKind::Pixel { default } => default.is_some(),
            ArgKind::Image { .. } | ArgKind::ImageList | ArgKind::Info => false,
        }
    }

    /// Declared default as a concrete value; `None` when there is none
    pub fn default_value(&self) -> Option<ArgValue> {
        match &self.kind {
            ArgKind::Int { default, .. } => default.map(ArgValue::Int),
            ArgKind::Real { default, .. } => default.map(ArgValue::Float),
            ArgKind::Complex { default } => {
                default.map(|[re, im]| ArgValue::Array(vec![ArgValue::Float(re), ArgValue::Float(im)]))
            }
            ArgKind::Text { default }
            | ArgKind::ChoiceString { default, .. }
            | ArgKind::Filename { default, .. }
            | ArgKind::Class { default, .. } => default.clone().map(ArgValue::Str),
            ArgKind::Check { default, .. } => default.map(ArgValue::Bool),
            ArgKind::Choice { default, .. } => default.map(|d| match d {
                ChoiceDefault::Index(index) => ArgValue::Int(index as i64),
                ChoiceDefault::NoneSentinel => ArgValue::Str("None".to_string()),
            }),
            ArgKind::Composite { kind, default } => default.map(|[x, y]| {
                if *kind == CompositeKind::FloatPoint {
                    ArgValue::Array(vec![ArgValue::Float(x), ArgValue::Float(y)])
                } else {
                    ArgValue::Array(vec![ArgValue::Int(x as i64), ArgValue::Int(y as i64)])
                }
            }),
            ArgKind::Vector { default, .. } => default.clone().map(ArgValue::Array),
            ArgKind::Pixel { default } => default.clone(),
            ArgKind::Image { .. } | ArgKind::ImageList | ArgKind::Info => None,
        }
    }

    /// reStructuredText rendering used by the documentation sidecar
    pub fn describe(&self, with_name: bool) -> String {
        let name = self.display_name();
        let mut out = String::new();
        let named = |out: &mut String| {
            if with_name {
                out.push_str(&format!(" *{}*", name));
            }
        };

        match &self.kind {
            ArgKind::Int { range, default } => {
                out.push_str("int");
                if !range.is_default() {
                    out.push_str(&format!("({}, {})", range.low as i64, range.high as i64));
                }
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = {}", value));
                }
            }
            ArgKind::Real { range, default } => {
                out.push_str("float");
                if !range.is_default() {
                    out.push_str(&format!("({:.2}, {:.2})", range.low, range.high));
                }
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = {:.2}", value));
                }
            }
            ArgKind::Complex { default } => {
                out.push_str("complex");
                named(&mut out);
                if let (true, Some([re, im])) = (with_name, default) {
                    out.push_str(&format!(" = ({}{:+}j)", re, im));
                }
            }
            ArgKind::Text { default } => {
                out.push_str("str");
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = '{}'", value));
                }
            }
            ArgKind::Check { default, .. } => {
                out.push_str("``bool``");
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = {}", ArgValue::Bool(*value)));
                }
            }
            ArgKind::Choice { choices, default } => {
                out.push_str(&format!("``Choice`` [{}]", choices.join("|")));
                named(&mut out);
                if with_name {
                    match default {
                        Some(ChoiceDefault::Index(index)) => {
                            if let Some(label) = choices.get(*index) {
                                out.push_str(&format!(" = {}", label));
                            }
                        }
                        Some(ChoiceDefault::NoneSentinel) => {
                            if choices.iter().any(|c| c == NONE_LABEL) {
                                out.push_str(" = ``None``");
                            } else {
                                out.push_str(" = None");
                            }
                        }
                        None => {}
                    }
                }
            }
            ArgKind::ChoiceString {
                choices,
                default,
                strict,
            } => {
                let strict = if *strict { "(strict)" } else { "" };
                out.push_str(&format!("``ChoiceString{}`` [{}]", strict, choices.join("|")));
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = {}", value));
                }
            }
            ArgKind::Image { pixel_types, list } => {
                out.push_str(&format!("``Image`` [{}]", pixel_types));
                named(&mut out);
                if *list {
                    out = format!("[{}]", out);
                }
            }
            ArgKind::Class {
                klass,
                list,
                default,
            } => {
                out.push_str(klass.as_deref().unwrap_or("object"));
                named(&mut out);
                if *list {
                    out = format!("[{}]", out);
                }
                if let Some(value) = default {
                    out.push_str(&format!(" = {}", value));
                }
            }
            ArgKind::Pixel { default } => {
                out.push_str("Pixel");
                named(&mut out);
                if let (true, Some(value)) = (with_name, default) {
                    out.push_str(&format!(" = {}", value));
                }
            }
            ArgKind::ImageList | ArgKind::Composite { .. } => {
                out.push_str(self.tag().info().doc_keyword);
                named(&mut out);
                if let (true, Some(value)) = (with_name, self.default_value()) {
                    out.push_str(&format!(" = {}", render_pair(&value)));
                }
                if self.is_list() {
                    out = format!("[{}]", out);
                }
            }
            ArgKind::Filename { .. } | ArgKind::Vector { .. } | ArgKind::Info => {
                out.push_str(self.tag().info().doc_keyword);
                named(&mut out);
                if let (true, Some(value)) = (with_name, self.default_value()) {
                    match value {
                        ArgValue::Str(text) => out.push_str(&format!(" = {}", text)),
                        other => out.push_str(&format!(" = {}", other)),
                    }
                }
            }
        }
        out
    }

    /// Check a concrete value against this argument's kind
    pub fn validate(&self, value: &ArgValue) -> Result<(), ValueError> {
        let fail = |reason: String| {
            Err(ValueError {
                arg: self.display_name().to_string(),
                reason,
            })
        };

        match (&self.kind, value) {
            (ArgKind::Int { range, .. }, ArgValue::Int(i)) => {
                if range.contains(*i as f64) {
                    Ok(())
                } else {
                    fail(format!("{} lies outside range ({}, {})", i, range.low, range.high))
                }
            }
            (ArgKind::Real { range, .. }, ArgValue::Int(_) | ArgValue::Float(_)) => {
                let x = value.as_f64().unwrap_or_default();
                if range.contains(x) {
                    Ok(())
                } else {
                    fail(format!("{} lies outside range ({}, {})", x, range.low, range.high))
                }
            }
            (ArgKind::Complex { .. }, ArgValue::Int(_) | ArgValue::Float(_)) => Ok(()),
            (ArgKind::Complex { .. }, ArgValue::Array(parts)) if is_number_pair(parts) => Ok(()),
            (
                ArgKind::Text { .. } | ArgKind::Filename { .. },
                ArgValue::Str(_),
            ) => Ok(()),
            (ArgKind::Check { .. }, ArgValue::Bool(_)) => Ok(()),
            (ArgKind::Check { .. }, ArgValue::Int(0 | 1)) => Ok(()),
            (ArgKind::Choice { choices, .. }, ArgValue::Int(i)) => {
                if *i >= 0 && (*i as usize) < choices.len() {
                    Ok(())
                } else {
                    fail(format!("choice index {} is out of bounds for {} choices", i, choices.len()))
                }
            }
            (ArgKind::Choice { choices, .. }, ArgValue::Str(s)) => {
                if choices.iter().any(|c| c == s) {
                    Ok(())
                } else {
                    fail(format!("'{}' is not one of [{}]", s, choices.join("|")))
                }
            }
            (
                ArgKind::ChoiceString {
                    choices, strict, ..
                },
                ArgValue::Str(s),
            ) => {
                if !strict || choices.iter().any(|c| c == s) {
                    Ok(())
                } else {
                    fail(format!("'{}' is not one of [{}]", s, choices.join("|")))
                }
            }
            (ArgKind::Vector { element, length, .. }, ArgValue::Array(items)) => {
                if let Some(expected) = length {
                    if items.len() != *expected {
                        return fail(format!(
                            "expected {} elements, got {}",
                            expected,
                            items.len()
                        ));
                    }
                }
                match items.iter().position(|item| !element_matches(*element, item)) {
                    Some(index) => fail(format!("element {} has the wrong type", index)),
                    None => Ok(()),
                }
            }
            (
                ArgKind::Composite {
                    kind: CompositeKind::Point | CompositeKind::FloatPoint | CompositeKind::Dim,
                    ..
                },
                ArgValue::Array(parts),
            ) if is_number_pair(parts) => Ok(()),
            // Opaque objects are supplied by reference in examples
            (
                ArgKind::Image { .. }
                | ArgKind::ImageList
                | ArgKind::Class { .. }
                | ArgKind::Composite { .. }
                | ArgKind::Pixel { .. },
                _,
            ) => Ok(()),
            (ArgKind::Info, _) => fail("documentation-only arguments take no value".to_string()),
            (kind, other) => fail(format!(
                "expected a value for {}, got {} {}",
                kind.tag(),
                other.type_name(),
                other
            )),
        }
    }
}

fn render_pair(value: &ArgValue) -> String {
    match value {
        ArgValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
            format!("({})", rendered.join(", "))
        }
        other => other.to_string(),
    }
}

fn is_number_pair(parts: &[ArgValue]) -> bool {
    parts.len() == 2 && parts.iter().all(|p| p.as_f64().is_some())
}

fn element_matches(element: VectorElement, item: &ArgValue) -> bool {
    match element {
        VectorElement::Int => matches!(item, ArgValue::Int(_)),
        VectorElement::Float | VectorElement::Complex => item.as_f64().is_some(),
    }
}

fn check_range(arg: &str, range: &NumericRange) -> Result<(), ConfigurationError> {
    if range.is_well_formed() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRange {
            arg: arg.to_string(),
            low: range.low,
            high: range.high,
        })
    }
}

fn check_numeric_default(
    arg: &str,
    range: &NumericRange,
    value: f64,
) -> Result<(), ConfigurationError> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(ConfigurationError::DefaultOutOfRange {
            arg: arg.to_string(),
            value,
            low: range.low,
            high: range.high,
        })
    }
}

fn check_configuration(arg: &str, kind: &ArgKind) -> Result<(), ConfigurationError> {
    match kind {
        ArgKind::Int { range, default } => {
            check_range(arg, range)?;
            if let Some(value) = default {
                check_numeric_default(arg, range, *value as f64)?;
            }
        }
        ArgKind::Real { range, default } => {
            check_range(arg, range)?;
            if let Some(value) = default {
                check_numeric_default(arg, range, *value)?;
            }
        }
        ArgKind::Choice { choices, default } => {
            if choices.is_empty() {
                return Err(ConfigurationError::EmptyChoices {
                    arg: arg.to_string(),
                });
            }
            // Rendered labels must map back to exactly one index
            for (index, label) in choices.iter().enumerate() {
                let separator = label.trim() != label.as_str()
                    || label.is_empty()
                    || label.contains(['|', ']'])
                    || label.contains("``");
                if separator || choices[..index].contains(label) {
                    return Err(ConfigurationError::AmbiguousChoice {
                        arg: arg.to_string(),
                        label: label.clone(),
                    });
                }
            }
            if let Some(ChoiceDefault::Index(index)) = default {
                if *index >= choices.len() {
                    return Err(ConfigurationError::ChoiceIndexOutOfBounds {
                        arg: arg.to_string(),
                        index: *index as i64,
                        len: choices.len(),
                    });
                }
            }
        }
        ArgKind::ChoiceString {
            choices, default, ..
        } => {
            if choices.is_empty() {
                return Err(ConfigurationError::EmptyChoices {
                    arg: arg.to_string(),
                });
            }
            if let Some(value) = default {
                if !choices.contains(value) {
                    return Err(ConfigurationError::ChoiceDefaultNotListed {
                        arg: arg.to_string(),
                        value: value.clone(),
                    });
                }
            }
        }
        ArgKind::Image { pixel_types, .. } => {
            if pixel_types.is_empty() {
                return Err(ConfigurationError::EmptyPixelTypes {
                    arg: arg.to_string(),
                });
            }
        }
        ArgKind::Composite { kind, default } => {
            if default.is_some() && !kind.accepts_default() {
                return Err(ConfigurationError::UnsupportedOption {
                    arg: arg.to_string(),
                    kind: KindTag::from(*kind).declared_as(),
                    option: "default",
                });
            }
        }
        ArgKind::Vector {
            element,
            length,
            default,
        } => {
            if *length == Some(0) {
                return Err(ConfigurationError::InvalidVectorLength {
                    arg: arg.to_string(),
                    length: 0,
                });
            }
            if let Some(values) = default {
                if let Some(expected) = length {
                    if values.len() != *expected {
                        return Err(ConfigurationError::VectorLengthMismatch {
                            arg: arg.to_string(),
                            expected: *expected,
                            found: values.len(),
                        });
                    }
                }
                if let Some(bad) = values.iter().find(|v| !element_matches(*element, v)) {
                    return Err(ConfigurationError::DefaultTypeMismatch {
                        arg: arg.to_string(),
                        expected: match element {
                            VectorElement::Int => "a list of integers",
                            VectorElement::Float | VectorElement::Complex => "a list of numbers",
                        },
                        found: bad.to_string(),
                    });
                }
            }
        }
        ArgKind::Complex { .. }
        | ArgKind::Text { .. }
        | ArgKind::Check { .. }
        | ArgKind::Filename { .. }
        | ArgKind::ImageList
        | ArgKind::Class { .. }
        | ArgKind::Pixel { .. }
        | ArgKind::Info => {}
    }
    Ok(())
}

impl From<CompositeKind> for KindTag {
    fn from(kind: CompositeKind) -> Self {
        ArgKind::Composite {
            kind,
            default: None,
        }
        .tag()
    }
}

/// Convert a declared vector length, where `-1` means variable
pub fn vector_length(arg: &str, length: i64) -> Result<Option<usize>, ConfigurationError> {
    match length {
        -1 => Ok(None),
        n if n > 0 => usize::try_from(n)
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidVectorLength {
                arg: arg.to_string(),
                length,
            }),
        _ => Err(ConfigurationError::InvalidVectorLength {
            arg: arg.to_string(),
            length,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::args::*;
    use crate::pixel::PixelType;

    fn int_arg(range: NumericRange, default: Option<i64>) -> Result<Argument, ConfigurationError> {
        Argument::new(Some("threshold"), ArgKind::Int { range, default })
    }

    #[test]
    fn test_int_with_custom_range_renders_range() {
        let Ok(arg) = int_arg(NumericRange::new(0.0, 10.0), Some(5)) else {
            panic!("valid int argument rejected");
        };
        assert!(arg.has_default());
        assert_eq!(arg.describe(false), "int(0, 10)");
        assert_eq!(arg.describe(true), "int(0, 10) *threshold* = 5");
    }

    #[test]
    fn test_int_with_default_range_omits_range() {
        let Ok(arg) = int_arg(NumericRange::DEFAULT, None) else {
            panic!("valid int argument rejected");
        };
        assert!(!arg.has_default());
        assert_eq!(arg.default_value(), None);
        assert_eq!(arg.describe(true), "int *threshold*");
    }

    #[test]
    fn test_int_default_outside_range_is_rejected() {
        let result = int_arg(NumericRange::new(0.0, 10.0), Some(15));
        assert!(matches!(
            result,
            Err(ConfigurationError::DefaultOutOfRange { ref arg, .. }) if arg == "threshold"
        ));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = int_arg(NumericRange::new(10.0, 0.0), None);
        assert!(matches!(result, Err(ConfigurationError::InvalidRange { .. })));
        let result = Argument::new(
            Some("x"),
            ArgKind::Real {
                range: NumericRange::new(f64::NAN, 1.0),
                default: None,
            },
        );
        assert!(matches!(result, Err(ConfigurationError::InvalidRange { .. })));
    }

    #[test]
    fn test_real_renders_two_decimals() {
        let Ok(arg) = Argument::new(
            Some("sigma"),
            ArgKind::Real {
                range: NumericRange::new(0.0, 1.0),
                default: Some(0.5),
            },
        ) else {
            panic!("valid real argument rejected");
        };
        assert_eq!(arg.describe(true), "float(0.00, 1.00) *sigma* = 0.50");
    }

    #[test]
    fn test_choice_configuration() {
        let choices = vec!["dense".to_string(), "rle".to_string()];
        let bad = Argument::new(
            Some("storage"),
            ArgKind::Choice {
                choices: choices.clone(),
                default: Some(ChoiceDefault::Index(2)),
            },
        );
        assert!(matches!(
            bad,
            Err(ConfigurationError::ChoiceIndexOutOfBounds { index: 2, len: 2, .. })
        ));

        let empty = Argument::new(
            Some("storage"),
            ArgKind::Choice {
                choices: Vec::new(),
                default: None,
            },
        );
        assert!(matches!(empty, Err(ConfigurationError::EmptyChoices { .. })));

        let Ok(none) = Argument::new(
            Some("storage"),
            ArgKind::Choice {
                choices,
                default: Some(ChoiceDefault::NoneSentinel),
            },
        ) else {
            panic!("none sentinel rejected");
        };
        assert_eq!(none.describe(true), "``Choice`` [dense|rle] *storage* = None");
    }

    #[test]
    fn test_choice_labels_must_be_unambiguous() {
        let choice = |labels: &[&str]| {
            Argument::new(
                Some("mode"),
                ArgKind::Choice {
                    choices: labels.iter().map(|l| (*l).to_string()).collect(),
                    default: None,
                },
            )
        };
        assert!(matches!(
            choice(&["a", "a"]),
            Err(ConfigurationError::AmbiguousChoice { ref label, .. }) if label == "a"
        ));
        assert!(matches!(
            choice(&["a|b", "c"]),
            Err(ConfigurationError::AmbiguousChoice { .. })
        ));
        assert!(choice(&["None", "Linear", "Spline"]).is_ok());
    }

    #[test]
    fn test_none_sentinel_is_marked_when_none_is_a_label() {
        let Ok(arg) = Argument::new(
            Some("interp_type"),
            ArgKind::Choice {
                choices: vec!["None".to_string(), "Linear".to_string()],
                default: Some(ChoiceDefault::NoneSentinel),
            },
        ) else {
            panic!("none label rejected");
        };
        assert_eq!(
            arg.describe(true),
            "``Choice`` [None|Linear] *interp_type* = ``None``"
        );
    }

    #[test]
    fn test_choice_string_default_must_be_listed() {
        let result = Argument::new(
            Some("mode"),
            ArgKind::ChoiceString {
                choices: vec!["a".to_string(), "b".to_string()],
                default: Some("c".to_string()),
                strict: true,
            },
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::ChoiceDefaultNotListed { .. })
        ));
    }

    #[test]
    fn test_image_argument_rendering() {
        let Ok(set) = PixelTypeSet::parse(&["RGB", "OneBit"]) else {
            panic!("tags should parse");
        };
        let Ok(single) = Argument::new(
            Some("mask"),
            ArgKind::Image {
                pixel_types: set.clone(),
                list: false,
            },
        ) else {
            panic!("image argument rejected");
        };
        assert_eq!(single.describe(true), "``Image`` [OneBit|RGB] *mask*");
        assert!(single.dispatch_types().is_some());

        let Ok(list) = Argument::new(
            Some("parts"),
            ArgKind::Image {
                pixel_types: set,
                list: true,
            },
        ) else {
            panic!("image list rejected");
        };
        assert_eq!(list.describe(false), "[``Image`` [OneBit|RGB]]");
        assert!(list.dispatch_types().is_none());
    }

    #[test]
    fn test_empty_pixel_types_rejected() {
        let result = Argument::new(
            Some("img"),
            ArgKind::Image {
                pixel_types: PixelTypeSet::default(),
                list: false,
            },
        );
        assert!(matches!(result, Err(ConfigurationError::EmptyPixelTypes { .. })));
    }

    #[test]
    fn test_vector_length_rules() {
        assert_eq!(vector_length("v", -1), Ok(None));
        assert_eq!(vector_length("v", 3), Ok(Some(3)));
        assert!(vector_length("v", 0).is_err());
        assert!(vector_length("v", -4).is_err());

        let mismatch = Argument::new(
            Some("weights"),
            ArgKind::Vector {
                element: VectorElement::Float,
                length: Some(3),
                default: Some(vec![ArgValue::Float(1.0)]),
            },
        );
        assert!(matches!(
            mismatch,
            Err(ConfigurationError::VectorLengthMismatch { expected: 3, found: 1, .. })
        ));
    }

    #[test]
    fn test_validate_values() {
        let Ok(arg) = int_arg(NumericRange::new(0.0, 10.0), None) else {
            panic!("valid int argument rejected");
        };
        assert!(arg.validate(&ArgValue::Int(4)).is_ok());
        assert!(arg.validate(&ArgValue::Int(11)).is_err());
        assert!(arg.validate(&ArgValue::Float(4.0)).is_err());

        let Ok(vector) = Argument::new(
            Some("offsets"),
            ArgKind::Vector {
                element: VectorElement::Int,
                length: None,
                default: None,
            },
        ) else {
            panic!("vector rejected");
        };
        assert!(vector
            .validate(&ArgValue::Array(vec![ArgValue::Int(1), ArgValue::Int(2)]))
            .is_ok());
        assert!(vector
            .validate(&ArgValue::Array(vec![ArgValue::Float(1.5)]))
            .is_err());
    }

    #[test]
    fn test_renamed_keeps_kind() {
        let Ok(arg) = Argument::new(
            None,
            ArgKind::Image {
                pixel_types: PixelTypeSet::single(PixelType::Float),
                list: false,
            },
        ) else {
            panic!("image argument rejected");
        };
        assert_eq!(arg.name(), None);
        let named = arg.renamed("_00000000");
        assert_eq!(named.name(), Some("_00000000"));
        assert_eq!(named.kind(), arg.kind());
    }
}
