//! Kind table and concrete argument values
//!
//! Every argument kind has exactly one entry in [`KIND_TABLE`]. Consumers
//! (the documentation renderer here, the wrapper backends in the codegen
//! crate) look kinds up by [`KindTag`] instead of matching on the full
//! [`crate::ArgKind`] payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat identifier of an argument kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KindTag {
    Int = 0,
    Real = 1,
    Complex = 2,
    Text = 3,
    Check = 4,
    Choice = 5,
    ChoiceString = 6,
    FileOpen = 7,
    FileSave = 8,
    Directory = 9,
    Image = 10,
    ImageList = 11,
    Class = 12,
    Point = 13,
    FloatPoint = 14,
    Dim = 15,
    Rect = 16,
    Region = 17,
    RegionMap = 18,
    ImageInfo = 19,
    PointVector = 20,
    IntVector = 21,
    FloatVector = 22,
    ComplexVector = 23,
    Pixel = 24,
    Info = 25,
}

/// Static facts about one argument kind
#[derive(Debug)]
pub struct KindInfo {
    pub tag: KindTag,
    /// Name used in declarations (`Int`, `ImageType`, ...)
    pub declared_as: &'static str,
    /// Keyword used when rendering documentation
    pub doc_keyword: &'static str,
    /// Whether the kind can carry a default value at all
    pub accepts_default: bool,
    /// Whether values of this kind take part in pixel-type dispatch
    pub dispatches: bool,
}

const fn info(
    tag: KindTag,
    declared_as: &'static str,
    doc_keyword: &'static str,
    accepts_default: bool,
    dispatches: bool,
) -> KindInfo {
    KindInfo {
        tag,
        declared_as,
        doc_keyword,
        accepts_default,
        dispatches,
    }
}

/// One entry per [`KindTag`], indexed by discriminant
pub static KIND_TABLE: [KindInfo; 26] = [
    info(KindTag::Int, "Int", "int", true, false),
    info(KindTag::Real, "Real", "float", true, false),
    info(KindTag::Complex, "Complex", "complex", true, false),
    info(KindTag::Text, "String", "str", true, false),
    info(KindTag::Check, "Check", "``bool``", true, false),
    info(KindTag::Choice, "Choice", "``Choice``", true, false),
    info(KindTag::ChoiceString, "ChoiceString", "``ChoiceString``", true, false),
    info(KindTag::FileOpen, "FileOpen", "``FileOpen``", true, false),
    info(KindTag::FileSave, "FileSave", "``FileSave``", true, false),
    info(KindTag::Directory, "Directory", "``Directory``", true, false),
    info(KindTag::Image, "ImageType", "``Image``", false, true),
    info(KindTag::ImageList, "ImageList", "``Image``", false, false),
    info(KindTag::Class, "Class", "object", true, false),
    info(KindTag::Point, "Point", "``Point``", true, false),
    info(KindTag::FloatPoint, "FloatPoint", "``FloatPoint``", true, false),
    info(KindTag::Dim, "Dim", "``Dim``", true, false),
    info(KindTag::Rect, "Rect", "``Rect``", false, false),
    info(KindTag::Region, "Region", "``Region``", false, false),
    info(KindTag::RegionMap, "RegionMap", "``RegionMap``", false, false),
    info(KindTag::ImageInfo, "ImageInfo", "``ImageInfo``", false, false),
    info(KindTag::PointVector, "PointVector", "``PointVector``", false, false),
    info(KindTag::IntVector, "IntVector", "``IntVector``", true, false),
    info(KindTag::FloatVector, "FloatVector", "``FloatVector``", true, false),
    info(KindTag::ComplexVector, "ComplexVector", "``ComplexVector``", true, false),
    info(KindTag::Pixel, "Pixel", "Pixel", true, false),
    info(KindTag::Info, "Info", "``Info``", false, false),
];

impl KindTag {
    pub fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    pub fn declared_as(self) -> &'static str {
        self.info().declared_as
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.declared_as())
    }
}

/// A concrete value: a default, a documentation example argument, or a
/// value supplied for validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(i) => Some(*i as f64),
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "str",
            ArgValue::Array(_) => "list",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(true) => f.write_str("True"),
            ArgValue::Bool(false) => f.write_str("False"),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{:?}", x),
            ArgValue::Str(s) => write!(f, "'{}'", s),
            ArgValue::Array(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}
