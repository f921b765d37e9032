//! Abstract pixel types and ordered pixel-type sets

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::errors::UnknownPixelTypeError;

/// Logical image representation, independent of storage optimizations.
///
/// The discriminant is the canonical rank used to order dispatch branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PixelType {
    OneBit = 0,
    GreyScale = 1,
    Grey16 = 2,
    #[serde(rename = "RGB")]
    Rgb = 3,
    Float = 4,
    Complex = 5,
}

impl PixelType {
    /// Every pixel type in rank order
    pub const ALL: [PixelType; 6] = [
        PixelType::OneBit,
        PixelType::GreyScale,
        PixelType::Grey16,
        PixelType::Rgb,
        PixelType::Float,
        PixelType::Complex,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PixelType::OneBit => "OneBit",
            PixelType::GreyScale => "GreyScale",
            PixelType::Grey16 => "Grey16",
            PixelType::Rgb => "RGB",
            PixelType::Float => "Float",
            PixelType::Complex => "Complex",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Upper-case constant name (`ONEBIT`, `GREYSCALE`, ...)
    pub fn constant_name(self) -> String {
        self.name().to_ascii_uppercase()
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pixel tag as written in a declaration: a concrete type or the `All` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelTag {
    Type(PixelType),
    All,
}

impl FromStr for PixelTag {
    type Err = UnknownPixelTypeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized = tag.trim().to_ascii_lowercase();
        let parsed = match normalized.as_str() {
            "onebit" => PixelTag::Type(PixelType::OneBit),
            "greyscale" | "grayscale" => PixelTag::Type(PixelType::GreyScale),
            "grey16" | "gray16" => PixelTag::Type(PixelType::Grey16),
            "rgb" => PixelTag::Type(PixelType::Rgb),
            "float" => PixelTag::Type(PixelType::Float),
            "complex" => PixelTag::Type(PixelType::Complex),
            "all" => PixelTag::All,
            _ => {
                return Err(UnknownPixelTypeError {
                    tag: tag.to_string(),
                })
            }
        };
        Ok(parsed)
    }
}

impl FromStr for PixelType {
    type Err = UnknownPixelTypeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.parse::<PixelTag>()? {
            PixelTag::Type(pixel_type) => Ok(pixel_type),
            PixelTag::All => Err(UnknownPixelTypeError {
                tag: tag.to_string(),
            }),
        }
    }
}

/// Ordered, deduplicated set of abstract pixel types.
///
/// Iteration always follows [`PixelType::rank`], whatever order the tags
/// were declared in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PixelTypeSet {
    types: SmallVec<[PixelType; 6]>,
}

impl PixelTypeSet {
    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = PixelTag>,
    {
        let mut types: SmallVec<[PixelType; 6]> = SmallVec::new();
        for tag in tags {
            match tag {
                PixelTag::Type(pixel_type) => types.push(pixel_type),
                PixelTag::All => types.extend(PixelType::ALL),
            }
        }
        types.sort_unstable();
        types.dedup();
        PixelTypeSet { types }
    }

    /// Parse a list of tag names; unknown names fail
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownPixelTypeError> {
        let tags = names
            .iter()
            .map(|name| name.as_ref().parse::<PixelTag>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_tags(tags))
    }

    pub fn all() -> Self {
        Self::from_tags([PixelTag::All])
    }

    pub fn single(pixel_type: PixelType) -> Self {
        Self::from_tags([PixelTag::Type(pixel_type)])
    }

    pub fn iter(&self) -> impl Iterator<Item = PixelType> + '_ {
        self.types.iter().copied()
    }

    pub fn contains(&self, pixel_type: PixelType) -> bool {
        self.types.contains(&pixel_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_all(&self) -> bool {
        self.types.len() == PixelType::ALL.len()
    }
}

impl fmt::Display for PixelTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(PixelType::name).collect();
        f.write_str(&names.join("|"))
    }
}

impl TryFrom<Vec<String>> for PixelTypeSet {
    type Error = UnknownPixelTypeError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&names)
    }
}

impl From<PixelTypeSet> for Vec<String> {
    fn from(set: PixelTypeSet) -> Self {
        set.iter().map(|t| t.name().to_string()).collect()
    }
}
