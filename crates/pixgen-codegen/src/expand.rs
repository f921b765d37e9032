//! Pixel-type expansion
//!
//! Maps abstract pixel types to the concrete view types the native code
//! branches over. The table is data: the standard table below can be
//! replaced per pixel type from configuration.

use pixgen_schema::{PixelTag, PixelType, PixelTypeSet, UnknownPixelTypeError};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::errors::VariantTableError;

/// Binary images have dense, run-length and connected-component views
const ONEBIT_VARIANTS: [&str; 5] = ["OneBitImageView", "Cc", "OneBitRleImageView", "RleCc", "MlCc"];

/// One concrete representation an abstract pixel type dispatches to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConcreteVariant {
    /// Native type name, e.g. `OneBitRleImageView`
    pub name: Arc<str>,
    /// Enumerator used in `case` labels, e.g. `ONEBITRLEIMAGEVIEW`
    pub label: String,
    pub pixel_type: PixelType,
}

impl ConcreteVariant {
    fn new(name: &Arc<str>, pixel_type: PixelType) -> Self {
        ConcreteVariant {
            name: Arc::clone(name),
            label: name.to_ascii_uppercase(),
            pixel_type,
        }
    }
}

type Variants = SmallVec<[Arc<str>; 5]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTable {
    /// Indexed by `PixelType::rank`
    entries: [Variants; 6],
}

impl Default for VariantTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl VariantTable {
    /// OneBit expands to its five storage variants; every other type to
    /// `<Name>ImageView`.
    pub fn standard() -> Self {
        let entries = PixelType::ALL.map(|pixel_type| match pixel_type {
            PixelType::OneBit => ONEBIT_VARIANTS.iter().map(|&v| Arc::from(v)).collect::<Variants>(),
            other => {
                let mut single = Variants::new();
                single.push(Arc::from(format!("{}ImageView", other.name())));
                single
            }
        });
        VariantTable { entries }
    }

    /// Standard table with some pixel types remapped, keyed by pixel tag name
    pub fn with_overrides(
        overrides: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, VariantTableError> {
        let mut table = Self::standard();
        for (tag, names) in overrides {
            let pixel_type: PixelType = tag.parse()?;
            if names.is_empty() {
                return Err(VariantTableError::EmptyVariants {
                    pixel_type: tag.clone(),
                });
            }
            if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
                return Err(VariantTableError::InvalidVariantName {
                    pixel_type: tag.clone(),
                    name: bad.clone(),
                });
            }
            table.entries[pixel_type.rank() as usize] =
                names.iter().map(|n| Arc::from(n.as_str())).collect();
        }

        let mut seen = BTreeSet::new();
        for name in table.entries.iter().flatten() {
            if !seen.insert(&**name) {
                return Err(VariantTableError::DuplicateVariant {
                    name: name.to_string(),
                });
            }
        }
        Ok(table)
    }

    /// Variants of one abstract pixel type, in table order
    pub fn variants_for(&self, pixel_type: PixelType) -> Vec<ConcreteVariant> {
        self.entries[pixel_type.rank() as usize]
            .iter()
            .map(|name| ConcreteVariant::new(name, pixel_type))
            .collect()
    }

    /// Variants for a whole set: pixel types by rank, table order within one
    pub fn expand(&self, set: &PixelTypeSet) -> Vec<ConcreteVariant> {
        set.iter().flat_map(|t| self.variants_for(t)).collect()
    }

    /// Expand tag names such as `["OneBit", "RGB"]` or `["All"]`
    pub fn expand_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> Result<Vec<ConcreteVariant>, UnknownPixelTypeError> {
        let parsed = tags
            .iter()
            .map(|t| t.as_ref().parse::<PixelTag>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.expand(&PixelTypeSet::from_tags(parsed)))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
