use pixgen_schema::{DeclarationError, UnknownPixelTypeError};
use std::path::PathBuf;
use thiserror::Error;

/// A function whose wrapper cannot be expressed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error(
        "function '{function}' returns an image but has no image argument to take its pixel type from"
    )]
    ImageReturnWithoutInput { function: String },

    #[error("function '{function}': pixel argument '{arg}' requires a self image")]
    PixelWithoutSelf { function: String, arg: String },

    #[error("function '{function}': pixel return value requires a self image")]
    PixelReturnWithoutSelf { function: String },

    #[error("function '{function}': {kind} cannot be returned to the caller")]
    UnsupportedReturn { function: String, kind: &'static str },
}

/// Invalid pixel variant table overrides
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantTableError {
    #[error(transparent)]
    UnknownPixelType(#[from] UnknownPixelTypeError),

    #[error("pixel type '{pixel_type}' must map to at least one variant")]
    EmptyVariants { pixel_type: String },

    #[error("pixel type '{pixel_type}': variant '{name}' is not a valid identifier")]
    InvalidVariantName { pixel_type: String, name: String },

    #[error("variant '{name}' is listed under more than one pixel type")]
    DuplicateVariant { name: String },
}

/// Errors raised while generating one module
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("module '{module}': {source}")]
    Template {
        module: String,
        #[source]
        source: TemplateError,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize build descriptors: {0}")]
    Serialize(#[from] serde_json::Error),
}
