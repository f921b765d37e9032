use std::path::PathBuf;
use thiserror::Error;

/// A pixel tag that is not in the fixed pixel-type table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "unknown pixel type '{tag}'; expected one of OneBit, GreyScale, Grey16, RGB, Float, Complex or All"
)]
pub struct UnknownPixelTypeError {
    pub tag: String,
}

/// Invalid static configuration of a single argument
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("argument '{arg}': unknown argument kind '{kind}'")]
    UnknownKind { arg: String, kind: String },

    #[error("argument '{arg}': range must be two finite numbers with low <= high, got ({low}, {high})")]
    InvalidRange { arg: String, low: f64, high: f64 },

    #[error("argument '{arg}': range must be a pair of numbers")]
    MalformedRange { arg: String },

    #[error("argument '{arg}': default {value} lies outside range ({low}, {high})")]
    DefaultOutOfRange {
        arg: String,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("argument '{arg}': default must be {expected}, got {found}")]
    DefaultTypeMismatch {
        arg: String,
        expected: &'static str,
        found: String,
    },

    #[error("argument '{arg}': choice list must not be empty")]
    EmptyChoices { arg: String },

    #[error("argument '{arg}': choice label '{label}' is repeated or contains a separator")]
    AmbiguousChoice { arg: String, label: String },

    #[error("argument '{arg}': choice {index} is not text")]
    NonTextChoice { arg: String, index: usize },

    #[error("argument '{arg}': default index {index} is out of bounds for {len} choices")]
    ChoiceIndexOutOfBounds { arg: String, index: i64, len: usize },

    #[error("argument '{arg}': default '{value}' is not one of the available choices")]
    ChoiceDefaultNotListed { arg: String, value: String },

    #[error("argument '{arg}': pixel type list must not be empty")]
    EmptyPixelTypes { arg: String },

    #[error("argument '{arg}': {source}")]
    UnknownPixelType {
        arg: String,
        #[source]
        source: UnknownPixelTypeError,
    },

    #[error("argument '{arg}': vector length must be -1 or positive, got {length}")]
    InvalidVectorLength { arg: String, length: i64 },

    #[error("argument '{arg}': default has {found} elements but the length is fixed at {expected}")]
    VectorLengthMismatch {
        arg: String,
        expected: usize,
        found: usize,
    },

    #[error("argument '{arg}': option '{option}' does not apply to kind {kind}")]
    UnsupportedOption {
        arg: String,
        kind: &'static str,
        option: &'static str,
    },
}

/// A concrete value rejected by an argument's validator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("argument '{arg}': {reason}")]
pub struct ValueError {
    pub arg: String,
    pub reason: String,
}

/// A function declaration that cannot form a valid signature
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("function '{function}': name is not a valid identifier")]
    InvalidName { function: String },

    #[error("function '{function}': argument name '{name}' is not a valid identifier")]
    InvalidArgumentName { function: String, name: String },

    #[error("function '{function}': parameters share the name '{name}' after normalization")]
    DuplicateArgument { function: String, name: String },

    #[error("function '{function}': parameter '{arg}' is variadic but not the last parameter")]
    NonFinalVariadic { function: String, arg: String },

    #[error("function '{function}': argument name '{name}' is reserved")]
    ReservedName { function: String, name: String },

    #[error("function '{function}': self type must be a single image, got {found}")]
    InvalidSelfType { function: String, found: String },

    #[error("function '{function}': example {index}: {reason}")]
    InvalidExample {
        function: String,
        index: usize,
        reason: String,
    },
}

/// Errors raised while loading plugin module declarations
#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse declaration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("module '{module}', function '{function}': {source}")]
    Configuration {
        module: String,
        function: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("module '{module}': {source}")]
    Signature {
        module: String,
        #[source]
        source: SignatureError,
    },

    #[error("module '{module}': {reason}")]
    InvalidModule { module: String, reason: String },

    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),
}

impl DeclarationError {
    /// Name of the module the error belongs to, when known
    pub fn module_name(&self) -> Option<&str> {
        match self {
            DeclarationError::Configuration { module, .. }
            | DeclarationError::Signature { module, .. }
            | DeclarationError::InvalidModule { module, .. }
            | DeclarationError::DuplicateModule(module) => Some(module),
            DeclarationError::Io { .. } | DeclarationError::Parse { .. } => None,
        }
    }
}
