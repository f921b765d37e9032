//! pixgen schema
//!
//! Argument kinds, pixel types and function metadata for native plugin
//! modules. Declarations are loaded from TOML (or produced by the Python
//! declaration parser in `pixgen-ast`), validated once, and then shared
//! read-only by the code generator and the documentation renderer.

pub mod args;
pub mod category;
pub mod declaration;
pub mod errors;
pub mod kinds;
pub mod module;
pub mod naming;
pub mod pixel;
pub mod registry;
pub mod signature;

pub use args::{
    ArgKind, Argument, ChoiceDefault, CompositeKind, FileMode, NumericRange, VectorElement,
    DEFAULT_MAX_ARG_NUMBER, NONE_LABEL,
};
pub use category::{
    flatten_by_category, CategorizedFunction, CategoryEntry, CategoryNode, CategoryTree,
    UNCATEGORIZED,
};
pub use declaration::{
    load_module_file, parse_module_spec, ArgSpec, DeclaredModule, FunctionSpec, ModuleSpec,
};
pub use errors::{
    ConfigurationError, DeclarationError, SignatureError, UnknownPixelTypeError, ValueError,
};
pub use kinds::{ArgValue, KindInfo, KindTag, KIND_TABLE};
pub use module::PluginModule;
pub use naming::NameAllocator;
pub use pixel::{PixelTag, PixelType, PixelTypeSet};
pub use registry::PluginRegistry;
pub use signature::{DocExample, FunctionDeclaration, FunctionSignature, RETURN_NAME, SELF_NAME};
