//! Wrapper generation for pixgen plugin modules
//!
//! Validated modules from `pixgen-schema` are expanded over their pixel
//! types, lowered into a structured wrapper representation and rendered by a
//! [`Backend`]. The crate also renders the documentation sidecar and the
//! build descriptors external tools compile the wrappers with.

pub mod backend;
pub mod build;
pub mod dispatch;
pub mod docs;
pub mod driver;
pub mod errors;
pub mod expand;
pub mod ir;
pub mod lower;

pub use backend::{Backend, CpythonBackend};
pub use build::{staleness, BuildSettings, BuildUnit, Staleness};
pub use dispatch::{DispatchNode, DispatchTree, ExpansionContext};
pub use docs::{parse_choice_default, DocFile};
pub use driver::{render_module, GenerationReport, Generator, GeneratorOptions, ModuleFailure};
pub use errors::{GenerateError, TemplateError, VariantTableError};
pub use expand::{ConcreteVariant, VariantTable};
pub use lower::{lower_function, lower_module};
