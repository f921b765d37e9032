//! Plugin declaration discovery
//!
//! Walks a plugin directory and turns every declaration file into a
//! [`DeclaredModule`](pixgen_schema::DeclaredModule):
//! - TOML declarations are deserialized directly
//! - Python declarations (`PluginFunction`/`PluginModule` classes) are read
//!   statically with ast-grep, no interpreter involved
//!
//! Validation happens later, in one place, when the registry is built.

pub mod discovery;
pub mod errors;
pub mod expr;
pub mod python;

pub use discovery::{discover, Discovery};
pub use errors::DiscoveryError;
pub use python::extract_module;
