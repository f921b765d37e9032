//! pixgen command line: generate wrappers, docs and build descriptors for
//! plugin declarations.

pub mod commands;
pub mod common;

pub use common::GlobalOpts;
