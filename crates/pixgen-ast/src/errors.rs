use pixgen_schema::DeclarationError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("{}: class '{class}', attribute '{attribute}': {reason}", path.display())]
    InvalidAttribute {
        path: PathBuf,
        class: String,
        attribute: String,
        reason: String,
    },

    #[error("{}: module '{module}' lists unknown function '{function}'", path.display())]
    UnknownFunction {
        path: PathBuf,
        module: String,
        function: String,
    },

    #[error("{}: more than one plugin module class ('{first}' and '{second}')", path.display())]
    MultipleModules {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("{}: class '{class}' inherits from itself", path.display())]
    InheritanceCycle { path: PathBuf, class: String },
}

impl DiscoveryError {
    /// File the error was found in, when known
    pub fn path(&self) -> Option<&Path> {
        match self {
            DiscoveryError::Walk { path, .. }
            | DiscoveryError::Io { path, .. }
            | DiscoveryError::InvalidAttribute { path, .. }
            | DiscoveryError::UnknownFunction { path, .. }
            | DiscoveryError::MultipleModules { path, .. }
            | DiscoveryError::InheritanceCycle { path, .. } => Some(path),
            DiscoveryError::Declaration(DeclarationError::Io { path, .. })
            | DiscoveryError::Declaration(DeclarationError::Parse { path, .. }) => Some(path),
            DiscoveryError::Declaration(_) => None,
        }
    }
}
