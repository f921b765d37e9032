//! Plugin directory discovery
//!
//! A single walk collects TOML and Python declaration files. Each file is
//! parsed independently so one broken declaration never hides the others.

use pixgen_schema::{parse_module_spec, DeclaredModule};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::DiscoveryError;
use crate::python::extract_module;

/// Declarations found under one plugin directory, in file name order
#[derive(Debug, Default)]
pub struct Discovery {
    pub modules: Vec<DeclaredModule>,
    pub errors: Vec<DiscoveryError>,
}

impl Discovery {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclarationFormat {
    Toml,
    Python,
}

fn declaration_format(path: &Path) -> Option<DeclarationFormat> {
    match path.extension()?.to_str()? {
        "toml" => Some(DeclarationFormat::Toml),
        "py" => Some(DeclarationFormat::Python),
        _ => None,
    }
}

/// Hidden entries, private modules and bytecode caches
fn is_ignored(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || name == "__pycache__"
}

fn load(path: &Path, format: DeclarationFormat) -> Result<Option<DeclaredModule>, DiscoveryError> {
    let spec = match format {
        DeclarationFormat::Toml => Some(parse_module_spec(path)?),
        DeclarationFormat::Python => {
            let source = std::fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            extract_module(path, &source)?
        }
    };
    Ok(spec.map(|spec| DeclaredModule {
        spec,
        path: Some(path.to_path_buf()),
    }))
}

/// Collect every declaration under `root`. A single file may also be given.
pub fn discover(root: &Path) -> Discovery {
    let start = Instant::now();
    let mut discovery = Discovery::default();
    let mut files: Vec<(PathBuf, DeclarationFormat)> = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                let path = source
                    .path()
                    .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                warn!(path = %path.display(), "Failed to read directory entry");
                discovery.errors.push(DiscoveryError::Walk { path, source });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(format) = declaration_format(entry.path()) {
            files.push((entry.into_path(), format));
        }
    }

    for (path, format) in files {
        match load(&path, format) {
            Ok(Some(module)) => {
                debug!(path = %path.display(), module = %module.spec.name, "Found declaration");
                discovery.modules.push(module);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping declaration");
                discovery.errors.push(e);
            }
        }
    }

    info!(
        root = %root.display(),
        modules = discovery.modules.len(),
        errors = discovery.errors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Discovery finished"
    );
    discovery
}
