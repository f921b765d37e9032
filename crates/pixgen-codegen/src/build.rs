//! Extension build descriptors and staleness checks

use pixgen_schema::PluginModule;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Settings shared by every build unit of a run
#[derive(Debug, Clone, Default)]
pub struct BuildSettings {
    /// Package the extensions live in, e.g. `pixgen.plugins`
    pub package: String,
    pub include_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub link_args: Vec<String>,
    pub compiler: Option<PathBuf>,
    /// Configuration the run was read from; editing it outdates every unit
    pub config_file: Option<PathBuf>,
}

/// Everything an external build tool needs to compile one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildUnit {
    /// Fully qualified extension name
    pub name: String,
    /// Generated wrapper first, then the module's own sources
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub link_args: Vec<String>,
    pub compile_args: Vec<String>,
    pub namespaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<PathBuf>,
}

impl BuildUnit {
    pub fn new(module: &PluginModule, generated: &Path, settings: &BuildSettings) -> Self {
        let declared_dir = module.source_dir().map(Path::to_path_buf);

        let mut sources = vec![generated.to_path_buf()];
        sources.extend(module.cpp_sources.iter().map(|source| match &declared_dir {
            Some(dir) => dir.join(source),
            None => PathBuf::from(source),
        }));

        let mut include_dirs = settings.include_dirs.clone();
        if let Some(dir) = declared_dir {
            if !include_dirs.contains(&dir) {
                include_dirs.push(dir);
            }
        }

        let mut libraries = settings.libraries.clone();
        for library in &module.extra_libraries {
            if !libraries.contains(library) {
                libraries.push(library.clone());
            }
        }

        BuildUnit {
            name: module.extension_name(&settings.package),
            sources,
            include_dirs,
            libraries,
            link_args: settings.link_args.clone(),
            compile_args: module.extra_compile_args.clone(),
            namespaces: module.cpp_namespaces.clone(),
            compiler: settings.compiler.clone(),
        }
    }
}

// ============================================================================
// STALENESS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// Generated source is newer than every input
    Fresh,
    /// Nothing generated yet
    Missing,
    /// An input changed after the last generation
    Outdated(PathBuf),
    /// A declared header was not found; regenerate to be safe
    UnresolvedHeader(String),
    /// Declaration file is unknown (built in memory)
    NoDeclaration,
}

impl Staleness {
    pub fn needs_regeneration(&self) -> bool {
        *self != Staleness::Fresh
    }
}

/// Locate a header relative to the declaration, then the include directories
pub fn find_header(module: &PluginModule, header: &str, include_dirs: &[PathBuf]) -> Option<PathBuf> {
    module
        .source_dir()
        .into_iter()
        .chain(include_dirs.iter().map(PathBuf::as_path))
        .map(|dir| dir.join(header))
        .find(|candidate| candidate.is_file())
}

fn modified(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Decide whether a module's generated source must be rewritten
pub fn staleness(module: &PluginModule, generated: &Path, settings: &BuildSettings) -> Staleness {
    let Some(declaration) = module.source.as_deref() else {
        return Staleness::NoDeclaration;
    };
    let Some(output_time) = modified(generated) else {
        return Staleness::Missing;
    };

    let mut inputs = vec![declaration.to_path_buf()];
    // A config that does not exist yet means built-in defaults
    if let Some(config) = settings.config_file.as_ref().filter(|c| c.is_file()) {
        inputs.push(config.clone());
    }
    for header in &module.cpp_headers {
        match find_header(module, header, &settings.include_dirs) {
            Some(path) => inputs.push(path),
            None => {
                debug!(module = %module.name, header = %header, "Header not found, regenerating");
                return Staleness::UnresolvedHeader(header.clone());
            }
        }
    }

    for input in inputs {
        match modified(&input) {
            Some(time) if time < output_time => {}
            _ => return Staleness::Outdated(input),
        }
    }
    Staleness::Fresh
}

#[cfg(test)]
mod tests {
    use crate::build::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, time: SystemTime) {
        let Ok(file) = File::options().create(true).append(true).open(path) else {
            panic!("failed to create {}", path.display());
        };
        let Ok(()) = file.set_modified(time) else {
            panic!("failed to set mtime on {}", path.display());
        };
    }

    fn module_in(dir: &Path) -> PluginModule {
        let mut module = PluginModule::new("threshold");
        module.source = Some(dir.join("threshold.toml"));
        module.cpp_headers = vec!["threshold.hpp".to_string()];
        module.cpp_sources = vec!["threshold_impl.cpp".to_string()];
        module.extra_libraries = vec!["m".to_string()];
        module.cpp_namespaces = vec!["Gamera".to_string()];
        module
    }

    #[test]
    fn test_build_unit_collects_sources_and_flags() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let module = module_in(dir.path());
        let settings = BuildSettings {
            package: "gamera.plugins".to_string(),
            include_dirs: vec![PathBuf::from("include")],
            libraries: vec!["stdc++".to_string(), "m".to_string()],
            ..BuildSettings::default()
        };
        let generated = dir.path().join("_threshold.cpp");
        let unit = BuildUnit::new(&module, &generated, &settings);
        assert_eq!(unit.name, "gamera.plugins._threshold");
        assert_eq!(
            unit.sources,
            vec![generated.clone(), dir.path().join("threshold_impl.cpp")]
        );
        assert_eq!(
            unit.include_dirs,
            vec![PathBuf::from("include"), dir.path().to_path_buf()]
        );
        assert_eq!(unit.libraries, vec!["stdc++".to_string(), "m".to_string()]);
        assert_eq!(unit.namespaces, vec!["Gamera".to_string()]);

        let Ok(json) = serde_json::to_value(&unit) else {
            panic!("unit should serialize");
        };
        assert_eq!(json["name"], "gamera.plugins._threshold");
        assert!(json.get("compiler").is_none());
    }

    #[test]
    fn test_fresh_output_is_skipped() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let module = module_in(dir.path());
        let old = SystemTime::now() - Duration::from_secs(3600);
        touch(&dir.path().join("threshold.toml"), old);
        touch(&dir.path().join("threshold.hpp"), old);
        let generated = dir.path().join("_threshold.cpp");
        touch(&generated, SystemTime::now());

        let settings = BuildSettings::default();
        assert_eq!(staleness(&module, &generated, &settings), Staleness::Fresh);
        assert!(!staleness(&module, &generated, &settings).needs_regeneration());
    }

    #[test]
    fn test_newer_header_forces_regeneration() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let include = dir.path().join("include");
        let Ok(()) = fs::create_dir(&include) else {
            panic!("failed to prepare test files");
        };
        let mut module = module_in(dir.path());
        module.source = Some(dir.path().join("plugins").join("threshold.toml"));
        let Ok(()) = fs::create_dir(dir.path().join("plugins")) else {
            panic!("failed to prepare test files");
        };
        let now = SystemTime::now();
        let hour = Duration::from_secs(3600);
        touch(&dir.path().join("plugins").join("threshold.toml"), now - hour * 2);
        touch(&include.join("threshold.hpp"), now);
        let generated = dir.path().join("_threshold.cpp");
        touch(&generated, now - hour);

        assert_eq!(
            staleness(
                &module,
                &generated,
                &BuildSettings {
                    include_dirs: vec![include.clone()],
                    ..BuildSettings::default()
                }
            ),
            Staleness::Outdated(include.join("threshold.hpp"))
        );
    }

    #[test]
    fn test_missing_header_and_output_regenerate() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let module = module_in(dir.path());
        let generated = dir.path().join("_threshold.cpp");
        assert_eq!(
            staleness(&module, &generated, &BuildSettings::default()),
            Staleness::Missing
        );

        touch(&dir.path().join("threshold.toml"), SystemTime::now() - Duration::from_secs(60));
        touch(&generated, SystemTime::now());
        assert_eq!(
            staleness(&module, &generated, &BuildSettings::default()),
            Staleness::UnresolvedHeader("threshold.hpp".to_string())
        );
    }

    #[test]
    fn test_newer_config_forces_regeneration() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let module = module_in(dir.path());
        let now = SystemTime::now();
        let hour = Duration::from_secs(3600);
        touch(&dir.path().join("threshold.toml"), now - hour * 2);
        touch(&dir.path().join("threshold.hpp"), now - hour * 2);
        let generated = dir.path().join("_threshold.cpp");
        touch(&generated, now - hour);

        let config = dir.path().join("pixgen.toml");
        let settings = BuildSettings {
            config_file: Some(config.clone()),
            ..BuildSettings::default()
        };
        // Not written yet: defaults apply and nothing is outdated
        assert_eq!(staleness(&module, &generated, &settings), Staleness::Fresh);

        touch(&config, now);
        assert_eq!(
            staleness(&module, &generated, &settings),
            Staleness::Outdated(config)
        );
    }
}
