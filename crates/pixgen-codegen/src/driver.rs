//! Generation runs
//!
//! A [`Generator`] owns everything that must not outlive one run: the
//! synthetic name counter, the variant table and the backend. Modules are
//! rendered in parallel from immutable inputs and written in name order.

use pixgen_schema::{DeclaredModule, NameAllocator, PluginModule, PluginRegistry};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::build::{staleness, BuildSettings, BuildUnit};
use crate::errors::{GenerateError, TemplateError};
use crate::expand::VariantTable;
use crate::lower::lower_module;

#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Directory for generated sources; next to each declaration when unset
    pub output_dir: Option<PathBuf>,
    /// Regenerate even when the output is fresh
    pub force: bool,
    /// Only these modules; every module when empty
    pub modules: Vec<String>,
    pub build: BuildSettings,
}

/// One module that could not be generated
#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: GenerateError,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Written source files, in module name order
    pub generated: Vec<PathBuf>,
    pub skipped_fresh: Vec<String>,
    pub skipped_pure: Vec<String>,
    pub failed: Vec<ModuleFailure>,
    /// One per native module, fresh or regenerated
    pub build_units: Vec<BuildUnit>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn build_units_json(&self) -> Result<String, GenerateError> {
        Ok(serde_json::to_string_pretty(&self.build_units)?)
    }

    pub fn write_build_units(&self, path: &Path) -> Result<(), GenerateError> {
        let json = self.build_units_json()?;
        fs::write(path, json + "\n").map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Render one validated module without touching the filesystem
pub fn render_module<B: Backend + ?Sized>(
    module: &PluginModule,
    table: &VariantTable,
    backend: &B,
) -> Result<String, TemplateError> {
    let wrapper = lower_module(module, table)?;
    Ok(backend.render(&wrapper))
}

pub struct Generator<B: Backend> {
    backend: B,
    table: VariantTable,
    options: GeneratorOptions,
    names: NameAllocator,
}

impl<B: Backend> Generator<B> {
    pub fn new(backend: B, table: VariantTable, options: GeneratorOptions) -> Self {
        Generator {
            backend,
            table,
            options,
            names: NameAllocator::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn selected(&self, name: &str) -> bool {
        self.options.modules.is_empty() || self.options.modules.iter().any(|m| m == name)
    }

    fn output_path(&self, module: &PluginModule) -> PathBuf {
        let dir = match (&self.options.output_dir, module.source_dir()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => dir.to_path_buf(),
            (None, None) => PathBuf::from("."),
        };
        dir.join(format!(
            "{}.{}",
            module.native_name(),
            self.backend.file_extension()
        ))
    }

    /// Validate, render and write every selected module
    pub fn run(&mut self, declarations: &[DeclaredModule]) -> GenerationReport {
        self.names.reset();
        let mut report = GenerationReport::default();

        let (registry, errors) = PluginRegistry::from_declarations(declarations, &mut self.names);
        for error in errors {
            let module = error.module_name().unwrap_or("<unknown>").to_string();
            if self.selected(&module) {
                report.failed.push(ModuleFailure {
                    module,
                    error: GenerateError::Declaration(error),
                });
            }
        }

        let mut pending = Vec::new();
        for module in registry.modules().iter().filter(|m| self.selected(&m.name)) {
            if !module.needs_generation() {
                debug!(module = %module.name, "Pure module, nothing to generate");
                report.skipped_pure.push(module.name.to_string());
                continue;
            }
            let output = self.output_path(module);
            report
                .build_units
                .push(BuildUnit::new(module, &output, &self.options.build));

            let state = staleness(module, &output, &self.options.build);
            if !self.options.force && !state.needs_regeneration() {
                debug!(module = %module.name, "Generated source is up to date");
                report.skipped_fresh.push(module.name.to_string());
                continue;
            }
            pending.push((module, output));
        }

        let table = &self.table;
        let backend = &self.backend;
        let rendered: Vec<_> = pending
            .par_iter()
            .map(|(module, _)| render_module(module, table, backend))
            .collect();

        for ((module, output), result) in pending.into_iter().zip(rendered) {
            let source = match result {
                Ok(source) => source,
                Err(source) => {
                    warn!(module = %module.name, "{}", source);
                    report.failed.push(ModuleFailure {
                        module: module.name.to_string(),
                        error: GenerateError::Template {
                            module: module.name.to_string(),
                            source,
                        },
                    });
                    continue;
                }
            };
            match write_source(&output, &source) {
                Ok(()) => {
                    info!(module = %module.name, path = %output.display(), "Generated wrapper");
                    report.generated.push(output);
                }
                Err(error) => report.failed.push(ModuleFailure {
                    module: module.name.to_string(),
                    error,
                }),
            }
        }

        report.failed.sort_by(|a, b| a.module.cmp(&b.module));
        report
    }
}

fn write_source(path: &Path, source: &str) -> Result<(), GenerateError> {
    let io = |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, source).map_err(io)
}

#[cfg(test)]
mod tests {
    use crate::backend::CpythonBackend;
    use crate::driver::*;
    use pixgen_schema::{ArgSpec, ArgValue, FunctionSpec, ModuleSpec};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn image_spec(tags: &[&str]) -> ArgSpec {
        ArgSpec {
            pixel_types: Some(tags.iter().map(|t| (*t).to_string()).collect()),
            ..ArgSpec::new("ImageType")
        }
    }

    fn threshold_spec() -> ModuleSpec {
        let level = ArgSpec {
            name: Some("threshold".to_string()),
            range: Some(vec![ArgValue::Int(0), ArgValue::Int(255)]),
            default: Some(ArgValue::Int(128)),
            ..ArgSpec::new("Int")
        };
        ModuleSpec {
            name: "threshold".to_string(),
            category: Some("Binarization".to_string()),
            cpp_headers: vec!["threshold.hpp".to_string()],
            functions: vec![FunctionSpec {
                name: "threshold".to_string(),
                self_type: Some(image_spec(&["GreyScale", "Float"])),
                args: vec![level],
                return_type: Some(image_spec(&["OneBit"])),
                ..FunctionSpec::default()
            }],
            ..ModuleSpec::default()
        }
    }

    fn broken_spec() -> ModuleSpec {
        ModuleSpec {
            name: "broken".to_string(),
            functions: vec![FunctionSpec {
                name: "make_image".to_string(),
                args: vec![ArgSpec {
                    name: Some("width".to_string()),
                    ..ArgSpec::new("Int")
                }],
                return_type: Some(image_spec(&["OneBit"])),
                ..FunctionSpec::default()
            }],
            ..ModuleSpec::default()
        }
    }

    fn declared(spec: ModuleSpec, dir: &Path) -> DeclaredModule {
        let path = dir.join(format!("{}.toml", spec.name));
        let Ok(()) = fs::write(&path, "") else {
            panic!("failed to write declaration");
        };
        DeclaredModule {
            spec,
            path: Some(path),
        }
    }

    fn generator(out: &Path, force: bool) -> Generator<CpythonBackend> {
        Generator::new(
            CpythonBackend::default(),
            VariantTable::standard(),
            GeneratorOptions {
                output_dir: Some(out.to_path_buf()),
                force,
                build: BuildSettings {
                    package: "gamera.plugins".to_string(),
                    ..BuildSettings::default()
                },
                ..GeneratorOptions::default()
            },
        )
    }

    #[test]
    fn test_generated_source_shape() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let mut generator = generator(&dir.path().join("out"), true);
        let report = generator.run(&[declared(threshold_spec(), dir.path())]);
        assert!(report.is_success(), "{:?}", report.failed);
        assert_eq!(report.generated, vec![dir.path().join("out").join("_threshold.cpp")]);

        let Ok(source) = fs::read_to_string(&report.generated[0]) else {
            panic!("generated file should exist");
        };
        assert!(source.contains("#include \"threshold.hpp\""));
        assert!(source.contains("static PyObject* call_threshold(PyObject* self, PyObject* args) {"));
        assert!(source.contains("if (PyArg_ParseTuple(args, \"Oi:threshold\", &self_pyarg, &threshold_arg) <= 0)"));
        assert!(source.contains("switch(get_image_combination(self_pyarg)) {"));
        assert!(source.contains("case GREYSCALEIMAGEVIEW:"));
        assert!(source.contains("return_arg = threshold(*((FloatImageView*)self_arg), threshold_arg);"));
        assert!(source.contains("Acceptable values are GREYSCALE, and FLOAT."));
        assert!(source.contains("} catch (std::exception& e) {"));
        assert!(source.contains("{ \"threshold\", call_threshold, METH_VARARGS, NULL },"));
        assert!(source.contains("PyMODINIT_FUNC PyInit__threshold(void) {"));
        assert!(source.contains("image_type = (PyTypeObject*)PyObject_GetAttrString(core, \"Image\");"));
    }

    #[test]
    fn test_two_runs_are_byte_identical() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let mut spec = threshold_spec();
        // Unnamed arguments draw from the run's name counter
        spec.functions[0].args.push(ArgSpec::new("Real"));
        let declarations = [declared(spec, dir.path())];

        let mut first = generator(&dir.path().join("a"), true);
        let mut second = generator(&dir.path().join("b"), true);
        first.run(&declarations);
        first.run(&declarations);
        second.run(&declarations);

        let (Ok(a), Ok(b)) = (
            fs::read(dir.path().join("a").join("_threshold.cpp")),
            fs::read(dir.path().join("b").join("_threshold.cpp")),
        ) else {
            panic!("both runs should write output");
        };
        assert_eq!(a, b);
        assert!(String::from_utf8_lossy(&a).contains("_00000000_arg"));
    }

    #[test]
    fn test_template_error_writes_nothing_and_is_isolated() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let out = dir.path().join("out");
        let mut generator = generator(&out, true);
        let report = generator.run(&[
            declared(broken_spec(), dir.path()),
            declared(threshold_spec(), dir.path()),
        ]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].module, "broken");
        assert!(matches!(
            report.failed[0].error,
            GenerateError::Template {
                source: TemplateError::ImageReturnWithoutInput { .. },
                ..
            }
        ));
        assert!(!out.join("_broken.cpp").exists());
        assert!(out.join("_threshold.cpp").exists());
    }

    #[test]
    fn test_header_mtime_drives_regeneration() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let out = dir.path().join("out");
        let declarations = [declared(threshold_spec(), dir.path())];
        let header = dir.path().join("threshold.hpp");
        let Ok(()) = fs::write(&header, "") else {
            panic!("failed to prepare test files");
        };

        let mut generator = generator(&out, false);
        let first = generator.run(&declarations);
        assert_eq!(first.generated.len(), 1);

        let set_mtime = |path: &Path, time: SystemTime| {
            let Ok(file) = fs::File::options().append(true).open(path) else {
                panic!("failed to open {}", path.display());
            };
            let Ok(()) = file.set_modified(time) else {
                panic!("failed to set mtime");
            };
        };
        let now = SystemTime::now();
        let generated = out.join("_threshold.cpp");
        set_mtime(&dir.path().join("threshold.toml"), now - Duration::from_secs(7200));
        set_mtime(&header, now - Duration::from_secs(7200));
        set_mtime(&generated, now - Duration::from_secs(3600));

        let fresh = generator.run(&declarations);
        assert!(fresh.generated.is_empty());
        assert_eq!(fresh.skipped_fresh, vec!["threshold".to_string()]);
        assert_eq!(fresh.build_units.len(), 1);

        set_mtime(&header, now);
        let stale = generator.run(&declarations);
        assert_eq!(stale.generated, vec![generated]);
    }

    #[test]
    fn test_pure_modules_and_filters() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let pure = ModuleSpec {
            name: "helpers".to_string(),
            pure_python: true,
            ..threshold_spec()
        };
        let options = GeneratorOptions {
            output_dir: Some(dir.path().join("out")),
            force: true,
            modules: vec!["helpers".to_string()],
            ..GeneratorOptions::default()
        };
        let mut generator = Generator::new(CpythonBackend::default(), VariantTable::standard(), options);
        let report = generator.run(&[
            declared(pure, dir.path()),
            declared(threshold_spec(), dir.path()),
            declared(broken_spec(), dir.path()),
        ]);
        assert_eq!(report.skipped_pure, vec!["helpers".to_string()]);
        assert!(report.generated.is_empty());
        assert!(report.failed.is_empty());
        assert!(report.build_units.is_empty());
    }

    #[test]
    fn test_build_units_serialize() {
        let Ok(dir) = TempDir::new() else {
            panic!("failed to create temp dir");
        };
        let mut generator = generator(&dir.path().join("out"), true);
        let report = generator.run(&[declared(threshold_spec(), dir.path())]);
        let json_path = dir.path().join("units.json");
        let Ok(()) = report.write_build_units(&json_path) else {
            panic!("units should serialize");
        };
        let Ok(text) = fs::read_to_string(&json_path) else {
            panic!("units file should exist");
        };
        assert!(text.contains("\"name\": \"gamera.plugins._threshold\""));
    }
}
