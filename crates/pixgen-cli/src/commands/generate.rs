use anyhow::{bail, Context, Result};
use clap::Args;
use pixgen_codegen::{BuildSettings, CpythonBackend, Generator, GeneratorOptions, VariantTable};
use pixgen_config::{resolve_compiler, Config};
use pixgen_logger as logger;
use std::path::PathBuf;

use crate::common::{discover_reported, load_config, GlobalOpts};

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Directory (or single file) holding plugin declarations
    pub plugin_dir: PathBuf,
    /// Directory for generated sources (default: next to each declaration)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Regenerate even when the generated source is up to date
    #[arg(short, long)]
    pub force: bool,
    /// Only generate these modules
    #[arg(short, long = "module", value_name = "NAME")]
    pub modules: Vec<String>,
    /// Write build descriptors for the generated extensions as JSON
    #[arg(long, value_name = "FILE")]
    pub build_json: Option<PathBuf>,
}

pub fn handle_generate(cmd: GenerateCommand, _opts: &GlobalOpts) -> Result<()> {
    let config_path = Config::path();
    let config = load_config()?;
    let table = VariantTable::with_overrides(&config.variants)
        .context("Invalid pixel variant table in config")?;

    let settings = BuildSettings {
        package: config.package_name(),
        include_dirs: config.include_dirs(),
        libraries: config.libraries(),
        link_args: config.link_args.clone(),
        compiler: resolve_compiler(config.compiler.as_deref()),
        config_file: Some(config_path),
    };
    if settings.compiler.is_none() {
        logger::warn("No C++ compiler found; build descriptors will not name one");
    }

    let discovery = discover_reported(&cmd.plugin_dir)?;
    logger::debug(&format!(
        "Found {} module declaration(s) under {}",
        discovery.modules.len(),
        cmd.plugin_dir.display()
    ));

    let options = GeneratorOptions {
        output_dir: cmd
            .output
            .or_else(|| config.output_dir.as_ref().map(PathBuf::from)),
        force: cmd.force,
        modules: cmd.modules,
        build: settings,
    };
    let mut generator = Generator::new(CpythonBackend::default(), table, options);

    logger::spinner_start("Generating wrappers");
    let report = generator.run(&discovery.modules);
    logger::spinner_stop();

    for path in &report.generated {
        logger::success(&format!("Generated {}", path.display()));
    }
    for module in &report.skipped_fresh {
        logger::info(&format!("{} is up to date", module));
    }
    for module in &report.skipped_pure {
        logger::info(&format!("{} is pure Python, nothing to generate", module));
    }
    for failure in &report.failed {
        logger::set_current_module(Some(failure.module.clone()));
        logger::error(&format!("{}: {}", failure.module, failure.error));
    }
    logger::set_current_module(None);

    if let Some(path) = &cmd.build_json {
        report
            .write_build_units(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        logger::success(&format!("Wrote build descriptors to {}", path.display()));
    }

    let failures = report.failed.len() + discovery.errors.len();
    if failures > 0 {
        bail!("{} declaration(s) failed to generate", failures);
    }
    logger::step(&format!(
        "generated={} fresh={} pure={}",
        report.generated.len(),
        report.skipped_fresh.len(),
        report.skipped_pure.len()
    ));
    Ok(())
}
