use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use pixgen_schema::{flatten_by_category, CategoryTree};
use std::path::PathBuf;

use crate::common::{build_registry, discover_reported, GlobalOpts};

#[derive(Args, Debug, Clone)]
pub struct ListCommand {
    /// Directory (or single file) holding plugin declarations
    pub plugin_dir: PathBuf,
    /// Only list functions at or below this category path (e.g. `Filter/Color`)
    #[arg(short, long, value_name = "PATH")]
    pub category: Option<String>,
}

pub fn handle_list(cmd: ListCommand, opts: &GlobalOpts) -> Result<()> {
    let discovery = discover_reported(&cmd.plugin_dir)?;
    let (registry, failures) = build_registry(&discovery);

    let tree = registry.category_tree();
    match &cmd.category {
        Some(path) => print_category(&tree, path),
        None => print_modules(&registry, opts),
    }

    if failures > 0 {
        bail!("{} declaration(s) are invalid", failures);
    }
    Ok(())
}

fn print_modules(registry: &pixgen_schema::PluginRegistry, opts: &GlobalOpts) {
    if registry.is_empty() {
        println!("{}", "No plugin modules found.".yellow());
        return;
    }
    for module in registry.modules() {
        let marker = if module.pure { " (pure)" } else { "" };
        println!("{}{}", module.name.bold().green(), marker.dimmed());
        for function in &module.functions {
            let category = function.category().unwrap_or(pixgen_schema::UNCATEGORIZED);
            println!("  {} {}", function.name().cyan(), format!("[{}]", category).dimmed());
            if opts.verbosity_level() > 0 {
                for param in function.params() {
                    println!("    {}", param.describe(true));
                }
            }
        }
    }
}

fn print_category(tree: &CategoryTree<'_>, path: &str) {
    let functions = flatten_by_category(tree, path);
    if functions.is_empty() {
        println!("{}", format!("No functions under category '{}'.", path).yellow());
        return;
    }
    for entry in functions {
        println!(
            "{} {}",
            entry.function.name().cyan(),
            format!("({})", entry.module.name).dimmed()
        );
    }
}
