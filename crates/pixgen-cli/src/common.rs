//! Common types and utilities shared across commands

use anyhow::{Context, Result};
use clap::Parser;
use pixgen_ast::{discover, Discovery};
use pixgen_config::Config;
use pixgen_schema::{NameAllocator, PluginRegistry};
use std::path::Path;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn load_config() -> Result<Config> {
    let path = Config::path();
    pixgen_logger::debug(&format!("Reading config from: {}", path.display()));
    Config::load_from(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Discover declarations and report every unreadable file
pub fn discover_reported(plugin_dir: &Path) -> Result<Discovery> {
    if !plugin_dir.exists() {
        anyhow::bail!("Plugin directory {} does not exist", plugin_dir.display());
    }
    let discovery = discover(plugin_dir);
    for error in &discovery.errors {
        pixgen_logger::error(&error.to_string());
    }
    Ok(discovery)
}

/// Validate discovered modules into a registry, reporting invalid ones
pub fn build_registry(discovery: &Discovery) -> (PluginRegistry, usize) {
    let mut names = NameAllocator::new();
    let (registry, errors) = PluginRegistry::from_declarations(&discovery.modules, &mut names);
    for error in &errors {
        pixgen_logger::error(&error.to_string());
    }
    (registry, errors.len() + discovery.errors.len())
}
