use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use pixgen_config::{Config, POINTER_FILE_NAME};
use pixgen_logger as logger;
use std::path::{Path, PathBuf};

use crate::common::{load_config, GlobalOpts};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured value
    Show,
    /// Set a value; list keys take a comma separated value
    Set {
        key: String,
        /// May start with `-`, as linker arguments do
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Print one value
    Get { key: String },
    /// Get or set the path to the config file.
    /// If `new_path` is provided, the CLI will set the config path to that value.
    /// If omitted, the CLI will print the current configuration file path.
    Path {
        /// Optional new config path to set
        new_path: Option<String>,
    },
}

fn pointer_path() -> PathBuf {
    Config::default_path()
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(POINTER_FILE_NAME)
}

pub fn handle_config(action: ConfigAction, opts: &GlobalOpts) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config()?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
                for (pixel_type, variants) in &config.variants {
                    println!(
                        "  {}: {}",
                        format!("variants.{}", pixel_type).cyan(),
                        variants.join(",")
                    );
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config()?;
            config.set(&key, value.clone())?;
            config.save().context("Failed to save config")?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Get { key } => {
            let config = load_config()?;
            if let Some(value) = config.get(&key) {
                println!("{}", value);
            } else if pixgen_config::KNOWN_KEYS.contains(&key.as_str()) {
                logger::debug(&format!("{} is not set", key));
            } else {
                anyhow::bail!(pixgen_config::ConfigError::UnknownKey(key));
            }
        }
        ConfigAction::Path { new_path } => {
            let config_path = Config::path();
            logger::debug(&format!("Reading config from: {}", config_path.display()));
            let pointer = pointer_path();

            match new_path {
                Some(p) => {
                    if let Some(parent) = pointer.parent() {
                        std::fs::create_dir_all(parent).context("Failed to set config path")?;
                    }
                    std::fs::write(&pointer, p.as_bytes()).context("Failed to set config path")?;
                    logger::success(&format!("Config path set to {}", p));
                }
                None => {
                    println!("{}", config_path.display());
                    if let Ok(contents) = std::fs::read_to_string(&pointer) {
                        let trimmed = contents.trim();
                        if !trimmed.is_empty() {
                            println!("{} {}", "overridden-by".cyan(), trimmed);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
