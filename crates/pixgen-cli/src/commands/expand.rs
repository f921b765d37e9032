use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pixgen_codegen::VariantTable;

use crate::common::{load_config, GlobalOpts};

#[derive(Args, Debug, Clone)]
pub struct ExpandCommand {
    /// Pixel type tags, e.g. `OneBit RGB` or `All`
    #[arg(required = true)]
    pub tags: Vec<String>,
    /// Print the variants as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_expand(cmd: ExpandCommand, _opts: &GlobalOpts) -> Result<()> {
    let config = load_config()?;
    let table = VariantTable::with_overrides(&config.variants)
        .context("Invalid pixel variant table in config")?;
    let variants = table.expand_tags(&cmd.tags)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&variants)?);
        return Ok(());
    }
    for variant in &variants {
        println!(
            "{} {} {}",
            variant.name.cyan(),
            variant.label.dimmed(),
            format!("({})", variant.pixel_type).dimmed()
        );
    }
    Ok(())
}
