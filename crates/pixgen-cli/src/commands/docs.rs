use anyhow::{bail, Context, Result};
use clap::Args;
use pixgen_codegen::docs::{category_docs, category_subset_doc, table_of_contents, DocFile};
use pixgen_logger as logger;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{build_registry, discover_reported, GlobalOpts};

#[derive(Args, Debug, Clone)]
pub struct DocsCommand {
    /// Directory (or single file) holding plugin declarations
    pub plugin_dir: PathBuf,
    /// Directory the reStructuredText files are written to
    #[arg(short, long, default_value = "doc")]
    pub output: PathBuf,
    /// Only document functions at or below this category path
    #[arg(short, long, value_name = "PATH")]
    pub category: Option<String>,
}

pub fn handle_docs(cmd: DocsCommand, _opts: &GlobalOpts) -> Result<()> {
    let discovery = discover_reported(&cmd.plugin_dir)?;
    let (registry, failures) = build_registry(&discovery);
    let tree = registry.category_tree();

    let files = match &cmd.category {
        Some(path) => match category_subset_doc(&tree, path) {
            Some(file) => vec![file],
            None => bail!("No functions under category '{}'", path),
        },
        None => {
            let mut files = category_docs(&tree);
            files.push(table_of_contents(&tree));
            files
        }
    };

    fs::create_dir_all(&cmd.output)
        .with_context(|| format!("Failed to create {}", cmd.output.display()))?;
    for file in &files {
        let path = write_doc(&cmd.output, file)?;
        logger::success(&format!("Wrote {}", path.display()));
    }

    if failures > 0 {
        bail!("{} declaration(s) are invalid and were left out", failures);
    }
    Ok(())
}

fn write_doc(dir: &Path, file: &DocFile) -> Result<PathBuf> {
    let path = dir.join(&file.file_name);
    fs::write(&path, &file.contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
