//! Redirect table output.

use super::load_context;
use crate::RedirectFormat;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use vaultpress_core::redirects::render_nginx_map;
use vaultpress_core::SiteBuilder;

/// Print servable redirects (reversed aliases, manifest redirects with a
/// live target and frontmatter `redirect` aliases), or the orphaned ones.
///
/// Documents are rendered so the table matches what `build` writes.
pub fn print_redirects(config_path: &Path, orphaned: bool, format: RedirectFormat) -> Result<()> {
    let context = load_context(config_path)?;
    let site = SiteBuilder::new(&context).build()?;
    let table = if orphaned { site.orphaned } else { site.redirects };

    match format {
        RedirectFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        RedirectFormat::Nginx => print!("{}", render_nginx_map(&table)),
    }
    Ok(())
}

/// Pretty-printed JSON file
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
