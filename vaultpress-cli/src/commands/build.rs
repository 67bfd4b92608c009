//! Build command implementation.

use super::load_context;
use crate::commands::redirects::write_json;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use vaultpress_core::redirects::render_nginx_map;
use vaultpress_core::{Page, SiteBuilder};

/// Build the site and write every artifact under the output directory
pub fn build_site(config_path: &Path) -> Result<()> {
    let context = load_context(config_path)?;
    tracing::info!("Building site: {}", context.config.site.title);

    let build = SiteBuilder::new(&context)
        .build()
        .context("Failed to build site")?;

    let output_dir = context.config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    for page in &build.index.pages {
        write_page(&output_dir, page)?;
    }

    write_json(&output_dir.join("aliases.json"), &build.aliases)?;
    write_json(&output_dir.join("redirects.json"), &build.redirects)?;
    write_json(&output_dir.join("orphaned-redirects.json"), &build.orphaned)?;
    write_json(&output_dir.join("static-paths.json"), &build.static_paths)?;
    write_json(&output_dir.join("diagnostics.json"), &build.index.diagnostics)?;
    fs::write(
        output_dir.join("nginx_redirect_map.conf"),
        render_nginx_map(&build.redirects),
    )
    .context("Failed to write nginx redirect map")?;

    tracing::info!(
        "Wrote {} pages to {} ({} errors)",
        build.index.pages.len(),
        output_dir.display(),
        build.index.errors()
    );
    Ok(())
}

/// `content/<route>.json`; the root route is written as `content/index.json`
fn page_output_path(output_dir: &Path, page: &Page) -> PathBuf {
    let content_dir = output_dir.join("content");
    match page.route.file_name() {
        Some(name) => page
            .route
            .parent()
            .segments()
            .fold(content_dir, |acc, segment| acc.join(segment))
            .join(format!("{name}.json")),
        None => content_dir.join("index.json"),
    }
}

fn write_page(output_dir: &Path, page: &Page) -> Result<()> {
    let path = page_output_path(output_dir, page);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_json(&path, page)
}
