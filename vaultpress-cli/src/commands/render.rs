//! Single-document rendering.

use super::load_context;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use vaultpress_core::{Document, MarkdownProcessor};
use vaultpress_types::ContentPath;

/// Render one source file (relative to the content directory) and print the
/// result as JSON
pub fn render_document(config_path: &Path, path: &str) -> Result<()> {
    let context = load_context(config_path)?;
    let source_path = ContentPath::new(path);
    let fs_path = context.tree.fs_path(&source_path);
    if !fs_path.is_file() {
        return Err(anyhow!("No such document: {}", fs_path.display()));
    }

    let content = std::fs::read_to_string(&fs_path)
        .with_context(|| format!("Failed to read {}", fs_path.display()))?;
    let document = Document::parse(&content)
        .with_context(|| format!("Malformed frontmatter in {}", fs_path.display()))?;
    let rendered = MarkdownProcessor::new()
        .render(&document, &source_path, &context.render_options())
        .with_context(|| format!("Failed to render {}", source_path))?;

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
