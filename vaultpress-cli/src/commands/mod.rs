//! CLI command implementations.

pub mod audit;
pub mod build;
pub mod paths;
pub mod redirects;
pub mod render;

pub use audit::audit_site;
pub use build::build_site;
pub use paths::print_paths;
pub use redirects::print_redirects;
pub use render::render_document;

use anyhow::{Context, Result};
use std::path::Path;
use vaultpress_core::{BuildContext, Config};

/// Load the configuration and build the shared context
pub(crate) fn load_context(config_path: &Path) -> Result<BuildContext> {
    tracing::debug!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    BuildContext::load(config).context("Failed to read content directory")
}
