//! Read-only state shared by every document render in one build.

use crate::alias::AliasGraph;
use crate::config::Config;
use crate::manifest::{read_manifest_or_empty, PathManifest};
use crate::markdown::RenderOptions;
use crate::models::Diagnostic;
use crate::redirects::{static_paths, RedirectFilter, RedirectMap};
use crate::tree::{ContentTree, WalkError};
use std::collections::BTreeMap;
use vaultpress_types::ContentPath;

/// Config, walker, alias graph and document list, built once before any
/// document is rendered and then only borrowed.
#[derive(Debug)]
pub struct BuildContext {
    pub config: Config,
    pub tree: ContentTree,
    pub aliases: AliasGraph,
    /// Routable document paths, sorted, excluded prefixes removed
    pub documents: Vec<ContentPath>,
    pub redirect_manifest: PathManifest,
    /// Problems found while loading manifests and expanding aliases
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildContext {
    pub fn load(config: Config) -> Result<Self, WalkError> {
        let tree = ContentTree::new(config.content_dir());
        let documents: Vec<ContentPath> = tree
            .document_paths()?
            .into_iter()
            .filter(|path| !config.is_excluded(path))
            .collect();

        let mut diagnostics = Vec::new();
        let (alias_manifest, problem) = read_manifest_or_empty(&config.alias_manifest_path());
        diagnostics.extend(problem);
        let (redirect_manifest, problem) = read_manifest_or_empty(&config.redirect_manifest_path());
        diagnostics.extend(problem);

        let (aliases, alias_diagnostics) =
            AliasGraph::build(&alias_manifest, &tree, &config.reserved_aliases);
        diagnostics.extend(alias_diagnostics);

        tracing::info!(
            "Loaded {} documents, {} aliases, {} redirects",
            documents.len(),
            aliases.len(),
            redirect_manifest.len()
        );

        Ok(Self {
            config,
            tree,
            aliases,
            documents,
            redirect_manifest,
            diagnostics,
        })
    }

    pub fn render_options(&self) -> RenderOptions<'_> {
        RenderOptions {
            aliases: &self.aliases,
            asset_prefix: &self.config.asset_prefix,
        }
    }

    pub fn redirect_filter(&self) -> RedirectFilter<'_> {
        RedirectFilter::new(&self.aliases, self.documents.iter().cloned())
    }

    /// Redirects whose target resolves to nothing
    pub fn orphaned_redirects(&self) -> RedirectMap {
        self.redirect_filter().orphaned(&self.redirect_manifest)
    }

    pub fn static_paths(&self) -> BTreeMap<ContentPath, ContentPath> {
        static_paths(&self.documents, &self.orphaned_redirects(), &self.aliases)
    }
}
