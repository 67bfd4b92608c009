//! Site building logic: discovery, parallel rendering and redirect tables.

use crate::{
    context::BuildContext,
    markdown::{MarkdownProcessor, RenderError},
    models::*,
    paths::{is_directory_index, is_markdown_file, markdown_stem, route_for_source, INDEX_STEMS},
    redirects::{frontmatter_redirects, redirect_map, RedirectMap},
    tree::WalkError,
};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vaultpress_types::ContentPath;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content walk failed: {0}")]
    Walk(#[from] WalkError),
}

/// Why one document was left out of the build
#[derive(Error, Debug)]
enum DocumentError {
    #[error("Failed to read {}: {}", .0.display(), .1)]
    Unreadable(PathBuf, #[source] std::io::Error),

    #[error("Malformed frontmatter in {}: {}", .0.display(), .1)]
    Frontmatter(PathBuf, #[source] crate::frontmatter::FrontmatterError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DocumentError {
    fn code(&self) -> &'static str {
        match self {
            DocumentError::Unreadable(..) => "document.unreadable",
            DocumentError::Frontmatter(..) => "document.frontmatter",
            DocumentError::Render(RenderError::ShadowedDocument { .. }) => "document.shadowed",
        }
    }
}

/// A markdown source found on disk
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the content root, extension included
    pub source_path: ContentPath,
    pub route: ContentPath,
    pub fs_path: PathBuf,
}

/// Everything one build produces
#[derive(Debug, Clone, Default)]
pub struct SiteBuild {
    pub index: SiteIndex,
    /// Expanded alias map, `key -> target`
    pub aliases: BTreeMap<ContentPath, ContentPath>,
    /// Web-server redirects: reversed aliases, live manifest redirects and
    /// frontmatter aliases
    pub redirects: RedirectMap,
    /// Manifest redirects whose target resolves to nothing
    pub orphaned: RedirectMap,
    pub static_paths: BTreeMap<ContentPath, ContentPath>,
}

/// Main site builder
pub struct SiteBuilder<'a> {
    context: &'a BuildContext,
    processor: MarkdownProcessor,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(context: &'a BuildContext) -> Self {
        Self {
            context,
            processor: MarkdownProcessor::new(),
        }
    }

    /// Render every document and assemble the redirect tables.
    ///
    /// A document that cannot be read, parsed or rendered is left out and
    /// reported as an error diagnostic; the rest of the build proceeds.
    pub fn build(&self) -> Result<SiteBuild, BuildError> {
        let sources = self.discover_markdown_files()?;
        tracing::info!("Found {} markdown files", sources.len());

        let results: Vec<(SourceFile, Result<Page, DocumentError>)> = sources
            .into_par_iter()
            .map(|source| {
                let result = self.render_page(&source);
                (source, result)
            })
            .collect();

        let mut diagnostics = self.context.diagnostics.clone();
        let mut pages = Vec::new();
        for (source, result) in results {
            match result {
                Ok(page) if page.is_draft() && !self.context.config.include_drafts => {
                    tracing::debug!("Skipping draft {}", source.source_path);
                }
                Ok(page) => pages.push(page),
                Err(err) => {
                    tracing::error!("Skipping {}: {}", source.source_path, err);
                    diagnostics.push(
                        Diagnostic::new(err.code(), DiagnosticSeverity::Error, err.to_string())
                            .with_path(&source.source_path),
                    );
                }
            }
        }
        pages.sort_by(|a, b| a.route.cmp(&b.route));

        let (declared, duplicates) = frontmatter_redirects(
            pages
                .iter()
                .map(|p| (&p.route, p.document.frontmatter.redirect.as_slice())),
        );
        diagnostics.extend(duplicates);

        let filter = self.context.redirect_filter();
        let manifest = &self.context.redirect_manifest;
        diagnostics.extend(filter.orphan_diagnostics(manifest));

        let redirects = redirect_map(&self.context.aliases, &filter.resolvable(manifest), &declared);

        Ok(SiteBuild {
            index: SiteIndex { pages, diagnostics },
            aliases: self.context.aliases.expanded().clone(),
            redirects,
            orphaned: filter.orphaned(manifest),
            static_paths: self.context.static_paths(),
        })
    }

    /// Markdown sources under the content root, one per route.
    ///
    /// Where a directory has both `readme` and `_index`, the readme renders
    /// the directory route.
    pub fn discover_markdown_files(&self) -> Result<Vec<SourceFile>, BuildError> {
        let content_dir = self.context.config.content_dir();
        if !content_dir.is_dir() {
            return Err(WalkError::MissingDirectory(content_dir).into());
        }
        let ignore_patterns = compile_ignore_patterns(&self.context.config.ignore_patterns);

        let mut by_route: HashMap<ContentPath, (usize, SourceFile)> = HashMap::new();
        for entry in WalkDir::new(&content_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy();
            if !is_markdown_file(&name) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&content_dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }

            let source_path = ContentPath::new(&rel);
            let route = route_for_source(&source_path);
            if self.context.config.is_excluded(&route) {
                tracing::debug!("Skipping {} under an excluded prefix", rel);
                continue;
            }

            let rank = source_rank(&name);
            let source = SourceFile {
                source_path,
                route: route.clone(),
                fs_path: entry.path().to_path_buf(),
            };
            match by_route.get(&route) {
                Some((existing, _)) if *existing <= rank => {
                    tracing::debug!("{} is superseded for route {}", rel, route);
                }
                _ => {
                    by_route.insert(route, (rank, source));
                }
            }
        }

        let mut files: Vec<SourceFile> = by_route.into_values().map(|(_, source)| source).collect();
        files.sort_by(|a, b| a.route.cmp(&b.route));
        Ok(files)
    }

    fn render_page(&self, source: &SourceFile) -> Result<Page, DocumentError> {
        let content = fs::read_to_string(&source.fs_path)
            .map_err(|e| DocumentError::Unreadable(source.fs_path.clone(), e))?;
        let document = Document::parse(&content)
            .map_err(|e| DocumentError::Frontmatter(source.fs_path.clone(), e))?;

        let rendered = self.processor.render(
            &document,
            &source.source_path,
            &self.context.render_options(),
        )?;

        // Fall back to the file name when the frontmatter has no title
        let title = match rendered.frontmatter.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => fallback_title(&source.fs_path),
        };

        Ok(Page {
            route: source.route.clone(),
            source_path: source.source_path.clone(),
            title,
            date: rendered.frontmatter.parsed_date(),
            document: rendered,
        })
    }
}

/// Lower ranks win a route: readme, then `_index`, then plain files
fn source_rank(name: &str) -> usize {
    let stem = markdown_stem(name).unwrap_or(name);
    INDEX_STEMS
        .iter()
        .position(|index| stem.eq_ignore_ascii_case(index))
        .unwrap_or(INDEX_STEMS.len())
}

fn fallback_title(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Untitled");
    let dir_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str());
    match dir_name {
        Some(dir) if is_directory_index(stem) => dir.to_string(),
        _ => stem.to_string(),
    }
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn context(dir: &TempDir) -> BuildContext {
        BuildContext::load(Config::new(dir.path().join("content"), dir.path().join("out"))).unwrap()
    }

    #[test]
    fn test_readme_wins_over_index() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "guides/readme.md", "# Guides");
        write(&content, "guides/_index.md", "# Index");
        write(&content, "guides/setup.mdx", "# Setup");
        write(&content, ".hidden/secret.md", "# Secret");

        let ctx = context(&dir);
        let files = SiteBuilder::new(&ctx).discover_markdown_files().unwrap();
        let sources: Vec<&str> = files.iter().map(|f| f.source_path.as_str()).collect();
        assert_eq!(sources, vec!["/guides/readme.md", "/guides/setup.mdx"]);
    }

    #[test]
    fn test_build_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "good.md", "---\ntitle: Good\nredirect: [g]\n---\n## Part\n");
        write(&content, "bad.md", "---\ntitle: [unclosed\n---\nBody\n");
        write(&content, "brainery.md", "# Shadowed\n");
        write(&content, "handbook/readme.md", "Hand");
        write(&content, "draft.md", "---\ndraft: true\n---\nDraft\n");
        write(&content, "aliases.json", r#"{"brainery": "handbook"}"#);

        let ctx = context(&dir);
        let build = SiteBuilder::new(&ctx).build().unwrap();
        let routes: Vec<&str> = build.index.pages.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(routes, vec!["/good", "/handbook"]);

        let codes: Vec<&str> = build.index.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"document.frontmatter"));
        assert!(codes.contains(&"document.shadowed"));
        assert_eq!(build.index.errors(), 2);

        assert_eq!(build.index.pages[1].title, "handbook");
        let frontmatter = build
            .index
            .diagnostics
            .iter()
            .find(|d| d.code == "document.frontmatter")
            .unwrap();
        assert!(frontmatter.message.starts_with("Malformed frontmatter in "));
        assert!(frontmatter.message.contains("bad.md"));
        assert_eq!(build.redirects.get(&ContentPath::new("/g")), Some(&ContentPath::new("/good")));
    }

    #[test]
    fn test_ignore_patterns_and_excluded_prefixes() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "notes/a.md", "A");
        write(&content, "notes/drafts/b.md", "B");
        write(&content, "contributor/me.md", "Me");

        let mut config = Config::new(&content, dir.path().join("out"));
        config.ignore_patterns = vec!["^notes/drafts/".to_string()];
        let ctx = BuildContext::load(config).unwrap();
        let files = SiteBuilder::new(&ctx).discover_markdown_files().unwrap();
        let routes: Vec<&str> = files.iter().map(|f| f.route.as_str()).collect();
        assert_eq!(routes, vec!["/notes/a"]);
    }
}
