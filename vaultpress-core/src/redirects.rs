//! Redirect reconciliation against the alias graph and the document tree.

use crate::alias::AliasGraph;
use crate::manifest::PathManifest;
use crate::models::{Diagnostic, DiagnosticSeverity};
use crate::paths::{normalize, strip_markdown_ext};
use std::collections::{BTreeMap, BTreeSet};
use vaultpress_types::ContentPath;

/// Classified redirect table
pub type RedirectMap = BTreeMap<ContentPath, ContentPath>;

/// Which consumer a redirect table is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectVariant {
    /// Web-server rewrite table: only redirects whose target resolves
    Resolvable,
    /// Audit list: only redirects whose target resolves to nothing
    Orphaned,
}

/// Filters a redirect manifest against alias coverage and real documents
pub struct RedirectFilter<'a> {
    aliases: &'a AliasGraph,
    documents: BTreeSet<ContentPath>,
}

impl<'a> RedirectFilter<'a> {
    /// `documents` are the routable document paths (excluded prefixes already removed)
    pub fn new(aliases: &'a AliasGraph, documents: impl IntoIterator<Item = ContentPath>) -> Self {
        Self {
            aliases,
            documents: documents.into_iter().collect(),
        }
    }

    pub fn filter(&self, manifest: &PathManifest, variant: RedirectVariant) -> RedirectMap {
        let mut out = RedirectMap::new();
        for (raw_from, raw_to) in manifest {
            let from = normalize(raw_from);
            let to = normalize(raw_to);

            if !is_readme_redirect(&from) && self.overlaps_alias(&from, &to) {
                tracing::debug!("Redirect {} -> {} duplicates alias coverage", from, to);
                continue;
            }

            match variant {
                RedirectVariant::Resolvable => match self.resolve(&to) {
                    Some(target) => {
                        out.insert(from, target);
                    }
                    None => tracing::debug!("Redirect {} -> {} has no valid target", from, to),
                },
                RedirectVariant::Orphaned => {
                    if self.resolve(&to).is_none() && !self.aliases.is_key(&to) {
                        tracing::warn!("Orphaned redirect {} -> {}", from, to);
                        out.insert(from, to);
                    }
                }
            }
        }
        out
    }

    /// Variant A: redirects whose target is a document or an alias target
    pub fn resolvable(&self, manifest: &PathManifest) -> RedirectMap {
        self.filter(manifest, RedirectVariant::Resolvable)
    }

    /// Variant B: redirects pointing at neither a document nor an alias
    pub fn orphaned(&self, manifest: &PathManifest) -> RedirectMap {
        self.filter(manifest, RedirectVariant::Orphaned)
    }

    /// Orphaned redirects as diagnostics for the audit report
    pub fn orphan_diagnostics(&self, manifest: &PathManifest) -> Vec<Diagnostic> {
        self.orphaned(manifest)
            .into_iter()
            .map(|(from, to)| {
                Diagnostic::new(
                    "redirect.orphaned",
                    DiagnosticSeverity::Warning,
                    format!("Redirect target '{to}' is neither a document nor an alias"),
                )
                .with_path(&from)
                .with_context(to.to_string())
            })
            .collect()
    }

    pub fn is_document(&self, path: &ContentPath) -> bool {
        self.documents.contains(path)
    }

    /// Final value of a resolvable redirect target
    fn resolve(&self, to: &ContentPath) -> Option<ContentPath> {
        if self.documents.contains(to) {
            return Some(to.clone());
        }
        let stripped = normalize(strip_markdown_ext(to.as_str()));
        if self.documents.contains(&stripped) {
            return Some(stripped);
        }
        self.aliases.key_for_target(to).cloned()
    }

    fn overlaps_alias(&self, from: &ContentPath, to: &ContentPath) -> bool {
        [from, to]
            .into_iter()
            .any(|side| self.aliases.is_key(side) || self.aliases.is_target(side))
    }
}

/// README redirects survive alias overlap
fn is_readme_redirect(from: &ContentPath) -> bool {
    from.as_str().to_ascii_lowercase().ends_with("/readme.md")
}

/// Collect the short aliases documents declare in their `redirect` frontmatter.
///
/// `documents` pairs each document route with its declared aliases. The first
/// document (in route order) to claim an alias keeps it; later claims are
/// reported as `redirect.duplicate` warnings and skipped.
pub fn frontmatter_redirects<'d>(
    documents: impl IntoIterator<Item = (&'d ContentPath, &'d [String])>,
) -> (RedirectMap, Vec<Diagnostic>) {
    let mut sorted: Vec<(&ContentPath, &[String])> = documents.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut map = RedirectMap::new();
    let mut diagnostics = Vec::new();
    for (route, aliases) in sorted {
        for raw in aliases {
            let alias = normalize(raw);
            if alias.is_root() || &alias == route {
                continue;
            }
            match map.get(&alias) {
                Some(existing) => {
                    tracing::warn!(
                        "Duplicate alias detected: {} in {} (already used by {}). Skipping.",
                        alias,
                        route,
                        existing
                    );
                    diagnostics.push(
                        Diagnostic::new(
                            "redirect.duplicate",
                            DiagnosticSeverity::Warning,
                            format!("Alias '{alias}' is already claimed by '{existing}'"),
                        )
                        .with_path(route)
                        .with_context(alias.to_string()),
                    );
                }
                None => {
                    map.insert(alias, route.clone());
                }
            }
        }
    }
    (map, diagnostics)
}

/// Route table for the front end: `route -> content path`.
///
/// Documents map to themselves unless they are an orphaned redirect source
/// or an alias target; orphaned redirects and reversed aliases are layered on
/// top.
pub fn static_paths(
    documents: &[ContentPath],
    orphaned: &RedirectMap,
    aliases: &AliasGraph,
) -> BTreeMap<ContentPath, ContentPath> {
    let mut paths = BTreeMap::new();
    for doc in documents {
        if orphaned.contains_key(doc) || aliases.is_target(doc) {
            continue;
        }
        paths.insert(doc.clone(), doc.clone());
    }
    for (from, to) in orphaned {
        paths.insert(from.clone(), to.clone());
    }
    for (target, key) in aliases.reverse() {
        paths.insert(key.clone(), target.clone());
    }
    paths
}

/// Web-server redirect map: reversed aliases, then resolvable redirects,
/// then frontmatter aliases, later layers overriding earlier ones.
/// Self-referential entries are left out.
pub fn redirect_map(
    aliases: &AliasGraph,
    resolvable: &RedirectMap,
    declared: &RedirectMap,
) -> RedirectMap {
    let mut map = RedirectMap::new();
    for layer in [aliases.reverse(), resolvable, declared] {
        for (from, to) in layer {
            map.insert(from.clone(), to.clone());
        }
    }
    map.retain(|from, to| from != to);
    map
}

/// Render a redirect table as an nginx `map` block keyed on `$request_uri`
pub fn render_nginx_map(map: &RedirectMap) -> String {
    let mut out = String::from("map $request_uri $redirect_target {\n    default 0;\n");
    for (from, to) in map {
        out.push_str(&format!("    \"{from}\" \"{to}\";\n"));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> ContentPath {
        ContentPath::new(raw)
    }

    fn graph(entries: &[(&str, &str)]) -> AliasGraph {
        AliasGraph::from_expanded(entries.iter().map(|(k, v)| (path(k), path(v))).collect())
    }

    fn manifest(entries: &[(&str, &str)]) -> PathManifest {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_readme_redirect_survives_alias_overlap() {
        let aliases = graph(&[("old", "new"), ("old/readme", "new/readme")]);
        let filter = RedirectFilter::new(&aliases, [path("new"), path("new/readme")]);
        let redirects = manifest(&[("old/readme.md", "new/readme.md")]);

        let resolved = filter.resolvable(&redirects);
        assert_eq!(
            resolved.get(&path("/old/readme.md")),
            Some(&path("/new/readme"))
        );
    }

    #[test]
    fn test_alias_overlap_is_dropped() {
        let aliases = graph(&[("old", "new")]);
        let filter = RedirectFilter::new(&aliases, [path("new"), path("other")]);
        let redirects = manifest(&[
            ("old", "other"),
            ("new", "other"),
            ("legacy", "old"),
            ("legacy2", "new"),
            ("keep", "other"),
        ]);
        let resolved = filter.resolvable(&redirects);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(&path("keep")), Some(&path("other")));
    }

    #[test]
    fn test_resolvable_prefers_document_then_alias() {
        let aliases = graph(&[("s/h", "handbook/intro")]);
        let filter = RedirectFilter::new(&aliases, [path("guides/setup")]);
        let redirects = manifest(&[
            ("/old-setup", "/guides/setup.md"),
            ("\"/gone\"", "/nowhere/"),
        ]);
        let resolved = filter.resolvable(&redirects);
        assert_eq!(resolved.get(&path("old-setup")), Some(&path("guides/setup")));
        assert!(!resolved.contains_key(&path("gone")));
    }

    #[test]
    fn test_orphaned_keeps_only_unresolvable() {
        let aliases = graph(&[("h", "handbook")]);
        let filter = RedirectFilter::new(&aliases, [path("guides/setup")]);
        let redirects = manifest(&[("a", "guides/setup"), ("b", "missing/page")]);
        let orphaned = filter.orphaned(&redirects);
        assert_eq!(orphaned.len(), 1);
        assert_eq!(orphaned.get(&path("b")), Some(&path("missing/page")));

        let diags = filter.orphan_diagnostics(&redirects);
        assert_eq!(diags[0].code, "redirect.orphaned");
        assert_eq!(diags[0].path.as_deref(), Some("/b"));
    }

    #[test]
    fn test_frontmatter_redirects_first_claim_wins() {
        let a = path("/a");
        let b = path("/b");
        let a_aliases = vec![String::from("s/x"), String::from("/s/y")];
        let b_aliases = vec![String::from("/s/x")];
        let (map, diags) = frontmatter_redirects([
            (&b, b_aliases.as_slice()),
            (&a, a_aliases.as_slice()),
        ]);
        assert_eq!(map.get(&path("/s/x")), Some(&a));
        assert_eq!(map.get(&path("/s/y")), Some(&a));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "redirect.duplicate");
    }

    #[test]
    fn test_static_paths() {
        let aliases = graph(&[("brainery", "handbook"), ("brainery/x", "handbook/x")]);
        let docs = vec![path("handbook"), path("handbook/x"), path("notes/y")];
        let orphaned: RedirectMap = [(path("legacy"), path("lost"))].into_iter().collect();
        let table = static_paths(&docs, &orphaned, &aliases);

        assert_eq!(table.get(&path("notes/y")), Some(&path("notes/y")));
        assert_eq!(table.get(&path("brainery/x")), Some(&path("handbook/x")));
        assert_eq!(table.get(&path("legacy")), Some(&path("lost")));
        assert!(!table.contains_key(&path("handbook/x")));
    }

    #[test]
    fn test_redirect_map_layers_and_nginx_output() {
        let aliases = graph(&[("brainery", "handbook")]);
        let resolvable: RedirectMap = [(path("/old"), path("/handbook"))].into_iter().collect();
        let declared: RedirectMap = [(path("/hb"), path("/hb"))].into_iter().collect();

        let map = redirect_map(&aliases, &resolvable, &declared);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&path("/handbook")), Some(&path("/brainery")));

        let conf = render_nginx_map(&map);
        assert_eq!(
            conf,
            "map $request_uri $redirect_target {\n    default 0;\n    \"/handbook\" \"/brainery\";\n    \"/old\" \"/handbook\";\n}\n"
        );
    }
}
