//! Alias graph: expands declared short paths over every document under their target.

use crate::manifest::PathManifest;
use crate::models::{Diagnostic, DiagnosticSeverity};
use crate::paths::normalize;
use crate::tree::{ContentTree, WalkError};
use serde::Serialize;
use std::collections::BTreeMap;
use vaultpress_types::ContentPath;

/// Expanded alias map (`key -> target`) and its inverse.
///
/// Read-only once built. The inverse keeps the lexicographically smallest key
/// when several keys point at the same target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AliasGraph {
    expanded: BTreeMap<ContentPath, ContentPath>,
    #[serde(skip)]
    reverse: BTreeMap<ContentPath, ContentPath>,
}

impl AliasGraph {
    /// Graph with no aliases
    pub fn empty() -> Self {
        Self::default()
    }

    /// Expand `manifest` against the documents found in `tree`.
    ///
    /// Synthesized `key/child -> target/child` entries are added for every
    /// document under each target; declared entries are merged last so they
    /// win over synthesized ones. Synthesized keys listed in `reserved`
    /// (compared without the leading slash) are skipped.
    pub fn build(
        manifest: &PathManifest,
        tree: &ContentTree,
        reserved: &[String],
    ) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut declared: Vec<(ContentPath, ContentPath)> = Vec::new();
        let mut expanded: BTreeMap<ContentPath, ContentPath> = BTreeMap::new();

        for (raw_key, raw_target) in manifest {
            let key = normalize(raw_key);
            let target = normalize(raw_target);
            if key == target {
                tracing::warn!("Alias '{}' points at itself, skipping", key);
                diagnostics.push(
                    Diagnostic::new(
                        "alias.self-reference",
                        DiagnosticSeverity::Warning,
                        format!("Alias '{key}' points at itself"),
                    )
                    .with_path(&key),
                );
                continue;
            }
            declared.push((key.clone(), target.clone()));

            let children = match tree.list_under(&target) {
                Ok(children) => children,
                Err(err) => {
                    let reason = match &err {
                        WalkError::MissingDirectory(_) => String::from("target does not exist"),
                        other => other.to_string(),
                    };
                    tracing::warn!("Alias '{}' -> '{}' not expanded: {}", key, target, reason);
                    diagnostics.push(
                        Diagnostic::new(
                            "alias.missing-target",
                            DiagnosticSeverity::Warning,
                            format!("Alias target '{target}' for '{key}': {reason}"),
                        )
                        .with_path(&key)
                        .with_context(target.to_string()),
                    );
                    expanded.insert(key, target);
                    continue;
                }
            };

            for child in children {
                if child.is_empty() {
                    expanded.insert(key.clone(), target.clone());
                    continue;
                }
                let child_key = extend(&key, &child);
                if reserved.iter().any(|name| name.trim_matches('/') == child_key.relative()) {
                    tracing::debug!("Skipping reserved alias key {}", child_key);
                    continue;
                }
                expanded.insert(child_key, extend(&target, &child));
            }
        }

        for (key, target) in declared {
            expanded.insert(key, target);
        }

        tracing::debug!("Expanded {} aliases into {}", manifest.len(), expanded.len());
        (Self::from_expanded(expanded), diagnostics)
    }

    /// Build directly from an already expanded map
    pub fn from_expanded(expanded: BTreeMap<ContentPath, ContentPath>) -> Self {
        let mut reverse = BTreeMap::new();
        // Keys iterate in ascending order, so the first claim is the smallest key.
        for (key, target) in &expanded {
            reverse.entry(target.clone()).or_insert_with(|| key.clone());
        }
        Self { expanded, reverse }
    }

    /// `key -> target`
    pub fn expanded(&self) -> &BTreeMap<ContentPath, ContentPath> {
        &self.expanded
    }

    /// `target -> key`
    pub fn reverse(&self) -> &BTreeMap<ContentPath, ContentPath> {
        &self.reverse
    }

    pub fn target_of(&self, key: &ContentPath) -> Option<&ContentPath> {
        self.expanded.get(key)
    }

    /// Canonical alias key for a document path, if one is exposed
    pub fn key_for_target(&self, target: &ContentPath) -> Option<&ContentPath> {
        self.reverse.get(target)
    }

    pub fn is_key(&self, path: &ContentPath) -> bool {
        self.expanded.contains_key(path)
    }

    pub fn is_target(&self, path: &ContentPath) -> bool {
        self.reverse.contains_key(path)
    }

    /// The alias target a document route collides with, if the route is
    /// itself an alias key.
    pub fn shadowed_by(&self, route: &ContentPath) -> Option<&ContentPath> {
        self.expanded.get(route)
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

fn extend(base: &ContentPath, child: &[String]) -> ContentPath {
    ContentPath::from_segments(base.segments().chain(child.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "body").unwrap();
        }
        dir
    }

    fn manifest(entries: &[(&str, &str)]) -> PathManifest {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn path(raw: &str) -> ContentPath {
        ContentPath::new(raw)
    }

    #[test]
    fn test_expansion_covers_every_document() {
        let dir = fixture(&[
            "handbook/readme.md",
            "handbook/setup.md",
            "handbook/guides/one.md",
            "handbook/guides/two.mdx",
        ]);
        let tree = ContentTree::new(dir.path());
        let (graph, diags) =
            AliasGraph::build(&manifest(&[("brainery", "handbook")]), &tree, &["index".into()]);
        assert!(diags.is_empty());

        for child in tree.list_under(&path("handbook")).unwrap() {
            let suffix = child.join("/");
            assert_eq!(
                graph.target_of(&path(&format!("brainery/{suffix}"))),
                Some(&path(&format!("handbook/{suffix}"))),
                "missing alias for {suffix}"
            );
        }
        assert_eq!(graph.target_of(&path("brainery")), Some(&path("handbook")));
        assert_eq!(
            graph.target_of(&path("brainery/guides/two")),
            Some(&path("handbook/guides/two"))
        );
    }

    #[test]
    fn test_missing_target_is_kept_verbatim() {
        let dir = fixture(&["a.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, diags) = AliasGraph::build(&manifest(&[("soon", "future/page")]), &tree, &[]);
        assert_eq!(graph.target_of(&path("soon")), Some(&path("future/page")));
        assert_eq!(graph.len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "alias.missing-target");
    }

    #[test]
    fn test_document_target_maps_key_directly() {
        let dir = fixture(&["notes/deep.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, _) = AliasGraph::build(&manifest(&[("d", "notes/deep")]), &tree, &[]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.target_of(&path("d")), Some(&path("notes/deep")));
    }

    #[test]
    fn test_reserved_keys_are_skipped() {
        let dir = fixture(&["site/index.md", "site/about.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, _) = AliasGraph::build(&manifest(&[("/", "site")]), &tree, &["index".into()]);
        assert!(!graph.is_key(&path("index")));
        assert_eq!(graph.target_of(&path("about")), Some(&path("site/about")));
    }

    #[test]
    fn test_declared_entries_win_over_synthesized() {
        let dir = fixture(&["handbook/setup.md", "elsewhere/setup.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, _) = AliasGraph::build(
            &manifest(&[("b", "handbook"), ("b/setup", "elsewhere/setup")]),
            &tree,
            &[],
        );
        assert_eq!(graph.target_of(&path("b/setup")), Some(&path("elsewhere/setup")));
    }

    #[test]
    fn test_reverse_prefers_smallest_key() {
        let dir = fixture(&["handbook/setup.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, _) = AliasGraph::build(
            &manifest(&[("zeta", "handbook"), ("alpha", "handbook")]),
            &tree,
            &[],
        );
        assert_eq!(graph.key_for_target(&path("handbook")), Some(&path("alpha")));
        assert_eq!(
            graph.key_for_target(&path("handbook/setup")),
            Some(&path("alpha/setup"))
        );
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let dir = fixture(&["a.md"]);
        let tree = ContentTree::new(dir.path());
        let (graph, diags) = AliasGraph::build(&manifest(&[("a", "/a/")]), &tree, &[]);
        assert!(graph.is_empty());
        assert_eq!(diags[0].code, "alias.self-reference");
    }

    #[test]
    fn test_shadowed_by() {
        let graph = AliasGraph::from_expanded(
            [(path("brainery"), path("handbook"))].into_iter().collect(),
        );
        assert_eq!(graph.shadowed_by(&path("/brainery")), Some(&path("handbook")));
        assert_eq!(graph.shadowed_by(&path("/handbook")), None);
    }
}
