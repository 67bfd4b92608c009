//! Content tree enumeration with README/`_index` precedence.

use crate::paths::{is_directory_index, markdown_stem, MARKDOWN_EXTENSIONS};
use std::path::{Path, PathBuf};
use thiserror::Error;
use vaultpress_types::ContentPath;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// How a directory presents itself as a navigable path, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Has `readme.md`/`readme.mdx`
    Readme,
    /// Has `_index.md`/`_index.mdx` but no readme
    Index,
    /// Has other entries but no index file
    Listing,
    /// Nothing visible inside
    Empty,
}

impl IndexKind {
    /// Classify a directory from its (visible) entries
    pub fn classify(entries: &[DirEntry]) -> Self {
        let has_index = |stem: &str| {
            entries.iter().any(|entry| {
                !entry.is_dir
                    && markdown_stem(&entry.name).is_some_and(|s| s.eq_ignore_ascii_case(stem))
            })
        };

        if has_index("readme") {
            IndexKind::Readme
        } else if has_index("_index") {
            IndexKind::Index
        } else if !entries.is_empty() {
            IndexKind::Listing
        } else {
            IndexKind::Empty
        }
    }

    /// Slugs this directory registers, relative to the walk root
    fn registered(self, base: &[String]) -> Vec<Vec<String>> {
        if base.is_empty() {
            return Vec::new();
        }
        match self {
            IndexKind::Readme => {
                let mut readme = base.to_vec();
                readme.push(String::from("readme"));
                vec![base.to_vec(), readme]
            }
            IndexKind::Index | IndexKind::Listing => vec![base.to_vec()],
            IndexKind::Empty => Vec::new(),
        }
    }
}

/// A single visible directory entry
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Walker over a content directory
#[derive(Debug, Clone)]
pub struct ContentTree {
    root: PathBuf,
}

impl ContentTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of a content path
    pub fn fs_path(&self, path: &ContentPath) -> PathBuf {
        path.segments()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Every document slug in the tree, relative to the root
    pub fn walk(&self) -> Result<Vec<Vec<String>>, WalkError> {
        self.list_under(&ContentPath::root())
    }

    /// Every document path in the tree, sorted
    pub fn document_paths(&self) -> Result<Vec<ContentPath>, WalkError> {
        let mut paths: Vec<ContentPath> = self
            .walk()?
            .into_iter()
            .map(ContentPath::from_segments)
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Document slugs under `sub`, relative to `sub`.
    ///
    /// A `sub` that names a single document yields one empty slug; a `sub`
    /// that is neither a directory nor a document is a
    /// [`WalkError::MissingDirectory`].
    pub fn list_under(&self, sub: &ContentPath) -> Result<Vec<Vec<String>>, WalkError> {
        let dir = self.fs_path(sub);
        if !dir.is_dir() {
            if !sub.is_root() && self.resolve_file(sub).is_some() {
                return Ok(vec![Vec::new()]);
            }
            return Err(WalkError::MissingDirectory(dir));
        }

        let mut out = Vec::new();
        walk_directory(&dir, &mut Vec::new(), &mut out)?;
        Ok(out)
    }

    /// Map a content path back to the file that renders it.
    ///
    /// Tries `x.md`, `x.mdx`, then the directory indexes `x/readme.*` and
    /// `x/_index.*` in precedence order.
    pub fn resolve_file(&self, path: &ContentPath) -> Option<PathBuf> {
        if !path.is_root() {
            let base = self.fs_path(path);
            if let (Some(dir), Some(name)) = (base.parent(), path.file_name()) {
                for ext in MARKDOWN_EXTENSIONS {
                    let candidate = dir.join(format!("{name}.{ext}"));
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }

        let dir = self.fs_path(path);
        let entries = read_entries(&dir).ok()?;
        for stem in crate::paths::INDEX_STEMS {
            let found = entries.iter().find(|entry| {
                !entry.is_dir
                    && markdown_stem(&entry.name).is_some_and(|s| s.eq_ignore_ascii_case(stem))
            });
            if let Some(entry) = found {
                return Some(entry.path.clone());
            }
        }
        None
    }
}

/// Visible entries of one directory, sorted by name. Dot-entries are skipped.
pub fn read_entries(dir: &Path) -> Result<Vec<DirEntry>, WalkError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| WalkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        entries.push(DirEntry {
            is_dir: entry.file_type().is_dir(),
            path: entry.path().to_path_buf(),
            name,
        });
    }
    Ok(entries)
}

fn walk_directory(
    dir: &Path,
    base: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) -> Result<(), WalkError> {
    let entries = read_entries(dir)?;
    let kind = IndexKind::classify(&entries);
    tracing::trace!("{} classified as {:?}", dir.display(), kind);
    out.extend(kind.registered(base));

    for entry in &entries {
        if entry.is_dir {
            base.push(entry.name.clone());
            if let Err(err) = walk_directory(&entry.path, base, out) {
                tracing::error!("Error reading directory {}: {}", entry.path.display(), err);
            }
            base.pop();
        } else if let Some(stem) = markdown_stem(&entry.name) {
            if is_directory_index(stem) {
                continue;
            }
            let mut slug = base.clone();
            slug.push(stem.to_string());
            out.push(slug);
        }
    }
    Ok(())
}
