//! JSON path manifests (`aliases.json`, `redirects.json`).

use crate::models::{Diagnostic, DiagnosticSeverity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A flat `{ "<from>": "<to>" }` object, as authored
pub type PathManifest = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a manifest file
pub fn read_manifest(path: &Path) -> Result<PathManifest, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a manifest, degrading to an empty one.
///
/// A missing file is normal (the site simply has no aliases or redirects);
/// any other failure is reported as a `manifest.unreadable` warning.
pub fn read_manifest_or_empty(path: &Path) -> (PathManifest, Option<Diagnostic>) {
    match read_manifest(path) {
        Ok(manifest) => (manifest, None),
        Err(ManifestError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::debug!("No manifest at {}, using an empty one", path.display());
            (PathManifest::new(), None)
        }
        Err(err) => {
            tracing::warn!("Could not read or parse manifest: {}", err);
            let diag = Diagnostic::new(
                "manifest.unreadable",
                DiagnosticSeverity::Warning,
                err.to_string(),
            )
            .with_path(path.display());
            (PathManifest::new(), Some(diag))
        }
    }
}
