//! Audit aliases, redirects and documents and emit diagnostics.

use super::load_context;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use vaultpress_core::{Diagnostic, DiagnosticSeverity, RedirectMap, SiteBuilder};

#[derive(Serialize)]
struct AuditSummary<'a> {
    documents: usize,
    pages: usize,
    aliases: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    orphaned_redirects: &'a RedirectMap,
    diagnostics: &'a [Diagnostic],
}

/// Run the build pipeline without writing output and surface diagnostics.
pub fn audit_site(config_path: &Path, json: bool) -> Result<()> {
    let context = load_context(config_path)?;
    let build = SiteBuilder::new(&context)
        .build()
        .context("Failed to build site for audit")?;

    let diagnostics = &build.index.diagnostics;
    let count = |severity: DiagnosticSeverity| {
        diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };

    let summary = AuditSummary {
        documents: context.documents.len(),
        pages: build.index.pages.len(),
        aliases: build.aliases.len(),
        errors: count(DiagnosticSeverity::Error),
        warnings: count(DiagnosticSeverity::Warning),
        infos: count(DiagnosticSeverity::Info),
        orphaned_redirects: &build.orphaned,
        diagnostics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Audit complete: {} pages, {} aliases, {} orphaned redirects, {} errors, {} warnings, {} info",
            summary.pages,
            summary.aliases,
            summary.orphaned_redirects.len(),
            summary.errors,
            summary.warnings,
            summary.infos
        );
        for diag in diagnostics {
            let path = diag
                .path
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!("- {:?} {}{}: {}", diag.severity, diag.code, path, diag.message);
            if let Some(ctx) = &diag.context {
                println!("  context: {}", ctx);
            }
        }
    }

    Ok(())
}
