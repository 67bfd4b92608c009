//! # vaultpress-core
//!
//! Core library for the vaultpress content pipeline.
//!
//! This crate turns a tree of Markdown/MDX documents into sanitized HTML with
//! a table of contents, and reconciles the alias and redirect manifests that
//! decide which URL serves which document.

pub mod alias;
pub mod builder;
pub mod config;
pub mod context;
pub mod frontmatter;
pub mod html;
pub mod manifest;
pub mod markdown;
pub mod models;
pub mod paths;
pub mod redirects;
pub mod slug;
pub mod tree;

pub use alias::AliasGraph;
pub use builder::{BuildError, SiteBuild, SiteBuilder};
pub use config::Config;
pub use context::BuildContext;
pub use markdown::{MarkdownProcessor, RenderError, RenderOptions};
pub use models::{
    Diagnostic, DiagnosticSeverity, Document, Frontmatter, Page, RenderedDocument, SiteIndex,
};
pub use redirects::{RedirectFilter, RedirectMap, RedirectVariant};
pub use slug::slugify;
pub use tree::{ContentTree, IndexKind, WalkError};
pub use vaultpress_types::{ContentPath, TocItem};
