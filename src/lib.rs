//! # repomirror - bare mirror generator for repo manifests
//!
//! `repomirror` reads the manifest of a `repo` checkout, resolves every
//! `<include>` into one flat element sequence, validates it, and creates one
//! bare mirror repository per declared project so the checkout can be served
//! to downstream clients.
//!
//! ## Workspace layout
//!
//! ```text
//! <top>/.repo/manifest.xml       top-level manifest
//! <top>/.repo/manifests/         include root
//! <top>/.repo/output/<name>.git  generated mirrors
//! <top>/<path>                   project working trees
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: manifest model, project paths and workspace layout
//! - [`application`]: manifest resolution and the mirror pipeline
//! - [`infrastructure`]: XML loading and libgit2 mirroring
//! - [`presentation`]: CLI interface
//! - [`common`]: shared error handling
//!
//! ## Resolving a manifest
//!
//! ```rust,no_run
//! use repomirror::application::services::manifest_service::{
//!     ManifestProcessingOptions, ManifestService,
//! };
//! use std::path::Path;
//!
//! # fn example() -> repomirror::Result<()> {
//! let service = ManifestService::new(ManifestProcessingOptions::new(".repo/manifests"));
//! let resolved = service.resolve(Path::new(".repo/manifest.xml"))?;
//!
//! for project in &resolved.projects {
//!     println!("{} -> {}", project.name, project.path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Generating mirrors
//!
//! ```rust,no_run
//! use repomirror::application::use_cases::generate_mirrors::{
//!     GenerateMirrorsConfig, GenerateMirrorsUseCase,
//! };
//! use repomirror::domain::entities::workspace::MirrorWorkspace;
//! use repomirror::infrastructure::GitScm;
//! use std::sync::Arc;
//!
//! # async fn example() -> repomirror::Result<()> {
//! let use_case = GenerateMirrorsUseCase::new(
//!     GenerateMirrorsConfig::new().with_parallel_jobs(Some(4)),
//!     MirrorWorkspace::new("/path/to/checkout"),
//!     Arc::new(GitScm::new()),
//! );
//! let report = use_case.execute().await?;
//! println!("{} mirrors created", report.created_count);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::RepoMirrorError;
pub use crate::common::result::RepoMirrorResult as Result;
