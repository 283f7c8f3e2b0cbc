use super::scm_interface::{MirrorOperations, MirrorOutcome, ScmError};
use async_trait::async_trait;
use git2::{BranchType, FetchOptions, FetchPrune, Repository};
use std::path::Path;

/// Refspecs copied from the source into the mirror, heads and tags only
const MIRROR_REFSPECS: [&str; 2] = ["+refs/heads/*:refs/heads/*", "+refs/tags/*:refs/tags/*"];

/// Remote removed from every mirror
const ORIGIN_REMOTE: &str = "origin";

/// libgit2 implementation of [`MirrorOperations`]
///
/// Mirrors are built by initialising a bare repository and fetching from the
/// source path through an anonymous remote, so no `origin` is ever recorded.
#[derive(Debug, Clone, Default)]
pub struct GitScm;

impl GitScm {
    /// Create a new Git SCM instance
    pub fn new() -> Self {
        Self
    }

    fn mirror_blocking(
        source: &Path,
        destination: &Path,
        default_branch: &str,
    ) -> Result<MirrorOutcome, ScmError> {
        if !source.is_dir() {
            return Ok(MirrorOutcome::Skipped {
                reason: format!("{} not exists", source.display()),
            });
        }

        let source_repo = Repository::open(source).map_err(|_| ScmError::RepositoryNotFound {
            path: source.display().to_string(),
        })?;
        let source_url = source.to_str().ok_or_else(|| {
            ScmError::internal(format!("Source path is not valid UTF-8: {}", source.display()))
        })?;

        if destination.exists() {
            let mirror = Repository::open_bare(destination)?;
            Self::populate(&source_repo, &mirror, source_url, default_branch)?;
            return Ok(MirrorOutcome::Refreshed);
        }

        std::fs::create_dir_all(destination)?;
        let populated = Repository::init_bare(destination)
            .map_err(ScmError::from)
            .and_then(|mirror| Self::populate(&source_repo, &mirror, source_url, default_branch));

        // A half-built mirror would be taken for an existing one on the next run
        if let Err(e) = populated {
            if let Err(cleanup) = std::fs::remove_dir_all(destination) {
                tracing::warn!(
                    "Failed to remove incomplete mirror {}: {}",
                    destination.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        Ok(MirrorOutcome::Created)
    }

    fn populate(
        source: &Repository,
        mirror: &Repository,
        source_url: &str,
        default_branch: &str,
    ) -> Result<(), ScmError> {
        tracing::debug!("Fetching {} into {}", source_url, mirror.path().display());
        Self::fetch_refs(mirror, source_url, &MIRROR_REFSPECS, true)?;

        Self::ensure_branch(mirror, source_url, default_branch)?;
        Self::copy_head(source, mirror, default_branch)?;
        Self::detach_origin(mirror)
    }

    fn fetch_refs(
        mirror: &Repository,
        source_url: &str,
        refspecs: &[&str],
        prune: bool,
    ) -> Result<(), ScmError> {
        let mut remote = mirror.remote_anonymous(source_url)?;
        let mut options = FetchOptions::new();
        if prune {
            options.prune(FetchPrune::On);
        }

        remote
            .fetch(refspecs, Some(&mut options), None)
            .map_err(|e| ScmError::mirror_failed(format!("Fetch from {} failed: {}", source_url, e)))
    }

    /// Create `branch` at the source's checked-out commit when the source has no such branch
    ///
    /// Works for detached sources too: the source advertises `HEAD` even when it
    /// names no branch.
    fn ensure_branch(mirror: &Repository, source_url: &str, branch: &str) -> Result<(), ScmError> {
        if mirror.find_branch(branch, BranchType::Local).is_ok() {
            return Ok(());
        }

        let refspec = format!("+HEAD:refs/heads/{}", branch);
        Self::fetch_refs(mirror, source_url, &[refspec.as_str()], false)?;

        mirror.find_branch(branch, BranchType::Local).map_err(|e| {
            ScmError::mirror_failed(format!("Cannot create branch {}: {}", branch, e))
        })?;
        tracing::debug!("Created branch {} at the source HEAD", branch);

        Ok(())
    }

    /// Point the mirror's HEAD at the branch the source has checked out,
    /// or at `fallback` when the source is detached
    fn copy_head(source: &Repository, mirror: &Repository, fallback: &str) -> Result<(), ScmError> {
        let source_branch = source
            .head()
            .ok()
            .filter(|head| head.is_branch())
            .and_then(|head| head.name().map(str::to_string))
            .filter(|name| mirror.find_reference(name).is_ok());

        let target = source_branch.unwrap_or_else(|| format!("refs/heads/{}", fallback));
        mirror.set_head(&target)?;

        Ok(())
    }

    fn detach_origin(mirror: &Repository) -> Result<(), ScmError> {
        if mirror.find_remote(ORIGIN_REMOTE).is_ok() {
            mirror.remote_delete(ORIGIN_REMOTE)?;
            tracing::debug!("Removed remote {}", ORIGIN_REMOTE);
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorOperations for GitScm {
    async fn mirror(
        &self,
        source: &Path,
        destination: &Path,
        default_branch: &str,
    ) -> Result<MirrorOutcome, ScmError> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        let default_branch = default_branch.to_string();

        tokio::task::spawn_blocking(move || {
            Self::mirror_blocking(&source, &destination, &default_branch)
        })
        .await
        .map_err(|e| ScmError::internal(format!("Mirror task failed: {}", e)))?
    }
}
