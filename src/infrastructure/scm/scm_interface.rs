use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// Produces self-contained bare mirrors of project working trees
///
/// Implementations must treat a missing source as [`MirrorOutcome::Skipped`]
/// rather than an error, so one absent checkout never aborts a batch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MirrorOperations: Send + Sync {
    /// Create or refresh the bare mirror at `destination` from the working tree at `source`,
    /// make sure `default_branch` exists in it and drop any `origin` remote.
    async fn mirror(
        &self,
        source: &Path,
        destination: &Path,
        default_branch: &str,
    ) -> Result<MirrorOutcome, ScmError>;
}

/// What happened to one project's mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MirrorOutcome {
    /// A new bare repository was created
    Created,
    /// An existing bare repository was updated from the source
    Refreshed,
    /// Nothing was done
    Skipped { reason: String },
}

/// Errors that can occur while mirroring one project
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("Repository not found at path: {path}")]
    RepositoryNotFound { path: String },

    #[error("Mirror operation failed: {message}")]
    MirrorFailed { message: String },

    #[error("Git error: {source}")]
    Git {
        #[from]
        source: git2::Error,
    },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ScmError {
    /// Create a mirror failed error
    pub fn mirror_failed(message: impl Into<String>) -> Self {
        Self::MirrorFailed {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
