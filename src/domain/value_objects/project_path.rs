use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// ProjectPath related errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectPathError {
    #[error("Path cannot be empty")]
    Empty,

    #[error("Path is absolute but a checkout path must be relative: {0}")]
    Absolute(String),

    #[error("Path leaves its root through '..': {0}")]
    ParentTraversal(String),
}

/// Checkout path of a project, relative to the working-tree root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Create a checkout path, rejecting anything that starts at a filesystem root
    pub fn new(path: &str) -> Result<Self, ProjectPathError> {
        if path.is_empty() {
            return Err(ProjectPathError::Empty);
        }

        if Self::is_rooted(path) {
            return Err(ProjectPathError::Absolute(path.to_string()));
        }

        Ok(Self(path.to_string()))
    }

    /// Resolve the declared `path`, falling back to the project `name` when unset
    pub fn from_declaration(name: &str, path: Option<&str>) -> Result<Self, ProjectPathError> {
        match path {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::new(name),
        }
    }

    /// Check a project name before it is used to place the project's mirror
    ///
    /// Names become `<output>/<name>.git`, so they must stay below the output root.
    pub fn validate_name(name: &str) -> Result<(), ProjectPathError> {
        if name.is_empty() {
            return Err(ProjectPathError::Empty);
        }

        if Self::is_rooted(name) {
            return Err(ProjectPathError::Absolute(name.to_string()));
        }

        if name.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ProjectPathError::ParentTraversal(name.to_string()));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    fn is_rooted(path: &str) -> bool {
        path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
