/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Manifest file reading (XML documents on disk)
/// - Mirror generation through libgit2
pub mod filesystem;
pub mod scm;

// Re-export commonly used types
pub use filesystem::manifest_store::ManifestStore;
pub use scm::{
    git_scm::GitScm,
    scm_interface::{MirrorOperations, MirrorOutcome, ScmError},
};
