/// SCM (Source Control Management) operations infrastructure
///
/// This module provides the interface used to turn project working trees
/// into bare mirrors, and its Git implementation.
pub mod git_scm;
pub mod scm_interface;

pub use git_scm::GitScm;
pub use scm_interface::{MirrorOperations, MirrorOutcome, ScmError};
