//! Shared error and result types

pub mod error;
pub mod result;

pub use error::RepoMirrorError;
pub use result::RepoMirrorResult;
