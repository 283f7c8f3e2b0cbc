pub mod manifest;
pub mod workspace;
