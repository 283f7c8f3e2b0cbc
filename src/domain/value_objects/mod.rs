pub mod project_path;
