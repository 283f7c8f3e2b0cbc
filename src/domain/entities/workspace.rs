use super::manifest::ProjectDeclaration;
use std::path::PathBuf;

/// Control directory under the working directory
pub const CONTROL_DIR_NAME: &str = ".repo";
/// Top-level manifest, relative to the control directory
pub const MANIFEST_FILE_NAME: &str = "manifest.xml";
/// Include root, relative to the control directory
pub const INCLUDE_ROOT_NAME: &str = "manifests";
/// Output root for generated mirrors, relative to the control directory
pub const OUTPUT_DIR_NAME: &str = "output";
/// Suffix appended to every bare mirror directory
pub const BARE_REPOSITORY_SUFFIX: &str = ".git";
/// Branch created in every mirror
pub const DEFAULT_BRANCH_NAME: &str = "master";

/// Directory layout of a checkout that mirrors are generated from
///
/// ```text
/// <top>/                      working-tree root, project sources live here
/// <top>/.repo/manifest.xml    top-level manifest
/// <top>/.repo/manifests/      include root
/// <top>/.repo/output/         <name>.git bare mirrors
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorWorkspace {
    /// Working-tree root (parent of the control directory)
    pub root_path: PathBuf,
}

impl MirrorWorkspace {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// `.repo` directory
    pub fn control_dir(&self) -> PathBuf {
        self.root_path.join(CONTROL_DIR_NAME)
    }

    pub fn manifest_file_path(&self) -> PathBuf {
        self.control_dir().join(MANIFEST_FILE_NAME)
    }

    pub fn include_root(&self) -> PathBuf {
        self.control_dir().join(INCLUDE_ROOT_NAME)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.control_dir().join(OUTPUT_DIR_NAME)
    }

    /// Whether the top-level manifest is present
    pub fn has_manifest(&self) -> bool {
        self.manifest_file_path().is_file()
    }

    /// Source working tree of a project
    pub fn source_path(&self, project: &ProjectDeclaration) -> PathBuf {
        self.root_path.join(project.path.as_path())
    }

    /// Bare mirror location of a project, derived from its name only
    pub fn mirror_path(&self, project: &ProjectDeclaration) -> PathBuf {
        self.output_dir()
            .join(format!("{}{}", project.name, BARE_REPOSITORY_SUFFIX))
    }
}
