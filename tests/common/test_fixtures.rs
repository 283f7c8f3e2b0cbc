//! Test fixtures for creating checkouts and git source trees

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use repomirror::domain::entities::workspace::MirrorWorkspace;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary checkout with a `.repo` control directory
pub struct CheckoutFixture {
    pub temp_dir: TempDir,
    pub workspace: MirrorWorkspace,
}

impl CheckoutFixture {
    /// Empty checkout: include root exists, no top-level manifest yet
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = std::fs::canonicalize(temp_dir.path()).unwrap();
        let workspace = MirrorWorkspace::new(root);
        std::fs::create_dir_all(workspace.include_root()).unwrap();

        Self {
            temp_dir,
            workspace,
        }
    }

    /// Checkout with the given top-level manifest
    pub fn with_manifest(content: &str) -> Self {
        let fixture = Self::new();
        fixture.write_manifest(content);
        fixture
    }

    pub fn root(&self) -> &Path {
        &self.workspace.root_path
    }

    pub fn write_manifest(&self, content: &str) -> PathBuf {
        let path = self.workspace.manifest_file_path();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn write_include(&self, name: &str, content: &str) -> PathBuf {
        let path = self.workspace.include_root().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Git working tree at `<root>/<relative>` with one commit on `main`
    pub fn create_source_repo(&self, relative: &str) -> SourceRepo {
        SourceRepo::init(&self.root().join(relative))
    }

    /// Plain directory that is not a git repository
    pub fn create_plain_dir(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn mirror_path(&self, name: &str) -> PathBuf {
        self.workspace.output_dir().join(format!("{}.git", name))
    }
}

/// A git working tree used as a mirror source
pub struct SourceRepo {
    pub repo: Repository,
}

impl SourceRepo {
    pub fn init(path: &Path) -> Self {
        std::fs::create_dir_all(path).unwrap();
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Repository::init_opts(path, &options).unwrap();

        let source = Self { repo };
        source.commit_file("README.md", "# source\n", "initial commit");
        source
    }

    pub fn commit_file(&self, file: &str, content: &str, message: &str) -> Oid {
        let workdir = self.repo.workdir().unwrap().to_path_buf();
        std::fs::write(workdir.join(file), content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();

        let parents = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parent_refs,
            )
            .unwrap()
    }

    pub fn head_id(&self) -> Oid {
        self.repo.head().unwrap().target().unwrap()
    }

    /// Detach HEAD at `commit`, optionally deleting the branch it pointed at
    pub fn detach_head(&self, commit: Oid, delete_branch: Option<&str>) {
        self.repo.set_head_detached(commit).unwrap();
        if let Some(branch) = delete_branch {
            self.repo
                .find_branch(branch, git2::BranchType::Local)
                .unwrap()
                .delete()
                .unwrap();
        }
    }

    pub fn create_branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }
}

/// Target of a local branch in a (bare) repository
pub fn branch_target(repo: &Repository, branch: &str) -> Option<Oid> {
    repo.find_branch(branch, git2::BranchType::Local)
        .ok()
        .and_then(|b| b.get().target())
}
