use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::application::services::manifest_service::{ManifestProcessingOptions, ManifestService};
use crate::common::error::RepoMirrorError;
use crate::common::result::{OptionExt, RepoMirrorResult, ResultExt};
use crate::domain::entities::manifest::{IncludeInfo, ProjectDeclaration, ResolvedManifest};
use crate::domain::entities::workspace::{MirrorWorkspace, DEFAULT_BRANCH_NAME};
use crate::domain::value_objects::project_path::ProjectPath;
use crate::infrastructure::scm::scm_interface::{MirrorOperations, MirrorOutcome};

/// Settings for one mirror generation run
#[derive(Debug, Clone)]
pub struct GenerateMirrorsConfig {
    /// Maximum number of concurrent mirror jobs (`None` = number of CPUs)
    pub parallel_jobs: Option<usize>,

    /// Resolve and report the project list without touching any repository
    pub dry_run: bool,

    pub verbose: bool,

    /// Branch guaranteed to exist in every mirror
    pub default_branch: String,
}

impl Default for GenerateMirrorsConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: None,
            dry_run: false,
            verbose: false,
            default_branch: DEFAULT_BRANCH_NAME.to_string(),
        }
    }
}

impl GenerateMirrorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel_jobs(mut self, parallel_jobs: Option<usize>) -> Self {
        self.parallel_jobs = parallel_jobs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// State of a single project after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorStatus {
    /// Dry run: would be mirrored
    Planned,
    Created,
    Refreshed,
    /// Source missing or project name already handled
    Skipped,
    Failed,
}

/// Result for one project declaration
#[derive(Debug, Clone, Serialize)]
pub struct ProjectMirrorResult {
    pub name: String,
    pub path: ProjectPath,
    pub destination: PathBuf,
    pub status: MirrorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProjectMirrorResult {
    fn new(project: &ProjectDeclaration, destination: PathBuf, status: MirrorStatus) -> Self {
        Self {
            name: project.name.clone(),
            path: project.path.clone(),
            destination,
            status,
            message: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == MirrorStatus::Failed
    }
}

/// Aggregated outcome of a run, results in manifest order
#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_server: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<IncludeInfo>,

    pub results: Vec<ProjectMirrorResult>,

    pub created_count: usize,
    pub refreshed_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,

    pub dry_run: bool,
}

impl MirrorReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn add_result(&mut self, result: ProjectMirrorResult) {
        match result.status {
            MirrorStatus::Created => self.created_count += 1,
            MirrorStatus::Refreshed => self.refreshed_count += 1,
            MirrorStatus::Skipped => self.skipped_count += 1,
            MirrorStatus::Failed => self.failed_count += 1,
            MirrorStatus::Planned => {}
        }
        self.results.push(result);
    }

    /// At least one project failed to mirror; skips do not count
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    pub fn failed_results(&self) -> Vec<&ProjectMirrorResult> {
        self.results.iter().filter(|r| r.is_failure()).collect()
    }
}

/// Resolves the workspace manifest and mirrors every declared project
pub struct GenerateMirrorsUseCase {
    config: GenerateMirrorsConfig,
    workspace: MirrorWorkspace,
    mirror_ops: Arc<dyn MirrorOperations>,
}

impl GenerateMirrorsUseCase {
    pub fn new(
        config: GenerateMirrorsConfig,
        workspace: MirrorWorkspace,
        mirror_ops: Arc<dyn MirrorOperations>,
    ) -> Self {
        Self {
            config,
            workspace,
            mirror_ops,
        }
    }

    pub async fn execute(&self) -> RepoMirrorResult<MirrorReport> {
        // 1. Manifest resolution
        let resolved = self.resolve_manifest()?;

        let mut report = MirrorReport::new(self.config.dry_run);
        report.manifest_server = resolved.server.as_ref().map(|server| server.url.clone());
        report.includes = resolved.includes.clone();

        // 2. Duplicate policy: first declaration of a name wins
        let first_seen = first_declarations(&resolved.projects);
        let unique: Vec<ProjectDeclaration> = resolved
            .projects
            .iter()
            .zip(&first_seen)
            .filter(|(_, first)| **first)
            .map(|(project, _)| project.clone())
            .collect();

        // 3. Mirroring
        let mirrored = if self.config.dry_run {
            Vec::new()
        } else {
            self.prepare_output_dir()?;
            self.mirror_projects(&unique).await?
        };
        let mut mirrored = mirrored.into_iter();

        for (project, first) in resolved.projects.iter().zip(first_seen) {
            let destination = self.workspace.mirror_path(project);

            let result = if !first {
                tracing::warn!(
                    "Project {} is declared more than once, skipping duplicate at {}",
                    project.name,
                    project.path
                );
                ProjectMirrorResult::new(project, destination, MirrorStatus::Skipped)
                    .with_message("duplicate project name")
            } else if self.config.dry_run {
                ProjectMirrorResult::new(project, destination, MirrorStatus::Planned)
            } else {
                mirrored.next().ok_or_internal_error(format!(
                    "No mirror result for project {}",
                    project.name
                ))?
            };

            report.add_result(result);
        }

        Ok(report)
    }

    /// Load, flatten, validate and extract the workspace manifest
    pub fn resolve_manifest(&self) -> RepoMirrorResult<ResolvedManifest> {
        self.check_workspace_initialized()?;

        let service =
            ManifestService::new(ManifestProcessingOptions::new(self.workspace.include_root()));
        let resolved = service.resolve(&self.workspace.manifest_file_path())?;

        Ok(resolved)
    }

    fn check_workspace_initialized(&self) -> RepoMirrorResult<()> {
        if !self.workspace.has_manifest() {
            return Err(RepoMirrorError::workspace_not_initialized(
                self.workspace.root_path.clone(),
            ));
        }
        Ok(())
    }

    fn prepare_output_dir(&self) -> RepoMirrorResult<()> {
        let output_dir = self.workspace.output_dir();
        std::fs::create_dir_all(&output_dir)
            .with_filesystem_error("Failed to create output directory", Some(output_dir))
    }

    fn parallel_jobs(&self, project_count: usize) -> RepoMirrorResult<usize> {
        match self.config.parallel_jobs {
            Some(0) => Err(RepoMirrorError::config_error(
                "Number of parallel jobs must be at least 1",
            )),
            Some(jobs) => Ok(jobs),
            None => Ok(std::cmp::min(project_count, num_cpus::get()).max(1)),
        }
    }

    async fn mirror_projects(
        &self,
        projects: &[ProjectDeclaration],
    ) -> RepoMirrorResult<Vec<ProjectMirrorResult>> {
        let jobs = self.parallel_jobs(projects.len())?;
        if self.config.verbose {
            println!("Mirroring {} projects with {} jobs", projects.len(), jobs);
        }

        let semaphore = Arc::new(Semaphore::new(jobs));

        let tasks: Vec<_> = projects
            .iter()
            .map(|project| {
                let project = project.clone();
                let source = self.workspace.source_path(&project);
                let destination = self.workspace.mirror_path(&project);
                let default_branch = self.config.default_branch.clone();
                let mirror_ops = Arc::clone(&self.mirror_ops);
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|e| {
                        RepoMirrorError::internal_error_with_source("Failed to acquire semaphore", e)
                    })?;

                    Ok::<_, RepoMirrorError>(
                        mirror_project(
                            mirror_ops.as_ref(),
                            &project,
                            &source,
                            destination,
                            &default_branch,
                        )
                        .await,
                    )
                })
            })
            .collect();

        let results = join_all(tasks).await;

        results
            .into_iter()
            .zip(projects)
            .map(|(joined, project)| match joined {
                Ok(task_result) => task_result,
                Err(join_err) => {
                    let error = RepoMirrorError::mirror_error(
                        format!("Task join error: {}", join_err),
                        &project.name,
                    );
                    Ok(ProjectMirrorResult::new(
                        project,
                        self.workspace.mirror_path(project),
                        MirrorStatus::Failed,
                    )
                    .with_message(error.to_string()))
                }
            })
            .collect()
    }
}

async fn mirror_project(
    mirror_ops: &dyn MirrorOperations,
    project: &ProjectDeclaration,
    source: &Path,
    destination: PathBuf,
    default_branch: &str,
) -> ProjectMirrorResult {
    tracing::debug!(
        "Mirroring {} from {} to {}",
        project.name,
        source.display(),
        destination.display()
    );

    match mirror_ops.mirror(source, &destination, default_branch).await {
        Ok(MirrorOutcome::Created) => {
            tracing::info!("Created mirror {}", destination.display());
            ProjectMirrorResult::new(project, destination, MirrorStatus::Created)
        }
        Ok(MirrorOutcome::Refreshed) => {
            tracing::info!("Refreshed mirror {}", destination.display());
            ProjectMirrorResult::new(project, destination, MirrorStatus::Refreshed)
        }
        Ok(MirrorOutcome::Skipped { reason }) => {
            tracing::warn!("Skipping {}: {}", project.name, reason);
            ProjectMirrorResult::new(project, destination, MirrorStatus::Skipped)
                .with_message(reason)
        }
        Err(e) => {
            let error = RepoMirrorError::mirror_error_with_source(e.to_string(), &project.name, e);
            tracing::error!("{}", error);
            ProjectMirrorResult::new(project, destination, MirrorStatus::Failed)
                .with_message(error.to_string())
        }
    }
}

/// `true` at the first declaration of each project name
fn first_declarations(projects: &[ProjectDeclaration]) -> Vec<bool> {
    let mut seen = HashSet::new();
    projects
        .iter()
        .map(|project| seen.insert(project.name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::scm::scm_interface::{MockMirrorOperations, ScmError};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn workspace_with_manifest(manifest: &str) -> (TempDir, MirrorWorkspace) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = MirrorWorkspace::new(temp_dir.path());
        std::fs::create_dir_all(workspace.include_root()).unwrap();
        std::fs::write(workspace.manifest_file_path(), manifest).unwrap();
        (temp_dir, workspace)
    }

    fn statuses(report: &MirrorReport) -> Vec<(String, MirrorStatus)> {
        report
            .results
            .iter()
            .map(|r| (r.name.clone(), r.status))
            .collect()
    }

    #[test]
    fn test_config_builder() {
        let config = GenerateMirrorsConfig::new()
            .with_parallel_jobs(Some(4))
            .with_dry_run(true)
            .with_verbose(true);

        assert_eq!(config.parallel_jobs, Some(4));
        assert!(config.dry_run);
        assert!(config.verbose);
        assert_eq!(config.default_branch, "master");
    }

    #[test]
    fn test_report_counts() {
        let project = ProjectDeclaration::new("p", ProjectPath::new("p").unwrap());
        let mut report = MirrorReport::new(false);
        report.add_result(ProjectMirrorResult::new(
            &project,
            PathBuf::from("p.git"),
            MirrorStatus::Created,
        ));
        report.add_result(ProjectMirrorResult::new(
            &project,
            PathBuf::from("p.git"),
            MirrorStatus::Skipped,
        ));
        assert!(!report.has_failures());

        report.add_result(ProjectMirrorResult::new(
            &project,
            PathBuf::from("p.git"),
            MirrorStatus::Failed,
        ));
        assert_eq!(report.total_count(), 3);
        assert_eq!(report.created_count, 1);
        assert_eq!(report.skipped_count, 1);
        assert!(report.has_failures());
        assert_eq!(report.failed_results().len(), 1);
    }

    #[tokio::test]
    async fn test_workspace_without_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::default(),
            MirrorWorkspace::new(temp_dir.path()),
            Arc::new(MockMirrorOperations::new()),
        );

        let err = use_case.execute().await.unwrap_err();
        assert!(matches!(err, RepoMirrorError::WorkspaceNotInitialized { .. }));
        assert!(err.is_manifest_error());
    }

    #[tokio::test]
    async fn test_manifest_errors_abort_before_mirroring() {
        let (_temp_dir, workspace) = workspace_with_manifest(
            r#"<manifest><project name="evil" path="/etc/x"/></manifest>"#,
        );
        let mut mirror_ops = MockMirrorOperations::new();
        mirror_ops.expect_mirror().times(0);

        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::default(),
            workspace,
            Arc::new(mirror_ops),
        );

        let err = use_case.execute().await.unwrap_err();
        assert!(err.is_manifest_error());
    }

    #[tokio::test]
    async fn test_dry_run_lists_projects_without_mirroring() {
        let (_temp_dir, workspace) = workspace_with_manifest(
            r#"<manifest>
  <manifest-server url="http://review"/>
  <project name="p0"/>
  <project name="p1" path="vendor/p1"/>
  <project name="p0" path="other"/>
</manifest>"#,
        );
        let output_dir = workspace.output_dir();
        let mut mirror_ops = MockMirrorOperations::new();
        mirror_ops.expect_mirror().times(0);

        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::new().with_dry_run(true),
            workspace,
            Arc::new(mirror_ops),
        );
        let report = use_case.execute().await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.manifest_server.as_deref(), Some("http://review"));
        assert_eq!(
            statuses(&report),
            vec![
                ("p0".to_string(), MirrorStatus::Planned),
                ("p1".to_string(), MirrorStatus::Planned),
                ("p0".to_string(), MirrorStatus::Skipped),
            ]
        );
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_mirror_arguments() {
        let (temp_dir, workspace) = workspace_with_manifest(
            r#"<manifest><project name="platform/x" path="vendor/x"/></manifest>"#,
        );
        let expected_source = temp_dir.path().join("vendor/x");
        let expected_destination = temp_dir.path().join(".repo/output/platform/x.git");

        let mut mirror_ops = MockMirrorOperations::new();
        mirror_ops
            .expect_mirror()
            .withf(move |source, destination, branch| {
                source == expected_source.as_path()
                    && destination == expected_destination.as_path()
                    && branch == "master"
            })
            .times(1)
            .returning(|_, _, _| Ok(MirrorOutcome::Created));

        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::default(),
            workspace,
            Arc::new(mirror_ops),
        );
        let report = use_case.execute().await.unwrap();

        assert_eq!(report.created_count, 1);
        assert!(temp_dir.path().join(".repo/output").is_dir());
    }

    #[tokio::test]
    async fn test_outcomes_are_reported_in_manifest_order() {
        let (_temp_dir, workspace) = workspace_with_manifest(
            r#"<manifest>
  <project name="created"/>
  <project name="refreshed"/>
  <project name="missing"/>
  <project name="broken"/>
  <project name="created"/>
</manifest>"#,
        );

        let mut mirror_ops = MockMirrorOperations::new();
        mirror_ops
            .expect_mirror()
            .times(4)
            .returning(|source, _, _| {
                match source.file_name().and_then(|n| n.to_str()) {
                    Some("created") => Ok(MirrorOutcome::Created),
                    Some("refreshed") => Ok(MirrorOutcome::Refreshed),
                    Some("missing") => Ok(MirrorOutcome::Skipped {
                        reason: "not exists".to_string(),
                    }),
                    _ => Err(ScmError::mirror_failed("fetch failed")),
                }
            });

        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::new().with_parallel_jobs(Some(2)),
            workspace,
            Arc::new(mirror_ops),
        );
        let report = use_case.execute().await.unwrap();

        assert_eq!(
            statuses(&report),
            vec![
                ("created".to_string(), MirrorStatus::Created),
                ("refreshed".to_string(), MirrorStatus::Refreshed),
                ("missing".to_string(), MirrorStatus::Skipped),
                ("broken".to_string(), MirrorStatus::Failed),
                ("created".to_string(), MirrorStatus::Skipped),
            ]
        );
        assert_eq!(report.created_count, 1);
        assert_eq!(report.refreshed_count, 1);
        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.failed_count, 1);
        assert!(report.has_failures());

        let failure = report.failed_results()[0];
        assert!(failure.message.as_deref().unwrap().contains("fetch failed"));
    }

    #[tokio::test]
    async fn test_zero_jobs_is_rejected() {
        let (_temp_dir, workspace) =
            workspace_with_manifest(r#"<manifest><project name="p"/></manifest>"#);

        let use_case = GenerateMirrorsUseCase::new(
            GenerateMirrorsConfig::new().with_parallel_jobs(Some(0)),
            workspace,
            Arc::new(MockMirrorOperations::new()),
        );

        let err = use_case.execute().await.unwrap_err();
        assert!(matches!(err, RepoMirrorError::ConfigError { .. }));
    }
}
