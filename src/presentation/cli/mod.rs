use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use crate::application::use_cases::generate_mirrors::{
    GenerateMirrorsConfig, GenerateMirrorsUseCase, MirrorReport, MirrorStatus,
};
use crate::common::error::RepoMirrorError;
use crate::common::result::{RepoMirrorResult, ResultExt};
use crate::domain::entities::workspace::MirrorWorkspace;
use crate::infrastructure::scm::git_scm::GitScm;

/// Every mirror was generated, refreshed or skipped
pub const EXIT_SUCCESS: i32 = 0;
/// I/O, configuration or internal failure
pub const EXIT_FAILURE: i32 = 1;
/// Top-level manifest missing or structurally invalid
pub const EXIT_MANIFEST_ERROR: i32 = 2;
/// At least one project failed to mirror
pub const EXIT_MIRROR_FAILURE: i32 = 3;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

/// Output format options for the project report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// repomirror - generate bare mirror repositories from a repo manifest
#[derive(Parser, Debug)]
#[command(name = "repomirror")]
#[command(about = "Generate bare mirror repositories for every project of a repo manifest")]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Working directory containing .repo (defaults to current directory)
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,

    /// Number of parallel mirror jobs (defaults to the number of CPUs)
    #[arg(short, long, env = "REPOMIRROR_JOBS")]
    pub jobs: Option<usize>,

    /// Resolve the manifest and list projects without mirroring
    #[arg(long)]
    pub dry_run: bool,

    /// Output format (text, json, yaml)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Map an error that aborted the run to the process exit code
pub fn exit_code_for(error: &RepoMirrorError) -> i32 {
    if error.is_manifest_error() {
        EXIT_MANIFEST_ERROR
    } else {
        EXIT_FAILURE
    }
}

/// Exit code of a run that completed
pub fn exit_code_for_report(report: &MirrorReport) -> i32 {
    if report.has_failures() {
        EXIT_MIRROR_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    pub async fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color);

        let code = match self.execute().await {
            Ok(report) => exit_code_for_report(&report),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                exit_code_for(&e)
            }
        };

        if code != EXIT_SUCCESS {
            exit(code);
        }
        Ok(())
    }

    async fn execute(&self) -> RepoMirrorResult<MirrorReport> {
        let workspace = MirrorWorkspace::new(self.working_directory()?);

        let config = GenerateMirrorsConfig::new()
            .with_parallel_jobs(self.cli.jobs)
            .with_dry_run(self.cli.dry_run)
            .with_verbose(self.cli.verbose);

        let use_case = GenerateMirrorsUseCase::new(config, workspace, Arc::new(GitScm::new()));

        if self.cli.format == OutputFormat::Text && !self.cli.dry_run {
            println!("{} Generating mirrors...", "::".blue().bold());
        }

        let report = use_case.execute().await?;

        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
            OutputFormat::Text if report.dry_run => self.print_project_list(&report),
            OutputFormat::Text => self.print_report(&report),
        }

        Ok(report)
    }

    /// Absolute working directory; mirrors are fetched from paths under it
    fn working_directory(&self) -> RepoMirrorResult<PathBuf> {
        let directory = match &self.cli.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .with_filesystem_error("Failed to determine current directory", None)?,
        };

        std::fs::canonicalize(&directory)
            .with_filesystem_error("Working directory not found", Some(directory))
    }

    fn print_project_list(&self, report: &MirrorReport) {
        if let Some(server) = &report.manifest_server {
            println!("{} {}", "manifest-server:".bold(), server);
        }
        println!(
            "{} {} projects in manifest",
            "::".blue().bold(),
            report.total_count()
        );

        for result in &report.results {
            match result.status {
                MirrorStatus::Skipped => println!(
                    "  {} {} ({})",
                    result.name.dimmed(),
                    result.path.as_str().dimmed(),
                    result.message.as_deref().unwrap_or("skipped").yellow()
                ),
                _ => println!("  {} {}", result.name.bold(), result.path),
            }

            if self.cli.verbose {
                println!("    -> {}", result.destination.display());
            }
        }
    }

    fn print_report(&self, report: &MirrorReport) {
        for result in &report.results {
            let message = result.message.as_deref().unwrap_or_default();
            match result.status {
                MirrorStatus::Created => {
                    println!("{} {} created", "✓".green().bold(), result.name.bold())
                }
                MirrorStatus::Refreshed => {
                    println!("{} {} refreshed", "✓".green().bold(), result.name.bold())
                }
                MirrorStatus::Skipped => println!(
                    "{} {} skipped: {}",
                    "⚠".yellow().bold(),
                    result.name.bold(),
                    message
                ),
                MirrorStatus::Failed => println!(
                    "{} {} failed: {}",
                    "✗".red().bold(),
                    result.name.bold(),
                    message.red()
                ),
                MirrorStatus::Planned => {}
            }

            if self.cli.verbose {
                println!("    -> {}", result.destination.display());
            }
        }

        let summary = format!(
            "{} created, {} refreshed, {} skipped, {} failed",
            report.created_count, report.refreshed_count, report.skipped_count, report.failed_count
        );
        if report.has_failures() {
            println!("{} Some mirrors failed: {}", "✗".red().bold(), summary);
        } else {
            println!("{} Mirrors generated: {}", "✓".green().bold(), summary);
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}
