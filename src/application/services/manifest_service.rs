use crate::domain::entities::manifest::{
    ElementKind, FlattenedManifest, IncludeInfo, ManifestNode, ProjectDeclaration,
    ResolvedManifest, ResolvedNode, ServerDeclaration, INCLUDE_ELEMENT, MANIFEST_SERVER_ELEMENT,
    PROJECT_ELEMENT,
};
use crate::domain::value_objects::project_path::{ProjectPath, ProjectPathError};
use crate::infrastructure::filesystem::manifest_store::ManifestStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Manifest resolution errors; every variant aborts the whole pass
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("error parsing manifest {}: {cause}", path.display())]
    ParseFailure { path: PathBuf, cause: String },

    #[error("no {attribute} in <{element}> within {}", file.display())]
    MissingAttribute {
        attribute: String,
        element: String,
        file: PathBuf,
    },

    #[error("include {name} doesn't exist or isn't a file ({})", path.display())]
    IncludeNotFound { name: String, path: PathBuf },

    #[error("failed parsing included manifest {included_name} from {}: {source}", including_file.display())]
    IncludeResolutionFailure {
        included_name: String,
        including_file: PathBuf,
        #[source]
        source: Box<ManifestError>,
    },

    #[error("include cycle detected: {}", format_chain(chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    #[error("duplicate manifest-server in {} (first declared in {})", file.display(), first_file.display())]
    DuplicateServerDeclaration { file: PathBuf, first_file: PathBuf },

    #[error("project {name} has an unsafe path: {path}")]
    UnsafePath { name: String, path: String },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ManifestError {
    pub fn parse_failure(path: &Path, cause: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }

    pub fn missing_attribute(attribute: &str, element: &str, file: &Path) -> Self {
        Self::MissingAttribute {
            attribute: attribute.to_string(),
            element: element.to_string(),
            file: file.to_path_buf(),
        }
    }

    /// The innermost error behind any number of include wrappers
    pub fn root_cause(&self) -> &ManifestError {
        let mut current = self;
        while let Self::IncludeResolutionFailure { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Resolution settings
#[derive(Debug, Clone)]
pub struct ManifestProcessingOptions {
    /// Directory that `<include name="..."/>` is resolved against
    pub include_root: PathBuf,
}

impl ManifestProcessingOptions {
    pub fn new(include_root: impl Into<PathBuf>) -> Self {
        Self {
            include_root: include_root.into(),
        }
    }
}

/// Resolves a manifest and its includes into a validated project list
pub struct ManifestService {
    options: ManifestProcessingOptions,
    store: ManifestStore,
}

impl ManifestService {
    pub fn new(options: ManifestProcessingOptions) -> Self {
        Self {
            options,
            store: ManifestStore::new(),
        }
    }

    /// Full pass: flatten, validate, extract
    pub fn resolve(&self, manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
        let flattened = self.flatten(manifest_path)?;
        let server = self.validate(&flattened)?;
        let projects = self.extract_projects(&flattened)?;

        tracing::info!(
            "Resolved {} projects from {} ({} includes)",
            projects.len(),
            manifest_path.display(),
            flattened.includes.len()
        );

        Ok(ResolvedManifest {
            server,
            projects,
            includes: flattened.includes,
        })
    }

    /// Replace every include with the contents of its target, depth-first
    pub fn flatten(&self, manifest_path: &Path) -> Result<FlattenedManifest, ManifestError> {
        let mut flattened = FlattenedManifest::default();
        let mut resolving = Vec::new();
        self.flatten_into(manifest_path, &mut resolving, &mut flattened)?;
        Ok(flattened)
    }

    fn flatten_into(
        &self,
        manifest_path: &Path,
        resolving: &mut Vec<PathBuf>,
        out: &mut FlattenedManifest,
    ) -> Result<(), ManifestError> {
        let identity = file_identity(manifest_path);
        if let Some(start) = resolving.iter().position(|p| *p == identity) {
            let mut chain = resolving[start..].to_vec();
            chain.push(identity);
            return Err(ManifestError::IncludeCycle { chain });
        }

        let document = self.store.read_manifest(manifest_path)?;
        let origin = Arc::new(document.path);

        resolving.push(identity);
        for child in document.root.children {
            match child.kind() {
                ElementKind::Include => {
                    let name = required_attribute(&child, "name", INCLUDE_ELEMENT, &origin)?;
                    self.splice_include(&name, &origin, resolving, out)
                        .map_err(|cause| ManifestError::IncludeResolutionFailure {
                            included_name: name.clone(),
                            including_file: origin.to_path_buf(),
                            source: Box::new(cause),
                        })?;
                }
                _ => out.nodes.push(ResolvedNode::new(child, origin.clone())),
            }
        }
        resolving.pop();

        Ok(())
    }

    fn splice_include(
        &self,
        name: &str,
        including_file: &Path,
        resolving: &mut Vec<PathBuf>,
        out: &mut FlattenedManifest,
    ) -> Result<(), ManifestError> {
        let target = self.options.include_root.join(name);
        if !target.is_file() {
            return Err(ManifestError::IncludeNotFound {
                name: name.to_string(),
                path: target,
            });
        }

        tracing::debug!(
            "Including {} from {}",
            target.display(),
            including_file.display()
        );

        let before = out.nodes.len();
        self.flatten_into(&target, resolving, out)?;
        out.includes.push(IncludeInfo {
            name: name.to_string(),
            path: target,
            node_count: out.nodes.len() - before,
        });

        Ok(())
    }

    /// Enforce at most one `<manifest-server>` across the whole flattened manifest
    pub fn validate(
        &self,
        flattened: &FlattenedManifest,
    ) -> Result<Option<ServerDeclaration>, ManifestError> {
        let mut server: Option<ServerDeclaration> = None;

        for resolved in flattened.of_kind(ElementKind::ManifestServer) {
            let url = required_attribute(
                &resolved.node,
                "url",
                MANIFEST_SERVER_ELEMENT,
                resolved.origin(),
            )?;

            if let Some(first) = &server {
                return Err(ManifestError::DuplicateServerDeclaration {
                    file: resolved.origin().to_path_buf(),
                    first_file: first.origin.clone(),
                });
            }

            server = Some(ServerDeclaration {
                url,
                origin: resolved.origin().to_path_buf(),
            });
        }

        Ok(server)
    }

    /// Project declarations in document order; duplicates are kept
    pub fn extract_projects(
        &self,
        flattened: &FlattenedManifest,
    ) -> Result<Vec<ProjectDeclaration>, ManifestError> {
        flattened
            .of_kind(ElementKind::Project)
            .map(|resolved| {
                let name =
                    required_attribute(&resolved.node, "name", PROJECT_ELEMENT, resolved.origin())?;
                let unsafe_path = |e: ProjectPathError| match e {
                    ProjectPathError::Absolute(path) | ProjectPathError::ParentTraversal(path) => {
                        ManifestError::UnsafePath {
                            name: name.clone(),
                            path,
                        }
                    }
                    ProjectPathError::Empty => {
                        ManifestError::missing_attribute("name", PROJECT_ELEMENT, resolved.origin())
                    }
                };

                ProjectPath::validate_name(&name).map_err(unsafe_path)?;
                let path = ProjectPath::from_declaration(&name, resolved.node.attribute("path"))
                    .map_err(unsafe_path)?;

                tracing::debug!("project name: {} path: {}", name, path);
                Ok(ProjectDeclaration::new(name, path))
            })
            .collect()
    }
}

fn required_attribute(
    node: &ManifestNode,
    attribute: &str,
    element: &str,
    file: &Path,
) -> Result<String, ManifestError> {
    node.non_empty_attribute(attribute)
        .map(str::to_string)
        .ok_or_else(|| ManifestError::missing_attribute(attribute, element, file))
}

/// Canonical path when it can be determined, the path as given otherwise
fn file_identity(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
