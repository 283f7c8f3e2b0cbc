use crate::domain::value_objects::project_path::ProjectPath;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tag of the top-level container element
pub const MANIFEST_ELEMENT: &str = "manifest";
/// Tag of an inclusion directive
pub const INCLUDE_ELEMENT: &str = "include";
/// Tag of the server declaration
pub const MANIFEST_SERVER_ELEMENT: &str = "manifest-server";
/// Tag of a project declaration
pub const PROJECT_ELEMENT: &str = "project";

/// Generic element of a parsed manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNode {
    /// Element tag
    pub name: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Child elements in document order
    pub children: Vec<ManifestNode>,
}

impl ManifestNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Attribute value, if present
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, treating an empty string as absent
    pub fn non_empty_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).filter(|value| !value.is_empty())
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::classify(&self.name)
    }
}

/// Role of a manifest element, decided once right after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<include name="..."/>`
    Include,
    /// `<manifest-server url="..."/>`
    ManifestServer,
    /// `<project name="..." path="..."/>`
    Project,
    /// Anything else; carried through untouched
    Other,
}

impl ElementKind {
    pub fn classify(tag: &str) -> Self {
        match tag {
            INCLUDE_ELEMENT => Self::Include,
            MANIFEST_SERVER_ELEMENT => Self::ManifestServer,
            PROJECT_ELEMENT => Self::Project,
            _ => Self::Other,
        }
    }
}

/// One manifest file after loading: its path and the `<manifest>` container
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    pub path: PathBuf,
    pub root: ManifestNode,
}

/// Element of the flattened sequence, tagged with its kind and originating file
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub kind: ElementKind,
    pub node: ManifestNode,
    pub origin: Arc<PathBuf>,
}

impl ResolvedNode {
    pub fn new(node: ManifestNode, origin: Arc<PathBuf>) -> Self {
        Self {
            kind: node.kind(),
            node,
            origin,
        }
    }

    pub fn origin(&self) -> &Path {
        self.origin.as_path()
    }
}

/// Record of one include that was spliced during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeInfo {
    /// Value of the directive's `name` attribute
    pub name: String,

    /// Resolved file under the include root
    pub path: PathBuf,

    /// Number of elements the include contributed (after its own includes)
    pub node_count: usize,
}

/// All includes replaced by their contents, in document order
#[derive(Debug, Clone, Default)]
pub struct FlattenedManifest {
    pub nodes: Vec<ResolvedNode>,
    pub includes: Vec<IncludeInfo>,
}

impl FlattenedManifest {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.iter()
    }

    /// Elements of one kind, in order
    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }
}

/// The single `<manifest-server>` of a resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerDeclaration {
    pub url: String,
    pub origin: PathBuf,
}

/// A project to mirror
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectDeclaration {
    /// Project name; also names the mirror under the output root
    pub name: String,

    /// Checkout path relative to the working-tree root
    pub path: ProjectPath,
}

impl ProjectDeclaration {
    pub fn new(name: impl Into<String>, path: ProjectPath) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

/// Output of a full resolution pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDeclaration>,

    pub projects: Vec<ProjectDeclaration>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<IncludeInfo>,
}

impl ResolvedManifest {
    pub fn project_names(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_by_tag() {
        assert_eq!(ElementKind::classify("include"), ElementKind::Include);
        assert_eq!(
            ElementKind::classify("manifest-server"),
            ElementKind::ManifestServer
        );
        assert_eq!(ElementKind::classify("project"), ElementKind::Project);
        assert_eq!(ElementKind::classify("remote"), ElementKind::Other);
        assert_eq!(ElementKind::classify("Project"), ElementKind::Other);
    }

    #[test]
    fn test_attribute_lookup() {
        let node = ManifestNode::new("project")
            .with_attribute("name", "libfoo")
            .with_attribute("path", "");

        assert_eq!(node.attribute("name"), Some("libfoo"));
        assert_eq!(node.attribute("path"), Some(""));
        assert_eq!(node.non_empty_attribute("path"), None);
        assert_eq!(node.attribute("revision"), None);
        assert_eq!(node.kind(), ElementKind::Project);
    }

    #[test]
    fn test_flattened_manifest_filters_by_kind() {
        let origin = Arc::new(PathBuf::from("manifest.xml"));
        let flattened = FlattenedManifest {
            nodes: vec![
                ResolvedNode::new(ManifestNode::new("remote"), origin.clone()),
                ResolvedNode::new(ManifestNode::new("project"), origin.clone()),
                ResolvedNode::new(ManifestNode::new("project"), origin),
            ],
            includes: Vec::new(),
        };

        assert_eq!(flattened.len(), 3);
        assert_eq!(flattened.of_kind(ElementKind::Project).count(), 2);
        assert_eq!(flattened.of_kind(ElementKind::ManifestServer).count(), 0);
    }
}
