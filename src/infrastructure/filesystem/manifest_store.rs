use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use crate::application::services::manifest_service::ManifestError;
use crate::domain::entities::manifest::{ManifestDocument, ManifestNode, MANIFEST_ELEMENT};

/// Reads manifest files from disk into [`ManifestNode`] trees
///
/// Each call reads exactly one file; nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore;

impl ManifestStore {
    pub fn new() -> Self {
        Self
    }

    /// Read one manifest file and return its `<manifest>` container
    pub fn read_manifest<P: AsRef<Path>>(
        &self,
        manifest_path: P,
    ) -> Result<ManifestDocument, ManifestError> {
        let manifest_path = manifest_path.as_ref();

        let content = std::fs::read_to_string(manifest_path)
            .map_err(|e| ManifestError::parse_failure(manifest_path, e.to_string()))?;

        let root = self.parse_manifest(&content, manifest_path)?;
        tracing::debug!(
            "Loaded manifest {} ({} elements)",
            manifest_path.display(),
            root.children.len()
        );

        Ok(ManifestDocument {
            path: manifest_path.to_path_buf(),
            root,
        })
    }

    /// Parse manifest XML; `path` is only used to label errors
    pub fn parse_manifest(&self, content: &str, path: &Path) -> Result<ManifestNode, ManifestError> {
        let root = parse_tree(content.trim_start_matches('\u{feff}'), path)?
            .ok_or_else(|| ManifestError::parse_failure(path, "no root node"))?;

        if root.name != MANIFEST_ELEMENT {
            return Err(ManifestError::parse_failure(
                path,
                format!("no <{}> root element (found <{}>)", MANIFEST_ELEMENT, root.name),
            ));
        }

        Ok(root)
    }
}

/// Build the element tree of a document; `None` when it has no element at all
fn parse_tree(content: &str, path: &Path) -> Result<Option<ManifestNode>, ManifestError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut open: Vec<ManifestNode> = Vec::new();
    let mut root: Option<ManifestNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if open.is_empty() && root.is_some() {
                    return Err(ManifestError::parse_failure(
                        path,
                        "multiple top-level elements",
                    ));
                }
                open.push(element_from(e, path)?);
            }
            Ok(Event::Empty(ref e)) => {
                let node = element_from(e, path)?;
                attach(node, &mut open, &mut root, path)?;
            }
            Ok(Event::End(_)) => {
                let node = open.pop().ok_or_else(|| {
                    ManifestError::parse_failure(path, "unexpected closing tag")
                })?;
                attach(node, &mut open, &mut root, path)?;
            }
            Ok(Event::Text(ref text)) => {
                if open.is_empty() && !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ManifestError::parse_failure(
                        path,
                        "text outside of the root element",
                    ));
                }
            }
            Ok(Event::CData(_)) | Ok(Event::GeneralRef(_)) if open.is_empty() => {
                return Err(ManifestError::parse_failure(
                    path,
                    "text outside of the root element",
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ManifestError::parse_failure(
                    path,
                    format!("{} at byte {}", e, reader.error_position()),
                ));
            }
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ManifestError::parse_failure(
            path,
            format!("unclosed element <{}>", unclosed.name),
        ));
    }

    Ok(root)
}

fn attach(
    node: ManifestNode,
    open: &mut [ManifestNode],
    root: &mut Option<ManifestNode>,
    path: &Path,
) -> Result<(), ManifestError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(ManifestError::parse_failure(
                path,
                "multiple top-level elements",
            ));
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn element_from(e: &BytesStart, path: &Path) -> Result<ManifestNode, ManifestError> {
    let mut node = ManifestNode::new(String::from_utf8_lossy(e.name().as_ref()));

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            ManifestError::parse_failure(path, format!("invalid attribute: {}", err))
        })?;
        let value = attr.unescape_value().map_err(|err| {
            ManifestError::parse_failure(path, format!("invalid attribute value: {}", err))
        })?;
        node.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }

    Ok(node)
}
