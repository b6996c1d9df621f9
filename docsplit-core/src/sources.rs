use crate::error::DocsplitError;
use crate::types::{FetchedDocument, SourceKind};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Where raw documents come from. Network fetch and authentication live
/// behind implementations of this trait, outside the core.
pub trait DocumentSource: Send + Sync {
    /// `Ok(None)` when the source has no document with this id.
    fn fetch_document(&self, id: &str) -> Result<Option<FetchedDocument>>;

    fn name(&self) -> &str;
}

/// Documents stored as `<id>.html`, `<id>.htm` or `<id>.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

const CANDIDATE_EXTENSIONS: [(&str, SourceKind); 3] = [
    ("html", SourceKind::Html),
    ("htm", SourceKind::Html),
    ("json", SourceKind::DocsJson),
];

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_id(id: &str) -> Result<(), DocsplitError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(DocsplitError::InvalidIdentifier {
                field: "document_id",
                value: id.to_string(),
            })
        }
    }
}

impl DocumentSource for FileSource {
    fn fetch_document(&self, id: &str) -> Result<Option<FetchedDocument>> {
        Self::validate_id(id)?;

        for (extension, kind) in CANDIDATE_EXTENSIONS {
            let path = self.root.join(format!("{id}.{extension}"));
            if path.is_file() {
                tracing::debug!("Resolved document {} to {}", id, path.display());
                let bytes = std::fs::read(&path)?;
                return Ok(Some(FetchedDocument {
                    id: id.to_string(),
                    kind,
                    bytes,
                }));
            }
        }

        tracing::warn!("⚠️  Document {} not found under {}", id, self.root.display());
        Ok(None)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolves_by_extension_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("doc1.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("doc2.htm"), b"<p>x</p>").unwrap();

        let source = FileSource::new(dir.path());
        let json = source.fetch_document("doc1").unwrap().unwrap();
        assert_eq!(json.kind, SourceKind::DocsJson);
        assert_eq!(json.bytes, b"{}");

        let html = source.fetch_document("doc2").unwrap().unwrap();
        assert_eq!(html.kind, SourceKind::Html);
        assert!(source.fetch_document("missing").unwrap().is_none());
    }

    #[test]
    fn rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let source = FileSource::new(dir.path());
        let err = source.fetch_document("../etc/passwd").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocsplitError>(),
            Some(DocsplitError::InvalidIdentifier { field: "document_id", .. })
        ));
    }
}
