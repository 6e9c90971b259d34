//! # Build Metadata Document
//!
//! Every uploaded file leaves one [`ArtifactRecord`] in an XML document stored
//! inside the build's artifacts directory:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <artifacts>
//!   <artifact path="build/output.jar" name="output.jar" sha1="…" serverId="…"
//!             serverUrl="https://nexus.example.com" repository="releases"
//!             deleteArtifactOnCleanup="true" featureId="BUILD_EXT_1"/>
//! </artifacts>
//! ```
//!
//! Records are immutable once written; new uploads append. Writes go through a
//! temporary file in the same directory and a rename, so readers see either
//! the previous document or the new one. Locking is the caller's job: hold the
//! directory's read lock around [`MetadataStore::read`] and its write lock
//! around [`MetadataStore::append`] / [`MetadataStore::write`].

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::NEXUS_BUILD_METADATA_PATH;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// One uploaded file as remembered for cleanup and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    /// Pattern or relative path from the upload specification.
    pub path: String,
    /// Base name of the resolved file.
    pub name: String,
    /// Lowercase hex SHA-1 of the uploaded bytes.
    pub sha1: String,
    pub server_id: String,
    pub server_url: String,
    pub repository: String,
    /// Delete flag snapshotted at upload time. `None` in documents written
    /// without it; cleanup then consults the owning feature.
    pub delete_on_cleanup: Option<bool>,
    /// Id of the push feature that uploaded the file.
    pub feature_id: Option<String>,
}

/// Ordered records of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDocument {
    pub artifacts: Vec<ArtifactRecord>,
}

// -- XML wire format ----------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "artifacts")]
struct ArtifactsElement {
    #[serde(rename = "artifact", default)]
    artifact: Vec<ArtifactElement>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArtifactElement {
    #[serde(rename = "@path", default)]
    path: String,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@sha1", default)]
    sha1: String,
    #[serde(rename = "@serverId", default)]
    server_id: String,
    #[serde(rename = "@serverUrl", default)]
    server_url: String,
    #[serde(rename = "@repository", default)]
    repository: String,
    #[serde(
        rename = "@deleteArtifactOnCleanup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    delete_artifact_on_cleanup: Option<String>,
    #[serde(rename = "@featureId", default, skip_serializing_if = "Option::is_none")]
    feature_id: Option<String>,
}

impl From<&ArtifactRecord> for ArtifactElement {
    fn from(r: &ArtifactRecord) -> Self {
        Self {
            path: r.path.clone(),
            name: r.name.clone(),
            sha1: r.sha1.clone(),
            server_id: r.server_id.clone(),
            server_url: r.server_url.clone(),
            repository: r.repository.clone(),
            delete_artifact_on_cleanup: r.delete_on_cleanup.map(|b| b.to_string()),
            feature_id: r.feature_id.clone(),
        }
    }
}

impl From<ArtifactElement> for ArtifactRecord {
    fn from(e: ArtifactElement) -> Self {
        Self {
            path: e.path,
            name: e.name,
            sha1: e.sha1,
            server_id: e.server_id,
            server_url: e.server_url,
            repository: e.repository,
            delete_on_cleanup: e.delete_artifact_on_cleanup.map(|v| v == "true"),
            feature_id: e.feature_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

impl MetadataDocument {
    pub fn new(artifacts: Vec<ArtifactRecord>) -> Self {
        Self { artifacts }
    }

    /// Render the document, declaration included.
    pub fn to_xml(&self) -> Result<String, MetadataError> {
        let wire = ArtifactsElement {
            artifact: self.artifacts.iter().map(ArtifactElement::from).collect(),
        };
        let mut xml = String::from(XML_DECLARATION);
        let mut ser = quick_xml::se::Serializer::new(&mut xml);
        ser.indent(' ', 2);
        wire.serialize(ser)
            .map_err(|e| MetadataError::Xml(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self, MetadataError> {
        let wire: ArtifactsElement =
            quick_xml::de::from_str(xml).map_err(|e| MetadataError::Xml(e.to_string()))?;
        Ok(Self {
            artifacts: wire.artifact.into_iter().map(ArtifactRecord::from).collect(),
        })
    }
}

// -- Store --------------------------------------------------------------------

/// Reads and writes the metadata document of a build.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    relative_path: PathBuf,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self {
            relative_path: PathBuf::from(NEXUS_BUILD_METADATA_PATH),
        }
    }
}

impl MetadataStore {
    pub fn path_in(&self, artifacts_dir: &Path) -> PathBuf {
        artifacts_dir.join(&self.relative_path)
    }

    pub fn exists(&self, artifacts_dir: &Path) -> bool {
        self.path_in(artifacts_dir).is_file()
    }

    /// Read the document. `Ok(None)` when the build has none.
    pub fn read(&self, artifacts_dir: &Path) -> Result<Option<MetadataDocument>, MetadataError> {
        let path = self.path_in(artifacts_dir);
        let xml = match std::fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MetadataError::Io { path, source }),
        };
        MetadataDocument::from_xml(&xml)
            .map(Some)
            .map_err(|e| MetadataError::Corrupt {
                path,
                reason: e.to_string(),
            })
    }

    /// Replace the document atomically.
    pub fn write(&self, artifacts_dir: &Path, doc: &MetadataDocument) -> Result<(), MetadataError> {
        let path = self.path_in(artifacts_dir);
        let xml = doc.to_xml()?;
        let dir = path.parent().unwrap_or(artifacts_dir);
        std::fs::create_dir_all(dir).map_err(|source| MetadataError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let io_err = |source| MetadataError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(xml.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Append records to whatever the build already has. A corrupt document
    /// is replaced. Returns the number of records now stored.
    pub fn append(
        &self,
        artifacts_dir: &Path,
        records: &[ArtifactRecord],
    ) -> Result<usize, MetadataError> {
        let mut doc = match self.read(artifacts_dir) {
            Ok(doc) => doc.unwrap_or_default(),
            Err(MetadataError::Corrupt { path, reason }) => {
                tracing::warn!(
                    path = %path.display(),
                    "replacing unreadable nexus metadata: {reason}"
                );
                MetadataDocument::default()
            }
            Err(e) => return Err(e),
        };
        doc.artifacts.extend_from_slice(records);
        self.write(artifacts_dir, &doc)?;
        Ok(doc.artifacts.len())
    }
}

/// Errors reading or writing the metadata document.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// File system failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The document exists but is not a valid artifacts document.
    #[error("corrupt metadata document {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    /// XML encoding or decoding failure.
    #[error("XML error: {0}")]
    Xml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, sha1: &str) -> ArtifactRecord {
        ArtifactRecord {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            sha1: sha1.to_string(),
            server_id: "srv-1".into(),
            server_url: "https://nexus.example.com".into(),
            repository: "releases".into(),
            delete_on_cleanup: Some(true),
            feature_id: Some("BUILD_EXT_1".into()),
        }
    }

    #[test]
    fn xml_uses_attribute_per_field() {
        let doc = MetadataDocument::new(vec![record("build/output.jar", "abc123")]);
        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<artifacts>"));
        assert!(xml.contains(r#"path="build/output.jar""#));
        assert!(xml.contains(r#"name="output.jar""#));
        assert!(xml.contains(r#"sha1="abc123""#));
        assert!(xml.contains(r#"serverId="srv-1""#));
        assert!(xml.contains(r#"deleteArtifactOnCleanup="true""#));
        assert!(xml.contains(r#"featureId="BUILD_EXT_1""#));
    }

    #[test]
    fn optional_attributes_are_omitted() {
        let mut r = record("a.jar", "00");
        r.delete_on_cleanup = None;
        r.feature_id = None;
        let xml = MetadataDocument::new(vec![r]).to_xml().unwrap();
        assert!(!xml.contains("deleteArtifactOnCleanup"));
        assert!(!xml.contains("featureId"));
    }

    #[test]
    fn reads_document_written_by_other_tools() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<artifacts>
  <artifact path="dist/app.zip" name="app.zip" sha1="ff" serverId="s" serverUrl="http://n" repository="raw" deleteArtifactOnCleanup="false" />
  <artifact path="dist/app.pom" name="app.pom" sha1="ee" serverId="s" serverUrl="http://n" repository="raw" featureId="BUILD_EXT_2" />
</artifacts>
"#;
        let doc = MetadataDocument::from_xml(xml).unwrap();
        assert_eq!(doc.artifacts.len(), 2);
        assert_eq!(doc.artifacts[0].delete_on_cleanup, Some(false));
        assert_eq!(doc.artifacts[0].feature_id, None);
        assert_eq!(doc.artifacts[1].delete_on_cleanup, None);
        assert_eq!(doc.artifacts[1].feature_id.as_deref(), Some("BUILD_EXT_2"));
    }

    #[test]
    fn non_true_flag_reads_as_false() {
        let xml = r#"<artifacts><artifact sha1="1" deleteArtifactOnCleanup="yes"/></artifacts>"#;
        let doc = MetadataDocument::from_xml(xml).unwrap();
        assert_eq!(doc.artifacts[0].delete_on_cleanup, Some(false));
        assert_eq!(doc.artifacts[0].server_id, "");
    }

    #[test]
    fn empty_root_has_no_records() {
        let doc = MetadataDocument::from_xml("<artifacts/>").unwrap();
        assert!(doc.artifacts.is_empty());
    }

    #[test]
    fn store_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::default();
        assert!(store.read(dir.path()).unwrap().is_none());
        assert!(!store.exists(dir.path()));
    }

    #[test]
    fn store_write_then_read_in_teamcity_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::default();
        let doc = MetadataDocument::new(vec![record("build/output.jar", "da39")]);
        store.write(dir.path(), &doc).unwrap();
        assert!(dir.path().join(".teamcity/nexus-metadata.xml").is_file());
        assert_eq!(store.read(dir.path()).unwrap(), Some(doc));
    }

    #[test]
    fn store_append_keeps_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::default();
        assert_eq!(store.append(dir.path(), &[record("a.jar", "01")]).unwrap(), 1);
        assert_eq!(store.append(dir.path(), &[record("b.jar", "02")]).unwrap(), 2);
        let doc = store.read(dir.path()).unwrap().unwrap();
        let paths: Vec<&str> = doc.artifacts.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.jar", "b.jar"]);
    }

    #[test]
    fn corrupt_document_is_reported_and_replaced_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::default();
        let path = store.path_in(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "<artifacts><artifact").unwrap();

        assert!(matches!(
            store.read(dir.path()),
            Err(MetadataError::Corrupt { .. })
        ));
        assert_eq!(store.append(dir.path(), &[record("c.jar", "03")]).unwrap(), 1);
    }
}
