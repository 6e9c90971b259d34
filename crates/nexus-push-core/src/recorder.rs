//! # Metadata Recorder
//!
//! After a successful upload, each uploaded file is hashed and turned into an
//! [`ArtifactRecord`]. Nexus does not return component ids from the upload
//! call, so the SHA-1 is the only handle cleanup has on the remote component.
//! A file that can no longer be read is logged and left out: it was uploaded
//! but cannot be tracked.

use std::path::PathBuf;

use crate::config::ServerConnection;
use crate::digest::Sha1Digest;
use crate::metadata::ArtifactRecord;
use crate::resolver::{file_name_of, ResolvedField};

/// A file parameter bound and hashed during one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub param_key: String,
    pub source_pattern: String,
    pub resolved_file: PathBuf,
    pub content_hash: Sha1Digest,
}

/// Where the artifacts of one feature went.
#[derive(Debug, Clone)]
pub struct UploadTarget<'a> {
    pub server: &'a ServerConnection,
    pub repository: &'a str,
    pub delete_on_cleanup: Option<bool>,
    pub feature_id: Option<&'a str>,
}

/// Hash every file field, skipping (and logging) unreadable files.
pub fn hash_artifacts(fields: &[ResolvedField]) -> Vec<ResolvedArtifact> {
    let mut artifacts = Vec::new();
    for field in fields {
        let ResolvedField::File { key, pattern, path } = field else {
            continue;
        };
        match Sha1Digest::of_file(path) {
            Ok(content_hash) => artifacts.push(ResolvedArtifact {
                param_key: key.clone(),
                source_pattern: pattern.clone(),
                resolved_file: path.clone(),
                content_hash,
            }),
            Err(e) => {
                tracing::error!(path = %path.display(), "Cannot save nexus artifact metadata: {e}");
            }
        }
    }
    artifacts
}

impl ResolvedArtifact {
    pub fn to_record(&self, target: &UploadTarget<'_>) -> ArtifactRecord {
        ArtifactRecord {
            path: self.source_pattern.clone(),
            name: file_name_of(&self.resolved_file),
            sha1: self.content_hash.to_hex(),
            server_id: target.server.id.clone(),
            server_url: target.server.url_string(),
            repository: target.repository.to_string(),
            delete_on_cleanup: target.delete_on_cleanup,
            feature_id: target.feature_id.map(str::to_string),
        }
    }
}

/// Records for every readable file field of a successful upload.
pub fn record_artifacts(
    fields: &[ResolvedField],
    target: &UploadTarget<'_>,
) -> Vec<ArtifactRecord> {
    hash_artifacts(fields)
        .iter()
        .map(|a| a.to_record(target))
        .collect()
}
