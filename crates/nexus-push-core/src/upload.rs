//! # Upload Executor
//!
//! Runs every push feature of a finished build. Each feature is independent:
//! a bad server id, an unmatched pattern or a rejected upload ends only that
//! feature's upload. The failure goes to the build log as a warning, or as an
//! error plus a build problem when the feature is *mandatory*.
//!
//! Uploads are never retried. A failed feature leaves no state behind; the
//! next invocation starts from the specification again.

use std::path::PathBuf;
use std::sync::Arc;

use crate::build_log::BuildLog;
use crate::client::NexusClient;
use crate::constants::{upload_failed_problem_id, NEXUS_PUSH_FEATURE_TYPE, UPLOAD_ERROR_PREFIX};
use crate::error::NexusApiError;
use crate::feature::PushFeature;
use crate::guard::{read_lock, write_lock, ArtifactsGuard};
use crate::metadata::{ArtifactRecord, MetadataStore};
use crate::recorder::{record_artifacts, UploadTarget};
use crate::registry::ServerLookup;
use crate::resolver::{resolve_parameters, ResolutionFailure, ResolvedField};
use crate::upload_spec::UploadSpec;

/// Identity and locations of the build being finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub build_id: u64,
    /// Whether the build has succeeded so far. Failed builds upload nothing.
    pub successful: bool,
    /// Base directory for file patterns.
    pub working_dir: PathBuf,
    /// Directory holding the build's artifacts and metadata document.
    pub artifacts_dir: PathBuf,
}

/// Result of one feature's upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Nexus accepted the component.
    Success,
    /// Server, repository or specification is unusable.
    ValidationFailure(String),
    /// One or more file parameters did not bind to exactly one file.
    ResolutionFailure(Vec<ResolutionFailure>),
    /// The upload request failed or was rejected.
    TransportFailure { status: Option<u16>, body: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Build log messages describing a failure, without the common prefix.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Success => Vec::new(),
            Self::ValidationFailure(reason) => vec![reason.clone()],
            Self::ResolutionFailure(failures) => failures.iter().map(|f| f.to_string()).collect(),
            Self::TransportFailure { status: Some(status), body } => {
                vec![format!("Upload failed - Invalid status: {status} {body}")]
            }
            Self::TransportFailure { status: None, body } => {
                vec![format!("Upload failed - {body}")]
            }
        }
    }
}

/// Outcome of one feature plus the records it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureUpload {
    pub feature_id: String,
    pub outcome: UploadOutcome,
    pub records: Vec<ArtifactRecord>,
}

/// Uploads a build's artifacts and records them in its metadata document.
pub struct ArtifactUploader {
    client: NexusClient,
    guard: Arc<dyn ArtifactsGuard>,
    store: MetadataStore,
}

impl ArtifactUploader {
    pub fn new(client: NexusClient, guard: Arc<dyn ArtifactsGuard>) -> Self {
        Self {
            client,
            guard,
            store: MetadataStore::default(),
        }
    }

    /// Upload every push feature of a finished build, then append the new
    /// records to the build's metadata document.
    ///
    /// Failures to write the document are logged and swallowed.
    pub fn upload_build(
        &self,
        build: &BuildInfo,
        features: &[PushFeature],
        servers: &dyn ServerLookup,
        log: &dyn BuildLog,
    ) -> Vec<FeatureUpload> {
        if !build.successful {
            tracing::info!(build_id = build.build_id, "Nexus push skipping failed build");
            return Vec::new();
        }
        if features.is_empty() {
            tracing::info!(
                build_id = build.build_id,
                "Nexus push skipping build, no features active"
            );
            return Vec::new();
        }

        let results: Vec<FeatureUpload> = features
            .iter()
            .map(|f| self.upload_feature(build, f, servers, log))
            .collect();

        let records: Vec<ArtifactRecord> =
            results.iter().flat_map(|r| r.records.iter().cloned()).collect();
        if !records.is_empty() {
            let _lock = write_lock(&*self.guard, &build.artifacts_dir);
            match self.store.append(&build.artifacts_dir, &records) {
                Ok(total) => tracing::debug!(
                    build_id = build.build_id,
                    added = records.len(),
                    total,
                    "saved nexus artifact metadata"
                ),
                Err(e) => tracing::error!(
                    build_id = build.build_id,
                    "Cannot save nexus artifact metadata: {e}"
                ),
            }
        }
        results
    }

    /// Validate, resolve, upload and record a single feature.
    pub fn upload_feature(
        &self,
        build: &BuildInfo,
        feature: &PushFeature,
        servers: &dyn ServerLookup,
        log: &dyn BuildLog,
    ) -> FeatureUpload {
        let outcome_only = |outcome: UploadOutcome| FeatureUpload {
            feature_id: feature.id.clone(),
            outcome,
            records: Vec::new(),
        };
        let mandatory = feature.is_mandatory();

        let (server, repository, spec) = match validate(feature, servers) {
            Ok(valid) => valid,
            Err(reason) => {
                let outcome = UploadOutcome::ValidationFailure(reason.into());
                report_failure(log, &outcome, mandatory);
                return outcome_only(outcome);
            }
        };

        let _lock = read_lock(&*self.guard, &build.artifacts_dir);

        let fields = match resolve_parameters(&spec, &build.working_dir) {
            Ok(fields) => fields,
            Err(failures) => {
                let outcome = UploadOutcome::ResolutionFailure(failures);
                report_failure(log, &outcome, mandatory);
                return outcome_only(outcome);
            }
        };

        log.message(&upload_summary(&fields));

        if let Err(e) = self.client.upload_component(&server, repository, &fields) {
            let outcome = transport_failure(&e);
            tracing::debug!(feature_id = %feature.id, "upload rejected: {e}");
            report_failure(log, &outcome, mandatory);
            return outcome_only(outcome);
        }

        let target = UploadTarget {
            server: &server,
            repository,
            delete_on_cleanup: feature.delete_on_cleanup(),
            feature_id: Some(feature.id.as_str()),
        };
        let records = record_artifacts(&fields, &target);
        tracing::info!(
            build_id = build.build_id,
            feature_id = %feature.id,
            repository,
            files = records.len(),
            "uploaded artifacts to Nexus"
        );

        FeatureUpload {
            feature_id: feature.id.clone(),
            outcome: UploadOutcome::Success,
            records,
        }
    }
}

fn validate<'f>(
    feature: &'f PushFeature,
    servers: &dyn ServerLookup,
) -> Result<(crate::config::ServerConnection, &'f str, UploadSpec), &'static str> {
    let server = feature
        .server_id()
        .and_then(|id| servers.server(id))
        .ok_or("Invalid server")?;
    let repository = feature.repository_id().ok_or("Invalid repository ID")?;
    let spec = feature
        .upload_settings()
        .and_then(|text| UploadSpec::parse(text).ok())
        .ok_or("Invalid artifact upload settings")?;
    Ok((server, repository, spec))
}

fn transport_failure(e: &NexusApiError) -> UploadOutcome {
    match e {
        NexusApiError::ApiError { status, body, .. } => UploadOutcome::TransportFailure {
            status: Some(*status),
            body: body.clone(),
        },
        other => UploadOutcome::TransportFailure {
            status: None,
            body: other.to_string(),
        },
    }
}

fn report_failure(log: &dyn BuildLog, outcome: &UploadOutcome, mandatory: bool) {
    for message in outcome.messages() {
        let text = format!("{UPLOAD_ERROR_PREFIX}{message}");
        if mandatory {
            log.error(&text);
            log.build_problem(&upload_failed_problem_id(), NEXUS_PUSH_FEATURE_TYPE, &text);
        } else {
            log.warning(&text);
        }
    }
}

/// The build log line listing everything sent to Nexus.
pub fn upload_summary(fields: &[ResolvedField]) -> String {
    let mut msg = String::from("Uploading artifacts to Nexus with the following config:\n");
    for field in fields {
        match field {
            ResolvedField::Literal { key, value } => {
                msg.push_str(&format!("\t{key}={value}\n"));
            }
            ResolvedField::File { key, .. } => {
                let name = field.file_name().unwrap_or_default();
                msg.push_str(&format!("\t{key}=File <{name}>\n"));
            }
        }
    }
    msg
}
