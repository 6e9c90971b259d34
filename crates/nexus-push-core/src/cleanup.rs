//! # Cleanup Resolver
//!
//! Removes the Nexus components of builds whose data is being purged. The
//! metadata document only knows each file's SHA-1, so every flagged record is
//! looked up with a search; exactly one hit is deleted, anything else is left
//! alone and logged.
//!
//! A cleanup pass may be interrupted at any time. The flag is checked before
//! each build; work already done for earlier builds stands. Errors never
//! escape: they are reported per build through [`CleanupErrorReporter`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::client::NexusClient;
use crate::config::ServerConnection;
use crate::error::NexusApiError;
use crate::feature::PushFeature;
use crate::guard::{read_lock, ArtifactsGuard};
use crate::metadata::{ArtifactRecord, MetadataStore};
use crate::registry::ServerLookup;

/// How much of a build's data the host is removing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupLevel {
    /// Build logs and statistics only; artifacts stay.
    Logs,
    Artifacts,
    Everything,
}

impl CleanupLevel {
    pub fn cleans_artifacts(self) -> bool {
        matches!(self, Self::Artifacts | Self::Everything)
    }
}

/// A historical build handed to the cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupBuild {
    pub build_id: u64,
    pub artifacts_dir: PathBuf,
    /// Push features still configured on the build. Consulted only for
    /// records that carry no delete flag of their own.
    #[serde(default)]
    pub features: Vec<PushFeature>,
}

/// Per-artifact result of a cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted { component_id: String },
    SkippedNotFlagged,
    /// Record lacks sha1, server id or repository.
    SkippedIncomplete,
    /// The record's server is no longer registered.
    ServerUnknown,
    /// Search found zero or several components.
    SearchAmbiguous(usize),
    SearchFailed(Option<u16>),
    DeleteFailed(Option<u16>),
}

/// Receives cleanup errors keyed by build id.
pub trait CleanupErrorReporter: Send + Sync {
    fn build_cleanup_error(&self, build_id: u64, message: &str);
}

/// Collects cleanup errors in memory.
#[derive(Debug, Default)]
pub struct CleanupErrors {
    errors: Mutex<Vec<(u64, String)>>,
}

impl CleanupErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<(u64, String)> {
        self.errors.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl CleanupErrorReporter for CleanupErrors {
    fn build_cleanup_error(&self, build_id: u64, message: &str) {
        tracing::warn!(build_id, "{message}");
        self.errors.lock().push((build_id, message.to_string()));
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub builds_processed: usize,
    pub interrupted: bool,
    pub outcomes: Vec<(u64, CleanupOutcome)>,
}

impl CleanupSummary {
    pub fn deleted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, CleanupOutcome::Deleted { .. }))
            .count()
    }
}

/// Deletes the Nexus components recorded for purged builds.
pub struct CleanupResolver {
    client: NexusClient,
    servers: Arc<dyn ServerLookup>,
    guard: Arc<dyn ArtifactsGuard>,
    store: MetadataStore,
}

impl CleanupResolver {
    pub fn new(
        client: NexusClient,
        servers: Arc<dyn ServerLookup>,
        guard: Arc<dyn ArtifactsGuard>,
    ) -> Self {
        Self {
            client,
            servers,
            guard,
            store: MetadataStore::default(),
        }
    }

    /// Process `builds` in order until done or `interrupted` is raised.
    pub fn cleanup_builds(
        &self,
        builds: &[CleanupBuild],
        level: CleanupLevel,
        interrupted: &AtomicBool,
        reporter: &dyn CleanupErrorReporter,
    ) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        for build in builds {
            if interrupted.load(Ordering::SeqCst) {
                tracing::info!(
                    build_id = build.build_id,
                    processed = summary.builds_processed,
                    "nexus cleanup interrupted"
                );
                summary.interrupted = true;
                break;
            }
            summary.builds_processed += 1;
            if !level.cleans_artifacts() {
                continue;
            }
            for outcome in self.cleanup_build(build, reporter) {
                summary.outcomes.push((build.build_id, outcome));
            }
        }
        summary
    }

    /// Clean one build. A missing document means nothing to do; an unreadable
    /// one is logged and skipped.
    pub fn cleanup_build(
        &self,
        build: &CleanupBuild,
        reporter: &dyn CleanupErrorReporter,
    ) -> Vec<CleanupOutcome> {
        let read = {
            let _lock = read_lock(&*self.guard, &build.artifacts_dir);
            self.store.read(&build.artifacts_dir)
        };
        let doc = match read {
            Ok(Some(doc)) => doc,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Error reading nexus build data: {e} for build {}", build.build_id);
                return Vec::new();
            }
        };

        doc.artifacts
            .iter()
            .map(|record| self.cleanup_record(build, record, reporter))
            .collect()
    }

    fn cleanup_record(
        &self,
        build: &CleanupBuild,
        record: &ArtifactRecord,
        reporter: &dyn CleanupErrorReporter,
    ) -> CleanupOutcome {
        if !should_delete(record, &build.features) {
            return CleanupOutcome::SkippedNotFlagged;
        }
        if [&record.sha1, &record.server_id, &record.repository]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return CleanupOutcome::SkippedIncomplete;
        }
        let Some(server) = self.servers.server(&record.server_id) else {
            tracing::info!(
                build_id = build.build_id,
                server_id = %record.server_id,
                "Nexus server no longer registered, keeping component {}",
                record.name
            );
            return CleanupOutcome::ServerUnknown;
        };
        self.remove_component(build.build_id, &server, record, reporter)
    }

    fn remove_component(
        &self,
        build_id: u64,
        server: &ServerConnection,
        record: &ArtifactRecord,
        reporter: &dyn CleanupErrorReporter,
    ) -> CleanupOutcome {
        let found = match self
            .client
            .search_by_sha1(server, &record.repository, &record.sha1)
        {
            Ok(found) => found,
            Err(e) => {
                reporter.build_cleanup_error(build_id, &failure_message("find", &e));
                return CleanupOutcome::SearchFailed(e.status());
            }
        };

        if found.items.len() != 1 {
            tracing::warn!(
                sha1 = %record.sha1,
                matches = found.items.len(),
                "Artifact did not have exactly one component associated, will not remove for build {build_id}"
            );
            return CleanupOutcome::SearchAmbiguous(found.items.len());
        }

        let component_id = found.items[0].id.clone();
        match self.client.delete_component(server, &component_id) {
            Ok(()) => {
                tracing::info!(
                    build_id,
                    component_id = %component_id,
                    repository = %record.repository,
                    "removed Nexus component {}",
                    record.name
                );
                CleanupOutcome::Deleted { component_id }
            }
            Err(e) => {
                reporter.build_cleanup_error(build_id, &failure_message("delete", &e));
                CleanupOutcome::DeleteFailed(e.status())
            }
        }
    }
}

/// The record's own flag wins; otherwise ask the feature that uploaded it.
fn should_delete(record: &ArtifactRecord, features: &[PushFeature]) -> bool {
    if let Some(flag) = record.delete_on_cleanup {
        return flag;
    }
    record
        .feature_id
        .as_deref()
        .and_then(|id| features.iter().find(|f| f.id == id))
        .and_then(PushFeature::delete_on_cleanup)
        .unwrap_or(false)
}

fn failure_message(action: &str, e: &NexusApiError) -> String {
    match e {
        NexusApiError::ApiError { body, .. } => {
            format!("Cannot {action} artifact on cleanup nexus artifact: {body}")
        }
        other => format!("IO Exception on cleanup nexus artifact: {other}"),
    }
}
