//! Per-build report of pushed artifacts.
//!
//! Lists the recorded artifacts of a build next to the Nexus components that
//! currently hold them. Lookup failures degrade to an empty component list;
//! the report never fails.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::client::{Component, NexusClient};
use crate::guard::{read_lock, ArtifactsGuard};
use crate::metadata::{ArtifactRecord, MetadataStore};
use crate::registry::ServerLookup;

/// A recorded artifact and the components found for its SHA-1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub record: ArtifactRecord,
    pub components: Vec<Component>,
}

pub struct ArtifactReporter {
    client: NexusClient,
    servers: Arc<dyn ServerLookup>,
    guard: Arc<dyn ArtifactsGuard>,
    store: MetadataStore,
}

impl ArtifactReporter {
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

    /// True when the build has a metadata document.
    pub fn is_available(&self, artifacts_dir: &Path) -> bool {
        let _lock = read_lock(&*self.guard, artifacts_dir);
        self.store.exists(artifacts_dir)
    }

    pub fn build_report(&self, artifacts_dir: &Path) -> Vec<ReportEntry> {
        let read = {
            let _lock = read_lock(&*self.guard, artifacts_dir);
            self.store.read(artifacts_dir)
        };
        let doc = match read {
            Ok(Some(doc)) => doc,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %artifacts_dir.display(), "cannot read nexus build data: {e}");
                return Vec::new();
            }
        };

        doc.artifacts
            .into_iter()
            .map(|record| {
                let components = self.components_of(&record);
                ReportEntry { record, components }
            })
            .collect()
    }

    fn components_of(&self, record: &ArtifactRecord) -> Vec<Component> {
        let Some(server) = self.servers.server(&record.server_id) else {
            return Vec::new();
        };
        match self
            .client
            .search_by_sha1(&server, &record.repository, &record.sha1)
        {
            Ok(found) => found.items,
            Err(e) => {
                tracing::debug!(sha1 = %record.sha1, "component lookup failed: {e}");
                Vec::new()
            }
        }
    }
}
