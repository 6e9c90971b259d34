//! # nexus-push-cli -- command-line host for Nexus push
//!
//! Drives `nexus-push-core` the way a build server would: runs the post-build
//! upload pass for a build job, runs retention cleanup over historical
//! builds, reports pushed artifacts and manages the server registry file.
//!
//! ## Subcommands
//!
//! - `nexus-push upload --job job.yaml` -- upload pass for one build.
//! - `nexus-push cleanup --builds cleanup.yaml` -- delete pushed components.
//! - `nexus-push report --artifacts-dir DIR` -- recorded artifacts and their
//!   current components.
//! - `nexus-push check --settings FILE` -- parse an upload specification.
//! - `nexus-push servers list|add|update|remove` -- registry management.
//! - `nexus-push params --job job.yaml` -- shared server parameters for
//!   build agents.
//!
//! ```bash
//! nexus-push servers add --url https://nexus.example.com --username ci --password "$PW"
//! nexus-push -v upload --job build-42.yaml
//! ```

pub mod check;
pub mod cleanup;
pub mod job;
pub mod params;
pub mod report;
pub mod servers;
pub mod upload;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nexus_push_core::{ClientConfig, NexusClient, ServerRegistry};

/// Load the registry bound to `path`; a missing file is an empty registry.
pub fn open_registry(path: &Path) -> Result<ServerRegistry> {
    ServerRegistry::load(path)
        .with_context(|| format!("cannot load server registry {}", path.display()))
}

/// HTTP client configured from `NEXUS_PUSH_*` environment variables.
pub fn nexus_client() -> Result<NexusClient> {
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    NexusClient::new(&config).context("cannot create HTTP client")
}

/// Resolve a path from a job file relative to the file's directory.
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_keeps_absolute_paths() {
        let abs = std::env::temp_dir().join("artifacts");
        assert_eq!(resolve_path(&abs, Path::new("/jobs")), abs);
    }

    #[test]
    fn resolve_path_joins_relative_paths() {
        assert_eq!(
            resolve_path(Path::new("work"), Path::new("/jobs")),
            PathBuf::from("/jobs/work")
        );
    }

    #[test]
    fn open_registry_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reg = open_registry(&dir.path().join("settings.xml")).unwrap();
        assert!(reg.is_empty());
    }
}
