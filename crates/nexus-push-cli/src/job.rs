//! YAML inputs: build jobs and cleanup lists.
//!
//! ```yaml
//! # job.yaml
//! build_id: 42
//! working_dir: work
//! artifacts_dir: artifacts
//! features:
//!   - id: BUILD_EXT_1
//!     parameters:
//!       nexusServerId: 0b6c…
//!       repositoryId: releases
//!       uploadSettings: |
//!         maven2.groupId=com.example
//!         maven2.asset1=@build/*.jar
//! ```
//!
//! Relative directories are resolved against the YAML file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nexus_push_core::{BuildInfo, CleanupBuild, CleanupLevel, PushFeature};
use serde::Deserialize;

use crate::resolve_path;

/// A finished build handed to the upload pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildJob {
    pub build_id: u64,
    #[serde(default = "default_true")]
    pub successful: bool,
    pub working_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    #[serde(default)]
    pub features: Vec<PushFeature>,
    /// Server settings shared with a build agent. When present, servers are
    /// looked up here instead of the registry.
    #[serde(default)]
    pub shared_parameters: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl BuildJob {
    pub fn load(path: &Path) -> Result<Self> {
        let mut job: Self = read_yaml(path)?;
        let base = base_dir(path);
        job.working_dir = resolve_path(&job.working_dir, &base);
        job.artifacts_dir = resolve_path(&job.artifacts_dir, &base);
        Ok(job)
    }

    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            build_id: self.build_id,
            successful: self.successful,
            working_dir: self.working_dir.clone(),
            artifacts_dir: self.artifacts_dir.clone(),
        }
    }
}

/// Historical builds to clean.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupList {
    #[serde(default = "default_level")]
    pub level: CleanupLevel,
    #[serde(default)]
    pub builds: Vec<CleanupBuild>,
}

fn default_level() -> CleanupLevel {
    CleanupLevel::Artifacts
}

impl CleanupList {
    pub fn load(path: &Path) -> Result<Self> {
        let mut list: Self = read_yaml(path)?;
        let base = base_dir(path);
        for build in &mut list.builds {
            build.artifacts_dir = resolve_path(&build.artifacts_dir, &base);
        }
        Ok(list)
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
