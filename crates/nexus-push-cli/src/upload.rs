//! `nexus-push upload` -- run the post-build upload pass for one build job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use nexus_push_core::{
    ArtifactUploader, DirectoryLocks, LogLevel, MemoryBuildLog, ServerLookup, SharedParameters,
};

use crate::job::BuildJob;
use crate::{nexus_client, open_registry};

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Build job YAML file.
    #[arg(long)]
    pub job: PathBuf,
}

/// Upload every push feature of the job. Exits 1 when a build problem was
/// raised by a mandatory feature.
pub fn run_upload(args: &UploadArgs, registry: &Path) -> Result<u8> {
    let job = BuildJob::load(&args.job)?;
    let servers: Box<dyn ServerLookup> = if job.shared_parameters.is_empty() {
        Box::new(open_registry(registry)?)
    } else {
        tracing::debug!("using shared server parameters from job");
        Box::new(SharedParameters::new(job.shared_parameters.clone()))
    };

    let uploader = ArtifactUploader::new(nexus_client()?, Arc::new(DirectoryLocks::new()));
    let log = MemoryBuildLog::new();
    let results = uploader.upload_build(&job.build_info(), &job.features, servers.as_ref(), &log);

    for entry in log.entries() {
        let tag = match entry.level {
            LogLevel::Normal => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        };
        for line in entry.text.lines() {
            println!("[{tag}] {line}");
        }
    }

    let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
    let recorded: usize = results.iter().map(|r| r.records.len()).sum();
    println!();
    println!(
        "Build {}: {succeeded}/{} features uploaded, {recorded} artifacts recorded",
        job.build_id,
        results.len()
    );

    let problems = log.problems();
    for p in &problems {
        println!("Build problem {}: {}", p.identity, p.description);
    }
    Ok(if problems.is_empty() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_job(dir: &Path, mandatory: bool) -> PathBuf {
        let path = dir.join("job.yaml");
        std::fs::write(
            &path,
            format!(
                "build_id: 3\nworking_dir: work\nartifacts_dir: artifacts\nfeatures:\n  - id: F1\n    parameters:\n      nexusServerId: missing\n      repositoryId: releases\n      uploadSettings: a=b\n      artifactUploadMandatory: \"{mandatory}\"\n"
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn unknown_server_on_mandatory_feature_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = UploadArgs {
            job: write_job(dir.path(), true),
        };
        let code = run_upload(&args, &dir.path().join("settings.xml")).unwrap();
        assert_eq!(code, 1);
        assert!(!dir.path().join("artifacts/.teamcity/nexus-metadata.xml").exists());
    }

    #[test]
    fn unknown_server_on_optional_feature_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let args = UploadArgs {
            job: write_job(dir.path(), false),
        };
        assert_eq!(run_upload(&args, &dir.path().join("settings.xml")).unwrap(), 0);
    }

    #[test]
    fn missing_job_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = UploadArgs {
            job: dir.path().join("nope.yaml"),
        };
        assert!(run_upload(&args, &dir.path().join("settings.xml")).is_err());
    }
}
