//! `nexus-push cleanup` -- remove pushed components of purged builds.
//!
//! Ctrl-C stops the pass before the next build; components already deleted
//! stay deleted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use nexus_push_core::{CleanupErrors, CleanupResolver, CleanupSummary, DirectoryLocks};

use crate::job::CleanupList;
use crate::{nexus_client, open_registry};

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Cleanup list YAML file.
    #[arg(long)]
    pub builds: PathBuf,
}

pub fn run_cleanup(args: &CleanupArgs, registry: &Path) -> Result<u8> {
    let list = CleanupList::load(&args.builds)?;
    let resolver = CleanupResolver::new(
        nexus_client()?,
        Arc::new(open_registry(registry)?),
        Arc::new(DirectoryLocks::new()),
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    watch_interrupt(Arc::clone(&interrupted))?;

    let errors = CleanupErrors::new();
    let summary = resolver.cleanup_builds(&list.builds, list.level, &interrupted, &errors);
    print_summary(&summary, &errors.errors());

    Ok(if errors.is_empty() { 0 } else { 1 })
}

/// Raise `flag` on Ctrl-C. The watcher thread lives until the process exits.
fn watch_interrupt(flag: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping after the current build");
                    flag.store(true, Ordering::SeqCst);
                }
            });
        })
        .context("failed to spawn signal watcher")?;
    Ok(())
}

fn print_summary(summary: &CleanupSummary, errors: &[(u64, String)]) {
    for (build_id, message) in errors {
        println!("  build {build_id}: {message}");
    }
    if !errors.is_empty() {
        println!();
    }
    println!(
        "Processed {} builds, deleted {} components",
        summary.builds_processed,
        summary.deleted()
    );
    if summary.interrupted {
        println!("Cleanup interrupted; remaining builds were not processed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_metadata_clean_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleanup.yaml");
        std::fs::write(
            &path,
            "builds:\n  - build_id: 1\n    artifacts_dir: b1\n  - build_id: 2\n    artifacts_dir: b2\n",
        )
        .unwrap();
        let args = CleanupArgs { builds: path };
        assert_eq!(run_cleanup(&args, &dir.path().join("settings.xml")).unwrap(), 0);
    }

    #[test]
    fn malformed_cleanup_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleanup.yaml");
        std::fs::write(&path, "builds: 7\n").unwrap();
        let args = CleanupArgs { builds: path };
        assert!(run_cleanup(&args, &dir.path().join("settings.xml")).is_err());
    }
}
