//! `nexus-push report` -- recorded artifacts of a build and the Nexus
//! components currently holding them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use nexus_push_core::{ArtifactReporter, Component, DirectoryLocks, ReportEntry};

use crate::{nexus_client, open_registry};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Artifacts directory of the build.
    #[arg(long)]
    pub artifacts_dir: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run_report(args: &ReportArgs, registry: &Path) -> Result<u8> {
    let reporter = ArtifactReporter::new(
        nexus_client()?,
        Arc::new(open_registry(registry)?),
        Arc::new(DirectoryLocks::new()),
    );

    if !reporter.is_available(&args.artifacts_dir) {
        println!("No Nexus artifacts recorded in {}", args.artifacts_dir.display());
        return Ok(0);
    }

    let entries = reporter.build_report(&args.artifacts_dir);
    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("failed to encode report")?;
        println!("{json}");
    } else {
        print!("{}", render(&entries));
    }
    Ok(0)
}

fn render(entries: &[ReportEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let r = &entry.record;
        out.push_str(&format!("{}  ({})\n", r.name, r.path));
        out.push_str(&format!("  sha1:       {}\n", r.sha1));
        out.push_str(&format!("  repository: {} on {}\n", r.repository, r.server_url));
        if entry.components.is_empty() {
            out.push_str("  components: none found\n");
        }
        for c in &entry.components {
            out.push_str(&format!("  component:  {}  {}\n", c.id, coordinates(c)));
        }
    }
    out.push_str(&format!("\nTotal: {} artifacts\n", entries.len()));
    out
}

fn coordinates(c: &Component) -> String {
    [&c.group, &c.name, &c.version]
        .iter()
        .map(|part| part.as_deref().unwrap_or("-"))
        .collect::<Vec<_>>()
        .join(":")
}
