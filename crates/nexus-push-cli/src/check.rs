//! `nexus-push check` -- parse an upload specification and, optionally,
//! resolve its file patterns against a working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use nexus_push_core::resolver::resolve_parameters;
use nexus_push_core::upload::upload_summary;
use nexus_push_core::{ParameterValue, UploadSpec};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File holding the upload specification text.
    #[arg(long)]
    pub settings: PathBuf,

    /// Resolve file patterns against this directory.
    #[arg(long)]
    pub working_dir: Option<PathBuf>,
}

pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.settings)
        .with_context(|| format!("failed to read {}", args.settings.display()))?;
    let spec = UploadSpec::parse(&text)
        .with_context(|| format!("invalid upload settings in {}", args.settings.display()))?;

    print!("{}", describe(&spec));

    match &args.working_dir {
        Some(dir) => Ok(resolve(&spec, dir)),
        None => Ok(0),
    }
}

fn describe(spec: &UploadSpec) -> String {
    let mut out = String::new();
    for p in spec.parameters() {
        match &p.value {
            ParameterValue::Literal(v) => out.push_str(&format!("  {} = {v}\n", p.key)),
            ParameterValue::File(pattern) => {
                out.push_str(&format!("  {} = file matching {pattern}\n", p.key))
            }
        }
    }
    out.push_str(&format!(
        "{} parameters, {} files\n",
        spec.len(),
        spec.file_parameters().count()
    ));
    out
}

fn resolve(spec: &UploadSpec, dir: &Path) -> u8 {
    match resolve_parameters(spec, dir) {
        Ok(fields) => {
            println!();
            print!("{}", upload_summary(&fields));
            0
        }
        Err(failures) => {
            for f in &failures {
                println!("  {}: {f}", f.key);
            }
            1
        }
    }
}
