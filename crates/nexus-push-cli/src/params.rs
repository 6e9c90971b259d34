//! `nexus-push params` -- shared server parameters exported for a job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use nexus_push_core::constants::AGENT_SERVER_PASSWORD_PARAM_PREFIX;
use nexus_push_core::params::export_server_parameters;

use crate::job::BuildJob;

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Build job YAML file.
    #[arg(long)]
    pub job: PathBuf,

    /// Print passwords instead of masking them.
    #[arg(long)]
    pub show_secrets: bool,
}

pub fn run_params(args: &ParamsArgs, registry: &Path) -> Result<u8> {
    let job = BuildJob::load(&args.job)?;
    let registry = crate::open_registry(registry)?;
    let params = export_server_parameters(&registry, &job.features);
    print!("{}", render(&params, args.show_secrets));
    Ok(0)
}

fn render(params: &BTreeMap<String, String>, show_secrets: bool) -> String {
    params
        .iter()
        .map(|(k, v)| {
            if !show_secrets && k.starts_with(AGENT_SERVER_PASSWORD_PARAM_PREFIX) {
                format!("{k}=********\n")
            } else {
                format!("{k}={v}\n")
            }
        })
        .collect()
}
