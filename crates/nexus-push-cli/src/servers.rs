//! `nexus-push servers` -- manage the registered Nexus servers.
//!
//! ```bash
//! nexus-push servers list
//! nexus-push servers add --url https://nexus.example.com --username ci --password "$PW"
//! nexus-push servers update --id 0b6c… --url https://nexus2.example.com --username ci
//! nexus-push servers remove --id 0b6c…
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use nexus_push_core::{Credentials, ServerRegistry};

#[derive(Args, Debug)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommand,
}

#[derive(Subcommand, Debug)]
pub enum ServersCommand {
    /// List registered servers. Passwords are never printed.
    List,

    /// Register a server under a new id.
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "NEXUS_PUSH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Replace URL and credentials of a registered server.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        username: String,
        /// Keeps the stored password when omitted.
        #[arg(long, env = "NEXUS_PUSH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Remove a registered server.
    Remove {
        #[arg(long)]
        id: String,
    },
}

pub fn run_servers(args: &ServersArgs, registry_path: &Path) -> Result<u8> {
    let registry = crate::open_registry(registry_path)?;
    match &args.command {
        ServersCommand::List => {
            list(&registry);
            Ok(0)
        }
        ServersCommand::Add {
            url,
            username,
            password,
        } => {
            let credentials = Credentials::new(username.as_str(), password.as_str());
            let id = registry.add_server(url, credentials)?;
            save(&registry)?;
            println!("{id}");
            Ok(0)
        }
        ServersCommand::Update {
            id,
            url,
            username,
            password,
        } => {
            let Some(existing) = registry.get_server(id) else {
                bail!("no server registered with id {id}");
            };
            let password = match password {
                Some(p) => p.clone(),
                None => existing.credentials.password.as_str().to_string(),
            };
            registry.update_server(id, url, Credentials::new(username.as_str(), password))?;
            save(&registry)?;
            println!("updated {id}");
            Ok(0)
        }
        ServersCommand::Remove { id } => {
            if registry.delete_server(id).is_none() {
                bail!("no server registered with id {id}");
            }
            save(&registry)?;
            println!("removed {id}");
            Ok(0)
        }
    }
}

fn list(registry: &ServerRegistry) {
    let servers = registry.all_servers();
    for s in &servers {
        println!("  {:<36}  {}  ({})", s.id, s.url_string(), s.credentials.username);
    }
    println!();
    println!("Total: {} servers", servers.len());
}

fn save(registry: &ServerRegistry) -> Result<()> {
    registry.persist().with_context(|| match registry.settings_path() {
        Some(p) => format!("failed to write {}", p.display()),
        None => "failed to write server registry".to_string(),
    })
}
