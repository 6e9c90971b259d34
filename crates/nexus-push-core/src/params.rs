//! Server settings handed from the build server to its agents.
//!
//! When a build starts, the settings of every server its push features use are
//! exported as secure shared parameters. On the agent, [`SharedParameters`]
//! reads them back and serves lookups by server id.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Credentials, ServerConnection};
use crate::constants::{
    AGENT_SERVER_PASSWORD_PARAM_PREFIX, AGENT_SERVER_URL_PARAM_PREFIX,
    AGENT_SERVER_USERNAME_PARAM_PREFIX,
};
use crate::feature::PushFeature;
use crate::registry::ServerLookup;

/// Shared parameters exposing the servers referenced by `features`.
/// Unknown server ids are left out.
pub fn export_server_parameters(
    servers: &dyn ServerLookup,
    features: &[PushFeature],
) -> BTreeMap<String, String> {
    let ids: BTreeSet<&str> = features.iter().filter_map(PushFeature::server_id).collect();
    let mut params = BTreeMap::new();
    for id in ids {
        let Some(conn) = servers.server(id) else {
            tracing::debug!(server_id = id, "feature references unknown server");
            continue;
        };
        params.insert(format!("{AGENT_SERVER_URL_PARAM_PREFIX}{id}"), conn.url_string());
        params.insert(
            format!("{AGENT_SERVER_USERNAME_PARAM_PREFIX}{id}"),
            conn.credentials.username.clone(),
        );
        params.insert(
            format!("{AGENT_SERVER_PASSWORD_PARAM_PREFIX}{id}"),
            conn.credentials.password.as_str().to_string(),
        );
    }
    params
}

/// Server lookup over a build's shared parameters.
#[derive(Debug, Clone, Default)]
pub struct SharedParameters {
    params: BTreeMap<String, String>,
}

impl SharedParameters {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }
}

impl ServerLookup for SharedParameters {
    /// Found only when URL, username and password are all present.
    fn server(&self, id: &str) -> Option<ServerConnection> {
        let url = self.params.get(&format!("{AGENT_SERVER_URL_PARAM_PREFIX}{id}"))?;
        let username = self.params.get(&format!("{AGENT_SERVER_USERNAME_PARAM_PREFIX}{id}"))?;
        let password = self.params.get(&format!("{AGENT_SERVER_PASSWORD_PARAM_PREFIX}{id}"))?;
        match ServerConnection::new(id, url, Credentials::new(username.clone(), password.clone())) {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(server_id = id, "ignoring shared server settings: {e}");
                None
            }
        }
    }
}
