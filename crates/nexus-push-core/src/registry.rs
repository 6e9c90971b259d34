//! # Server Registry
//!
//! Owned, thread-safe map from server id to connection settings. A registry
//! handle is cloned into every collaborator that needs lookups; clones share
//! one `parking_lot::RwLock`, which is never held across I/O.
//!
//! The registry persists to `nexus-publisher-settings.xml`:
//!
//! ```xml
//! <nexusConfig>
//!   <server id="…" url="https://nexus.example.com" username="deployer" password="…"/>
//! </nexusConfig>
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ConfigError, Credentials, ServerConnection};

/// Lookup of connection settings by server id.
pub trait ServerLookup: Send + Sync {
    fn server(&self, id: &str) -> Option<ServerConnection>;
}

/// Registered Nexus servers.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: Arc<RwLock<BTreeMap<String, ServerConnection>>>,
    settings_path: Option<PathBuf>,
}

impl ServerRegistry {
    /// Create an empty in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry bound to `path`. A missing file yields an empty
    /// registry that [`persist`](Self::persist) will create.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let mut servers = BTreeMap::new();

        match std::fs::read_to_string(&path) {
            Ok(xml) => {
                let wire: NexusConfigElement =
                    quick_xml::de::from_str(&xml).map_err(|e| RegistryError::Corrupt {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                for entry in wire.server {
                    let creds = Credentials::new(entry.username, entry.password);
                    match ServerConnection::new(entry.id.clone(), &entry.url, creds) {
                        Ok(conn) => {
                            servers.insert(entry.id, conn);
                        }
                        Err(e) => {
                            tracing::warn!(
                                server_id = %entry.id,
                                "skipping registered server: {e}"
                            );
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(RegistryError::Io { path, source }),
        }

        tracing::debug!(path = %path.display(), count = servers.len(), "loaded server registry");
        Ok(Self {
            servers: Arc::new(RwLock::new(servers)),
            settings_path: Some(path),
        })
    }

    /// Register a server under a fresh id and return the id.
    pub fn add_server(&self, url: &str, credentials: Credentials) -> Result<String, RegistryError> {
        let id = Uuid::new_v4().to_string();
        let conn = ServerConnection::new(id.clone(), url, credentials)?;
        self.servers.write().insert(id.clone(), conn);
        tracing::info!(server_id = %id, url, "registered Nexus server");
        Ok(id)
    }

    /// Replace URL and credentials of an existing server. Returns `false`
    /// when no server has this id.
    pub fn update_server(
        &self,
        id: &str,
        url: &str,
        credentials: Credentials,
    ) -> Result<bool, RegistryError> {
        let conn = ServerConnection::new(id, url, credentials)?;
        let mut guard = self.servers.write();
        match guard.get_mut(id) {
            Some(entry) => {
                *entry = conn;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_server(&self, id: &str) -> Option<ServerConnection> {
        self.servers.write().remove(id)
    }

    pub fn get_server(&self, id: &str) -> Option<ServerConnection> {
        self.servers.read().get(id).cloned()
    }

    /// All servers ordered by id.
    pub fn all_servers(&self) -> Vec<ServerConnection> {
        self.servers.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.servers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// Write the registry to its settings file, replacing it atomically.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let path = self.settings_path.clone().ok_or(RegistryError::Unbound)?;
        let wire = NexusConfigElement {
            server: self
                .servers
                .read()
                .values()
                .map(|s| ServerElement {
                    id: s.id.clone(),
                    url: s.url_string(),
                    username: s.credentials.username.clone(),
                    password: s.credentials.password.to_string(),
                })
                .collect(),
        };

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let mut ser = quick_xml::se::Serializer::new(&mut xml);
        ser.indent(' ', 2);
        wire.serialize(ser)
            .map_err(|e| RegistryError::Xml(e.to_string()))?;
        xml.push('\n');

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| RegistryError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(xml.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl ServerLookup for ServerRegistry {
    fn server(&self, id: &str) -> Option<ServerConnection> {
        self.get_server(id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "nexusConfig")]
struct NexusConfigElement {
    #[serde(rename = "server", default)]
    server: Vec<ServerElement>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ServerElement {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "@username", default)]
    username: String,
    #[serde(rename = "@password", default)]
    password: String,
}

/// Server registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Settings file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Settings file is not a valid registry document.
    #[error("cannot read Nexus settings {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    /// Invalid server settings.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
    #[error("XML error: {0}")]
    Xml(String),
    /// `persist` was called on a registry created without a settings file.
    #[error("registry has no settings file")]
    Unbound,
}
