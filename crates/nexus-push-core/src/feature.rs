//! Typed view of one push feature configured on a build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ARTIFACT_UPLOAD_MANDATORY, ARTIFACT_UPLOAD_SETTINGS, DELETE_ARTIFACT_ON_CLEANUP,
    NEXUS_SERVER_ID, REPOSITORY_ID,
};

/// A build feature instance: its host-assigned id and raw parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFeature {
    pub id: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl PushFeature {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Configured server id, `None` when missing or blank.
    pub fn server_id(&self) -> Option<&str> {
        self.non_blank(NEXUS_SERVER_ID)
    }

    pub fn repository_id(&self) -> Option<&str> {
        self.non_blank(REPOSITORY_ID)
    }

    pub fn upload_settings(&self) -> Option<&str> {
        self.non_blank(ARTIFACT_UPLOAD_SETTINGS)
    }

    /// The delete flag, `None` when the parameter is absent.
    pub fn delete_on_cleanup(&self) -> Option<bool> {
        self.parameter(DELETE_ARTIFACT_ON_CLEANUP).map(|v| v == "true")
    }

    pub fn is_mandatory(&self) -> bool {
        self.parameter(ARTIFACT_UPLOAD_MANDATORY) == Some("true")
    }

    fn non_blank(&self, key: &str) -> Option<&str> {
        self.parameter(key).filter(|v| !v.trim().is_empty())
    }
}
