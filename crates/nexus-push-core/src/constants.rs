//! Parameter keys, file locations and identifiers shared with the host.

/// Feature parameter: id of the registered Nexus server.
pub const NEXUS_SERVER_ID: &str = "nexusServerId";
/// Feature parameter: target repository id.
pub const REPOSITORY_ID: &str = "repositoryId";
/// Feature parameter: the upload specification text.
pub const ARTIFACT_UPLOAD_SETTINGS: &str = "uploadSettings";
/// Feature parameter: delete the component when the build is cleaned up.
pub const DELETE_ARTIFACT_ON_CLEANUP: &str = "deleteOnCleanup";
/// Feature parameter: escalate upload failures to a build problem.
pub const ARTIFACT_UPLOAD_MANDATORY: &str = "artifactUploadMandatory";

/// Build feature type of a push configuration.
pub const NEXUS_PUSH_FEATURE_TYPE: &str = "com.github.mpoindexter.teamcity.nexuspushplugin";

/// File name of the per-build metadata document.
pub const NEXUS_BUILD_METADATA_FILE: &str = "nexus-metadata.xml";
/// Location of the metadata document relative to the artifacts directory.
pub const NEXUS_BUILD_METADATA_PATH: &str = ".teamcity/nexus-metadata.xml";

/// File name of the persisted server registry.
pub const SERVER_SETTINGS_FILE: &str = "nexus-publisher-settings.xml";

pub const AGENT_SERVER_URL_PARAM_PREFIX: &str = "secure:nexuspush.serverUrl.";
pub const AGENT_SERVER_USERNAME_PARAM_PREFIX: &str = "secure:nexuspush.serverUsername.";
pub const AGENT_SERVER_PASSWORD_PARAM_PREFIX: &str = "secure:nexuspush.serverPassword.";

/// Prefix of every upload error shown in the build log.
pub const UPLOAD_ERROR_PREFIX: &str = "Cannot push artifact to Nexus:  ";

/// Identity of the build problem raised for a failed mandatory upload.
pub fn upload_failed_problem_id() -> String {
    format!("{NEXUS_PUSH_FEATURE_TYPE}.uploadFailed")
}
