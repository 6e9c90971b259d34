//! # nexus-push-core -- Nexus artifact push, metadata and cleanup
//!
//! Uploads selected build artifacts to a Nexus repository manager through its
//! REST component-upload API, records what was uploaded as a small XML
//! metadata document attached to the build, and removes the matching
//! components again when the build's data is purged.
//!
//! ## Data Flow
//!
//! ```text
//! UploadSpec::parse ──► resolve_parameters ──► NexusClient::upload_component
//!                                                   │
//!                          MetadataStore::append ◄── record_artifacts (SHA-1)
//!
//! MetadataStore::read ──► CleanupResolver ──► search by sha1 ──► delete component
//! ```
//!
//! ## Host Extension Points
//!
//! The build server is an external collaborator. It calls
//! [`ArtifactUploader::upload_build`] once artifacts are finalized and
//! [`CleanupResolver::cleanup_builds`] during retention cleanup, passing the
//! build's identity and directories as plain arguments. Server connection
//! settings come from any [`ServerLookup`]: the owned [`ServerRegistry`] on
//! the server side, or [`SharedParameters`] on a build agent.
//!
//! ## Locking
//!
//! Access to a build's metadata document is coordinated through an
//! [`ArtifactsGuard`]. Readers hold the read lock while resolving, uploading,
//! hashing and reading; the document itself is rewritten under the write
//! lock. Both are scoped guards released on every exit path.

pub mod build_log;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod feature;
pub mod guard;
pub mod metadata;
pub mod params;
pub mod recorder;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod upload;
pub mod upload_spec;

pub use build_log::{BuildLog, LogLevel, MemoryBuildLog, TracingBuildLog};
pub use cleanup::{
    CleanupBuild, CleanupErrorReporter, CleanupErrors, CleanupLevel, CleanupOutcome,
    CleanupResolver, CleanupSummary,
};
pub use client::{Component, NexusClient, SearchResponse};
pub use config::{ClientConfig, ConfigError, Credentials, ServerConnection};
pub use digest::Sha1Digest;
pub use error::{NexusApiError, NexusPushError};
pub use feature::PushFeature;
pub use guard::{ArtifactsGuard, DirectoryLocks};
pub use metadata::{ArtifactRecord, MetadataDocument, MetadataError, MetadataStore};
pub use params::SharedParameters;
pub use registry::{RegistryError, ServerLookup, ServerRegistry};
pub use report::{ArtifactReporter, ReportEntry};
pub use resolver::{ResolutionFailure, ResolvedField};
pub use upload::{ArtifactUploader, BuildInfo, FeatureUpload, UploadOutcome};
pub use upload_spec::{ParameterValue, SpecParseError, UploadParameter, UploadSpec};
