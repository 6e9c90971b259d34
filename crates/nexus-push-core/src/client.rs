//! Typed blocking client for the Nexus REST API.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/service/rest/v1/components?repository={id}` | Multipart component upload |
//! | GET    | `/service/rest/beta/search?repository={id}&sha1={sha1}` | Search components by asset SHA-1 |
//! | DELETE | `/service/rest/beta/components/{componentId}` | Delete a component |
//!
//! Every request carries HTTP Basic credentials of the target server. One
//! [`NexusClient`] is meant to be shared by all concurrent builds; the
//! underlying connection pool is reference counted and cloning is cheap.

use std::fs::File;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ClientConfig, ServerConnection};
use crate::error::NexusApiError;
use crate::resolver::{file_name_of, ResolvedField};

const UPLOAD_PATH: [&str; 4] = ["service", "rest", "v1", "components"];
const SEARCH_PATH: [&str; 4] = ["service", "rest", "beta", "search"];
const COMPONENTS_PATH: [&str; 4] = ["service", "rest", "beta", "components"];

/// A Nexus component as returned by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<Component>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// Shared blocking HTTP client for Nexus servers.
#[derive(Debug, Clone)]
pub struct NexusClient {
    http: Client,
}

impl NexusClient {
    pub fn new(config: &ClientConfig) -> Result<Self, NexusApiError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NexusApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http })
    }

    /// Upload one component built from resolved form fields.
    ///
    /// Calls `POST {url}/service/rest/v1/components?repository={repository}`.
    /// File parts are streamed from disk as `application/octet-stream`.
    pub fn upload_component(
        &self,
        server: &ServerConnection,
        repository: &str,
        fields: &[ResolvedField],
    ) -> Result<(), NexusApiError> {
        let endpoint = "POST /service/rest/v1/components";
        let mut url = rest_url(&server.url, &UPLOAD_PATH)?;
        url.query_pairs_mut().append_pair("repository", repository);

        let form = multipart_form(fields)?;
        let resp = self
            .authorized(self.http.post(url), server)
            .multipart(form)
            .send()
            .map_err(|e| NexusApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        ensure_success(endpoint, resp).map(drop)
    }

    /// Search components of `repository` holding an asset with this SHA-1.
    ///
    /// Calls `GET {url}/service/rest/beta/search?repository={repository}&sha1={sha1}`.
    pub fn search_by_sha1(
        &self,
        server: &ServerConnection,
        repository: &str,
        sha1: &str,
    ) -> Result<SearchResponse, NexusApiError> {
        let endpoint = "GET /service/rest/beta/search";
        let mut url = rest_url(&server.url, &SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("repository", repository)
            .append_pair("sha1", sha1);

        let resp = self
            .authorized(self.http.get(url), server)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| NexusApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        ensure_success(endpoint, resp)?
            .json()
            .map_err(|e| NexusApiError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }

    /// Delete a component by id.
    ///
    /// Calls `DELETE {url}/service/rest/beta/components/{component_id}`.
    pub fn delete_component(
        &self,
        server: &ServerConnection,
        component_id: &str,
    ) -> Result<(), NexusApiError> {
        let endpoint = format!("DELETE /service/rest/beta/components/{component_id}");
        let mut url = rest_url(&server.url, &COMPONENTS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| invalid_base(&server.url))?
            .push(component_id);

        let resp = self
            .authorized(self.http.delete(url), server)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| NexusApiError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        ensure_success(&endpoint, resp).map(drop)
    }

    fn authorized(&self, req: RequestBuilder, server: &ServerConnection) -> RequestBuilder {
        req.basic_auth(
            &server.credentials.username,
            Some(server.credentials.password.as_str()),
        )
    }
}

fn ensure_success(endpoint: &str, resp: Response) -> Result<Response, NexusApiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    Err(NexusApiError::ApiError {
        endpoint: endpoint.into(),
        status,
        body,
    })
}

fn multipart_form(fields: &[ResolvedField]) -> Result<Form, NexusApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            ResolvedField::Literal { key, value } => form.text(key.clone(), value.clone()),
            ResolvedField::File { key, path, .. } => {
                let io_err = |source| NexusApiError::Io {
                    path: path.clone(),
                    source,
                };
                let file = File::open(path).map_err(io_err)?;
                let len = file.metadata().map_err(io_err)?.len();
                let part = Part::reader_with_length(file, len)
                    .file_name(file_name_of(path))
                    .mime_str("application/octet-stream")
                    .map_err(|e| NexusApiError::Http {
                        endpoint: "multipart".into(),
                        source: e,
                    })?;
                form.part(key.clone(), part)
            }
        };
    }
    Ok(form)
}

/// `base` with the REST path segments appended after any context path.
fn rest_url(base: &Url, segments: &[&str]) -> Result<Url, NexusApiError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| invalid_base(base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn invalid_base(base: &Url) -> NexusApiError {
    NexusApiError::InvalidUrl {
        url: base.to_string(),
        reason: "URL cannot be used as a base".into(),
    }
}
