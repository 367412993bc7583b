//! Tag listing client.
//!
//! One request per call, no retries: every check cycle is a fresh
//! best-effort attempt and failures end up in the error log.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{GitHubConfig, NetworkConfig};
use crate::error::{FetchError, UpdateError};
use crate::repository::RepositoryRef;

/// A published tag and its source archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag name, usually a version string.
    pub name: String,
    /// Source archive download URL.
    pub zipball_url: String,
}

impl TagRecord {
    pub fn new(name: impl Into<String>, zipball_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zipball_url: zipball_url.into(),
        }
    }
}

/// Source of published tags for a repository.
#[async_trait]
pub trait TagSource: Send + Sync {
    /// List the tags of `repository`.
    ///
    /// An empty list is a valid answer; only transport failures, non-200
    /// responses and unusable references are errors.
    async fn fetch_tags(&self, repository: &RepositoryRef) -> Result<Vec<TagRecord>, FetchError>;
}

/// Parse a tag listing body.
///
/// Anything other than a JSON array yields no tags. Array elements without
/// a string `name` and `zipball_url` are skipped.
pub fn parse_tags(body: &str) -> Vec<TagRecord> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Tag listing is not JSON, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let serde_json::Value::Array(items) = value else {
        debug!("Tag listing is not an array, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<TagRecord>(item) {
            Ok(tag) => Some(tag),
            Err(e) => {
                warn!("Skipping malformed tag entry: {}", e);
                None
            }
        })
        .collect()
}

/// Tag client for the GitHub REST API.
pub struct GitHubTagClient {
    client: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubTagClient {
    /// Create a client from configuration.
    ///
    /// The network timeout bounds the whole request; a hanging host blocks
    /// the check no longer than that.
    pub fn new(config: GitHubConfig, network: &NetworkConfig) -> Result<Self, UpdateError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.timeout_seconds))
            .user_agent(&config.user_agent);

        if !network.use_system_proxy {
            builder = builder.no_proxy();
        }
        if let Some(proxy) = network.proxy.as_deref().filter(|p| !p.is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Endpoint that will be requested for `repository`.
    pub fn endpoint(&self, repository: &RepositoryRef) -> Result<String, FetchError> {
        repository.tags_endpoint(self.config.api_base.as_deref())
    }
}

#[async_trait]
impl TagSource for GitHubTagClient {
    async fn fetch_tags(&self, repository: &RepositoryRef) -> Result<Vec<TagRecord>, FetchError> {
        let endpoint = self.endpoint(repository)?;
        debug!("Fetching tags from: {}", endpoint);

        let mut request = self
            .client
            .get(&endpoint)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(&endpoint, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(&endpoint, e.to_string()))?;

        if status != StatusCode::OK {
            return Err(FetchError::status(&endpoint, status.as_u16(), body));
        }

        let tags = parse_tags(&body);
        debug!("Fetched {} tags from {}", tags.len(), endpoint);
        Ok(tags)
    }
}
