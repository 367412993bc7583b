//! Repository references and the recognized metadata headers.
//!
//! An extension opts into update checks by carrying a repository URI in one
//! of the headers declared here. Only GitHub is supported today; a new host
//! is a new [`RepositoryKind`] variant with its own header label and
//! endpoint rule.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

/// Supported repository hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    GitHub,
}

impl RepositoryKind {
    /// Every kind, in the order its header is checked.
    pub const ALL: [RepositoryKind; 1] = [RepositoryKind::GitHub];

    /// Metadata header an extension declares its repository URI in.
    pub fn header(&self) -> &'static str {
        match self {
            Self::GitHub => "GitHub URI",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "github"),
        }
    }
}

/// A repository an extension is published from, e.g.
/// `{kind: github, uri: "https://github.com/owner/repo"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub kind: RepositoryKind,
    pub uri: String,
}

impl RepositoryRef {
    pub fn new(kind: RepositoryKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
        }
    }

    pub fn github(uri: impl Into<String>) -> Self {
        Self::new(RepositoryKind::GitHub, uri)
    }

    /// Whether the reference carries a usable URI.
    pub fn is_set(&self) -> bool {
        !self.uri.trim().is_empty()
    }

    /// Derive the tag listing endpoint.
    ///
    /// Trailing slashes are stripped first. Without an API base the host is
    /// rewritten: `https://github.com/o/r` becomes
    /// `https://api.github.com/repos/o/r/tags`. With an API base (GitHub
    /// Enterprise, local test servers) the endpoint is
    /// `<api_base>/repos/o/r/tags`.
    pub fn tags_endpoint(&self, api_base: Option<&str>) -> Result<String, FetchError> {
        let trimmed = self.uri.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| FetchError::invalid_reference(&self.uri, e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| FetchError::invalid_reference(&self.uri, "missing host"))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let (owner, repo) = match segments.as_slice() {
            [owner, repo, ..] => (*owner, *repo),
            _ => {
                return Err(FetchError::invalid_reference(
                    &self.uri,
                    "expected <host>/<owner>/<repo>",
                ))
            }
        };

        let endpoint = match api_base {
            Some(base) => format!("{}/repos/{}/{}/tags", base.trim_end_matches('/'), owner, repo),
            None => {
                let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
                format!(
                    "{}://api.{}{}/repos/{}/{}/tags",
                    url.scheme(),
                    host,
                    port,
                    owner,
                    repo
                )
            }
        };

        Ok(endpoint)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.uri)
    }
}

/// Host capability for extending the set of metadata headers it extracts
/// from installed extensions.
pub trait HeaderRegistrar {
    /// Headers currently recognized.
    fn headers(&self) -> Vec<String>;

    /// Add a header to the recognized set.
    fn register(&mut self, header: &str);
}

impl HeaderRegistrar for Vec<String> {
    fn headers(&self) -> Vec<String> {
        self.clone()
    }

    fn register(&mut self, header: &str) {
        self.push(header.to_string());
    }
}

/// Register every repository header the registrar does not know yet.
pub fn register_headers(registrar: &mut dyn HeaderRegistrar) {
    let known = registrar.headers();
    for kind in RepositoryKind::ALL {
        if !known.iter().any(|h| h == kind.header()) {
            registrar.register(kind.header());
        }
    }
}

/// `existing` with each repository header appended once.
pub fn recognized_headers(mut existing: Vec<String>) -> Vec<String> {
    register_headers(&mut existing);
    existing
}
