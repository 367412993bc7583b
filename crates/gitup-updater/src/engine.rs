//! Update check engine - turns an extension inventory into update decisions.
//!
//! The engine combines:
//! - a [`TagSource`] for listing published tags
//! - the version comparator for picking the highest newer tag
//! - the [`ErrorLog`] for recording failed checks
//!
//! Candidates are checked one at a time. A failure on one candidate is
//! logged and never aborts the batch, so [`UpdateChecker::run`] cannot fail.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error_log::{ErrorLog, ErrorLogEntry};
use crate::inventory::ExtensionRecord;
use crate::repository::{register_headers, HeaderRegistrar};
use crate::tags::{TagRecord, TagSource};
use crate::version::VersionKey;

/// A newer version available for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDecision {
    /// Extension identifier.
    pub id: String,
    /// Directory part of the identifier.
    pub slug: String,
    /// Tag name of the newer version.
    pub new_version: String,
    /// Archive to install the newer version from.
    pub package: String,
    /// Extension homepage.
    pub url: Option<String>,
}

impl UpdateDecision {
    fn new(extension: &ExtensionRecord, tag: &TagRecord) -> Self {
        Self {
            id: extension.id.clone(),
            slug: slug_of(&extension.id),
            new_version: tag.name.clone(),
            package: tag.zipball_url.clone(),
            url: extension.homepage.clone(),
        }
    }
}

/// `plugin-dir/plugin.php` -> `plugin-dir`; identifiers without a directory
/// are their own slug.
fn slug_of(id: &str) -> String {
    match id.split_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => id.to_string(),
    }
}

/// Pick the highest tag strictly newer than `installed`.
///
/// Tag listings are not guaranteed to be sorted. Among tags that compare
/// equal the first one listed wins.
pub fn select_update<'a>(installed: &str, tags: &'a [TagRecord]) -> Option<&'a TagRecord> {
    let installed = VersionKey::parse(installed);
    let mut best: Option<(VersionKey, &TagRecord)> = None;

    for tag in tags {
        let key = VersionKey::parse(&tag.name);
        if key <= installed {
            continue;
        }
        let replace = best
            .as_ref()
            .map_or(true, |(best_key, _)| key > *best_key);
        if replace {
            best = Some((key, tag));
        }
    }

    best.map(|(_, tag)| tag)
}

/// The host's update notification cache.
///
/// `checked` is filled by the host's own update check (identifier to
/// installed version); `response` holds the updates it will offer.
/// `last_checked` is stamped each time decisions are merged in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTransient {
    #[serde(default)]
    pub checked: BTreeMap<String, String>,
    #[serde(default)]
    pub response: BTreeMap<String, UpdateDecision>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

/// Runs update checks for a batch of extensions.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gitup_updater::{ErrorLog, GitHubTagClient, MemoryOptionStore, UpdateChecker, UpdateConfig};
///
/// let config = UpdateConfig::default();
/// let client = GitHubTagClient::new(config.github.clone(), &config.network)?;
/// let log = ErrorLog::new(Arc::new(MemoryOptionStore::new()));
/// let checker = UpdateChecker::new(Arc::new(client), log);
///
/// for decision in checker.run(&extensions).await {
///     println!("{} -> {}", decision.id, decision.new_version);
/// }
/// ```
pub struct UpdateChecker {
    source: Arc<dyn TagSource>,
    log: ErrorLog,
}

impl UpdateChecker {
    pub fn new(source: Arc<dyn TagSource>, log: ErrorLog) -> Self {
        Self { source, log }
    }

    /// Get the error log.
    pub fn error_log(&self) -> &ErrorLog {
        &self.log
    }

    /// Make the host recognize every repository header.
    pub fn register_headers(&self, registrar: &mut dyn HeaderRegistrar) {
        register_headers(registrar);
    }

    /// Check every tracked extension and return the updates found.
    ///
    /// Extensions without a repository reference are skipped without any
    /// request. Failed requests are appended to the error log. Decisions
    /// are in candidate order but callers should not rely on it.
    pub async fn run(&self, extensions: &[ExtensionRecord]) -> Vec<UpdateDecision> {
        let candidates: Vec<_> = extensions
            .iter()
            .filter_map(|ext| ext.tracked_repository().map(|repo| (ext, repo)))
            .collect();

        if candidates.is_empty() {
            debug!("No tracked extensions, skipping update check");
            return Vec::new();
        }

        info!("Checking {} tracked extensions for updates", candidates.len());
        let mut decisions = Vec::new();

        for (extension, repository) in candidates {
            let tags = match self.source.fetch_tags(repository).await {
                Ok(tags) => tags,
                Err(e) => {
                    warn!("Update check failed for {}: {}", extension.id, e);
                    let entry = ErrorLogEntry::from_fetch_error(&extension.id, &e);
                    if let Err(log_err) = self.log.append(entry) {
                        error!("Failed to record error for {}: {}", extension.id, log_err);
                    }
                    continue;
                }
            };

            if tags.is_empty() {
                debug!("{} has no tags", extension.id);
                continue;
            }

            match select_update(&extension.version, &tags) {
                Some(tag) => {
                    info!(
                        "Update available for {}: {} -> {}",
                        extension.id, extension.version, tag.name
                    );
                    decisions.push(UpdateDecision::new(extension, tag));
                }
                None => debug!(
                    "{} is up to date at {} ({} tags)",
                    extension.id,
                    extension.version,
                    tags.len()
                ),
            }
        }

        decisions
    }

    /// Merge update decisions into the host's notification cache.
    ///
    /// Does nothing until the host's own check has populated `checked`.
    /// Otherwise stamps `last_checked` and returns the number of decisions
    /// merged.
    pub async fn check_transient(
        &self,
        transient: &mut UpdateTransient,
        extensions: &[ExtensionRecord],
    ) -> usize {
        if transient.checked.is_empty() {
            debug!("Host has not checked for updates yet, leaving transient untouched");
            return 0;
        }

        let decisions = self.run(extensions).await;
        let merged = decisions.len();
        for decision in decisions {
            transient.response.insert(decision.id.clone(), decision);
        }
        transient.last_checked = Some(Utc::now());
        merged
    }
}
