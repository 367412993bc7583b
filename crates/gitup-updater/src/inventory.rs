//! Installed extensions as seen by the update checker.
//!
//! The host owns the inventory; this module only defines the record the
//! engine consumes, how a host header map turns into one, and the provider
//! capability the host implements.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::UpdateError;
use crate::repository::{RepositoryKind, RepositoryRef};

/// Header holding the installed version.
pub const VERSION_HEADER: &str = "Version";
/// Header holding the display name.
pub const NAME_HEADER: &str = "Name";
/// Headers holding the homepage, in lookup order.
pub const HOMEPAGE_HEADERS: [&str; 3] = ["PluginURI", "ThemeURI", "URI"];

/// Plugin or theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Plugin,
    Theme,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin => write!(f, "plugin"),
            Self::Theme => write!(f, "theme"),
        }
    }
}

/// An installed extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Unique identifier, e.g. `git-update/git-update.php` or a theme
    /// template name.
    pub id: String,
    /// Installed version.
    pub version: String,
    /// Where updates are published; `None` means not tracked.
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Homepage, passed through to update decisions.
    #[serde(default)]
    pub homepage: Option<String>,
}

impl ExtensionRecord {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            repository: None,
            name: None,
            homepage: None,
        }
    }

    pub fn with_repository(mut self, repository: RepositoryRef) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Build a record from the header map a host extracted from an
    /// extension. Empty values count as absent.
    pub fn from_headers(id: impl Into<String>, headers: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            headers
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let repository = RepositoryKind::ALL
            .iter()
            .find_map(|kind| get(kind.header()).map(|uri| RepositoryRef::new(*kind, uri)));

        Self {
            id: id.into(),
            version: get(VERSION_HEADER).unwrap_or_default(),
            repository,
            name: get(NAME_HEADER),
            homepage: HOMEPAGE_HEADERS.iter().find_map(|&h| get(h)),
        }
    }

    /// The repository to check, if the extension is tracked.
    pub fn tracked_repository(&self) -> Option<&RepositoryRef> {
        self.repository.as_ref().filter(|r| r.is_set())
    }
}

/// Host capability listing installed extensions.
pub trait ExtensionInventory {
    fn extensions(&self, kind: ExtensionKind) -> Result<Vec<ExtensionRecord>, UpdateError>;
}

/// Inventory file contents: header maps keyed by extension identifier.
///
/// ```toml
/// [plugins."git-update/git-update.php"]
/// Name = "Git Updates"
/// Version = "1.2.5"
/// "GitHub URI" = "https://github.com/kasparsd/git-update"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileInventory {
    #[serde(default)]
    pub plugins: BTreeMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub themes: BTreeMap<String, HashMap<String, String>>,
}

impl FileInventory {
    /// Load an inventory from a `.json` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self, UpdateError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content).map_err(|e| {
                UpdateError::InventoryError(format!("{}: {}", path.display(), e))
            })
        } else {
            toml::from_str(&content).map_err(|e| {
                UpdateError::InventoryError(format!("{}: {}", path.display(), e))
            })
        }
    }
}

impl ExtensionInventory for FileInventory {
    fn extensions(&self, kind: ExtensionKind) -> Result<Vec<ExtensionRecord>, UpdateError> {
        let source = match kind {
            ExtensionKind::Plugin => &self.plugins,
            ExtensionKind::Theme => &self.themes,
        };
        Ok(source
            .iter()
            .map(|(id, headers)| ExtensionRecord::from_headers(id.as_str(), headers))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_headers_plugin() {
        let record = ExtensionRecord::from_headers(
            "git-update/git-update.php",
            &headers(&[
                ("Name", "Git Updates"),
                ("Version", "1.2.5"),
                ("PluginURI", "https://github.com/kasparsd/git-update"),
                ("GitHub URI", "https://github.com/kasparsd/git-update"),
            ]),
        );
        assert_eq!(record.id, "git-update/git-update.php");
        assert_eq!(record.version, "1.2.5");
        assert_eq!(record.name.as_deref(), Some("Git Updates"));
        assert_eq!(
            record.homepage.as_deref(),
            Some("https://github.com/kasparsd/git-update")
        );
        assert_eq!(
            record.tracked_repository(),
            Some(&RepositoryRef::github("https://github.com/kasparsd/git-update"))
        );
    }

    #[test]
    fn test_from_headers_theme_homepage() {
        let record = ExtensionRecord::from_headers(
            "twentyten",
            &headers(&[("Version", "2.0"), ("ThemeURI", "https://example.com/theme")]),
        );
        assert_eq!(record.homepage.as_deref(), Some("https://example.com/theme"));
        assert!(record.tracked_repository().is_none());
    }

    #[test]
    fn test_empty_repository_header_is_untracked() {
        let record = ExtensionRecord::from_headers(
            "blank",
            &headers(&[("Version", "1.0"), ("GitHub URI", "  ")]),
        );
        assert!(record.repository.is_none());

        let record = ExtensionRecord::new("manual", "1.0").with_repository(RepositoryRef::github(""));
        assert!(record.tracked_repository().is_none());
    }

    #[test]
    fn test_file_inventory_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inventory.toml");
        std::fs::write(
            &path,
            r#"
[plugins."git-update/git-update.php"]
Version = "1.2.5"
"GitHub URI" = "https://github.com/kasparsd/git-update"

[plugins."hello.php"]
Version = "1.7"

[themes.mytheme]
Version = "0.3"
"GitHub URI" = "https://github.com/me/mytheme"
"#,
        )
        .unwrap();

        let inventory = FileInventory::load(&path).unwrap();
        let plugins = inventory.extensions(ExtensionKind::Plugin).unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].id, "git-update/git-update.php");
        assert!(plugins[1].tracked_repository().is_none());

        let themes = inventory.extensions(ExtensionKind::Theme).unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].version, "0.3");
    }

    #[test]
    fn test_file_inventory_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inventory.json");
        std::fs::write(
            &path,
            r#"{"themes": {"t": {"Version": "1.0", "GitHub URI": "https://github.com/o/t"}}}"#,
        )
        .unwrap();

        let inventory = FileInventory::load(&path).unwrap();
        assert!(inventory.extensions(ExtensionKind::Plugin).unwrap().is_empty());
        assert_eq!(inventory.extensions(ExtensionKind::Theme).unwrap().len(), 1);
    }

    #[test]
    fn test_file_inventory_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inventory.toml");
        std::fs::write(&path, "plugins = 3").unwrap();
        assert!(matches!(
            FileInventory::load(&path),
            Err(UpdateError::InventoryError(_))
        ));
    }
}
