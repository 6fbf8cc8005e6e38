//! Repository configuration.
//!
//! Loaded once at the start of a run and passed by reference into every
//! stage. The main file (`index.yaml`) is required:
//!
//! ```yaml
//! base-url: https://repo.example.com
//! havoc-mappings:
//!   com.example.tweak: 123
//! hidden:
//!   - com.example.internal
//! title-overrides:
//!   com.example.tweak: Example Tweak
//! release:
//!   origin: Example
//!   label: Example
//! ```
//!
//! The icon map (`icons/index.yaml`, package name -> icon file name) is
//! optional; when it is absent no `Icon` fields are emitted.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the icon map, relative to the config file's directory.
pub const ICON_MAP_PATH: &str = "icons/index.yaml";

/// URL templates for presentation fields.
///
/// `{id}` expands to the depiction id, `{base_url}` and `{icon}` to the
/// repository base URL and icon file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DepictionTemplates {
    /// `Depiction` field template.
    pub depiction: String,
    /// `SileoDepiction` field template.
    pub sileo_depiction: String,
    /// `Icon` field template.
    pub icon: String,
}

impl Default for DepictionTemplates {
    fn default() -> Self {
        Self {
            depiction: "https://havoc.app/depiction/{id}".to_string(),
            sileo_depiction: "https://havoc.app/package/{id}/depiction.json".to_string(),
            icon: "{base_url}/icons/{icon}".to_string(),
        }
    }
}

impl DepictionTemplates {
    /// Expand the `Depiction` template.
    pub fn depiction_url(&self, id: &str) -> String {
        self.depiction.replace("{id}", id)
    }

    /// Expand the `SileoDepiction` template.
    pub fn sileo_depiction_url(&self, id: &str) -> String {
        self.sileo_depiction.replace("{id}", id)
    }

    /// Expand the `Icon` template.
    pub fn icon_url(&self, base_url: &str, icon: &str) -> String {
        self.icon
            .replace("{base_url}", base_url.trim_end_matches('/'))
            .replace("{icon}", icon)
    }
}

/// Static lookup tables consulted by display enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTables {
    /// Package names whose archives never appear in the index.
    pub hidden: BTreeSet<String>,
    /// Package name -> replacement `Name` field value.
    pub title_overrides: BTreeMap<String, String>,
    /// Package name -> icon file name.
    pub icons: BTreeMap<String, String>,
    /// Package name -> depiction id.
    pub depiction_ids: BTreeMap<String, String>,
    /// Public base URL of the repository, used for icon links.
    pub base_url: Option<String>,
    /// URL templates.
    pub templates: DepictionTemplates,
}

/// Header fields of the `Release` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseMetadata {
    /// `Origin` header.
    pub origin: String,
    /// `Label` header.
    pub label: String,
    /// `Suite` header.
    pub suite: String,
    /// `Version` header.
    pub version: String,
    /// `Codename` header.
    pub codename: String,
    /// `Architectures` header, space-joined on output.
    pub architectures: Vec<String>,
    /// `Components` header, space-joined on output.
    pub components: Vec<String>,
    /// `Description` header.
    pub description: String,
}

impl Default for ReleaseMetadata {
    fn default() -> Self {
        Self {
            origin: "debdex".to_string(),
            label: "debdex".to_string(),
            suite: "stable".to_string(),
            version: "1.0".to_string(),
            codename: "stable".to_string(),
            architectures: vec![
                "iphoneos-arm".to_string(),
                "iphoneos-arm64".to_string(),
                "iphoneos-arm64e".to_string(),
            ],
            components: vec!["main".to_string()],
            description: String::new(),
        }
    }
}

/// Immutable configuration for one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoConfig {
    /// Enrichment tables.
    pub tables: MappingTables,
    /// `Release` headers.
    pub release: ReleaseMetadata,
}

/// On-disk shape of the main config file. Unknown keys (e.g. the download
/// tooling's `repos` list) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default, deserialize_with = "id_map")]
    havoc_mappings: BTreeMap<String, String>,
    #[serde(default)]
    hidden: BTreeSet<String>,
    #[serde(default)]
    title_overrides: BTreeMap<String, String>,
    #[serde(default)]
    depiction: DepictionTemplates,
    #[serde(default)]
    release: ReleaseMetadata,
}

/// Depiction ids are numeric in most hand-written configs.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

fn id_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, IdValue>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, id)| match id {
            IdValue::Text(s) => (name, s),
            IdValue::Number(n) => (name, n.to_string()),
        })
        .collect())
}

impl RepoConfig {
    /// Load the main config file and the icon map.
    ///
    /// `icon_map` defaults to [`ICON_MAP_PATH`] next to the config file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ConfigurationMissing`] if the main file does not
    /// exist, or [`BuildError::InvalidConfiguration`] if either file cannot be
    /// parsed.
    pub fn load(path: &Path, icon_map: Option<&Path>) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::ConfigurationMissing {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let file = parse_config(path, &content)?;

        let icon_path = icon_map.map_or_else(
            || {
                path.parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(ICON_MAP_PATH)
            },
            Path::to_path_buf,
        );
        let icons = load_icon_map(&icon_path)?;

        Ok(Self {
            tables: MappingTables {
                hidden: file.hidden,
                title_overrides: file.title_overrides,
                icons,
                depiction_ids: file.havoc_mappings,
                base_url: file.base_url.filter(|u| !u.trim().is_empty()),
                templates: file.depiction,
            },
            release: file.release,
        })
    }
}

fn parse_config(path: &Path, content: &str) -> Result<ConfigFile> {
    let invalid = |reason: String| BuildError::InvalidConfiguration {
        path: path.to_path_buf(),
        reason,
    };

    if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(content).map_err(|e| invalid(e.to_string()))
    } else {
        serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))
    }
}

/// Load the optional icon map. A missing or empty file yields an empty map.
fn load_icon_map(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        debug!(path = %path.display(), "no icon map, icons disabled");
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let map: Option<BTreeMap<String, String>> =
        serde_yaml::from_str(&content).map_err(|e| BuildError::InvalidConfiguration {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })?;
    Ok(map.unwrap_or_default())
}
