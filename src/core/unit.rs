//! Installed unit (plugin) data model.
//!
//! A [`Unit`] is what the host knows about one installed plugin: its stable
//! path-like id (e.g. `"akismet/akismet.php"`), header fields, and the raw
//! `requires_plugins` declaration that the graph parses. Units are plain values;
//! the core never stores them beyond one resolution pass.

use serde::{Deserialize, Serialize};

/// One installed plugin as enumerated by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable path-like identifier, usually `"<dir>/<file>.php"`.
    pub id: String,
    /// Display name from the plugin header.
    #[serde(default)]
    pub name: String,
    /// Version from the plugin header.
    #[serde(default)]
    pub version: String,
    /// Minimum host (WordPress) version.
    #[serde(default)]
    pub requires_wp: String,
    /// Minimum PHP version.
    #[serde(default)]
    pub requires_php: String,
    /// Raw declaration: comma-separated `identifier` or `identifier|endpoint` tokens.
    #[serde(default)]
    pub requires_plugins: String,
    /// Author from the plugin header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Description from the plugin header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plugin homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_uri: Option<String>,
    /// URL of the unit's own directory, used to resolve relative `.json` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Unit {
    /// Create a unit with an id and display name and no requirements.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the raw `requires_plugins` declaration.
    #[must_use]
    pub fn with_requires(mut self, requires_plugins: impl Into<String>) -> Self {
        self.requires_plugins = requires_plugins.into();
        self
    }

    /// Set the directory URL used for relative endpoints.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The identifier other units use to require this one.
    pub fn slug(&self) -> String {
        slug_from_id(&self.id)
    }

    /// Whether the unit declares any requirement at all.
    pub fn has_requirements(&self) -> bool {
        !self.requires_plugins.trim().is_empty()
    }
}

/// Derive the dependency identifier of a unit from its id.
///
/// `"dir/file.php"` maps to `"dir"`; a single-file id maps to its file name
/// without the `.php` extension.
pub fn slug_from_id(id: &str) -> String {
    match id.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => id.strip_suffix(".php").unwrap_or(id).to_string(),
    }
}
