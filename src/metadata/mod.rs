//! Metadata records for dependency identifiers.
//!
//! A [`MetadataRecord`] is either *fetched* (decoded from a source payload) or
//! *synthesized* (a local placeholder built when no source answered). Raw
//! bytes are classified exactly once, in [`decode_payload`], into a
//! [`FetchOutcome`]; nothing downstream inspects payload shapes.
//!
//! Payloads are JSON objects in the plugin-information format:
//!
//! ```json
//! {
//!   "name": "Ext Plugin",
//!   "slug": "ext",
//!   "version": "1.2.0",
//!   "author": "Someone",
//!   "short_description": "Does things.",
//!   "sections": { "description": "Does many things.", "installation": "Upload it." },
//!   "homepage": "https://example.com/ext",
//!   "requires_plugins": ["woocommerce"],
//!   "download_link": "https://example.com/ext.zip",
//!   "icons": { "default": "https://example.com/ext.svg" }
//! }
//! ```
//!
//! Decoding is tolerant: absent fields become empty, numbers are accepted
//! where strings are expected, and `requires_plugins` may be an array or a
//! comma-separated string. An object carrying an `error` or `code` key is an
//! error report, not a record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_ICON_TEMPLATE, ELLIPSIS, MANUAL_INSTALL_INSTRUCTIONS, MANUAL_INSTALL_NOTICE,
    SHORT_DESCRIPTION_LIMIT,
};
use crate::core::Unit;
use crate::fetch::FetchError;
use crate::requirement::{parse, parse_declaration};

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    /// Decoded from a successful source call.
    Fetched,
    /// Built locally because no source produced usable data.
    Synthesized,
}

/// Long-form sections of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Installation instructions.
    #[serde(default)]
    pub installation: String,
}

/// Descriptive data for one dependency identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Identifier the record was resolved for.
    pub identifier: String,
    /// Display name; never empty.
    pub name: String,
    /// Slug reported by the source, or the identifier.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub sections: Sections,
    #[serde(default)]
    pub homepage: String,
    /// Identifiers this dependency itself requires.
    #[serde(default)]
    pub requires_plugins: Vec<String>,
    #[serde(default)]
    pub requires_wp: String,
    #[serde(default)]
    pub requires_php: String,
    #[serde(default)]
    pub download_link: String,
    #[serde(default)]
    pub icon: String,
    pub origin: RecordOrigin,
}

impl MetadataRecord {
    /// Whether this is a best-effort placeholder rather than real source data.
    pub fn is_synthesized(&self) -> bool {
        self.origin == RecordOrigin::Synthesized
    }

    /// Placeholder record for an identifier no source could supply.
    ///
    /// The name is always the identifier. When the installed unit owning the
    /// identifier is known, its header fields and its own requirements fill
    /// the rest of the record.
    pub fn synthesized(identifier: &str, installed: Option<&Unit>) -> Self {
        let unit_description =
            installed.and_then(|unit| unit.description.as_deref()).map(str::trim).filter(|d| !d.is_empty());
        let description = match unit_description {
            Some(text) => format!("{text}\n\n{MANUAL_INSTALL_NOTICE}"),
            None => MANUAL_INSTALL_NOTICE.to_string(),
        };

        let requires_plugins = installed
            .map(|unit| {
                parse_declaration(&unit.requires_plugins)
                    .into_iter()
                    .map(|requirement| requirement.identifier)
                    .collect()
            })
            .unwrap_or_default();

        let field = |get: fn(&Unit) -> String| installed.map(get).unwrap_or_default();

        Self {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            slug: identifier.to_string(),
            version: field(|unit| unit.version.clone()),
            author: field(|unit| unit.author.clone().unwrap_or_default()),
            short_description: MANUAL_INSTALL_NOTICE.to_string(),
            sections: Sections {
                description,
                installation: MANUAL_INSTALL_INSTRUCTIONS.to_string(),
            },
            homepage: field(|unit| unit.plugin_uri.clone().unwrap_or_default()),
            requires_plugins,
            requires_wp: field(|unit| unit.requires_wp.clone()),
            requires_php: field(|unit| unit.requires_php.clone()),
            download_link: String::new(),
            icon: DEFAULT_ICON_TEMPLATE.replace("{slug}", identifier),
            origin: RecordOrigin::Synthesized,
        }
    }
}

/// Result of classifying one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A structurally valid record.
    Record(MetadataRecord),
    /// The payload was unusable.
    Failed(FetchError),
}

impl FetchOutcome {
    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<MetadataRecord, FetchError> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Failed(error) => Err(error),
        }
    }
}

/// Classify raw payload bytes for `identifier`.
pub fn decode_payload(identifier: &str, bytes: &[u8]) -> FetchOutcome {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            return FetchOutcome::Failed(FetchError::Malformed {
                reason: e.to_string(),
            });
        }
    };

    let object = match value {
        Value::Object(object) => object,
        other => {
            return FetchOutcome::Failed(FetchError::Malformed {
                reason: format!("expected a JSON object, found {}", kind(&other)),
            });
        }
    };

    // A null marker counts as absent.
    for marker in ["error", "code"] {
        if let Some(value) = object.get(marker).filter(|value| !value.is_null()) {
            return FetchOutcome::Failed(FetchError::ErrorMarker {
                message: text(value).unwrap_or_else(|| marker.to_string()),
            });
        }
    }

    FetchOutcome::Record(normalize(identifier, &object))
}

fn normalize(identifier: &str, object: &Map<String, Value>) -> MetadataRecord {
    let string = |key: &str| object.get(key).and_then(text).unwrap_or_default();

    let slug = object.get("slug").and_then(text).unwrap_or_else(|| identifier.to_string());
    let name = object.get("name").and_then(text).unwrap_or_else(|| slug.clone());

    let section = |key: &str| {
        object
            .get("sections")
            .and_then(Value::as_object)
            .and_then(|sections| sections.get(key))
            .and_then(text)
            .unwrap_or_default()
    };
    let mut sections = Sections {
        description: section("description"),
        installation: section("installation"),
    };

    let short_description = match object.get("short_description").and_then(text) {
        Some(short) => short,
        None if !sections.description.is_empty() => truncate_description(&sections.description),
        None => MANUAL_INSTALL_NOTICE.to_string(),
    };
    if sections.description.is_empty() {
        sections.description = short_description.clone();
    }

    MetadataRecord {
        identifier: identifier.to_string(),
        name,
        slug,
        version: string("version"),
        author: string("author"),
        short_description,
        sections,
        homepage: string("homepage"),
        requires_plugins: object.get("requires_plugins").map(identifiers).unwrap_or_default(),
        requires_wp: string("requires"),
        requires_php: string("requires_php"),
        download_link: string("download_link"),
        icon: icon(object),
        origin: RecordOrigin::Fetched,
    }
}

/// First [`SHORT_DESCRIPTION_LIMIT`] characters of `description` plus [`ELLIPSIS`].
pub fn truncate_description(description: &str) -> String {
    let mut short: String = description.chars().take(SHORT_DESCRIPTION_LIMIT).collect();
    short.push_str(ELLIPSIS);
    short
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn identifiers(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text)
            .map(|token| parse(&token).identifier)
            .filter(|identifier| !identifier.is_empty())
            .collect(),
        Value::String(declaration) => {
            parse_declaration(declaration).into_iter().map(|requirement| requirement.identifier).collect()
        }
        _ => Vec::new(),
    }
}

fn icon(object: &Map<String, Value>) -> String {
    if let Some(icons) = object.get("icons").and_then(Value::as_object) {
        for key in ["default", "svg", "2x", "1x"] {
            if let Some(url) = icons.get(key).and_then(text) {
                return url;
            }
        }
    }
    object.get("icon").and_then(text).unwrap_or_default()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
