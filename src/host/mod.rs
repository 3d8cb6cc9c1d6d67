//! Host-side unit enumeration.
//!
//! The core never owns a unit store; each pass asks a [`UnitSource`] for the
//! current snapshot. [`UnitsManifest`] is the file-backed source the CLI uses:
//! a TOML document with `[[units]]` tables, or JSON (either a bare array or an
//! object with a `units` array) when the file ends in `.json`.
//!
//! ```toml
//! [[units]]
//! id = "my-addon/my-addon.php"
//! name = "My Addon"
//! version = "1.0.0"
//! requires_plugins = "woocommerce, ext|https://example.com/ext.json"
//! base_url = "https://site.example/wp-content/plugins/my-addon/"
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::{PluginDepsError, Unit};

/// Supplies the installed units for one resolution pass.
pub trait UnitSource {
    /// Current snapshot of installed units.
    fn enumerate_units(&self) -> Result<Vec<Unit>>;
}

impl UnitSource for Vec<Unit> {
    fn enumerate_units(&self) -> Result<Vec<Unit>> {
        Ok(self.clone())
    }
}

impl UnitSource for [Unit] {
    fn enumerate_units(&self) -> Result<Vec<Unit>> {
        Ok(self.to_vec())
    }
}

#[derive(Deserialize)]
struct UnitsDocument {
    #[serde(default)]
    units: Vec<Unit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonUnits {
    Bare(Vec<Unit>),
    Document(UnitsDocument),
}

/// Units listed in a TOML or JSON file.
#[derive(Debug, Clone)]
pub struct UnitsManifest {
    path: PathBuf,
}

impl UnitsManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode units from `content`; `file` names the source in errors.
    pub fn parse(content: &str, file: &Path) -> Result<Vec<Unit>> {
        let is_json = file.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parse_error = |reason: String| PluginDepsError::UnitsParseError {
            file: file.display().to_string(),
            reason,
        };

        let units = if is_json {
            match serde_json::from_str::<JsonUnits>(content).map_err(|e| parse_error(e.to_string()))? {
                JsonUnits::Bare(units) => units,
                JsonUnits::Document(document) => document.units,
            }
        } else {
            toml::from_str::<UnitsDocument>(content).map_err(|e| parse_error(e.to_string()))?.units
        };

        if let Some(unit) = units.iter().find(|unit| unit.id.trim().is_empty()) {
            return Err(PluginDepsError::InvalidUnit {
                id: unit.id.clone(),
                reason: format!("unit '{}' has an empty id", unit.name),
            }
            .into());
        }

        Ok(units)
    }
}

impl UnitSource for UnitsManifest {
    fn enumerate_units(&self) -> Result<Vec<Unit>> {
        if !self.path.exists() {
            return Err(PluginDepsError::UnitsFileNotFound {
                path: self.path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(&self.path).map_err(PluginDepsError::IoError)?;
        Self::parse(&content, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_toml_manifest() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("units.toml");
        std::fs::write(
            &path,
            r#"
[[units]]
id = "a/a.php"
name = "A"
requires_plugins = "b, ext|ext.json"
base_url = "https://site/plugins/a/"

[[units]]
id = "b/b.php"
"#,
        )
        .unwrap();

        let units = UnitsManifest::new(&path).enumerate_units().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].requires_plugins, "b, ext|ext.json");
        assert_eq!(units[1].slug(), "b");
    }

    #[test]
    fn test_json_manifest_shapes() {
        let file = Path::new("units.json");
        let bare = UnitsManifest::parse(r#"[{"id":"a/a.php","requires_plugins":"b"}]"#, file).unwrap();
        assert_eq!(bare[0].id, "a/a.php");

        let wrapped = UnitsManifest::parse(r#"{"units":[{"id":"a/a.php"}]}"#, file).unwrap();
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let temp = tempdir().unwrap();
        let err = UnitsManifest::new(temp.path().join("absent.toml")).enumerate_units().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginDepsError>(),
            Some(PluginDepsError::UnitsFileNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        let err = UnitsManifest::parse("[[units]\n", Path::new("units.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginDepsError>(),
            Some(PluginDepsError::UnitsParseError { .. })
        ));

        let err = UnitsManifest::parse("[[units]]\nid = \"\"\nname = \"Nameless\"\n", Path::new("units.toml"))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<PluginDepsError>(), Some(PluginDepsError::InvalidUnit { .. })));
    }

    #[test]
    fn test_vec_source() {
        let units = vec![Unit::new("a/a.php", "A")];
        assert_eq!(units.enumerate_units().unwrap(), units);
    }
}
