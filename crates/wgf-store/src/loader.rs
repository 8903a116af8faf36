//! Loading structured configuration from locations.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::{ConfigurationData, RAW_FIELD};

/// A source of configuration documents.
pub trait CanLoadConfiguration: Send + Sync {
    /// Returns whether this loader understands the given location.
    fn supports(&self, source: &Path) -> bool;

    /// Loads the document stored at `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is unreadable or malformed.
    fn load(&self, source: &Path) -> Result<ConfigurationData>;

    /// Loads the document at `source`, or an empty document if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the location exists but is unreadable or malformed.
    fn load_if_exists(&self, source: &Path) -> Result<ConfigurationData> {
        if source.exists() {
            self.load(source)
        } else {
            debug!(path = %source.display(), "location does not exist, using empty document");
            Ok(ConfigurationData::new())
        }
    }
}

pub(crate) fn is_json(location: &Path) -> bool {
    location
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}

fn read(source: &Path) -> Result<String> {
    fs::read_to_string(source).map_err(|e| Error::io(source, e))
}

/// Loads JSON objects from `.json` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileConfigurationLoader;

impl CanLoadConfiguration for JsonFileConfigurationLoader {
    fn supports(&self, source: &Path) -> bool {
        is_json(source)
    }

    fn load(&self, source: &Path) -> Result<ConfigurationData> {
        let content = read(source)?;
        if content.trim().is_empty() {
            return Ok(ConfigurationData::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(data)) => Ok(data),
            Ok(other) => Err(Error::parse(
                source,
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
            Err(e) => Err(Error::parse(source, e.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads any non-JSON file as a text record: `{"raw": "<content>"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileConfigurationLoader;

impl CanLoadConfiguration for TextFileConfigurationLoader {
    fn supports(&self, source: &Path) -> bool {
        !is_json(source)
    }

    fn load(&self, source: &Path) -> Result<ConfigurationData> {
        let content = read(source)?;
        let mut data = ConfigurationData::new();
        data.insert(
            RAW_FIELD.to_string(),
            Value::String(content.trim_end_matches('\n').to_string()),
        );
        Ok(data)
    }
}

/// Dispatches each load to the first registered loader that supports the location.
pub struct ConfigurationLoader {
    loaders: Vec<Box<dyn CanLoadConfiguration>>,
}

impl ConfigurationLoader {
    /// Creates a loader over the given implementations, tried in order.
    #[must_use]
    pub fn new(loaders: Vec<Box<dyn CanLoadConfiguration>>) -> Self {
        Self { loaders }
    }

    fn loader_for(&self, source: &Path) -> Result<&dyn CanLoadConfiguration> {
        self.loaders
            .iter()
            .find(|loader| loader.supports(source))
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnsupportedLocation {
                path: source.to_path_buf(),
            })
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new(vec![
            Box::new(JsonFileConfigurationLoader),
            Box::new(TextFileConfigurationLoader),
        ])
    }
}

impl std::fmt::Debug for ConfigurationLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationLoader")
            .field("loaders", &self.loaders.len())
            .finish()
    }
}

impl CanLoadConfiguration for ConfigurationLoader {
    fn supports(&self, source: &Path) -> bool {
        self.loaders.iter().any(|loader| loader.supports(source))
    }

    fn load(&self, source: &Path) -> Result<ConfigurationData> {
        debug!(path = %source.display(), "loading configuration");
        self.loader_for(source)?.load(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("state.json", true ; "json extension")]
    #[test_case("STATE.JSON", true ; "uppercase json extension")]
    #[test_case("salt.txt", false ; "text file")]
    #[test_case("salt", false ; "no extension")]
    fn json_detection(name: &str, expected: bool) {
        assert_eq!(is_json(Path::new(name)), expected);
    }

    #[test]
    fn loads_json_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"federation": {"name": "wg-federation0"}}"#).expect("write");

        let data = ConfigurationLoader::default().load(&path).expect("load");
        assert_eq!(data["federation"]["name"], "wg-federation0");
    }

    #[test]
    fn rejects_json_that_is_not_an_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        let err = ConfigurationLoader::default().load(&path).expect_err("must fail");
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(matches!(
            ConfigurationLoader::default().load(&path),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn empty_json_file_is_an_empty_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "").expect("write");

        let data = ConfigurationLoader::default().load(&path).expect("load");
        assert!(data.is_empty());
    }

    #[test]
    fn loads_text_as_raw_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("salt.txt");
        fs::write(&path, "c2FsdA==\n").expect("write");

        let data = ConfigurationLoader::default().load(&path).expect("load");
        assert_eq!(data[RAW_FIELD], "c2FsdA==");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");

        assert!(matches!(
            ConfigurationLoader::default().load(&path),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn load_if_exists_returns_empty_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");

        let data = ConfigurationLoader::default()
            .load_if_exists(&path)
            .expect("load_if_exists");
        assert!(data.is_empty());
    }

    #[test]
    fn loader_without_implementations_rejects_every_location() {
        let loader = ConfigurationLoader::new(Vec::new());
        assert!(!loader.supports(Path::new("state.json")));
        assert!(matches!(
            loader.load(Path::new("state.json")),
            Err(Error::UnsupportedLocation { .. })
        ));
    }
}
