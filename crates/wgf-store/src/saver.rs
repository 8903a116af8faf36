//! Saving structured configuration to locations.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::loader::is_json;
use crate::{ConfigurationData, RAW_FIELD};

/// A destination for configuration documents.
pub trait CanSaveConfiguration: Send + Sync {
    /// Returns whether this saver understands the given location.
    fn supports(&self, destination: &Path) -> bool;

    /// Overwrites `destination` with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized or written.
    fn save(&self, data: &ConfigurationData, destination: &Path) -> Result<()>;
}

/// Restricts a file to owner read/write (`0600`).
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
pub fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Replaces `destination` with whatever `write` produces.
///
/// The content goes to a `0600` temporary file in the destination directory,
/// is synced to disk and then renamed over the destination, so readers see
/// either the previous file or the complete new one.
///
/// # Errors
///
/// Returns an error if any filesystem step fails; the destination is then untouched.
pub fn write_atomically_with<F>(destination: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|e| Error::io(directory, e))?;

    let mut temporary = tempfile::Builder::new()
        .prefix(".wgf-")
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(|e| Error::io(directory, e))?;
    restrict_permissions(temporary.path())?;

    write(temporary.as_file_mut()).map_err(|e| Error::io(destination, e))?;
    temporary
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(destination, e))?;
    temporary
        .persist(destination)
        .map_err(|e| Error::io(destination, e.error))?;

    debug!(path = %destination.display(), "wrote file atomically");
    Ok(())
}

/// Replaces `destination` with `contents`. See [`write_atomically_with`].
///
/// # Errors
///
/// Returns an error if any filesystem step fails.
pub fn write_atomically(destination: &Path, contents: &[u8]) -> Result<()> {
    write_atomically_with(destination, |file| file.write_all(contents))
}

/// Saves documents as pretty-printed JSON to `.json` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileConfigurationSaver;

impl CanSaveConfiguration for JsonFileConfigurationSaver {
    fn supports(&self, destination: &Path) -> bool {
        is_json(destination)
    }

    fn save(&self, data: &ConfigurationData, destination: &Path) -> Result<()> {
        let mut contents = serde_json::to_vec_pretty(data).map_err(|e| Error::Serialize {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })?;
        contents.push(b'\n');
        write_atomically(destination, &contents)
    }
}

/// Saves text records (`{"raw": "<content>"}`) to any non-JSON file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileConfigurationSaver;

impl CanSaveConfiguration for TextFileConfigurationSaver {
    fn supports(&self, destination: &Path) -> bool {
        !is_json(destination)
    }

    fn save(&self, data: &ConfigurationData, destination: &Path) -> Result<()> {
        let Some(Value::String(raw)) = data.get(RAW_FIELD) else {
            return Err(Error::Serialize {
                path: destination.to_path_buf(),
                reason: format!("text records need a string `{RAW_FIELD}` field"),
            });
        };
        write_atomically(destination, raw.as_bytes())
    }
}

/// Dispatches each save to the first registered saver that supports the location.
pub struct ConfigurationSaver {
    savers: Vec<Box<dyn CanSaveConfiguration>>,
}

impl ConfigurationSaver {
    /// Creates a saver over the given implementations, tried in order.
    #[must_use]
    pub fn new(savers: Vec<Box<dyn CanSaveConfiguration>>) -> Self {
        Self { savers }
    }
}

impl Default for ConfigurationSaver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(JsonFileConfigurationSaver),
            Box::new(TextFileConfigurationSaver),
        ])
    }
}

impl std::fmt::Debug for ConfigurationSaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationSaver")
            .field("savers", &self.savers.len())
            .finish()
    }
}

impl CanSaveConfiguration for ConfigurationSaver {
    fn supports(&self, destination: &Path) -> bool {
        self.savers.iter().any(|saver| saver.supports(destination))
    }

    fn save(&self, data: &ConfigurationData, destination: &Path) -> Result<()> {
        let saver = self
            .savers
            .iter()
            .find(|saver| saver.supports(destination))
            .ok_or_else(|| Error::UnsupportedLocation {
                path: destination.to_path_buf(),
            })?;
        debug!(path = %destination.display(), "saving configuration");
        saver.save(data, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{CanLoadConfiguration, ConfigurationLoader};

    fn record(raw: &str) -> ConfigurationData {
        let mut data = ConfigurationData::new();
        data.insert(RAW_FIELD.to_string(), Value::String(raw.to_string()));
        data
    }

    #[test]
    fn json_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");
        let mut data = ConfigurationData::new();
        data.insert("name".to_string(), Value::String("wg-federation0".to_string()));

        ConfigurationSaver::default().save(&data, &path).expect("save");
        let loaded = ConfigurationLoader::default().load(&path).expect("load");

        assert_eq!(loaded, data);
    }

    #[test]
    fn text_save_writes_raw_content_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("salt.txt");

        ConfigurationSaver::default()
            .save(&record("abc"), &path)
            .expect("save");

        assert_eq!(fs::read_to_string(&path).expect("read"), "abc");
    }

    #[test]
    fn text_save_requires_raw_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("salt.txt");

        let err = ConfigurationSaver::default()
            .save(&ConfigurationData::new(), &path)
            .expect_err("must fail");
        assert!(matches!(err, Error::Serialize { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn save_overwrites_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("salt.txt");
        let saver = ConfigurationSaver::default();

        saver.save(&record("first"), &path).expect("first save");
        saver.save(&record("second"), &path).expect("second save");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
    }

    #[test]
    fn atomic_write_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.conf");

        write_atomically(&path, b"[Interface]\n").expect("write");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("wg0.conf")]);
    }

    #[test]
    fn failing_writer_keeps_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        write_atomically(&path, b"previous").expect("write");

        let result = write_atomically_with(&path, |_| Err(io::Error::other("disk full")));

        assert!(matches!(result, Err(Error::Io { .. })));
        assert_eq!(fs::read_to_string(&path).expect("read"), "previous");
    }

    #[cfg(unix)]
    #[test]
    fn saved_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("salt.txt");
        ConfigurationSaver::default()
            .save(&record("secret"), &path)
            .expect("save");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
