//! Persisted plugin settings.
//!
//! The record is stored as a flat JSON object
//! `{ "unsplashAccessKey": "...", "query": "..." }`. Loading merges the stored
//! object over the defaults key by key, so fields missing from an older record
//! fall back to the default and keys written by someone else are kept.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SettingsError;

/// File name used by [`JsonFileSettingsStore::in_dir`].
pub const SETTINGS_FILE_NAME: &str = "data.json";

const KNOWN_FIELDS: [&str; 2] = ["unsplashAccessKey", "query"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "unsplashAccessKey")]
    pub access_key: String,
    pub query: String,
    /// Keys in the stored record this crate does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Shallow merge of a persisted record over the defaults.
    ///
    /// `None` (nothing stored yet) yields the defaults, and so does a known
    /// field stored as `null`. A stored value that is not an object, or a
    /// known field of any other non-string type, is rejected.
    pub fn merged(persisted: Option<Value>) -> Result<Self, SettingsError> {
        let mut record = match serde_json::to_value(Settings::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        match persisted {
            None | Some(Value::Null) => {}
            Some(Value::Object(stored)) => {
                for (key, value) in stored {
                    // A null known field reads as unset.
                    if value.is_null() && KNOWN_FIELDS.contains(&key.as_str()) {
                        continue;
                    }
                    record.insert(key, value);
                }
            }
            Some(other) => {
                return Err(SettingsError::Corrupt(format!(
                    "expected an object, found {}",
                    json_kind(&other)
                )))
            }
        }
        serde_json::from_value(Value::Object(record))
            .map_err(|err| SettingsError::Corrupt(err.to_string()))
    }

    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::AccessKey => &self.access_key,
            SettingKey::Query => &self.query,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            SettingKey::AccessKey => self.access_key = value,
            SettingKey::Query => self.query = value,
        }
    }

    pub fn to_value(&self) -> Result<Value, SettingsError> {
        Ok(serde_json::to_value(self)?)
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

/// Editable settings fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    AccessKey,
    Query,
}

/// Host-provided persistence for the settings record.
pub trait SettingsStore: Send + Sync {
    /// The stored record, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Value>, SettingsError>;

    /// Replace the stored record.
    fn save(&self, record: &Value) -> Result<(), SettingsError>;
}

/// In-memory store, mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    record: Mutex<Option<Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Value) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    /// Snapshot of the last saved record.
    pub fn record(&self) -> Option<Value> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<Value>, SettingsError> {
        Ok(self.record())
    }

    fn save(&self, record: &Value) -> Result<(), SettingsError> {
        *self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record.clone());
        Ok(())
    }
}

/// JSON file on disk, written atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/data.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Option<Value>, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, record: &Value) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(record)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SETTINGS_FILE_NAME.to_string());
        let temp = self
            .path
            .with_file_name(format!("{file_name}.tmp.{}", std::process::id()));

        let written = write_private(&temp, &json).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }
        Ok(())
    }
}

/// Write `contents` to `path`, readable by the owner only.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)?;
    // The access key lives in this file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
