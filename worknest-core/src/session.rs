//! Local key/value facts written by the login flow.
//!
//! The core only reads these (organization id, user id, the serialized
//! user-info record). The one exception is the identity resolver, which
//! persists the default tenant so later lookups short-circuit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::error::{WorknestError, WorknestResult};

pub const ORGANIZATION_ID_KEY: &str = "organization_id";
pub const SELECTED_ORGANIZATION_ID_KEY: &str = "selectedOrganizationId";
pub const ORG_ID_KEY: &str = "orgId";
pub const USER_ID_KEY: &str = "user_id";
pub const USER_ID_CAMEL_KEY: &str = "userId";
pub const USER_INFO_KEY: &str = "user_info";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> WorknestResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> WorknestResult<()>;
    fn remove(&self, key: &str) -> WorknestResult<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> WorknestResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> WorknestResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> WorknestResult<()> {
        (**self).remove(key)
    }
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MemoryStore {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> WorknestResult<MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| WorknestError::Storage("session store lock poisoned".into()))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> WorknestResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> WorknestResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> WorknestResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// A flat JSON object on disk. Non-string values are returned in their JSON
/// text form, which is how a nested `user_info` record comes back.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> WorknestResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            WorknestError::Storage(format!("{} is not a JSON object: {e}", self.path.display()))
        })
    }

    fn write(&self, values: &Map<String, Value>) -> WorknestResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| WorknestError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// All stored facts, for display.
    pub fn entries(&self) -> WorknestResult<Vec<(String, String)>> {
        let mut entries: Vec<_> = self
            .read()?
            .into_iter()
            .map(|(k, v)| (k, value_to_string(v)))
            .collect();
        entries.sort();
        Ok(entries)
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> WorknestResult<Option<String>> {
        Ok(self.read()?.remove(key).map(value_to_string))
    }

    fn set(&self, key: &str, value: &str) -> WorknestResult<()> {
        let mut values = self.read()?;
        values.insert(key.to_string(), Value::String(value.to_string()));
        self.write(&values)
    }

    fn remove(&self, key: &str) -> WorknestResult<()> {
        let mut values = self.read()?;
        if values.remove(key).is_some() {
            self.write(&values)?;
        }
        Ok(())
    }
}
