//! Local JSON file standing in for the remote APIs when testing on a real box.
//!
//! ```json
//! {
//!     "outdoor": 68,
//!     "device": {
//!         "ambient_temperature_f": 70,
//!         "hvac_mode": "heat",
//!         "target_temperature_f": 70,
//!         "device_id": "fake_device_123"
//!     }
//! }
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FakeFileError {
    #[error("Cannot access fake file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse fake file {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Fake file {path:?} has no '{key}'")]
    MissingKey { path: PathBuf, key: String },
}

#[derive(Debug, Clone)]
pub struct FakeFile {
    path: PathBuf,
}

impl FakeFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Value, FakeFileError> {
        let data = fs::read_to_string(&self.path)
            .map_err(|source| FakeFileError::Io { path: self.path.clone(), source })?;
        serde_json::from_str(&data)
            .map_err(|source| FakeFileError::Json { path: self.path.clone(), source })
    }

    /// Read the top level `key` out of the file.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T, FakeFileError> {
        let mut data = self.read_all()?;
        let value = data.get_mut(key)
            .map(Value::take)
            .ok_or_else(|| FakeFileError::MissingKey { path: self.path.clone(), key: key.to_owned() })?;
        serde_json::from_value(value)
            .map_err(|source| FakeFileError::Json { path: self.path.clone(), source })
    }

    /// Set `object.parm` to `value`, leaving everything else in the file alone.
    pub fn write(&self, object: &str, parm: &str, value: Value) -> Result<(), FakeFileError> {
        let mut data = self.read_all()?;
        let target = data.get_mut(object)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| FakeFileError::MissingKey { path: self.path.clone(), key: object.to_owned() })?;
        target.insert(parm.to_owned(), value);

        let pretty = serde_json::to_string_pretty(&data)
            .map_err(|source| FakeFileError::Json { path: self.path.clone(), source })?;
        fs::write(&self.path, pretty)
            .map_err(|source| FakeFileError::Io { path: self.path.clone(), source })
    }
}
