use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
    chart::{Chart, Dashboard},
    error::{CotlensResult, IoError},
};

// ================================================================================================
// Traits
// ================================================================================================

pub trait ExportName {
    fn base_name(&self) -> String;

    fn filename(&self) -> String {
        format!("{}.json", self.base_name())
    }
}

pub trait ToJson {
    /// Serializes the value to a generic JSON tree for a rendering layer.
    fn to_json(&self) -> CotlensResult<Value>;
}

pub trait ToJsonFile {
    /// Writes the value as pretty-printed JSON into `dir`.
    ///
    /// # Side Effects
    /// - Creates the directory if missing.
    /// - Overwrites the file if it exists.
    ///
    /// Returns the path of the written file.
    fn write_json(&self, dir: impl AsRef<Path>) -> CotlensResult<PathBuf>;
}

// ================================================================================================
// Blanket Implementations
// ================================================================================================

impl<T> ToJson for T
where
    T: Serialize,
{
    fn to_json(&self) -> CotlensResult<Value> {
        Ok(serde_json::to_value(self).map_err(IoError::Json)?)
    }
}

impl<T> ToJsonFile for T
where
    T: Serialize + ExportName,
{
    fn write_json(&self, dir: impl AsRef<Path>) -> CotlensResult<PathBuf> {
        let dir = dir.as_ref();
        let file_path = dir.join(self.filename());

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                IoError::WriteFailed(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let body = serde_json::to_string_pretty(self).map_err(IoError::Json)?;
        fs::write(&file_path, body).map_err(|e| {
            IoError::WriteFailed(format!("Failed to write '{}': {e}", file_path.display()))
        })?;

        info!(path = %file_path.display(), "Wrote chart JSON");
        Ok(file_path)
    }
}

impl ExportName for Dashboard {
    fn base_name(&self) -> String {
        "dashboard".to_string()
    }
}

impl ExportName for Chart {
    fn base_name(&self) -> String {
        self.metric.as_str().to_string()
    }
}
