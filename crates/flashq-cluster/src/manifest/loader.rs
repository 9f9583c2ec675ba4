//! Cluster manifest loading from disk.

use super::types::ClusterManifest;
use crate::error::ControllerError;
use std::path::Path;

/// Loads a [`ClusterManifest`] from a JSON or YAML file, selected by
/// extension with JSON-then-YAML fallback for anything else.
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ClusterManifest, ControllerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ControllerError::from_io_error(e, "manifest loading"))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ControllerError::from_io_error(e, "JSON manifest parsing")),
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ControllerError::from_io_error(e, "YAML manifest parsing")),
            _ => serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| {
                    ControllerError::from_io_error(e, "manifest parsing (tried JSON and YAML)")
                }),
        }
    }
}
