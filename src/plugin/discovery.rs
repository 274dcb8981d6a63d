//! Manifest Discovery
//!
//! Finds plugin manifests (`*.yaml`, `*.yml`, `*.json`) under a directory.

use std::path::{Path, PathBuf};
use log::{debug, warn};
use tokio::fs;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::manifest::PluginManifest;

const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A manifest together with the file it came from
#[derive(Debug, Clone)]
pub struct DiscoveredManifest {
    pub path: PathBuf,
    pub manifest: PluginManifest,
}

fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Recursively scans a directory for plugin manifests
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    plugin_directory: PathBuf,
}

impl ManifestDiscovery {
    pub fn new<P: AsRef<Path>>(plugin_directory: P) -> PluginResult<Self> {
        let path = plugin_directory.as_ref().to_path_buf();

        if !path.is_dir() {
            return Err(PluginError::manifest_error(format!(
                "Plugin directory does not exist or is not a directory: {}",
                path.display()
            )));
        }

        Ok(Self { plugin_directory: path })
    }

    pub fn plugin_directory(&self) -> &Path {
        &self.plugin_directory
    }

    /// Parse every manifest found, sorted by path. Files that fail to parse
    /// are logged and skipped.
    pub async fn discover(&self) -> PluginResult<Vec<DiscoveredManifest>> {
        let mut manifests = Vec::new();
        let mut directories_to_scan = vec![self.plugin_directory.clone()];

        while let Some(current_dir) = directories_to_scan.pop() {
            let mut entries = fs::read_dir(&current_dir).await.map_err(|e| {
                PluginError::manifest_error(format!("Failed to read directory {}: {}", current_dir.display(), e))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                PluginError::manifest_error(format!("Failed to read directory entry: {}", e))
            })? {
                let path = entry.path();

                if path.is_dir() {
                    directories_to_scan.push(path);
                } else if is_manifest_file(&path) {
                    match Self::parse_manifest_file(&path).await {
                        Ok(manifest) => manifests.push(DiscoveredManifest { path, manifest }),
                        Err(e) => warn!("Skipping manifest {}: {}", path.display(), e),
                    }
                }
            }
        }

        manifests.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Discovered {} manifests in {}", manifests.len(), self.plugin_directory.display());
        Ok(manifests)
    }

    async fn parse_manifest_file(path: &Path) -> PluginResult<PluginManifest> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            PluginError::manifest_error(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        PluginManifest::parse_for_path(path, &content)
    }
}
