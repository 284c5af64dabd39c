//! Tree document loaded from a file (JSON, or YAML by extension).
//!
//! Useful when angreal is not installed where the server runs, or to pin
//! the advertised tree.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;

use super::CommandSource;

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CommandSource for SnapshotSource {
    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }

    async fn load_tree_document(&self) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read tree snapshot: {}", self.path.display()))?;
        let lower = self.path.to_string_lossy().to_ascii_lowercase();

        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            let yaml_v: serde_yaml::Value =
                serde_yaml::from_str(&raw).context("failed to parse YAML tree snapshot")?;
            serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON tree snapshot")
        }
    }
}
