use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default node id and CPU set used when no inventory file is given
/// (spec §6: "absent file yields the single default node").
pub const DEFAULT_NODE_ID: &str = "default";
const DEFAULT_CPU_COUNT: u32 = 4;

/// One node's entry in the node inventory YAML (spec §4.3's "per-node
/// inventory of available CPU ids and a memory ceiling").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInventoryEntry {
    pub node_id: String,
    pub cpu_ids: Vec<u32>,
    #[serde(default)]
    pub memory_mb: u32,
}

/// Loads the node inventory from `path`, or returns a single default node
/// (`"default"`, 4 CPUs, unconstrained memory) when `path` is `None`.
pub fn load_node_inventory(path: Option<&str>) -> ConfigResult<Vec<NodeInventoryEntry>> {
    let Some(path) = path else {
        return Ok(vec![default_node_inventory()]);
    };

    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
    let entries: Vec<NodeInventoryEntry> = serde_yaml::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;

    if entries.is_empty() {
        return Ok(vec![default_node_inventory()]);
    }
    Ok(entries)
}

fn default_node_inventory() -> NodeInventoryEntry {
    NodeInventoryEntry {
        node_id: DEFAULT_NODE_ID.to_string(),
        cpu_ids: (0..DEFAULT_CPU_COUNT).collect(),
        memory_mb: 0,
    }
}

/// Convenience overload taking any path-like value, for callers that
/// already hold a `Path`/`PathBuf` rather than a config string.
pub fn load_node_inventory_path(path: Option<&Path>) -> ConfigResult<Vec<NodeInventoryEntry>> {
    load_node_inventory(path.and_then(|p| p.to_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn absent_file_yields_single_default_node() {
        let entries = load_node_inventory(None).unwrap();
        assert_eq!(entries, vec![default_node_inventory()]);
    }

    #[test]
    fn parses_a_yaml_inventory_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- node_id: n1\n  cpu_ids: [0, 1]\n  memory_mb: 2048\n- node_id: n2\n  cpu_ids: [0]\n"
        )
        .unwrap();

        let entries = load_node_inventory(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].node_id, "n1");
        assert_eq!(entries[0].memory_mb, 2048);
        assert_eq!(entries[1].memory_mb, 0);
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let result = load_node_inventory(Some("/nonexistent/path/inventory.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
