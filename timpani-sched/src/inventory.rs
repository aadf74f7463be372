/// A node's available CPUs and memory ceiling, supplied externally by the
/// YAML-ingest collaborator (spec §4.3's "per-node inventory").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInventory {
    pub node_id: String,
    /// CPU indices available on this node, in ascending order.
    pub cpu_ids: Vec<u32>,
    /// Memory ceiling in megabytes; `0` means unconstrained. Only the
    /// legacy algorithms consult this (spec §4.3).
    pub memory_mb: u32,
}

impl NodeInventory {
    pub fn new(node_id: impl Into<String>, cpu_ids: Vec<u32>, memory_mb: u32) -> Self {
        NodeInventory { node_id: node_id.into(), cpu_ids, memory_mb }
    }
}
