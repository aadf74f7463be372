//! Configuration loading for the Timpani orchestrator and node binaries
//! (spec §6 [ADDED]).
//!
//! CLI parsing is `clap`-derived; environment variables (`TIMPANI_NODE_*`,
//! `TIMPANI_ORCH_*`) are applied on top of flags, matching the "env wins
//! over file/default" layering of `knhk-config::env::apply_env_overrides`.
//! The node inventory file is `serde_yaml`.

mod clock;
mod env;
mod error;
mod inventory_file;
mod node_config;
mod orch_config;

pub use clock::ClockId;
pub use error::{ConfigError, ConfigResult};
pub use inventory_file::{load_node_inventory, load_node_inventory_path, NodeInventoryEntry, DEFAULT_NODE_ID};
pub use node_config::NodeConfig;
pub use orch_config::OrchConfig;
