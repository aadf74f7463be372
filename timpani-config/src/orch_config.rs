use clap::Parser;

use crate::env::{env_override, env_override_parsed};
use crate::error::ConfigResult;

/// Orchestrator process configuration (spec §6's orchestrator CLI plus
/// `TIMPANI_ORCH_*` env overrides).
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "timpani-orchestrator", about = "Timpani plan dispatcher and fault sink relay")]
pub struct OrchConfig {
    /// Path to an optional static config file.
    #[arg(long)]
    pub config: Option<String>,

    /// Port the `SchedInfo`/`Sync`/`DMiss`/`Register` RPC server binds.
    #[arg(long = "sinfo-port", env = "TIMPANI_ORCH_SINFO_PORT", default_value_t = 7070)]
    pub sinfo_port: u16,

    #[arg(long = "fault-service-host", env = "TIMPANI_ORCH_FAULT_SERVICE_HOST", default_value = "127.0.0.1")]
    pub fault_service_host: String,

    #[arg(long = "fault-service-port", env = "TIMPANI_ORCH_FAULT_SERVICE_PORT", default_value_t = 7071)]
    pub fault_service_port: u16,

    /// Kept as a field name for wire-schema compatibility with the
    /// original's config layout; the transport is plain TCP, not D-Bus, so
    /// this has no effect on how the server actually listens (see
    /// DESIGN.md).
    #[arg(long = "dbus-port", env = "TIMPANI_ORCH_DBUS_PORT", default_value_t = 0)]
    pub dbus_port: u16,

    /// Path to the node inventory YAML file. Absent ⇒ a single default
    /// node (spec §6).
    #[arg(long = "node-config-file", env = "TIMPANI_ORCH_NODE_CONFIG_FILE")]
    pub node_config_file: Option<String>,

    #[arg(long = "log-level", env = "TIMPANI_ORCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Scheduling algorithm name: `target_node_priority` (default),
    /// `least_loaded`, or `best_fit_decreasing`.
    #[arg(long, env = "TIMPANI_ORCH_ALGORITHM", default_value = "target_node_priority")]
    pub algorithm: String,
}

impl OrchConfig {
    pub fn load() -> ConfigResult<Self> {
        let mut config = OrchConfig::parse();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        env_override_parsed("TIMPANI_ORCH_SINFO_PORT", &mut self.sinfo_port)?;
        env_override("TIMPANI_ORCH_FAULT_SERVICE_HOST", &mut self.fault_service_host);
        env_override_parsed("TIMPANI_ORCH_FAULT_SERVICE_PORT", &mut self.fault_service_port)?;
        env_override_parsed("TIMPANI_ORCH_DBUS_PORT", &mut self.dbus_port)?;
        env_override("TIMPANI_ORCH_LOG_LEVEL", &mut self.log_level);
        env_override("TIMPANI_ORCH_ALGORITHM", &mut self.algorithm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_target_node_priority() {
        let config = OrchConfig::parse_from(["timpani-orchestrator"]);
        assert_eq!(config.algorithm, "target_node_priority");
        assert_eq!(config.sinfo_port, 7070);
        assert!(config.node_config_file.is_none());
    }
}
