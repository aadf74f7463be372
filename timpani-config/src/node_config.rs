use clap::Parser;

use crate::clock::ClockId;
use crate::env::{env_override, env_override_bool, env_override_parsed};
use crate::error::ConfigResult;

/// Node process configuration (spec §6's node CLI, plus `TIMPANI_NODE_*`
/// env overrides applied on top — grounded on
/// `knhk-config::env::apply_env_overrides`'s "env wins over flag" layering).
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "timpani-node", about = "Timpani time-triggered task execution agent")]
pub struct NodeConfig {
    /// Path to this node's static config file, if any.
    #[arg(long)]
    pub config: Option<String>,

    /// This node's id, as used in the orchestrator's node inventory.
    #[arg(long, env = "TIMPANI_NODE_ID")]
    pub node_id: String,

    /// Orchestrator RPC host to connect to.
    #[arg(long = "server-host", env = "TIMPANI_NODE_SERVER_HOST", default_value = "127.0.0.1")]
    pub server_host: String,

    /// Orchestrator RPC port to connect to.
    #[arg(long, env = "TIMPANI_NODE_PORT", default_value_t = 7070)]
    pub port: u16,

    #[arg(long = "log-level", env = "TIMPANI_NODE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Whether to poll the cross-node `Sync` barrier before arming timers
    /// (spec §4.5).
    #[arg(long = "enable-sync", env = "TIMPANI_NODE_ENABLE_SYNC", default_value_t = false)]
    pub enable_sync: bool,

    /// Whether to write a `.gpdata` plot file of observed scheduling
    /// intervals.
    #[arg(long = "enable-plot", env = "TIMPANI_NODE_ENABLE_PLOT", default_value_t = false)]
    pub enable_plot: bool,

    /// Clock shared by the timer engine and the hyperperiod supervisor
    /// (spec §9 [ADDED] note).
    #[arg(long = "clock-id", env = "TIMPANI_NODE_CLOCK_ID", default_value = "wall")]
    pub clock_id: ClockId,

    /// Whether to apply `sched_setaffinity` for scheduled tasks.
    #[arg(long = "cpu-pinning", env = "TIMPANI_NODE_CPU_PINNING", default_value_t = true)]
    pub cpu_pinning: bool,

    /// Default `sched_setattr` priority applied when a task doesn't specify
    /// one of its own.
    #[arg(long, env = "TIMPANI_NODE_PRIORITY", default_value_t = 50)]
    pub priority: u32,

    /// Path to a pre-built sigwait tracing probe object. The probe's own
    /// content is an external collaborator's concern (spec §1); absent,
    /// the node runs without deadline-miss detection.
    #[arg(long = "bpf-object", env = "TIMPANI_NODE_BPF_OBJECT")]
    pub bpf_object: Option<String>,
}

impl NodeConfig {
    /// Parses CLI args, then re-applies `TIMPANI_NODE_*` environment
    /// variables on top so they win even when a flag's default was used
    /// (matches `clap`'s `env` attribute precedence, made explicit here for
    /// fields whose env var name doesn't map 1:1 to a flag).
    pub fn load() -> ConfigResult<Self> {
        let mut config = NodeConfig::parse();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        env_override("TIMPANI_NODE_SERVER_HOST", &mut self.server_host);
        env_override_parsed("TIMPANI_NODE_PORT", &mut self.port)?;
        env_override("TIMPANI_NODE_LOG_LEVEL", &mut self.log_level);
        env_override_bool("TIMPANI_NODE_ENABLE_SYNC", &mut self.enable_sync)?;
        env_override_bool("TIMPANI_NODE_ENABLE_PLOT", &mut self.enable_plot)?;
        env_override_bool("TIMPANI_NODE_CPU_PINNING", &mut self.cpu_pinning)?;
        env_override_parsed("TIMPANI_NODE_PRIORITY", &mut self.priority)?;
        if let Ok(value) = std::env::var("TIMPANI_NODE_BPF_OBJECT") {
            self.bpf_object = Some(value);
        }
        Ok(())
    }
}
