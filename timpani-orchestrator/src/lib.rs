//! Timpani plan dispatcher: the orchestrator-side half of the node/orchestrator
//! bus (spec §3, §4.4).
//!
//! Serves `SchedInfo`, the cross-node `Sync` barrier, and `Register`/`DMiss`
//! over `timpani-rpc`, fanning faults out to a [`fault_sink::FaultSink`].

mod dispatcher;
mod error;
mod fault_sink;
mod handler;
mod ingest;

pub use dispatcher::Dispatcher;
pub use error::{OrchError, OrchResult};
pub use fault_sink::{notify_fault_best_effort, FaultKind, FaultSink, RpcFaultSink};
pub use handler::OrchestratorHandler;
pub use ingest::{build_plan, to_sched_inventory};
