use async_trait::async_trait;
use tracing::warn;

/// The kind of fault being reported. Spec §4.4 names only `DeadlineMiss`
/// today; kept as an enum (rather than a bare string) so a future fault
/// kind is a compile-time addition, not a wire-format guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    DeadlineMiss,
}

impl FaultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::DeadlineMiss => "deadline_miss",
        }
    }
}

/// The orchestrator's upstream fault collaborator (spec §4 [ADDED] "Fault
/// sink contract"): a fire-and-forget `NotifyFault(workload_id, node_id,
/// task_name, kind)` call over a distinct endpoint from the node↔orchestrator
/// bus.
///
/// Represented as a trait, grounded on `knhk-sidecar::client::SidecarClient`'s
/// trait-based client pattern, so tests can substitute a recording fake
/// instead of a real socket.
#[async_trait]
pub trait FaultSink: Send + Sync {
    async fn notify_fault(&self, workload_id: &str, node_id: &str, task_name: &str, kind: FaultKind) -> anyhow::Result<()>;
}

/// Connects to `fault_service_host:fault_service_port` over the same
/// `timpani-rpc` transport as the node/orchestrator bus and issues one
/// `DMiss`-shaped call per fault. A fresh connection is opened per call:
/// faults are rare enough (spec §4.6: "best-effort... no local queue") that
/// holding a persistent socket open buys nothing.
pub struct RpcFaultSink {
    addr: String,
}

impl RpcFaultSink {
    pub fn new(host: &str, port: u16) -> Self {
        RpcFaultSink { addr: format!("{host}:{port}") }
    }
}

#[async_trait]
impl FaultSink for RpcFaultSink {
    async fn notify_fault(&self, workload_id: &str, node_id: &str, task_name: &str, kind: FaultKind) -> anyhow::Result<()> {
        let mut client = timpani_rpc::RpcClient::connect(&self.addr).await?;
        // `DMiss` is reused as the wire shape for `NotifyFault`: both carry
        // (node id, task name); `workload_id`/`kind` are implied by context
        // on today's single-fault-kind sink and logged locally for
        // diagnosis rather than placed on the wire.
        client.dmiss(node_id, task_name).await?;
        tracing::debug!(workload_id, node_id, task_name, kind = kind.as_str(), "forwarded fault to upstream sink");
        Ok(())
    }
}

/// Calls `sink.notify_fault`, logging (not propagating) a failure — spec
/// §4.4: "Failures upstream are logged; no local queue."
pub async fn notify_fault_best_effort(sink: &dyn FaultSink, workload_id: &str, node_id: &str, task_name: &str, kind: FaultKind) {
    if let Err(e) = sink.notify_fault(workload_id, node_id, task_name, kind).await {
        warn!(workload_id, node_id, task_name, error = %e, "fault sink notification failed");
    }
}
