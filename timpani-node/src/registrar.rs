//! Node registrar & fetcher (spec §4.5, component C5): connects to the
//! orchestrator, polls `SchedInfo` until it returns a non-empty plan, and
//! decodes it into this node's task list and hyperperiod.

use std::time::Duration;

use tracing::{info, warn};

use timpani_codec::decode_sched_info;
use timpani_rpc::RpcClient;
use timpani_types::TaskRecord;

use crate::error::{NodeError, NodeResult};

/// Interval between empty-`SchedInfo` retries once connected (the plan may
/// not be installed on the orchestrator yet).
const SCHED_INFO_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// This node's slice of the plan, as fetched and decoded from the
/// orchestrator.
pub struct FetchedPlan {
    pub workload_id: String,
    pub hyperperiod_us: u64,
    pub tasks: Vec<TaskRecord>,
}

/// Connects to `addr` (with the standard up-to-300-retry window), then polls
/// `SchedInfo` for `node_id` until it returns a non-empty payload (spec
/// §4.5: "If the reply is empty, drop the session and retry").
pub async fn fetch_plan(addr: &str, node_id: &str) -> NodeResult<FetchedPlan> {
    loop {
        let mut client = RpcClient::connect_with_retry(addr).await?;
        client.register(node_id).await?;

        loop {
            let payload = client.sched_info(node_id).await?;
            if payload.is_empty() {
                warn!(node_id, "SchedInfo returned an empty plan; retrying");
                tokio::time::sleep(SCHED_INFO_POLL_INTERVAL).await;
                continue;
            }

            let decoded = decode_sched_info(&payload).map_err(NodeError::Protocol)?;
            let own_tasks: Vec<TaskRecord> =
                decoded.tasks.into_iter().filter(|t| t.assigned_node_id == node_id).collect();

            if own_tasks.is_empty() {
                return Err(NodeError::EmptyPlan { node_id: node_id.to_string() });
            }

            info!(node_id, workload_id = %decoded.workload_id, task_count = own_tasks.len(), "fetched plan");
            return Ok(FetchedPlan {
                workload_id: decoded.workload_id,
                hyperperiod_us: decoded.hyperperiod_us,
                tasks: own_tasks,
            });
        }
    }
}
