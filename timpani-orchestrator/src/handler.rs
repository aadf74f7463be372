use std::sync::Arc;

use async_trait::async_trait;
use timpani_rpc::{Request, Response, RpcHandler, RpcResult};

use crate::dispatcher::Dispatcher;

/// Adapts [`Dispatcher`] to [`timpani_rpc::RpcHandler`], translating each of
/// the four wire methods (spec §4.2) into the matching dispatcher call
/// (spec §4.4).
pub struct OrchestratorHandler {
    dispatcher: Arc<Dispatcher>,
}

impl OrchestratorHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        OrchestratorHandler { dispatcher }
    }
}

#[async_trait]
impl RpcHandler for OrchestratorHandler {
    async fn handle(&self, request: Request) -> RpcResult<Response> {
        Ok(match request {
            Request::Register { node_id } => {
                self.dispatcher.register(&node_id).await;
                Response::Register
            }
            Request::SchedInfo { node_id } => {
                Response::SchedInfo { payload: self.dispatcher.sched_info(&node_id).await }
            }
            Request::Sync { node_id } => {
                let (ack, sec, nsec) = self.dispatcher.sync(&node_id).await;
                Response::Sync { ack, sec, nsec }
            }
            Request::DMiss { node_id, task_name } => {
                self.dispatcher.dmiss(&node_id, &task_name).await;
                Response::DMiss
            }
        })
    }
}
