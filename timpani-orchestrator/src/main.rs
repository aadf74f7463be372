use std::sync::Arc;

use timpani_config::OrchConfig;
use timpani_orchestrator::{Dispatcher, OrchestratorHandler, RpcFaultSink};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OrchConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let fault_sink = Arc::new(RpcFaultSink::new(&config.fault_service_host, config.fault_service_port));
    let dispatcher = Arc::new(Dispatcher::new(fault_sink));
    let handler = Arc::new(OrchestratorHandler::new(dispatcher));

    let addr = format!("0.0.0.0:{}", config.sinfo_port);
    tracing::info!(%addr, algorithm = %config.algorithm, "starting timpani-orchestrator");

    timpani_rpc::listen_and_serve(&addr, handler).await?;
    Ok(())
}
