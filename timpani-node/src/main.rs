use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use timpani_config::NodeConfig;
use timpani_node::{
    calibrate_offset, fetch_plan, find_process_by_name, install_shutdown_signal_handlers, negotiate_start_instant,
    real_ns_to_tokio_instant, run_hyperperiod, run_observer, run_task_timer, set_affinity, set_sched_attr, teardown,
    watch_task_death, AyaRingBufferSource, ChannelEventSource, EventSource, HyperperiodSupervisor, PlotWriter,
    ProcessHandle, TaskRuntime,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rpc_addr = format!("{}:{}", config.server_host, config.port);
    tracing::info!(node_id = %config.node_id, %rpc_addr, "starting timpani-node");

    let fetched = fetch_plan(&rpc_addr, &config.node_id).await?;
    let (shutdown_tx, shutdown_rx) = install_shutdown_signal_handlers();

    let plot_writer = if config.enable_plot {
        Some(Arc::new(tokio::sync::Mutex::new(PlotWriter::open(".", &config.node_id)?)))
    } else {
        None
    };

    let mut runtimes = Vec::new();
    for record in fetched.tasks {
        let handle = match find_process_by_name(&record.name) {
            Ok(Some(pid)) => match ProcessHandle::open(pid) {
                Ok(handle) => {
                    if config.cpu_pinning {
                        if let Err(e) = set_affinity(pid, record.cpu_affinity) {
                            tracing::warn!(task = %record.name, error = %e, "failed to set CPU affinity; continuing");
                        }
                    }
                    if let Err(e) = set_sched_attr(pid, record.policy, record.priority) {
                        tracing::warn!(task = %record.name, error = %e, "failed to set scheduling attributes; continuing");
                    }
                    Some(handle)
                }
                Err(e) => {
                    tracing::warn!(task = %record.name, error = %e, "failed to open a stable process handle; task dropped");
                    None
                }
            },
            Ok(None) => {
                tracing::warn!(task = %record.name, "no matching process found; task dropped");
                None
            }
            Err(e) => {
                tracing::warn!(task = %record.name, error = %e, "process resolution failed; task dropped");
                None
            }
        };

        if handle.is_some() {
            runtimes.push(Arc::new(TaskRuntime::new(record, handle)));
        }
    }

    if runtimes.is_empty() {
        tracing::warn!("no tasks resolved to a live process; node has nothing to schedule");
    }

    let start_instant_real_ns =
        negotiate_start_instant(&rpc_addr, &config.node_id, config.enable_sync, config.clock_id).await?;
    let supervisor = Arc::new(HyperperiodSupervisor::new(
        start_instant_real_ns,
        fetched.hyperperiod_us,
        runtimes.len(),
        config.clock_id,
    ));

    let offset_ns = calibrate_offset();
    let observer_source: Box<dyn EventSource> = match config.bpf_object.as_deref() {
        Some(path) => match AyaRingBufferSource::load(path) {
            Ok(source) => Box::new(source),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load tracing probe; observer will see no events");
                Box::new(ChannelEventSource::new().1)
            }
        },
        None => {
            tracing::info!("no --bpf-object configured; observer will see no events");
            Box::new(ChannelEventSource::new().1)
        }
    };
    tokio::spawn(run_observer(observer_source, offset_ns, Arc::new(runtimes.clone()), shutdown_rx.clone()));

    let tokio_start = real_ns_to_tokio_instant(start_instant_real_ns);

    let mut task_handles = Vec::new();
    for task in &runtimes {
        let timer_task = Arc::clone(task);
        let node_id = config.node_id.clone();
        let rpc_addr = rpc_addr.clone();
        let supervisor = Arc::clone(&supervisor);
        let plot = plot_writer.clone();
        let shutdown_rx = shutdown_rx.clone();
        task_handles.push(tokio::spawn(run_task_timer(
            timer_task, tokio_start, node_id, rpc_addr, supervisor, plot, shutdown_rx,
        )));

        if let Some(handle) = task.handle.clone() {
            let name = task.record.name.clone();
            let shutdown_rx = shutdown_rx.clone();
            task_handles.push(tokio::spawn(async move {
                if watch_task_death(&name, &handle, shutdown_rx).await {
                    tracing::warn!(task = %name, "removed from the monitored set; no restart attempted");
                }
            }));
        }
    }

    let hyperperiod_rx = shutdown_rx.clone();
    tokio::spawn(run_hyperperiod(Arc::clone(&supervisor), fetched.workload_id.clone(), tokio_start, hyperperiod_rx));

    let mut shutdown_watch = shutdown_rx;
    shutdown_watch.changed().await.ok();

    // Graceful only (spec §5): every spawned task already watches this same
    // shutdown channel and exits at the top of its own loop, so teardown
    // waits for natural completion rather than aborting mid-handler.
    futures::future::join_all(task_handles).await;
    let handles: Vec<_> = runtimes.iter().filter_map(|t| t.handle.clone()).collect();
    teardown(handles);

    tracing::info!("timpani-node shut down");
    let _ = shutdown_tx;
    Ok(())
}
