//! Timpani node agent: registrar/fetcher (C5), time-trigger engine (C6),
//! deadline-miss observer (C7), hyperperiod supervisor (C8), and lifecycle
//! management (C9).

mod clock;
mod engine;
mod error;
mod hyperperiod;
mod lifecycle;
mod observer;
mod plot;
mod process;
mod registrar;
mod task_runtime;

pub use engine::{classify, negotiate_start_instant, real_ns_to_tokio_instant, run_task_timer, DeadlineOutcome};
pub use error::{NodeError, NodeResult};
pub use hyperperiod::{run as run_hyperperiod, HyperperiodSupervisor, STATISTICS_LOG_INTERVAL};
pub use lifecycle::{install_shutdown_signal_handlers, teardown, watch_task_death};
pub use observer::{calibrate_offset, run as run_observer, AyaRingBufferSource, ChannelEventSource, EventSource, SigwaitEvent};
pub use plot::PlotWriter;
pub use process::{find_process_by_name, set_affinity, set_sched_attr, ProcessHandle};
pub use registrar::{fetch_plan, FetchedPlan};
pub use task_runtime::TaskRuntime;
