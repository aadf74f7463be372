//! Lifecycle & shutdown (spec §4.9, component C9).
//!
//! The original polls `epoll_wait` over each task's process-stable handle
//! and a signal-driven shutdown flag. `tokio::io::unix::AsyncFd` gives the
//! same "readable on process death" semantics for a `pidfd` without a raw
//! `epoll` loop: a `pidfd` becomes readable exactly when its process exits.

use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::process::ProcessHandle;

/// Installs handlers for `SIGTERM`/`SIGINT` (spec §4.9: "terminate and
/// interrupt signals") and returns a `watch` channel that flips to `true`
/// the first time either fires.
pub fn install_shutdown_signal_handlers() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    let sender = tx.clone();

    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        let _ = sender.send(true);
    });

    (tx, rx)
}

/// A bare file-descriptor wrapper so `AsyncFd` can register a `pidfd` it
/// doesn't own; the owning [`ProcessHandle`] is kept alive by the caller for
/// as long as this future runs.
struct BorrowedFd(RawFd);

impl AsRawFd for BorrowedFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Watches one task's process handle until either the process dies (the
/// `pidfd` becomes readable) or `shutdown` fires. Returns `true` if the
/// process died (spec §4.9: "remove it from the monitored set and log; the
/// engine does not attempt restart").
pub async fn watch_task_death(task_name: &str, handle: &ProcessHandle, mut shutdown: watch::Receiver<bool>) -> bool {
    let async_fd = match tokio::io::unix::AsyncFd::with_interest(
        BorrowedFd(handle.as_raw_fd()),
        tokio::io::Interest::READABLE,
    ) {
        Ok(fd) => fd,
        Err(e) => {
            warn!(task_name, error = %e, "failed to register pidfd with the reactor; falling back to polling");
            return poll_until_dead(handle, shutdown).await;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return false;
                }
            }
            ready = async_fd.readable() => {
                match ready {
                    Ok(mut guard) => {
                        guard.clear_ready();
                        if !handle.is_alive() {
                            warn!(task_name, "task process exited");
                            return true;
                        }
                    }
                    Err(e) => warn!(task_name, error = %e, "pidfd readiness poll failed"),
                }
            }
        }
    }
}

async fn poll_until_dead(handle: &ProcessHandle, mut shutdown: watch::Receiver<bool>) -> bool {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return false;
                }
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(500)) => {
                if !handle.is_alive() {
                    return true;
                }
            }
        }
    }
}

/// Implements spec §4.9's teardown order: stop observer threads (handled by
/// the caller sending shutdown before joining), drop timers (handled by
/// `tokio::task` drop once the owning `JoinHandle`s are dropped), close
/// process handles, and free the in-memory plan. All steps here are no-ops
/// when their resource was never created, making teardown idempotent.
pub fn teardown(task_handles: Vec<Arc<ProcessHandle>>) {
    for handle in task_handles {
        drop(handle); // OwnedFd's Drop closes the pidfd.
    }
    info!("node teardown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_task_death_detects_a_process_that_exits() {
        let mut child = std::process::Command::new("sleep").arg("0.2").spawn().unwrap();
        let pid = child.id() as i32;
        let handle = ProcessHandle::open(pid).unwrap();
        let (_tx, shutdown_rx) = watch::channel(false);

        let died = tokio::time::timeout(std::time::Duration::from_secs(5), watch_task_death("sleep", &handle, shutdown_rx))
            .await
            .unwrap();
        assert!(died);
        let _ = child.wait();
    }

    #[tokio::test]
    async fn watch_task_death_returns_false_on_shutdown() {
        let mut child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let pid = child.id() as i32;
        let handle = ProcessHandle::open(pid).unwrap();
        let (tx, shutdown_rx) = watch::channel(false);

        tx.send(true).unwrap();
        let died = tokio::time::timeout(std::time::Duration::from_secs(2), watch_task_death("sleep", &handle, shutdown_rx))
            .await
            .unwrap();
        assert!(!died);
        let _ = child.kill();
        let _ = child.wait();
    }
}
