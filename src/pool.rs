//! Fixed-size worker pool with a two-phase shutdown.
//!
//! Workers pull jobs from a shared queue and run for the lifetime of the
//! pool. Shutdown escalates: close the intake and let queued work drain,
//! then cancel anything still queued, and finally detach whatever refuses
//! to finish. Resource release is best-effort and never fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// How a shutdown ended, one variant per escalation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// All workers exited within the grace period after the intake closed.
    Clean,
    /// Queued jobs had to be cancelled, but workers then exited in time.
    Forced,
    /// Workers were still running after both phases and were detached.
    TimedOut,
}

pub struct TickPool {
    job_tx: Option<Sender<Job>>,
    cancel: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl TickPool {
    /// Spawn a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let cancel = Arc::new(AtomicBool::new(false));

        let handles = (0..workers)
            .map(|i| {
                let job_rx = Arc::clone(&job_rx);
                let cancel = Arc::clone(&cancel);
                thread::Builder::new()
                    .name(format!("tick-worker-{i}"))
                    .spawn(move || worker_loop(&job_rx, &cancel))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            cancel,
            handles,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Queue a job. Returns false once the pool has been shut down.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.job_tx {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Stop the pool: request a graceful stop, wait up to `grace`, cancel
    /// queued work and wait up to `grace` again, then detach stragglers.
    pub fn shutdown(&mut self, grace: Duration) -> ShutdownOutcome {
        // Phase 1: close the intake; workers drain the queue and exit on
        // disconnect.
        self.job_tx = None;
        if self.wait_idle(grace) {
            self.join_all();
            return ShutdownOutcome::Clean;
        }

        // Phase 2: discard queued jobs that have not started yet.
        self.cancel.store(true, Ordering::Relaxed);
        log::warn!("worker pool still busy after {grace:?}; cancelling queued work");
        if self.wait_idle(grace) {
            self.join_all();
            return ShutdownOutcome::Forced;
        }

        let stuck = self
            .handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count();
        log::warn!("worker pool did not stop within {grace:?}; detaching {stuck} workers");
        self.handles.clear();
        ShutdownOutcome::TimedOut
    }

    fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            if self.handles.iter().all(|handle| handle.is_finished()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for TickPool {
    fn drop(&mut self) {
        if self.job_tx.is_some() || !self.handles.is_empty() {
            self.shutdown(Duration::from_secs(1));
        }
    }
}

fn worker_loop(jobs: &Mutex<Receiver<Job>>, cancel: &AtomicBool) {
    loop {
        // Hold the queue lock only while receiving, not while running.
        let job = {
            let rx = jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rx.recv()
        };
        match job {
            Ok(job) => {
                if !cancel.load(Ordering::Relaxed) {
                    job();
                }
            }
            Err(_) => break,
        }
    }
}
