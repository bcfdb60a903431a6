//! # Task Management System
//!
//! This module provides the worker pool the generation pipeline runs its stages on.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Cloneable handle to a pool of worker threads
//! - `Task`: A unit of work that owns its inputs and produces one output
//! - `TaskHandle`: The control thread's end of a spawned task, polled without blocking
//!
//! Each worker has a dedicated `std::sync::mpsc` channel. Work is distributed over the
//! channels round-robin, and every task reports back through its own result channel, so
//! the control thread can poll a single stage without draining anybody else's results.
//!
//! ## Task Lifecycle
//! 1. A task is spawned via `TaskManager::spawn()` or `TaskManager::publish_task()`
//! 2. The manager hands it to the next worker channel (round-robin)
//! 3. The worker runs it inside `catch_unwind`, so a panicking task cannot take the
//!    worker down with it
//! 4. The output (or the loss of it) is sent through the task's result channel
//! 5. The control thread observes it with `TaskHandle::poll()` or joins with
//!    `TaskHandle::wait()`
//!
//! A manager with zero workers runs every task inline on the spawning thread. Dropping
//! the last handle to the pool closes every channel and joins the workers.
//!
//! ## Example Usage
//! ```
//! use voxel_terrain::engine_state::task_management::TaskManager;
//!
//! let task_manager = TaskManager::new(2);
//! let handle = task_manager.spawn(|| 6 * 7);
//!
//! assert_eq!(handle.wait(), Some(42));
//! ```

pub mod task;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info};

pub use task::{Task, TaskHandle, TaskStatus};

/// A type-erased unit of work as it travels through a worker channel.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// The worker threads and the sending half of their channels.
///
/// Owned through an `Arc` by every `TaskManager` clone. Dropping it closes the channels,
/// which ends each worker's receive loop, and then joins the threads.
struct WorkerPool {
    senders: Vec<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    /// Index of the channel the next task goes to.
    current_channel: AtomicUsize,
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.senders.clear();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("A task worker terminated abnormally");
            }
        }
        debug!("Task workers joined");
    }
}

/// Handle to a pool of worker threads.
///
/// Cloning the handle shares the pool. The pool lives until the last clone is dropped.
///
/// # Implementation Notes
/// - Round-robin: consecutive tasks land on consecutive workers
/// - Panic-safe: a panicking task is reported as [`TaskStatus::Lost`], the worker survives
/// - Drop-safe: the last handle joins every worker thread
#[derive(Clone)]
pub struct TaskManager {
    pool: Arc<WorkerPool>,
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("workers", &self.pool.workers.len())
            .finish()
    }
}

/// Number of workers to use when the configuration does not specify one: all available
/// cores but one, which is left to the control thread.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. `0` makes every task run
    ///   inline on the spawning thread.
    ///
    /// A worker thread that cannot be created is logged and skipped; the pool then runs
    /// with the workers it has.
    pub fn new(num_workers: usize) -> Self {
        let mut senders = Vec::with_capacity(num_workers);
        let mut workers = Vec::with_capacity(num_workers);

        info!(
            "Available parallelism: {:?}",
            thread::available_parallelism()
        );

        for index in 0..num_workers {
            let (job_tx, job_rx) = channel::<Job>();

            let worker_closure = move || {
                while let Ok(job) = job_rx.recv() {
                    job();
                }
            };

            match thread::Builder::new()
                .name(format!("terrain-worker-{}", index))
                .spawn(worker_closure)
            {
                Ok(worker) => {
                    senders.push(job_tx);
                    workers.push(worker);
                }
                Err(e) => error!("Could not start task worker {}: {}", index, e),
            }
        }

        info!("Task manager started with {} workers", workers.len());

        TaskManager {
            pool: Arc::new(WorkerPool {
                senders,
                workers,
                current_channel: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.pool.workers.len()
    }

    /// Spawns a closure on the pool.
    ///
    /// # Returns
    /// A [`TaskHandle`] through which the closure's output is received. If no worker can
    /// take the task it runs inline before this method returns.
    pub fn spawn<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = channel();
        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(f));
            if result.is_err() {
                error!("A task panicked; its result is lost");
            }
            // The handle may already be gone when the task was abandoned.
            let _ = result_tx.send(result.ok());
        });

        match self.try_send_job(job) {
            Ok(()) => {}
            Err(job) => job(),
        }

        TaskHandle::new(result_rx)
    }

    /// Publishes a [`Task`] for execution.
    ///
    /// This is the primary method for scheduling pipeline stages. The task is moved to a
    /// worker and its [`Task::process`] output is delivered through the returned handle.
    pub fn publish_task<T: Task>(&self, task: T) -> TaskHandle<T::Output> {
        self.spawn(move || task.process())
    }

    /// Hands a job to the next worker channel, skipping disconnected ones.
    ///
    /// # Returns
    /// - `Ok(())` if a worker accepted the job
    /// - `Err(job)` if there are no workers or every worker has disconnected
    fn try_send_job(&self, mut job: Job) -> Result<(), Job> {
        let channels = self.pool.senders.len();
        for _ in 0..channels {
            let channel_idx = self.pool.current_channel.fetch_add(1, Ordering::Relaxed) % channels;
            match self.pool.senders[channel_idx].send(job) {
                Ok(()) => return Ok(()),
                Err(returned) => {
                    error!("Task worker {} disconnected", channel_idx);
                    job = returned.0;
                }
            }
        }
        Err(job)
    }
}
