//! # Task System Core Types
//!
//! This module defines the building blocks of the task system.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed on a worker thread
//! - `TaskHandle`: The receiving end of a spawned task
//! - `TaskStatus`: What a non-blocking poll observed
//!
//! ## Thread Safety
//! - `Task` must be `Send + 'static` to be transferred to a worker
//! - The output must be `Send` to be transferred back to the control thread
//! - A task owns everything it reads; shared inputs travel as `Arc`s

use std::sync::mpsc::{Receiver, TryRecvError};

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the mechanism for offloading work from the control thread to the worker
/// pool. They should be self-contained and own all the data they need.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be coarse-grained to amortize scheduling overhead
/// - Must not hold references to data that might be modified elsewhere
pub trait Task: Send + 'static {
    /// The value the task produces.
    type Output: Send + 'static;

    /// Processes the task on a worker thread.
    ///
    /// # Returns
    /// The task's output, delivered to the control thread through a [`TaskHandle`].
    fn process(self) -> Self::Output;
}

/// The outcome of a non-blocking [`TaskHandle::poll`].
#[derive(Debug)]
pub enum TaskStatus<T> {
    /// The task has not finished yet.
    Pending,
    /// The task finished and produced a value. The handle is spent afterwards.
    Complete(T),
    /// The task panicked, or its result was already taken.
    Lost,
}

/// The control thread's end of a spawned task.
///
/// Dropping a handle does not stop the task; it only discards the result.
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<Option<T>>,
    spent: bool,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(receiver: Receiver<Option<T>>) -> Self {
        TaskHandle {
            receiver,
            spent: false,
        }
    }

    /// Checks for the task's result without blocking.
    pub fn poll(&mut self) -> TaskStatus<T> {
        if self.spent {
            return TaskStatus::Lost;
        }
        match self.receiver.try_recv() {
            Ok(Some(value)) => {
                self.spent = true;
                TaskStatus::Complete(value)
            }
            Ok(None) | Err(TryRecvError::Disconnected) => {
                self.spent = true;
                TaskStatus::Lost
            }
            Err(TryRecvError::Empty) => TaskStatus::Pending,
        }
    }

    /// Whether the result has been taken or the task is known to be lost.
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Blocks until the task has finished.
    ///
    /// # Returns
    /// The task's output, or `None` if the task panicked or its result was already taken.
    pub fn wait(self) -> Option<T> {
        if self.spent {
            return None;
        }
        self.receiver.recv().ok().flatten()
    }
}
