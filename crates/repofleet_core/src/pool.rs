//! Bounded fan-out/fan-in over a fixed set of worker threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use anyhow::{Context, Result, bail};
use rayon::ThreadPoolBuilder;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPool {
    workers: usize,
}

impl TaskPool {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            bail!("worker count must be at least 1");
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every task on at most `workers` threads.
    ///
    /// Items are returned in completion order, and `on_complete(item, done,
    /// total)` is called on the calling thread as each one arrives. A task that
    /// panics is replaced by `recover(task_index, panic_message)`.
    pub fn run<T, F, R, P>(&self, tasks: Vec<F>, recover: R, mut on_complete: P) -> Result<Vec<T>>
    where
        T: Send,
        F: FnOnce() -> T + Send,
        R: Fn(usize, String) -> T,
        P: FnMut(&T, usize, usize),
    {
        let total = tasks.len();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("repofleet-worker-{index}"))
            .build()
            .context("failed to start worker pool")?;

        let mut completed = Vec::with_capacity(total);
        let (sender, receiver) = mpsc::channel();

        pool.in_place_scope(|scope| {
            for (index, task) in tasks.into_iter().enumerate() {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(task));
                    let _ = sender.send((index, outcome));
                });
            }
            drop(sender);

            for (index, outcome) in receiver.iter() {
                let item = match outcome {
                    Ok(item) => item,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        warn!(task = index, panic = %message, "task panicked");
                        recover(index, message)
                    }
                };
                on_complete(&item, completed.len() + 1, total);
                completed.push(item);
            }
        });

        Ok(completed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "task panicked".to_string()
}
