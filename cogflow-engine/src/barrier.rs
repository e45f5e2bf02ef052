//! The scope barrier.
//!
//! Every cog started by a scope runs under one barrier, a cancellation
//! group built on [`tokio::task::JoinSet`]. Stopping the barrier aborts
//! every in-flight task; joining yields completions in finish order, with
//! cancellation and panic discriminated per task.

use cogflow_core::error::Result;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinSet};

/// One completion event out of the barrier.
#[derive(Debug)]
pub enum BarrierEvent {
    /// A cog's unit of work ran to completion. `outcome` is what the unit
    /// re-raised after its own absorption rules, not the cog's output.
    Finished {
        /// The cog that finished.
        cog: String,
        /// The re-raised outcome.
        outcome: Result<()>,
    },
    /// A cog's task was aborted before finishing.
    Cancelled {
        /// The cog that was cancelled.
        cog: String,
    },
    /// A cog's task panicked.
    Panicked {
        /// The cog whose task panicked.
        cog: String,
    },
}

/// Cancellation group for one scope.
pub struct Barrier {
    tasks: JoinSet<Result<()>>,
    names: HashMap<Id, String>,
    stopped: bool,
}

impl Barrier {
    /// Create an empty barrier.
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            names: HashMap::new(),
            stopped: false,
        }
    }

    /// Spawn a cog's unit of work under this barrier.
    pub(crate) fn spawn<F>(&mut self, cog: &str, fut: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = self.tasks.spawn(fut);
        self.names.insert(handle.id(), cog.to_string());
    }

    /// Wait for the next completion, in finish order. Returns `None` once
    /// every spawned task has been joined.
    pub async fn join_next(&mut self) -> Option<BarrierEvent> {
        match self.tasks.join_next_with_id().await? {
            Ok((id, outcome)) => Some(BarrierEvent::Finished {
                cog: self.take_name(id),
                outcome,
            }),
            Err(join_err) => {
                let cog = self.take_name(join_err.id());
                if join_err.is_cancelled() {
                    Some(BarrierEvent::Cancelled { cog })
                } else {
                    Some(BarrierEvent::Panicked { cog })
                }
            }
        }
    }

    fn take_name(&mut self, id: Id) -> String {
        self.names
            .remove(&id)
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Abort every in-flight task. Idempotent; aborted tasks still surface
    /// as [`BarrierEvent::Cancelled`] from `join_next`.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.tasks.abort_all();
        }
    }

    /// Whether the barrier has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether every spawned task has been joined.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks not yet joined.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completions_arrive_in_finish_order() {
        let mut barrier = Barrier::new();
        barrier.spawn("slow", async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        });
        barrier.spawn("fast", async { Ok(()) });

        match barrier.join_next().await.unwrap() {
            BarrierEvent::Finished { cog, .. } => assert_eq!(cog, "fast"),
            other => panic!("unexpected event: {:?}", other),
        }
        match barrier.join_next().await.unwrap() {
            BarrierEvent::Finished { cog, .. } => assert_eq!(cog, "slow"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(barrier.join_next().await.is_none());
    }

    #[tokio::test]
    async fn stop_cancels_in_flight_tasks() {
        let mut barrier = Barrier::new();
        barrier.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });

        barrier.stop();
        assert!(barrier.is_stopped());

        match barrier.join_next().await.unwrap() {
            BarrierEvent::Cancelled { cog } => assert_eq!(cog, "stuck"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(barrier.is_empty());

        // A second stop is a no-op.
        barrier.stop();
    }

    #[tokio::test]
    async fn panics_are_discriminated_from_cancellation() {
        let mut barrier = Barrier::new();
        barrier.spawn("bad", async { panic!("boom") });

        match barrier.join_next().await.unwrap() {
            BarrierEvent::Panicked { cog } => assert_eq!(cog, "bad"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
