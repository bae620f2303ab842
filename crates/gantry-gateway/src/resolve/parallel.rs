//! Concurrent fan-out with deferred blocking.
//!
//! [`run_parallel`] starts every operation immediately, in list order.  An
//! operation that completes on its first poll (e.g. a warm cache hit) is
//! settled on the spot; anything still outstanding is handed to the Tokio
//! runtime so it keeps making progress, and only its [`JoinHandle`] is kept.
//!
//! Callers then read results with [`ParallelResults::get`], which only blocks
//! on the specific slot being read.  Reading slots in priority order and
//! stopping at the first winner means the caller never waits on
//! lower-priority work it does not need.
//!
//! Pending tasks are never cancelled: dropping [`ParallelResults`] detaches
//! them and their results are discarded.
//!
//! A panicking operation settles as [`TaskError::Join`], whether it panics
//! on the first poll or after it was spawned.

use futures::FutureExt;
use futures::future::BoxFuture;
use gantry_kernel::plugin::TaskError;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::task::Poll;
use tokio::task::JoinHandle;

/// A unit of work accepted by [`run_parallel`].
pub type Operation<T> = BoxFuture<'static, T>;

/// State of one started operation.
#[derive(Debug)]
pub enum Slot<T> {
    Settled(Result<T, TaskError>),
    Pending(JoinHandle<T>),
}

/// Ordered results of [`run_parallel`], one slot per operation.
#[derive(Debug)]
pub struct ParallelResults<T> {
    slots: Vec<Slot<T>>,
}

/// Start every operation, settling those that complete without suspending.
///
/// Must be called from within a Tokio runtime.
pub async fn run_parallel<T>(operations: Vec<Operation<T>>) -> ParallelResults<T>
where
    T: Send + 'static,
{
    let mut slots = Vec::with_capacity(operations.len());
    for mut op in operations {
        let first_poll = futures::poll!(AssertUnwindSafe(op.as_mut()).catch_unwind());
        let slot = match first_poll {
            Poll::Ready(Ok(value)) => Slot::Settled(Ok(value)),
            Poll::Ready(Err(panic)) => Slot::Settled(Err(TaskError::Join(panic_message(&*panic)))),
            Poll::Pending => Slot::Pending(tokio::spawn(op)),
        };
        slots.push(slot);
    }
    ParallelResults { slots }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("operation panicked: {detail}")
}

impl<T> ParallelResults<T> {
    /// Result of the operation at `index`, waiting for it if still pending.
    ///
    /// The first read of a pending slot settles it; later reads return the
    /// same value without waiting or re-running anything.
    pub async fn get(&mut self, index: usize) -> Result<&T, TaskError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TaskError::OutOfRange(index))?;

        if let Slot::Pending(handle) = slot {
            let settled = handle.await.map_err(|e| TaskError::Join(e.to_string()));
            *slot = Slot::Settled(settled);
        }

        match slot {
            Slot::Settled(result) => result.as_ref().map_err(Clone::clone),
            Slot::Pending(_) => Err(TaskError::Join(format!("slot {index} did not settle"))),
        }
    }

    /// Whether the slot at `index` already holds a value.
    pub fn is_settled(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Settled(_)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
