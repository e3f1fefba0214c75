use std::thread::Builder;
use anyhow::Result;
use serde_json::Value;
use tracing::debug;
use crate::vm::{Callbacks, DeferredValue, Handle, Reason, Settlement};

pub type Work = Box<dyn FnOnce() + Send>;

/// Where blocking host work runs.
pub trait Executor: Send + 'static {
    fn execute(&self, work: Work) -> Result<()>;
}

/// Runs each piece of work on a fresh OS thread.
pub struct Threads;

/// Runs host work through an [`Executor`] and settles the deferred value it
/// hands out on the machine thread.
pub struct Blocking<E> {
    executor: E,
    handle:   Handle,
}

impl<E: Executor> Blocking<E> {
    pub fn new(executor: E, handle: Handle) -> Self {
        Self { executor, handle }
    }

    /// Must be called on the machine thread that owns `callbacks`.
    pub fn spawn<F>(&self, callbacks: &mut Callbacks, work: F) -> Result<DeferredValue>
    where
        F: FnOnce() -> Result<Value, Reason> + Send + 'static,
    {
        let (deferred, resolver) = DeferredValue::pending();

        let id     = callbacks.insert(resolver)?;
        let handle = self.handle.clone();

        let queued = self.executor.execute(Box::new(move || {
            let settlement = match work() {
                Ok(value)  => Settlement::Success(id, value),
                Err(cause) => Settlement::Failure(id, cause),
            };

            if let Err(e) = handle.done(settlement) {
                debug!(id = id.get(), "completion lost: {e:?}");
            }
        }));

        if let Err(e) = queued {
            callbacks.reject(id, Reason::error(format!("work not started: {e:#}")))?;
        }

        Ok(deferred)
    }
}

impl Executor for Threads {
    fn execute(&self, work: Work) -> Result<()> {
        Builder::new().name("blocking".to_owned()).spawn(work)?;
        Ok(())
    }
}

#[cfg(feature = "tokio")]
impl Executor for tokio::runtime::Handle {
    fn execute(&self, work: Work) -> Result<()> {
        self.spawn_blocking(work);
        Ok(())
    }
}
