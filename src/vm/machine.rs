use std::thread::{Builder, JoinHandle};
use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Sender, Receiver};
use serde_json::Value;
use tracing::{debug, error, warn};
use super::callback::{CallbackId, Callbacks, Settlement, MAX_HANDLES};
use super::channel::{oneshot, Rx};
use super::deferred::DeferredValue;
use super::error::{Error, Reason};

pub type Job = Box<dyn FnOnce(&mut Callbacks) -> Result<()> + Send>;

/// Owner of a [`Callbacks`] table confined to its own thread.
///
/// Other threads reach the table only through a [`Handle`], which queues
/// jobs and completions for the machine thread to run in order.
pub struct Machine {
    name:  String,
    limit: u64,
}

#[derive(Clone)]
pub struct Handle {
    sender: Sender<Command>,
}

pub struct Guard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

struct Thread {
    limit:    u64,
    receiver: Receiver<Command>,
}

pub enum Command {
    Exec(Job),
    Done(Settlement),
    Stop,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            name:  "machine".to_owned(),
            limit: MAX_HANDLES,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn exec(self) -> Result<(Handle, Guard)> {
        let (sender, receiver) = unbounded();

        let handle = Handle { sender };
        let thread = Thread {
            limit:    self.limit,
            receiver: receiver,
        };

        let thread = Builder::new().name(self.name).spawn(move || {
            thread.exec();
            debug!("machine finished");
        })?;

        let guard  = Guard {
            handle: handle.clone(),
            thread: Some(thread),
        };

        Ok((handle, guard))
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle {
    pub fn exec<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce(&mut Callbacks) -> Result<()> + Send + 'static,
    {
        self.send(Command::Exec(Box::new(job)))
    }

    /// Run `f` on the machine thread and deliver the outcome of the
    /// deferred value it returns. Replaces that value's `finally` handler.
    pub fn call<F>(&self, f: F) -> Result<Rx>
    where
        F: FnOnce(&mut Callbacks) -> Result<DeferredValue> + Send + 'static,
    {
        let (tx, rx) = oneshot();
        self.exec(move |callbacks| {
            let deferred = match f(callbacks) {
                Ok(deferred) => deferred,
                Err(e)       => {
                    tx.send(Err(Reason::from(e)));
                    return Ok(());
                }
            };
            deferred.finally(move |outcome| {
                tx.send(outcome.clone());
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(rx)
    }

    pub fn done(&self, settlement: Settlement) -> Result<()> {
        self.send(Command::Done(settlement))
    }

    pub fn resolve(&self, id: CallbackId, value: Value) -> Result<()> {
        self.done(Settlement::Success(id, value))
    }

    pub fn reject<R: Into<Reason>>(&self, id: CallbackId, reason: R) -> Result<()> {
        self.done(Settlement::Failure(id, reason.into()))
    }

    fn send(&self, cmd: Command) -> Result<()> {
        match self.sender.send(cmd) {
            Ok(()) => Ok(()),
            Err(_) => Err(anyhow!("machine terminated")),
        }
    }
}

impl Thread {
    fn exec(self) {
        let Self { limit, receiver } = self;

        let mut callbacks = Callbacks::with_limit(limit);

        loop {
            match receiver.recv() {
                Ok(Command::Exec(job))     => exec(&mut callbacks, job),
                Ok(Command::Done(settled)) => done(&mut callbacks, settled),
                Ok(Command::Stop) | Err(_) => break,
            }
        }

        if !callbacks.is_empty() {
            warn!(pending = callbacks.len(), "machine stopped with pending callbacks");
        }
    }
}

fn exec(callbacks: &mut Callbacks, job: Job) {
    if let Err(e) = job(callbacks) {
        error!("job failed: {e:?}");
    }
}

fn done(callbacks: &mut Callbacks, settlement: Settlement) {
    let id = settlement.id();
    match callbacks.settle(settlement) {
        Ok(())                        => (),
        Err(Error::HandleNotFound(_)) => debug!(id = id.get(), "settlement dropped"),
        Err(e)                        => error!(id = id.get(), "settlement failed: {e:?}"),
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = self.handle.send(Command::Stop);
            match handle.join() {
                Ok(()) => (),
                Err(e) => error!("join error: {e:?}"),
            }
        }
    }
}
