use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;
use super::error::Reason;

pub type Outcome = Result<Value, Reason>;

pub type Continuation = Box<dyn FnOnce(&Value) -> Result<()> + Send>;
pub type Recovery     = Box<dyn FnOnce(&Reason) -> Result<()> + Send>;
pub type Finalizer    = Box<dyn FnOnce(&Outcome) -> Result<()> + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Pending,
    Resolved,
    Rejected,
}

/// An eventual success or failure that notifies its callbacks synchronously.
///
/// Settlement happens at most once, through a [`Resolver`]. Every callback
/// runs on the stack of the call that triggers it: continuations registered
/// while pending run inside `resolve`/`reject`, and callbacks registered after
/// settlement run inside `then`/`catch`/`finally`. A callback error aborts the
/// remaining notifications and propagates to that caller.
///
/// While a settlement is still notifying, registrations from any thread are
/// queued behind it and run by the settling call in registration order; a
/// `catch` or `finally` registered then replaces the one not yet run.
#[derive(Clone)]
pub struct DeferredValue {
    state: Arc<Mutex<State>>,
}

/// The settlement entry points of a [`DeferredValue`].
#[derive(Clone)]
pub struct Resolver {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    outcome:  Option<Arc<Outcome>>,
    settling: bool,
    thens:    VecDeque<Continuation>,
    catch:    Option<Recovery>,
    finally:  Option<Finalizer>,
}

impl State {
    fn finish(&mut self) {
        self.settling = false;
        self.thens.clear();
        self.catch   = None;
        self.finally = None;
    }
}

enum Next {
    Then(Continuation),
    Catch(Recovery),
    Finally(Finalizer),
}

impl DeferredValue {
    /// Construct a pending value and run `init` before returning.
    ///
    /// An error from `init` is returned as is; the value is not rejected.
    pub fn new<F>(init: F) -> Result<Self>
    where
        F: FnOnce(Resolver) -> Result<()>,
    {
        let (deferred, resolver) = Self::pending();
        init(resolver)?;
        Ok(deferred)
    }

    pub fn pending() -> (Self, Resolver) {
        let state    = Arc::new(Mutex::new(State::default()));
        let resolver = Resolver { state: state.clone() };
        (Self { state }, resolver)
    }

    pub(super) fn settled(outcome: Outcome) -> Self {
        let state = State {
            outcome: Some(Arc::new(outcome)),
            ..State::default()
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Run `f` with the success value, now if resolved or later on resolution.
    /// Never runs if the value is, or becomes, rejected.
    pub fn then<F>(&self, f: F) -> Result<&Self>
    where
        F: FnOnce(&Value) -> Result<()> + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) if !state.settling => outcome,
                _                                => {
                    state.thens.push_back(Box::new(f));
                    return Ok(self);
                }
            }
        };

        if let Ok(value) = &*outcome {
            f(value)?;
        }

        Ok(self)
    }

    /// Replace the error handler; runs now if already rejected.
    pub fn catch<F>(&self, f: F) -> Result<&Self>
    where
        F: FnOnce(&Reason) -> Result<()> + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) if !state.settling => outcome,
                _                                => {
                    state.catch = Some(Box::new(f));
                    return Ok(self);
                }
            }
        };

        if let Err(reason) = &*outcome {
            f(reason)?;
        }

        Ok(self)
    }

    /// Replace the completion handler; runs now if already settled.
    pub fn finally<F>(&self, f: F) -> Result<&Self>
    where
        F: FnOnce(&Outcome) -> Result<()> + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) if !state.settling => outcome,
                _                                => {
                    state.finally = Some(Box::new(f));
                    return Ok(self);
                }
            }
        };

        f(&outcome)?;

        Ok(self)
    }

    pub fn status(&self) -> Status {
        match self.state.lock().outcome.as_deref() {
            None          => Status::Pending,
            Some(Ok(_))   => Status::Resolved,
            Some(Err(_))  => Status::Rejected,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    pub fn outcome(&self) -> Option<Arc<Outcome>> {
        self.state.lock().outcome.clone()
    }
}

impl Resolver {
    pub fn resolve(&self, value: Value) -> Result<()> {
        self.settle(Ok(value))
    }

    pub fn reject<R: Into<Reason>>(&self, reason: R) -> Result<()> {
        self.settle(Err(reason.into()))
    }

    pub fn is_settled(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    fn settle(&self, outcome: Outcome) -> Result<()> {
        let outcome = {
            let mut state = self.state.lock();

            if state.outcome.is_some() {
                trace!("ignoring repeated settlement");
                return Ok(());
            }

            let outcome = Arc::new(outcome);
            state.outcome  = Some(outcome.clone());
            state.settling = true;
            outcome
        };

        let result = self.notify(&outcome);

        if result.is_err() {
            self.state.lock().finish();
        }

        result
    }

    fn notify(&self, outcome: &Outcome) -> Result<()> {
        loop {
            let next = {
                let mut state = self.state.lock();
                let handler = match outcome {
                    Ok(_)  => state.thens.pop_front().map(Next::Then),
                    Err(_) => state.catch.take().map(Next::Catch),
                };
                let next = handler.or_else(|| state.finally.take().map(Next::Finally));
                if next.is_none() {
                    state.finish();
                }
                next
            };

            match (next, outcome) {
                (Some(Next::Then(then)), Ok(value))     => then(value)?,
                (Some(Next::Catch(catch)), Err(reason)) => catch(reason)?,
                (Some(Next::Finally(finally)), _)       => finally(outcome)?,
                (Some(_), _)                            => (),
                (None, _)                               => return Ok(()),
            }
        }
    }
}

impl fmt::Debug for DeferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DeferredValue")
            .field("outcome", &state.outcome)
            .field("thens", &state.thens.len())
            .finish()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
