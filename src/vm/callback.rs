use std::collections::HashMap;
use std::fmt;
use anyhow::Result;
use serde_json::Value;
use tracing::{trace, warn};
use super::deferred::Resolver;
use super::error::{Error, Reason};

/// Largest integer a script number can represent exactly.
pub const MAX_HANDLES: u64 = (1 << 53) - 1;

/// Table of pending callback pairs keyed by opaque integer handles.
///
/// Handles are allocated from a cursor that scans forward for a free slot,
/// wrapping to zero once. Allocation is O(1) amortized while the table is
/// sparse relative to its limit.
pub struct Callbacks {
    cursor:  u64,
    limit:   u64,
    pending: HashMap<u64, Entry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallbackId(u64);

pub enum Settlement {
    Success(CallbackId, Value),
    Failure(CallbackId, Reason),
}

pub type OnResolve = Box<dyn FnOnce(Value) -> Result<()> + Send>;
pub type OnReject  = Box<dyn FnOnce(Reason) -> Result<()> + Send>;

struct Entry {
    resolve: OnResolve,
    reject:  OnReject,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::with_limit(MAX_HANDLES)
    }

    pub fn with_limit(limit: u64) -> Self {
        Self {
            cursor:  0,
            limit:   limit,
            pending: HashMap::new(),
        }
    }

    pub fn register<R, J>(&mut self, resolve: R, reject: J) -> Result<CallbackId, Error>
    where
        R: FnOnce(Value) -> Result<()> + Send + 'static,
        J: FnOnce(Reason) -> Result<()> + Send + 'static,
    {
        let id = self.allocate()?;

        self.cursor = id + 1;
        self.pending.insert(id, Entry {
            resolve: Box::new(resolve),
            reject:  Box::new(reject),
        });

        trace!(id, pending = self.pending.len(), "registered callback");

        Ok(CallbackId(id))
    }

    pub fn insert(&mut self, resolver: Resolver) -> Result<CallbackId, Error> {
        let rejecter = resolver.clone();
        self.register(
            move |value| resolver.resolve(value),
            move |reason| rejecter.reject(reason),
        )
    }

    pub fn resolve(&mut self, id: CallbackId, value: Value) -> Result<(), Error> {
        let entry = self.remove(id)?;
        trace!(id = id.0, "resolving callback");
        Ok((entry.resolve)(value)?)
    }

    pub fn reject<R: Into<Reason>>(&mut self, id: CallbackId, reason: R) -> Result<(), Error> {
        let entry = self.remove(id)?;
        trace!(id = id.0, "rejecting callback");
        Ok((entry.reject)(reason.into().coerce())?)
    }

    pub fn settle(&mut self, settlement: Settlement) -> Result<(), Error> {
        match settlement {
            Settlement::Success(id, value)  => self.resolve(id, value),
            Settlement::Failure(id, reason) => self.reject(id, reason),
        }
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.pending.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn allocate(&self) -> Result<u64, Error> {
        let mut cursor = self.cursor;
        let mut looped = false;

        if self.limit == 0 {
            return Err(Error::TableExhausted);
        }

        if cursor >= self.limit {
            cursor = 0;
        }

        while self.pending.contains_key(&cursor) {
            cursor += 1;
            if cursor >= self.limit {
                if looped {
                    warn!(limit = self.limit, "callback table exhausted");
                    return Err(Error::TableExhausted);
                }
                cursor = 0;
                looped = true;
            }
        }

        Ok(cursor)
    }

    fn remove(&mut self, id: CallbackId) -> Result<Entry, Error> {
        match self.pending.remove(&id.0) {
            Some(entry) => Ok(entry),
            None        => {
                warn!(id = id.0, "no pending callback");
                Err(Error::HandleNotFound(id))
            }
        }
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CallbackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<CallbackId> for u64 {
    fn from(id: CallbackId) -> Self {
        id.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Settlement {
    pub fn id(&self) -> CallbackId {
        match self {
            Self::Success(id, _) => *id,
            Self::Failure(id, _) => *id,
        }
    }
}
