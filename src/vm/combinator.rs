use std::mem::take;
use std::sync::Arc;
use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use super::deferred::DeferredValue;
use super::error::Reason;

struct Gather {
    values:   Vec<Option<Value>>,
    complete: usize,
}

impl DeferredValue {
    pub fn resolve(value: Value) -> Self {
        Self::settled(Ok(value))
    }

    pub fn reject<R: Into<Reason>>(reason: R) -> Self {
        Self::settled(Err(reason.into()))
    }

    /// Resolve with every input's value, in input order, once all resolve.
    ///
    /// The first rejection wins and is passed through unchanged. Each input
    /// gets a `then` continuation and has its error handler replaced.
    pub fn all<I>(deferreds: I) -> Result<Self>
    where
        I: IntoIterator<Item = DeferredValue>,
    {
        let deferreds = deferreds.into_iter().collect::<Vec<_>>();
        let target    = deferreds.len();

        if target == 0 {
            return Ok(Self::resolve(Value::Array(Vec::new())));
        }

        let (all, resolver) = Self::pending();

        let gather = Arc::new(Mutex::new(Gather {
            values:   vec![None; target],
            complete: 0,
        }));

        for (index, deferred) in deferreds.iter().enumerate() {
            let gather   = gather.clone();
            let resolved = resolver.clone();
            let rejected = resolver.clone();

            deferred.then(move |value| {
                let values = {
                    let mut gather = gather.lock();
                    gather.values[index] = Some(value.clone());
                    gather.complete += 1;
                    if gather.complete < target {
                        return Ok(());
                    }
                    take(&mut gather.values)
                };
                let values = values.into_iter().flatten().collect();
                resolved.resolve(Value::Array(values))
            })?;

            deferred.catch(move |reason| {
                rejected.reject(reason.clone())
            })?;
        }

        Ok(all)
    }
}
