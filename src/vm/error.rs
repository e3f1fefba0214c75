use std::fmt;
use serde_json::Value;
use thiserror::Error;
use super::callback::CallbackId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no pending callback for handle {0}")]
    HandleNotFound(CallbackId),
    #[error("out of room to cache callbacks")]
    TableExhausted,
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

/// Failure payload carried by a rejected [`DeferredValue`].
///
/// [`DeferredValue`]: super::DeferredValue
#[derive(Clone, Debug, PartialEq)]
pub enum Reason {
    Error(String),
    Value(Value),
}

impl Reason {
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::Error(message.into())
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Value(_)       => None,
        }
    }

    /// Wrap a plain string payload into a structured error.
    pub fn coerce(self) -> Self {
        match self {
            Self::Value(Value::String(s)) => Self::Error(s),
            reason                        => reason,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message)          => write!(f, "Error: {message}"),
            Self::Value(Value::String(s)) => write!(f, "{s}"),
            Self::Value(value)            => write!(f, "{value}"),
        }
    }
}

impl std::error::Error for Reason {}

impl From<Value> for Reason {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Reason {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<String> for Reason {
    fn from(s: String) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<anyhow::Error> for Reason {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<Reason>() {
            Ok(reason) => reason,
            Err(e)     => Self::Error(format!("{e:#}")),
        }
    }
}
