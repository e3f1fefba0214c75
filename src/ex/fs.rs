use std::fs::read;
use std::io::ErrorKind;
use std::path::PathBuf;
use anyhow::Result;
use serde_json::Value;
use crate::vm::{Callbacks, DeferredValue, Handle, Reason};
use super::blocking::{Blocking, Executor};

pub struct ReadFile<E> {
    blocking: Blocking<E>,
}

impl<E: Executor> ReadFile<E> {
    pub fn new(executor: E, handle: Handle) -> Self {
        Self { blocking: Blocking::new(executor, handle) }
    }

    /// Read a file off the machine thread. Resolves with a string when the
    /// contents are valid UTF-8 and with an array of byte values otherwise.
    pub fn read<P: Into<PathBuf>>(&self, callbacks: &mut Callbacks, path: P) -> Result<DeferredValue> {
        let path = path.into();
        self.blocking.spawn(callbacks, move || {
            match read(&path) {
                Ok(bytes)                                  => Ok(contents(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound  => {
                    Err(Reason::from(format!("no such file {}", path.display())))
                }
                Err(e)                                     => {
                    Err(Reason::from(format!("something went wrong reading {}: {e}", path.display())))
                }
            }
        })
    }
}

fn contents(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e)   => Value::Array(e.into_bytes().into_iter().map(Value::from).collect()),
    }
}
