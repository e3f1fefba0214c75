#![allow(dead_code)]

use std::sync::Arc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

pub fn trace() {
    let mut filter = EnvFilter::from_default_env();
    filter = filter.add_directive(LevelFilter::WARN.into());
    let print = fmt::layer().compact().with_test_writer();
    let _ = registry().with(filter).with(print).try_init();
}

/// Shared log of callback invocations.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push<S: Into<String>>(&self, entry: S) {
        self.0.lock().push(entry.into());
    }

    pub fn record(&self, tag: &str, value: &Value) {
        self.push(format!("{tag}:{value}"));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}
