use std::env::args;
use anyhow::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use callbridge::{Machine, ex::{ReadFile, Threads}};
use callbridge::vm::DeferredValue;

fn main() -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    filter = filter.add_directive(LevelFilter::WARN.into());
    let print = fmt::layer().compact();
    registry().with(filter).with(print).init();

    let paths = args().skip(1).collect::<Vec<_>>();

    let (handle, _guard) = Machine::new().exec()?;
    let reader = ReadFile::new(Threads, handle.clone());

    let rx = handle.call(move |callbacks| {
        let reads = paths.iter().map(|path| {
            reader.read(callbacks, path)
        }).collect::<Result<Vec<_>>>()?;

        DeferredValue::all(reads)
    })?;

    match rx.recv() {
        Ok(texts) => println!("{texts:#}"),
        Err(e)    => println!("failed: {e}"),
    }

    Ok(())
}
