pub use blocking::{Blocking, Executor, Threads};
pub use fs::ReadFile;

pub mod blocking;
pub mod fs;
