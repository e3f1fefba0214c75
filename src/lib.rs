pub use vm::Machine;

pub mod ex;
pub mod vm;
