pub use callback::CallbackId;
pub use callback::Callbacks;
pub use callback::Settlement;
pub use callback::MAX_HANDLES;
pub use channel::{oneshot, Rx, Tx};
pub use deferred::DeferredValue;
pub use deferred::Outcome;
pub use deferred::Resolver;
pub use deferred::Status;
pub use error::Error;
pub use error::Reason;
pub use machine::Guard;
pub use machine::Handle;
pub use machine::Machine;

mod callback;
mod channel;
mod combinator;
mod deferred;
mod error;
mod machine;
