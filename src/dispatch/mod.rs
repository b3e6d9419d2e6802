//! Action dispatch.
//!
//! Actions are transient `(name, args)` pairs broadcast synchronously to the
//! store handlers that declared them. Nothing is queued: a handler that
//! dispatches again runs the nested dispatch to completion before it
//! continues.

mod args;
mod dispatcher;

pub use args::Args;
pub use dispatcher::{create_store, exec, Dispatcher};
