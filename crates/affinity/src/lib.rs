//! Thread-affinity work dispatch.
//!
//! Some resources may only be touched from the one thread that created them.
//! This crate runs such a resource on a dedicated affinity thread and lets any
//! caller thread execute work against it synchronously:
//!
//! * [`WorkDispatcher`] owns the affinity thread. [`WorkDispatcher::dispatch`]
//!   hands a closure to the thread, blocks until it has run, and returns its
//!   result or the panic it raised. Work is totally ordered and never overlaps.
//! * [`ThreadContext`] hooks set up and tear down the thread-affine context
//!   on the affinity thread itself.
//! * [`SharedDispatcherRegistry`] shares one dispatcher among any number of
//!   client handles through counted [`DispatcherRef`] acquisitions, creating
//!   it on first acquire and joining its thread on last release.
//! * [`Affine<T>`] keys let shareable handles refer to values that stay
//!   pinned to the affinity thread.

mod affine;
mod config;
mod context;
mod dispatcher;
mod error;
mod panic;
mod registry;
mod thread;

pub use affine::{Affine, pinned_count};
pub use config::{DEFAULT_THREAD_NAME, DispatcherConfig, SetupPolicy};
pub use context::{ContextState, NoContext, ThreadContext};
pub use dispatcher::WorkDispatcher;
pub use error::{AffineError, ContextError, DispatchError};
pub use registry::{DispatcherRef, RegistrySnapshot, SharedDispatcherRegistry};
