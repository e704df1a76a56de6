//! Error types for dispatch, thread context setup, and thread-pinned values.

use thiserror::Error;

/// Failure reported by a [`ThreadContext`](crate::ThreadContext) setup hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ContextError {
	message: String,
}

impl ContextError {
	/// Creates a context error carrying `message`.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	/// Returns the failure message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Errors surfaced to callers of [`WorkDispatcher::dispatch`](crate::WorkDispatcher::dispatch)
/// and [`SharedDispatcherRegistry::acquire`](crate::SharedDispatcherRegistry::acquire).
#[derive(Debug, Error)]
pub enum DispatchError {
	/// The affinity thread could not be spawned.
	#[error("failed to spawn affinity thread: {0}")]
	Spawn(#[source] std::io::Error),

	/// Thread context setup failed under the strict setup policy.
	#[error("affinity thread context setup failed: {0}")]
	Setup(#[source] ContextError),

	/// The unit of work panicked on the affinity thread.
	#[error("dispatched work panicked: {0}")]
	Panicked(String),

	/// The affinity thread no longer accepts work.
	#[error("affinity thread is not running")]
	Disconnected,
}

/// Errors accessing a thread-pinned [`Affine`](crate::Affine) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AffineError {
	/// Access was attempted from a thread other than the owning one.
	#[error("pinned value accessed from a foreign thread")]
	WrongThread,

	/// The value was already taken or its store was torn down.
	#[error("pinned value is no longer present")]
	Vacant,

	/// The stored value does not have the requested type.
	#[error("pinned value has an unexpected type")]
	TypeMismatch,
}
