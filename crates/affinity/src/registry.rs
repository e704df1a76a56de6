//! Reference-counted sharing of one [`WorkDispatcher`] among client handles.

use std::ops::Deref;
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::{DispatchError, DispatcherConfig, NoContext, ThreadContext, WorkDispatcher};

type ContextFactory = dyn Fn() -> Box<dyn ThreadContext> + Send + Sync;

/// Point-in-time view of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySnapshot {
	/// Outstanding acquisitions.
	pub refs: usize,
	/// Number of dispatchers constructed so far.
	pub generation: u64,
	/// Affinity thread of the live dispatcher, if any.
	pub thread: Option<ThreadId>,
}

impl RegistrySnapshot {
	/// Returns true while a dispatcher exists.
	pub fn is_live(&self) -> bool {
		self.thread.is_some()
	}
}

#[derive(Default)]
struct RegistryState {
	refs: usize,
	dispatcher: Option<Arc<WorkDispatcher>>,
	generation: u64,
}

struct RegistryInner {
	config: DispatcherConfig,
	context: Box<ContextFactory>,
	state: Mutex<RegistryState>,
}

impl RegistryInner {
	fn release(&self) {
		let mut state = self.state.lock();
		debug_assert!(state.refs > 0, "dispatcher released more often than acquired");
		state.refs = state.refs.saturating_sub(1);
		tracing::trace!(refs = state.refs, "registry.release");
		if state.refs > 0 {
			return;
		}
		if let Some(last) = state.dispatcher.take() {
			tracing::debug!(generation = state.generation, thread = ?last.thread_id(), "registry.destroy");
			// Join before unlocking so a racing acquire cannot overlap teardown.
			last.shutdown();
		}
	}
}

/// Holder of at most one live [`WorkDispatcher`], shared by every client handle.
///
/// The first [`acquire`](Self::acquire) constructs the dispatcher (and its
/// affinity thread); dropping the last [`DispatcherRef`] tears it down and
/// joins the thread before the release returns. A later acquire constructs a
/// fresh dispatcher on a new thread.
///
/// The registry is an ordinary value owned by the host and passed to whatever
/// creates client handles. Clones share the same state.
#[derive(Clone)]
pub struct SharedDispatcherRegistry {
	inner: Arc<RegistryInner>,
}

impl SharedDispatcherRegistry {
	/// Creates a registry whose dispatchers run `context` hooks on their affinity thread.
	///
	/// `context` is called once per dispatcher construction.
	pub fn new<C>(config: DispatcherConfig, context: C) -> Self
	where
		C: Fn() -> Box<dyn ThreadContext> + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(RegistryInner {
				config,
				context: Box::new(context),
				state: Mutex::new(RegistryState::default()),
			}),
		}
	}

	/// Creates a registry whose affinity threads need no context hooks.
	pub fn without_context(config: DispatcherConfig) -> Self {
		Self::new(config, || Box::new(NoContext))
	}

	/// Returns the dispatcher configuration.
	pub fn config(&self) -> &DispatcherConfig {
		&self.inner.config
	}

	/// Acquires the shared dispatcher, constructing it if none is live.
	///
	/// Construction happens under the registry lock, so simultaneous first
	/// acquisitions construct exactly one dispatcher. If construction fails
	/// the reference count is left unchanged.
	pub fn acquire(&self) -> Result<DispatcherRef, DispatchError> {
		let mut state = self.inner.state.lock();
		let dispatcher = match &state.dispatcher {
			Some(dispatcher) => Arc::clone(dispatcher),
			None => {
				let dispatcher = Arc::new(WorkDispatcher::spawn(&self.inner.config, (self.inner.context)())?);
				state.generation = state.generation.wrapping_add(1);
				state.dispatcher = Some(Arc::clone(&dispatcher));
				tracing::debug!(generation = state.generation, thread = ?dispatcher.thread_id(), "registry.create");
				dispatcher
			}
		};
		state.refs += 1;
		tracing::trace!(refs = state.refs, "registry.acquire");

		Ok(DispatcherRef {
			registry: Arc::clone(&self.inner),
			dispatcher,
		})
	}

	/// Returns the current reference count, generation, and live thread.
	pub fn snapshot(&self) -> RegistrySnapshot {
		let state = self.inner.state.lock();
		RegistrySnapshot {
			refs: state.refs,
			generation: state.generation,
			thread: state.dispatcher.as_ref().map(|dispatcher| dispatcher.thread_id()),
		}
	}
}

impl std::fmt::Debug for SharedDispatcherRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedDispatcherRegistry")
			.field("config", &self.inner.config)
			.field("snapshot", &self.snapshot())
			.finish()
	}
}

/// One counted acquisition of a registry's shared dispatcher.
///
/// Dereferences to [`WorkDispatcher`]. Cloning acquires again; dropping (or
/// [`release`](Self::release)) releases exactly once. Client handles own a
/// `DispatcherRef`, so a handle can never outlive its dispatcher.
pub struct DispatcherRef {
	registry: Arc<RegistryInner>,
	dispatcher: Arc<WorkDispatcher>,
}

impl DispatcherRef {
	/// Releases this acquisition. When it is the last one, the dispatcher is
	/// torn down and its thread joined before this returns.
	pub fn release(self) {
		drop(self);
	}
}

impl Deref for DispatcherRef {
	type Target = WorkDispatcher;

	fn deref(&self) -> &WorkDispatcher {
		&self.dispatcher
	}
}

impl Clone for DispatcherRef {
	fn clone(&self) -> Self {
		let mut state = self.registry.state.lock();
		state.refs += 1;
		tracing::trace!(refs = state.refs, "registry.acquire");
		Self {
			registry: Arc::clone(&self.registry),
			dispatcher: Arc::clone(&self.dispatcher),
		}
	}
}

impl Drop for DispatcherRef {
	fn drop(&mut self) {
		self.registry.release();
	}
}

impl std::fmt::Debug for DispatcherRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DispatcherRef").field("dispatcher", &self.dispatcher).finish()
	}
}

#[cfg(test)]
mod tests;
