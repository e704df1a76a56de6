use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::panic::panic_message;
use crate::thread::{AffinityThread, Job};
use crate::{ContextState, DispatchError, DispatcherConfig, SetupPolicy, ThreadContext};

/// Runs units of work on one dedicated affinity thread on behalf of any caller thread.
///
/// [`dispatch`](Self::dispatch) blocks the caller until its work has run to
/// completion. Callers serialize on an internal handoff lock that is held
/// until the reply arrives, so at most one unit of work is in flight and work
/// executes in the order callers acquired the lock.
///
/// Dropping the dispatcher posts a shutdown request behind any in-flight work,
/// runs context teardown on the affinity thread, and joins it.
pub struct WorkDispatcher {
	handoff: Mutex<()>,
	thread: AffinityThread,
}

impl WorkDispatcher {
	/// Spawns the affinity thread and waits for its context setup to settle.
	///
	/// The probe dispatched here runs only after setup finished, so its
	/// completion makes the setup outcome observable. Under
	/// [`SetupPolicy::Strict`] a failed setup stops the thread and returns
	/// [`DispatchError::Setup`].
	pub fn spawn(config: &DispatcherConfig, context: Box<dyn ThreadContext>) -> Result<Self, DispatchError> {
		let thread = AffinityThread::start(&config.thread_name, context)?;
		let dispatcher = Self {
			handoff: Mutex::new(()),
			thread,
		};

		dispatcher.dispatch(|| ())?;
		if let ContextState::Failed(err) = dispatcher.context_state() {
			match config.setup_policy {
				SetupPolicy::Strict => return Err(DispatchError::Setup(err)),
				SetupPolicy::Lenient => {
					tracing::warn!(thread = ?dispatcher.thread_id(), error = %err, "continuing without affinity thread context");
				}
			}
		}
		Ok(dispatcher)
	}

	/// Runs `work` on the affinity thread and returns its result.
	///
	/// A panic inside `work` is caught on the affinity thread and returned as
	/// [`DispatchError::Panicked`]; the thread keeps serving work. Called from
	/// the affinity thread itself, `work` runs inline.
	pub fn dispatch<F, R>(&self, work: F) -> Result<R, DispatchError>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		if self.thread.is_current() {
			return catch_unwind(AssertUnwindSafe(work)).map_err(|payload| DispatchError::Panicked(panic_message(payload.as_ref())));
		}

		let (reply_tx, reply_rx) = mpsc::sync_channel(1);
		let span = tracing::Span::current();
		let job = Job::Run(Box::new(move || {
			let _guard = span.enter();
			let outcome = catch_unwind(AssertUnwindSafe(work)).map_err(|payload| panic_message(payload.as_ref()));
			let _ = reply_tx.send(outcome);
		}));

		let _handoff = self.handoff.lock();
		if self.thread.post(job).is_err() {
			return Err(DispatchError::Disconnected);
		}
		match reply_rx.recv() {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(message)) => Err(DispatchError::Panicked(message)),
			Err(_) => Err(DispatchError::Disconnected),
		}
	}

	/// Like [`dispatch`](Self::dispatch), flattening a fallible unit of work
	/// into the caller's error type.
	pub fn try_dispatch<F, T, E>(&self, work: F) -> Result<T, E>
	where
		F: FnOnce() -> Result<T, E> + Send + 'static,
		T: Send + 'static,
		E: From<DispatchError> + Send + 'static,
	{
		self.dispatch(work)?
	}

	/// Stops the affinity thread after any in-flight work. Idempotent.
	///
	/// Later dispatches fail with [`DispatchError::Disconnected`]. Only the
	/// owner stops the thread: `Drop` for a standalone dispatcher, the last
	/// release for a shared one.
	pub(crate) fn shutdown(&self) {
		if self.thread.is_current() {
			// The in-flight caller holds the handoff lock and waits on us.
			self.thread.stop();
			return;
		}
		let _handoff = self.handoff.lock();
		self.thread.stop();
	}

	/// Returns the affinity thread's identity.
	pub fn thread_id(&self) -> ThreadId {
		self.thread.id()
	}

	/// Returns the affinity thread's name.
	pub fn thread_name(&self) -> &str {
		self.thread.name()
	}

	/// Returns true when called from the affinity thread.
	pub fn is_affinity_thread(&self) -> bool {
		self.thread.is_current()
	}

	/// Returns the affinity thread's context state.
	pub fn context_state(&self) -> ContextState {
		self.thread.context_state()
	}
}

impl Drop for WorkDispatcher {
	fn drop(&mut self) {
		self.shutdown();
	}
}

impl std::fmt::Debug for WorkDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WorkDispatcher")
			.field("thread", &self.thread.id())
			.field("name", &self.thread.name())
			.finish()
	}
}
