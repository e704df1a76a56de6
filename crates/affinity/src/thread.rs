//! The dedicated affinity thread and its single-slot work cell.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::affine;
use crate::panic::panic_message;
use crate::{ContextError, ContextState, DispatchError, ThreadContext};

/// A type-erased unit of work, already wired to its reply channel.
pub(crate) type Work = Box<dyn FnOnce() + Send + 'static>;

/// Content of the pending-work slot.
pub(crate) enum Job {
	Run(Work),
	Shutdown,
}

struct Cell {
	pending: Option<Job>,
	/// Cleared once a shutdown request has been posted.
	accepting: bool,
	state: ContextState,
}

struct Shared {
	cell: Mutex<Cell>,
	work_posted: Condvar,
}

/// Owner of one OS thread dedicated to running posted work.
pub(crate) struct AffinityThread {
	shared: Arc<Shared>,
	handle: Mutex<Option<JoinHandle<()>>>,
	id: ThreadId,
	name: String,
}

impl AffinityThread {
	/// Spawns the thread. Returns as soon as the OS thread exists; context
	/// setup proceeds concurrently and finishes before the first job runs.
	pub fn start(name: &str, context: Box<dyn ThreadContext>) -> Result<Self, DispatchError> {
		let shared = Arc::new(Shared {
			cell: Mutex::new(Cell {
				pending: None,
				accepting: true,
				state: ContextState::Pending,
			}),
			work_posted: Condvar::new(),
		});

		let loop_shared = Arc::clone(&shared);
		let handle = thread::Builder::new()
			.name(name.to_string())
			.spawn(move || run_loop(&loop_shared, context))
			.map_err(DispatchError::Spawn)?;
		let id = handle.thread().id();
		tracing::debug!(thread = ?id, name, "affinity.spawn");

		Ok(Self {
			shared,
			handle: Mutex::new(Some(handle)),
			id,
			name: name.to_string(),
		})
	}

	pub fn id(&self) -> ThreadId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_current(&self) -> bool {
		thread::current().id() == self.id
	}

	pub fn context_state(&self) -> ContextState {
		self.shared.cell.lock().state.clone()
	}

	/// Places `job` in the pending slot and wakes the thread.
	///
	/// Callers serialize through the dispatcher's handoff lock and wait for
	/// completion before releasing it, so the slot is always empty here.
	pub fn post(&self, job: Job) -> Result<(), Job> {
		let mut cell = self.shared.cell.lock();
		if !cell.accepting {
			return Err(job);
		}
		debug_assert!(cell.pending.is_none(), "affinity slot already occupied");
		if matches!(job, Job::Shutdown) {
			cell.accepting = false;
		}
		cell.pending = Some(job);
		self.shared.work_posted.notify_one();
		Ok(())
	}

	/// Posts a shutdown request behind any posted work and joins the thread.
	///
	/// Idempotent. When called on the affinity thread itself the thread
	/// cannot be joined; it is detached and exits once the current job returns.
	pub fn stop(&self) {
		let _ = self.post(Job::Shutdown);
		let Some(handle) = self.handle.lock().take() else {
			return;
		};
		if self.is_current() {
			tracing::warn!(thread = ?self.id, "affinity thread stopped from itself, detaching");
			return;
		}
		if handle.join().is_err() {
			tracing::error!(thread = ?self.id, "affinity thread terminated abnormally");
		}
		tracing::debug!(thread = ?self.id, "affinity.joined");
	}
}

fn run_loop(shared: &Shared, mut context: Box<dyn ThreadContext>) {
	let setup = match catch_unwind(AssertUnwindSafe(|| context.setup())) {
		Ok(result) => result,
		Err(payload) => Err(ContextError::new(format!("setup panicked: {}", panic_message(payload.as_ref())))),
	};
	let state = match setup {
		Ok(()) => {
			tracing::trace!("affinity.setup");
			ContextState::Ready
		}
		Err(err) => {
			tracing::warn!(error = %err, "affinity thread context setup failed");
			ContextState::Failed(err)
		}
	};
	shared.cell.lock().state = state;

	loop {
		let job = {
			let mut cell = shared.cell.lock();
			loop {
				if let Some(job) = cell.pending.take() {
					break job;
				}
				shared.work_posted.wait(&mut cell);
			}
		};
		match job {
			// Work arrives pre-wrapped with unwind capture and its reply sender.
			Job::Run(work) => work(),
			Job::Shutdown => break,
		}
	}

	{
		let mut cell = shared.cell.lock();
		cell.accepting = false;
		cell.state = ContextState::Stopped;
	}

	let leaked = affine::clear_current_thread();
	if leaked > 0 {
		tracing::warn!(leaked, "pinned values still alive at affinity thread exit");
	}
	if let Err(payload) = catch_unwind(AssertUnwindSafe(|| context.teardown())) {
		tracing::error!(panic = %panic_message(payload.as_ref()), "affinity thread context teardown panicked");
	}
	tracing::trace!("affinity.teardown");
}
