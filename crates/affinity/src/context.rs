use crate::ContextError;

/// Per-thread setup and teardown hooks for the thread-affine resource context.
///
/// Both hooks run on the affinity thread: `setup` once before the first unit of
/// work, `teardown` once after the last one. Nothing else runs on the thread
/// concurrently with either hook.
pub trait ThreadContext: Send + 'static {
	/// Initializes the thread-affine context.
	fn setup(&mut self) -> Result<(), ContextError>;

	/// Releases the thread-affine context. Runs even if `setup` failed.
	fn teardown(&mut self) {}
}

/// Context with no setup or teardown work.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl ThreadContext for NoContext {
	fn setup(&mut self) -> Result<(), ContextError> {
		Ok(())
	}
}

/// Observed state of the affinity thread's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextState {
	/// Setup has not finished yet.
	Pending,
	/// Setup succeeded and the run loop is accepting work.
	Ready,
	/// Setup failed with the given error.
	Failed(ContextError),
	/// The run loop has exited.
	Stopped,
}

impl ContextState {
	/// Returns true once setup succeeded and until the loop stops.
	pub fn is_ready(&self) -> bool {
		matches!(self, Self::Ready)
	}
}
