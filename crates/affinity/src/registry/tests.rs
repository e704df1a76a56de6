use std::cell::RefCell;
use std::sync::Barrier;
use std::thread;

use super::*;
use crate::{Affine, ContextError, ContextState};

type EventLog = Arc<Mutex<Vec<&'static str>>>;

struct ExitProbe(EventLog);

impl Drop for ExitProbe {
	fn drop(&mut self) {
		self.0.lock().push("exit");
	}
}

thread_local! {
	static EXIT_PROBE: RefCell<Option<ExitProbe>> = const { RefCell::new(None) };
}

struct RecordingContext {
	log: EventLog,
}

impl ThreadContext for RecordingContext {
	fn setup(&mut self) -> Result<(), ContextError> {
		EXIT_PROBE.with(|probe| *probe.borrow_mut() = Some(ExitProbe(Arc::clone(&self.log))));
		self.log.lock().push("setup");
		Ok(())
	}

	fn teardown(&mut self) {
		self.log.lock().push("teardown");
	}
}

fn recording_registry() -> (SharedDispatcherRegistry, EventLog) {
	let log: EventLog = Arc::default();
	let ctx_log = Arc::clone(&log);
	let registry = SharedDispatcherRegistry::new(DispatcherConfig::default(), move || {
		Box::new(RecordingContext { log: Arc::clone(&ctx_log) })
	});
	(registry, log)
}

/// Pinned value that records its drop.
struct Pinned(EventLog);

impl Drop for Pinned {
	fn drop(&mut self) {
		self.0.lock().push("drop");
	}
}

#[test]
fn first_acquire_constructs_and_last_release_destroys() {
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	assert_eq!(registry.snapshot().refs, 0);
	assert!(!registry.snapshot().is_live());

	let refs: Vec<_> = (0..3).map(|_| registry.acquire().unwrap()).collect();
	let snapshot = registry.snapshot();
	assert_eq!(snapshot.refs, 3);
	assert_eq!(snapshot.generation, 1);
	assert_eq!(snapshot.thread, Some(refs[0].thread_id()));
	assert!(refs.iter().all(|r| r.thread_id() == refs[0].thread_id()));

	let mut refs = refs.into_iter();
	refs.next().unwrap().release();
	refs.next().unwrap().release();
	assert!(registry.snapshot().is_live());
	refs.next().unwrap().release();

	let snapshot = registry.snapshot();
	assert_eq!(snapshot.refs, 0);
	assert!(!snapshot.is_live());
}

#[test]
fn reacquire_after_full_release_uses_fresh_thread() {
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let first = registry.acquire().unwrap();
	let first_thread = first.dispatch(|| thread::current().id()).unwrap();
	first.release();

	let second = registry.acquire().unwrap();
	let second_thread = second.dispatch(|| thread::current().id()).unwrap();
	assert_ne!(first_thread, second_thread);
	assert_eq!(registry.snapshot().generation, 2);
}

#[test]
fn clone_counts_as_acquisition() {
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let original = registry.acquire().unwrap();
	let copy = original.clone();
	assert_eq!(registry.snapshot().refs, 2);

	drop(original);
	assert_eq!(copy.dispatch(|| 3).unwrap(), 3);
	drop(copy);
	assert_eq!(registry.snapshot().refs, 0);
	assert_eq!(registry.snapshot().generation, 1);
}

#[test]
fn teardown_precedes_thread_exit_precedes_release_return() {
	let (registry, log) = recording_registry();
	let dispatcher = registry.acquire().unwrap();
	dispatcher.dispatch(|| ()).unwrap();
	assert_eq!(*log.lock(), vec!["setup"]);

	dispatcher.release();
	assert_eq!(*log.lock(), vec!["setup", "teardown", "exit"]);
}

#[test]
fn concurrent_first_acquires_construct_once() {
	const THREADS: usize = 16;
	let (registry, log) = recording_registry();
	let barrier = Arc::new(Barrier::new(THREADS));

	let workers: Vec<_> = (0..THREADS)
		.map(|_| {
			let registry = registry.clone();
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				registry.acquire().unwrap()
			})
		})
		.collect();
	let refs: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

	let snapshot = registry.snapshot();
	assert_eq!(snapshot.refs, THREADS);
	assert_eq!(snapshot.generation, 1);
	assert_eq!(log.lock().iter().filter(|e| **e == "setup").count(), 1);

	drop(refs);
	assert_eq!(registry.snapshot().refs, 0);
}

struct BrokenContext;

impl ThreadContext for BrokenContext {
	fn setup(&mut self) -> Result<(), ContextError> {
		Err(ContextError::new("unavailable"))
	}
}

#[test]
fn failed_construction_leaves_count_unchanged() {
	let registry = SharedDispatcherRegistry::new(DispatcherConfig::default(), || Box::new(BrokenContext));
	assert!(matches!(registry.acquire(), Err(DispatchError::Setup(_))));
	let snapshot = registry.snapshot();
	assert_eq!(snapshot.refs, 0);
	assert_eq!(snapshot.generation, 0);
	assert!(!snapshot.is_live());
}

#[test]
fn lenient_registry_shares_degraded_dispatcher() {
	let config = DispatcherConfig::default().setup_policy(crate::SetupPolicy::Lenient);
	let registry = SharedDispatcherRegistry::new(config, || Box::new(BrokenContext));
	let dispatcher = registry.acquire().unwrap();
	assert!(matches!(dispatcher.context_state(), ContextState::Failed(_)));
	assert_eq!(dispatcher.dispatch(|| 9).unwrap(), 9);
}

#[test]
fn leaked_pinned_values_drop_before_teardown() {
	let (registry, log) = recording_registry();
	let dispatcher = registry.acquire().unwrap();
	let pinned_log = Arc::clone(&log);
	dispatcher.dispatch(move || Affine::new(Pinned(pinned_log))).unwrap();
	assert_eq!(*log.lock(), vec!["setup"]);

	dispatcher.release();
	assert_eq!(*log.lock(), vec!["setup", "drop", "teardown", "exit"]);
}

struct PanickingSetup;

impl ThreadContext for PanickingSetup {
	fn setup(&mut self) -> Result<(), ContextError> {
		panic!("driver missing")
	}
}

#[test]
fn setup_panic_counts_as_setup_failure() {
	let registry = SharedDispatcherRegistry::new(DispatcherConfig::default(), || Box::new(PanickingSetup));
	let err = registry.acquire().unwrap_err();
	assert!(
		matches!(&err, DispatchError::Setup(e) if e.message() == "setup panicked: driver missing"),
		"unexpected error: {err}"
	);
	assert_eq!(registry.snapshot().refs, 0);
	assert!(!registry.snapshot().is_live());
}

struct PanickingTeardown {
	log: EventLog,
}

impl ThreadContext for PanickingTeardown {
	fn setup(&mut self) -> Result<(), ContextError> {
		EXIT_PROBE.with(|probe| *probe.borrow_mut() = Some(ExitProbe(Arc::clone(&self.log))));
		Ok(())
	}

	fn teardown(&mut self) {
		self.log.lock().push("teardown");
		panic!("release failed");
	}
}

#[test]
fn teardown_panic_still_joins_thread() {
	let log: EventLog = Arc::default();
	let ctx_log = Arc::clone(&log);
	let registry = SharedDispatcherRegistry::new(DispatcherConfig::default(), move || {
		Box::new(PanickingTeardown { log: Arc::clone(&ctx_log) })
	});

	let dispatcher = registry.acquire().unwrap();
	assert_eq!(dispatcher.dispatch(|| 4).unwrap(), 4);
	dispatcher.release();

	assert_eq!(*log.lock(), vec!["teardown", "exit"]);
	assert!(!registry.snapshot().is_live());
	assert_eq!(registry.acquire().unwrap().dispatch(|| 5).unwrap(), 5);
}

#[test]
fn releasing_one_handle_keeps_shared_dispatcher_serving() {
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let first = registry.acquire().unwrap();
	let second = registry.acquire().unwrap();
	let affinity = first.thread_id();

	first.release();
	assert_eq!(second.dispatch(|| 1).unwrap(), 1);
	assert_eq!(second.context_state(), ContextState::Ready);

	let third = registry.acquire().unwrap();
	assert_eq!(third.thread_id(), affinity);
	assert_eq!(third.dispatch(|| 2).unwrap(), 2);
	assert_eq!(registry.snapshot().generation, 1);
}
