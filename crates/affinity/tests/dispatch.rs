use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use lexa_affinity::{Affine, AffineError, DispatchError, DispatcherConfig, SharedDispatcherRegistry, pinned_count};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Stand-in for a resource that must stay on its creating thread.
struct Counter {
	counts: RefCell<BTreeMap<String, usize>>,
	_not_send: Rc<()>,
}

impl Counter {
	fn new() -> Self {
		Self {
			counts: RefCell::default(),
			_not_send: Rc::new(()),
		}
	}

	fn bump(&self, key: &str) -> usize {
		let mut counts = self.counts.borrow_mut();
		let slot = counts.entry(key.to_string()).or_default();
		*slot += 1;
		*slot
	}
}

#[test]
fn dispatch_returns_value_and_error() {
	init_tracing();
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let dispatcher = registry.acquire().unwrap();

	assert_eq!(dispatcher.dispatch(|| 42).unwrap(), 42);

	let err = dispatcher.try_dispatch(|| -> Result<(), Failure> { Err(Failure("x".to_string())) });
	assert_eq!(err, Err(Failure("x".to_string())));

	let panicked = dispatcher.dispatch(|| -> u8 { panic!("x") }).unwrap_err();
	assert!(panicked.to_string().contains('x'), "unexpected error: {panicked}");
	assert_eq!(dispatcher.dispatch(|| 1).unwrap(), 1);
}

impl From<DispatchError> for Failure {
	fn from(err: DispatchError) -> Self {
		Self(err.to_string())
	}
}

#[derive(Debug, PartialEq)]
struct Failure(String);

#[test]
fn handle_lifecycle_across_caller_threads() {
	init_tracing();
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let dispatcher = registry.acquire().unwrap();
	let affinity_thread = dispatcher.thread_id();

	let handle = dispatcher.dispatch(|| Affine::new(Counter::new())).unwrap();
	assert_eq!(handle.thread(), affinity_thread);
	assert_eq!(handle.with(|c| c.bump("local")), Err(AffineError::WrongThread));

	let active = Arc::new(AtomicUsize::new(0));
	let overlaps = Arc::new(AtomicUsize::new(0));
	let barrier = Arc::new(Barrier::new(3));
	let callers: Vec<_> = ["alpha", "beta", "gamma"]
		.into_iter()
		.map(|key| {
			let dispatcher = dispatcher.clone();
			let active = Arc::clone(&active);
			let overlaps = Arc::clone(&overlaps);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				dispatcher.try_dispatch(move || -> Result<usize, Failure> {
					if active.fetch_add(1, Ordering::SeqCst) != 0 {
						overlaps.fetch_add(1, Ordering::SeqCst);
					}
					let count = handle.with(|c| c.bump(key)).map_err(|e| Failure(e.to_string()));
					active.fetch_sub(1, Ordering::SeqCst);
					count
				})
			})
		})
		.collect();
	for caller in callers {
		assert_eq!(caller.join().unwrap(), Ok(1));
	}
	assert_eq!(overlaps.load(Ordering::SeqCst), 0);

	let totals = dispatcher
		.dispatch(move || handle.with(|c| c.counts.borrow().values().sum::<usize>()))
		.unwrap();
	assert_eq!(totals, Ok(3));

	dispatcher.dispatch(move || handle.remove()).unwrap().unwrap();
	assert_eq!(dispatcher.dispatch(pinned_count).unwrap(), 0);

	assert_eq!(registry.snapshot().refs, 1);
	dispatcher.release();
	let snapshot = registry.snapshot();
	assert_eq!(snapshot.refs, 0);
	assert!(!snapshot.is_live());
}

#[test]
fn ordering_follows_handoff_order_from_one_caller() {
	let registry = SharedDispatcherRegistry::without_context(DispatcherConfig::default());
	let dispatcher = registry.acquire().unwrap();
	let log = dispatcher.dispatch(|| Affine::new(RefCell::new(Vec::<i32>::new()))).unwrap();

	for i in 0..50 {
		dispatcher.dispatch(move || log.with(|l| l.borrow_mut().push(i))).unwrap().unwrap();
	}
	let seen = dispatcher.dispatch(move || log.with(|l| l.borrow().clone())).unwrap().unwrap();
	assert_eq!(seen, (0..50).collect::<Vec<_>>());
}
