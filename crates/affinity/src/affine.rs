//! Thread-pinned values.
//!
//! A thread-affine resource cannot be moved to, or touched from, another
//! thread, yet client handles that refer to it are shared freely between
//! caller threads. [`Affine<T>`] bridges the two: the value lives in a
//! per-thread store on the thread that created it, and the handle is a plain
//! `Send + Sync + Copy` key that only resolves on that thread.
//!
//! Keys carry a generation, so a slot reused after [`Affine::remove`] never
//! resolves through a stale key.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread::{self, ThreadId};

use slab::Slab;

use crate::AffineError;

struct Entry {
	generation: u64,
	value: Rc<dyn Any>,
}

#[derive(Default)]
struct Store {
	entries: Slab<Entry>,
	next_generation: u64,
}

thread_local! {
	static STORE: RefCell<Store> = RefCell::new(Store::default());
}

/// Key to a value pinned to the thread that created it.
pub struct Affine<T: 'static> {
	key: usize,
	generation: u64,
	thread: ThreadId,
	_marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Clone for Affine<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: 'static> Copy for Affine<T> {}

impl<T: 'static> fmt::Debug for Affine<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Affine")
			.field("key", &self.key)
			.field("generation", &self.generation)
			.field("thread", &self.thread)
			.finish()
	}
}

impl<T: 'static> Affine<T> {
	/// Pins `value` to the current thread.
	pub fn new(value: T) -> Self {
		let (key, generation) = STORE.with(|store| {
			let mut store = store.borrow_mut();
			store.next_generation = store.next_generation.wrapping_add(1);
			let generation = store.next_generation;
			let key = store.entries.insert(Entry {
				generation,
				value: Rc::new(value),
			});
			(key, generation)
		});
		Self {
			key,
			generation,
			thread: thread::current().id(),
			_marker: PhantomData,
		}
	}

	/// Returns the owning thread.
	pub fn thread(&self) -> ThreadId {
		self.thread
	}

	/// Returns true when called on the owning thread.
	pub fn is_owner_thread(&self) -> bool {
		thread::current().id() == self.thread
	}

	/// Runs `f` with a shared reference to the pinned value.
	///
	/// The store is not borrowed while `f` runs, so `f` may pin or remove
	/// other values.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, AffineError> {
		let value = self.resolve()?;
		Ok(f(&value))
	}

	/// Removes the pinned value from the store and drops it.
	///
	/// If a [`with`](Self::with) call on the same value is still running
	/// further up the stack, the drop happens when that call returns.
	pub fn remove(self) -> Result<(), AffineError> {
		if !self.is_owner_thread() {
			return Err(AffineError::WrongThread);
		}
		let entry = STORE
			.try_with(|store| {
				let mut store = store.borrow_mut();
				let live = store.entries.get(self.key).is_some_and(|entry| entry.generation == self.generation);
				if live { Ok(store.entries.remove(self.key)) } else { Err(AffineError::Vacant) }
			})
			.unwrap_or(Err(AffineError::Vacant))?;
		drop(entry);
		Ok(())
	}

	fn resolve(&self) -> Result<Rc<T>, AffineError> {
		if !self.is_owner_thread() {
			return Err(AffineError::WrongThread);
		}
		let value = STORE
			.try_with(|store| {
				let store = store.borrow();
				match store.entries.get(self.key) {
					Some(entry) if entry.generation == self.generation => Ok(Rc::clone(&entry.value)),
					_ => Err(AffineError::Vacant),
				}
			})
			.unwrap_or(Err(AffineError::Vacant))?;
		value.downcast::<T>().map_err(|_| AffineError::TypeMismatch)
	}
}

/// Returns the number of values pinned to the current thread.
pub fn pinned_count() -> usize {
	STORE.try_with(|store| store.borrow().entries.len()).unwrap_or(0)
}

/// Drops every value pinned to the current thread, returning how many there were.
pub(crate) fn clear_current_thread() -> usize {
	let entries = STORE
		.try_with(|store| std::mem::take(&mut store.borrow_mut().entries))
		.unwrap_or_default();
	let count = entries.len();
	drop(entries);
	count
}
