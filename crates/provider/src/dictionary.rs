use lexa_affinity::{Affine, DispatcherRef};

use crate::{BackendError, Result};
use crate::backend::{SpellChecker, Suggestions};
use crate::encoding::{WideString, from_wide, to_wide};

/// Per-language client handle.
///
/// Words are marshaled to UTF-16 on the calling thread; the backend call runs
/// on the affinity thread. A dictionary holds its own dispatcher acquisition,
/// so it stays usable after the [`Provider`](crate::Provider) that opened it
/// is dropped.
pub struct Dictionary {
	tag: String,
	checker: Affine<Box<dyn SpellChecker>>,
	dispatcher: DispatcherRef,
}

impl Dictionary {
	pub(crate) fn new(tag: String, checker: Affine<Box<dyn SpellChecker>>, dispatcher: DispatcherRef) -> Self {
		Self { tag, checker, dispatcher }
	}

	/// Returns the tag this dictionary was requested with.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// Returns true when `word` is spelled correctly.
	pub fn check(&self, word: &str) -> Result<bool> {
		let word = to_wide(word)?;
		let checker = self.checker;
		self.dispatcher.try_dispatch(move || -> Result<bool> { Ok(checker.with(|c| c.check(&word))??) })
	}

	/// Suggests corrections for `word`, best first. Empty when `word` is correct.
	///
	/// Candidates that are too long or not valid UTF-16 are skipped.
	pub fn suggest(&self, word: &str) -> Result<Vec<String>> {
		let word = to_wide(word)?;
		let checker = self.checker;
		let suggestions = self.dispatcher.try_dispatch(move || -> Result<Suggestions> { Ok(checker.with(|c| c.suggest(&word))??) })?;
		match suggestions {
			Suggestions::Correct => Ok(Vec::new()),
			Suggestions::Candidates(candidates) => Ok(candidates
				.iter()
				.filter_map(|candidate| match from_wide(candidate) {
					Ok(candidate) => Some(candidate),
					Err(err) => {
						tracing::warn!(tag = %self.tag, error = %err, "skipping unusable suggestion");
						None
					}
				})
				.collect()),
		}
	}

	/// Adds `word` to the user's personal dictionary.
	pub fn add_to_personal(&self, word: &str) -> Result<()> {
		self.apply(to_wide(word)?, |checker, word| checker.add(word))
	}

	/// Accepts `word` for the rest of the session.
	pub fn add_to_exclude(&self, word: &str) -> Result<()> {
		self.apply(to_wide(word)?, |checker, word| checker.ignore(word))
	}

	/// Records `correction` as the preferred replacement for `misspelling`.
	pub fn store_replacement(&self, misspelling: &str, correction: &str) -> Result<()> {
		let from = to_wide(misspelling)?;
		let to = to_wide(correction)?;
		let checker = self.checker;
		self.dispatcher.try_dispatch(move || -> Result<()> { Ok(checker.with(|c| c.auto_correct(&from, &to))??) })
	}

	fn apply<F>(&self, word: WideString, op: F) -> Result<()>
	where
		F: FnOnce(&dyn SpellChecker, &[u16]) -> std::result::Result<(), BackendError> + Send + 'static,
	{
		let checker = self.checker;
		self.dispatcher.try_dispatch(move || -> Result<()> { Ok(checker.with(|c| op(&**c, &word))??) })
	}
}

impl Drop for Dictionary {
	fn drop(&mut self) {
		let checker = self.checker;
		match self.dispatcher.dispatch(move || checker.remove()) {
			Ok(Ok(())) => tracing::debug!(tag = %self.tag, "dictionary.dispose"),
			Ok(Err(err)) => tracing::warn!(tag = %self.tag, error = %err, "dictionary checker already gone"),
			Err(err) => tracing::warn!(tag = %self.tag, error = %err, "failed to dispose dictionary checker"),
		}
	}
}

impl std::fmt::Debug for Dictionary {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dictionary")
			.field("tag", &self.tag)
			.field("checker", &self.checker)
			.finish()
	}
}
