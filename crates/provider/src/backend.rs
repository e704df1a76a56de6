//! Backend seam.
//!
//! A backend's factory and checkers are thread-affine: they are created,
//! used, and dropped on the affinity thread only, so none of these traits
//! require `Send`.

use lexa_affinity::ThreadContext;

use crate::BackendError;
use crate::encoding::WideString;

/// A spell-check backend plugged into a [`ProviderHost`](crate::ProviderHost).
pub trait Backend: Send + Sync + 'static {
	/// Short identifier, e.g. `"wordlist"`.
	fn identify(&self) -> &str;

	/// Human-readable description.
	fn describe(&self) -> &str;

	/// Returns the hooks that initialize the backend's per-thread context.
	///
	/// Called once per affinity thread.
	fn context(&self) -> Box<dyn ThreadContext>;

	/// Creates the root factory. Runs on the affinity thread.
	fn create_factory(&self) -> Result<Box<dyn SpellFactory>, BackendError>;
}

/// Root backend object, producing per-language checkers.
pub trait SpellFactory {
	/// Lists supported language names (`en-US` form).
	fn supported_languages(&self) -> Result<Vec<WideString>, BackendError>;

	/// Reports whether `language` is supported.
	fn is_supported(&self, language: &[u16]) -> Result<bool, BackendError>;

	/// Creates a checker for `language`.
	fn create_checker(&self, language: &[u16]) -> Result<Box<dyn SpellChecker>, BackendError>;
}

/// Result of a suggestion lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestions {
	/// The word is spelled correctly; nothing to suggest.
	Correct,
	/// Replacement candidates, best first. May be empty.
	Candidates(Vec<WideString>),
}

/// Per-language checker.
pub trait SpellChecker {
	/// Returns true when `word` is spelled correctly.
	fn check(&self, word: &[u16]) -> Result<bool, BackendError>;

	/// Suggests replacements for `word`.
	fn suggest(&self, word: &[u16]) -> Result<Suggestions, BackendError>;

	/// Adds `word` to the user's personal dictionary.
	fn add(&self, word: &[u16]) -> Result<(), BackendError>;

	/// Accepts `word` for the rest of the session.
	fn ignore(&self, word: &[u16]) -> Result<(), BackendError>;

	/// Records `to` as the preferred replacement for `from`.
	fn auto_correct(&self, from: &[u16], to: &[u16]) -> Result<(), BackendError>;
}
