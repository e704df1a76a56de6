//! Error types for the provider layer.

use std::path::PathBuf;

use lexa_affinity::{AffineError, DispatchError};
use thiserror::Error;

/// Failure reported by a backend call.
#[derive(Debug, Error)]
pub enum BackendError {
	/// The backend's thread context was not initialized on this thread.
	#[error("backend context is not initialized on this thread")]
	NotInitialized,

	/// The backend has no dictionary for the language.
	#[error("language {0} is not supported by the backend")]
	Unsupported(String),

	/// Text handed to the backend was not valid UTF-16.
	#[error("backend received malformed text")]
	MalformedText,

	/// Reading or writing a backend file failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// File the operation touched.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		error: std::io::Error,
	},
}

/// Failure converting text between the caller's UTF-8 and the backend's UTF-16.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
	/// The text exceeds the backend's word length limit.
	#[error("text is {len} units long, limit is {max}")]
	TooLong {
		/// Length of the rejected text.
		len: usize,
		/// Limit that applied.
		max: usize,
	},

	/// The backend returned text that is not valid UTF-16.
	#[error("invalid UTF-16 text")]
	InvalidUtf16,

	/// A language tag is empty or contains characters other than ASCII
	/// alphanumerics, `_` and `-`.
	#[error("invalid language tag {0:?}")]
	InvalidTag(String),
}

/// Errors surfaced by [`Provider`](crate::Provider) and [`Dictionary`](crate::Dictionary) operations.
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error(transparent)]
	Dispatch(#[from] DispatchError),

	#[error(transparent)]
	Affine(#[from] AffineError),

	#[error(transparent)]
	Backend(#[from] BackendError),

	#[error(transparent)]
	Encoding(#[from] EncodingError),

	/// No dictionary exists for the requested tag.
	#[error("no dictionary available for {0}")]
	UnsupportedLanguage(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
