//! UTF-8 / UTF-16 marshaling at the backend boundary.
//!
//! Callers speak UTF-8 and language tags of the form `en_US`; backends speak
//! UTF-16 and language names of the form `en-US`.

use crate::EncodingError;

/// Longest word, in UTF-16 units, a backend accepts or returns.
pub const MAX_WORD_LENGTH: usize = 128;

/// Longest UTF-8 input, in bytes, accepted for conversion.
pub const MAX_UTF8_WORD_BYTES: usize = MAX_WORD_LENGTH * 4;

/// Owned UTF-16 text as passed to backends.
pub type WideString = Vec<u16>;

/// Converts caller text to UTF-16.
pub fn to_wide(text: &str) -> Result<WideString, EncodingError> {
	if text.len() > MAX_UTF8_WORD_BYTES {
		return Err(EncodingError::TooLong {
			len: text.len(),
			max: MAX_UTF8_WORD_BYTES,
		});
	}
	Ok(text.encode_utf16().collect())
}

/// Converts backend UTF-16 text to UTF-8, stopping at the first NUL.
pub fn from_wide(wide: &[u16]) -> Result<String, EncodingError> {
	let end = wide.iter().position(|&unit| unit == 0).unwrap_or(wide.len());
	if end > MAX_WORD_LENGTH {
		return Err(EncodingError::TooLong { len: end, max: MAX_WORD_LENGTH });
	}
	String::from_utf16(&wide[..end]).map_err(|_| EncodingError::InvalidUtf16)
}

/// Converts a caller tag (`en_US`) to a backend language name (`en-US`).
pub fn tag_to_language(tag: &str) -> Result<WideString, EncodingError> {
	validate_tag(tag)?;
	to_wide(&tag.replace('_', "-"))
}

/// Converts a backend language name (`en-US`) to a caller tag (`en_US`).
pub fn language_to_tag(language: &[u16]) -> Result<String, EncodingError> {
	let tag = from_wide(language)?.replace('-', "_");
	validate_tag(&tag)?;
	Ok(tag)
}

fn validate_tag(tag: &str) -> Result<(), EncodingError> {
	let valid = !tag.is_empty() && tag.len() <= MAX_WORD_LENGTH && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
	if valid { Ok(()) } else { Err(EncodingError::InvalidTag(tag.to_string())) }
}
