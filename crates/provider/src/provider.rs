use std::sync::Arc;

use lexa_affinity::{Affine, DispatcherRef};

use crate::backend::{Backend, SpellChecker, SpellFactory};
use crate::encoding::{language_to_tag, tag_to_language};
use crate::{Dictionary, ProviderError, Result};

/// Top-level client handle over a backend's root factory.
///
/// The factory lives on the affinity thread; every operation is dispatched
/// there. A provider holds one acquisition of the shared dispatcher for its
/// whole lifetime.
pub struct Provider {
	backend: Arc<dyn Backend>,
	factory: Affine<Box<dyn SpellFactory>>,
	dispatcher: DispatcherRef,
}

impl Provider {
	/// Creates the backend factory on the affinity thread.
	///
	/// On failure `dispatcher` is dropped, releasing the acquisition.
	pub(crate) fn create(dispatcher: DispatcherRef, backend: Arc<dyn Backend>) -> Result<Self> {
		let creator = Arc::clone(&backend);
		let factory = dispatcher.try_dispatch(move || -> Result<_> { Ok(Affine::new(creator.create_factory()?)) })?;
		tracing::debug!(backend = backend.identify(), thread = ?dispatcher.thread_id(), "provider.create");
		Ok(Self {
			backend,
			factory,
			dispatcher,
		})
	}

	/// Returns the backend identifier.
	pub fn identify(&self) -> &str {
		self.backend.identify()
	}

	/// Returns the backend description.
	pub fn describe(&self) -> &str {
		self.backend.describe()
	}

	/// Lists the tags (`en_US` form) of every available dictionary.
	///
	/// Backend language names that do not convert to a valid tag are skipped.
	pub fn list_dicts(&self) -> Result<Vec<String>> {
		let factory = self.factory;
		self.dispatcher.try_dispatch(move || -> Result<Vec<String>> {
			let languages = factory.with(|f| f.supported_languages())??;
			Ok(languages
				.iter()
				.filter_map(|language| match language_to_tag(language) {
					Ok(tag) => Some(tag),
					Err(err) => {
						tracing::warn!(error = %err, "skipping unusable backend language");
						None
					}
				})
				.collect())
		})
	}

	/// Reports whether a dictionary exists for `tag`.
	pub fn dictionary_exists(&self, tag: &str) -> Result<bool> {
		let language = tag_to_language(tag)?;
		let factory = self.factory;
		self.dispatcher.try_dispatch(move || -> Result<bool> { Ok(factory.with(|f| f.is_supported(&language))??) })
	}

	/// Opens the dictionary for `tag`.
	pub fn request_dict(&self, tag: &str) -> Result<Dictionary> {
		let language = tag_to_language(tag)?;
		let factory = self.factory;
		let owned_tag = tag.to_string();
		let checker = self.dispatcher.try_dispatch(move || -> Result<_> {
			factory
				.with(|f| -> Result<Affine<Box<dyn SpellChecker>>> {
					if !f.is_supported(&language)? {
						return Err(ProviderError::UnsupportedLanguage(owned_tag));
					}
					Ok(Affine::new(f.create_checker(&language)?))
				})?
		})?;
		tracing::debug!(tag, "dictionary.request");
		Ok(Dictionary::new(tag.to_string(), checker, self.dispatcher.clone()))
	}
}

impl Drop for Provider {
	fn drop(&mut self) {
		let factory = self.factory;
		match self.dispatcher.dispatch(move || factory.remove()) {
			Ok(Ok(())) => tracing::debug!(backend = self.backend.identify(), "provider.dispose"),
			Ok(Err(err)) => tracing::warn!(error = %err, "provider factory already gone"),
			Err(err) => tracing::warn!(error = %err, "failed to dispose provider factory"),
		}
	}
}

impl std::fmt::Debug for Provider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Provider")
			.field("backend", &self.backend.identify())
			.field("factory", &self.factory)
			.field("dispatcher", &self.dispatcher)
			.finish()
	}
}
