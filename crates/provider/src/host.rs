use std::sync::Arc;

use lexa_affinity::{DispatcherConfig, RegistrySnapshot, SharedDispatcherRegistry};

use crate::backend::Backend;
use crate::{Provider, Result};

/// Plugin shell owning the shared dispatcher registry for one backend.
///
/// Every [`Provider`] created here shares one affinity thread. The thread
/// starts with the first provider and is joined when the last provider and
/// dictionary are gone.
#[derive(Clone)]
pub struct ProviderHost {
	registry: SharedDispatcherRegistry,
	backend: Arc<dyn Backend>,
}

impl ProviderHost {
	/// Creates a host whose affinity threads run `backend`'s context hooks.
	pub fn new(config: DispatcherConfig, backend: Arc<dyn Backend>) -> Self {
		let context_backend = Arc::clone(&backend);
		let registry = SharedDispatcherRegistry::new(config, move || context_backend.context());
		Self { registry, backend }
	}

	/// Acquires the shared dispatcher and creates a provider on it.
	pub fn create_provider(&self) -> Result<Provider> {
		let dispatcher = self.registry.acquire()?;
		Provider::create(dispatcher, Arc::clone(&self.backend))
	}

	/// Returns the shared registry.
	pub fn registry(&self) -> &SharedDispatcherRegistry {
		&self.registry
	}

	/// Returns the registry's current state.
	pub fn snapshot(&self) -> RegistrySnapshot {
		self.registry.snapshot()
	}
}

impl std::fmt::Debug for ProviderHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProviderHost")
			.field("backend", &self.backend.identify())
			.field("registry", &self.registry)
			.finish()
	}
}
