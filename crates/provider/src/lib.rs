//! Spell-check provider over a thread-affine backend.
//!
//! A [`ProviderHost`] plays the plugin shell: it owns the shared dispatcher
//! registry and hands out [`Provider`] handles. Providers open
//! [`Dictionary`] handles. Every backend call they make runs on the one
//! affinity thread, through [`lexa_affinity`].
//!
//! [`wordlist::WordListBackend`] is the bundled backend; others implement
//! [`backend::Backend`].

pub mod backend;
mod dictionary;
pub mod encoding;
mod error;
mod host;
mod provider;
pub mod wordlist;

pub use dictionary::Dictionary;
pub use error::{BackendError, EncodingError, ProviderError, Result};
pub use host::ProviderHost;
pub use provider::Provider;
