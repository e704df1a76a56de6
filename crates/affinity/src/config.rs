use serde::Deserialize;

/// Default name given to affinity threads.
pub const DEFAULT_THREAD_NAME: &str = "lexa-affinity";

/// How a failed [`ThreadContext::setup`](crate::ThreadContext::setup) affects dispatcher construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupPolicy {
	/// Construction fails and the thread is stopped.
	#[default]
	Strict,
	/// The dispatcher keeps running; dependent work fails on its own.
	Lenient,
}

/// Construction parameters for a [`WorkDispatcher`](crate::WorkDispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
	/// OS thread name for the affinity thread.
	pub thread_name: String,
	/// Setup failure handling.
	pub setup_policy: SetupPolicy,
}

impl Default for DispatcherConfig {
	fn default() -> Self {
		Self {
			thread_name: DEFAULT_THREAD_NAME.to_string(),
			setup_policy: SetupPolicy::default(),
		}
	}
}

impl DispatcherConfig {
	/// Sets the affinity thread name.
	pub fn thread_name(mut self, name: impl Into<String>) -> Self {
		self.thread_name = name.into();
		self
	}

	/// Sets the setup failure policy.
	pub fn setup_policy(mut self, policy: SetupPolicy) -> Self {
		self.setup_policy = policy;
		self
	}
}
