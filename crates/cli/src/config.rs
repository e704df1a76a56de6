//! Host configuration file.
//!
//! ```toml
//! [dispatcher]
//! thread_name = "lexa-affinity"
//! setup_policy = "strict"
//!
//! [wordlist]
//! dir = "/usr/share/lexa/dicts"
//! persist_personal = true
//!
//! [log]
//! filter = "lexa=debug"
//! ```

use std::path::{Path, PathBuf};

use lexa_affinity::DispatcherConfig;
use lexa_provider::wordlist::WordListConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "LEXA_CONFIG";

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML.
	#[error("invalid config {path}: {error}")]
	Parse {
		/// Path to the file that failed to parse.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub dispatcher: DispatcherConfig,
	pub wordlist: WordListSection,
	pub log: LogSection,
}

/// `[wordlist]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WordListSection {
	/// Dictionary directory. Falls back to `<data_dir>/lexa/dicts`.
	pub dir: Option<PathBuf>,
	pub persist_personal: bool,
}

impl Default for WordListSection {
	fn default() -> Self {
		Self {
			dir: None,
			persist_personal: true,
		}
	}
}

/// `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
	/// `tracing` filter directives, used when `RUST_LOG` is unset.
	pub filter: Option<String>,
}

impl Config {
	/// Reads and parses the file at `path`.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		toml::from_str(&text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Loads the first config found: `explicit`, then `$LEXA_CONFIG`, then the
	/// user config dir. Returns defaults when none applies.
	pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
		let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
		let user = dirs::config_dir().map(|dir| dir.join("lexa").join("config.toml"));
		match config_path(explicit, env, user) {
			Some(path) => Ok((Self::load(&path)?, Some(path))),
			None => Ok((Self::default(), None)),
		}
	}

	/// Builds the word-list backend settings, `dict_dir` taking precedence over the file.
	pub fn wordlist_config(&self, dict_dir: Option<&Path>) -> Option<WordListConfig> {
		let dir = dict_dir
			.map(Path::to_path_buf)
			.or_else(|| self.wordlist.dir.clone())
			.or_else(|| dirs::data_dir().map(|dir| dir.join("lexa").join("dicts")))?;
		Some(WordListConfig {
			dir,
			persist_personal: self.wordlist.persist_personal,
		})
	}
}

/// Picks the config file to load. Explicit and environment paths are used even
/// if missing, so a typo surfaces as an error; the user default only if present.
fn config_path(explicit: Option<&Path>, env: Option<PathBuf>, user: Option<PathBuf>) -> Option<PathBuf> {
	explicit
		.map(Path::to_path_buf)
		.or(env.filter(|path| !path.as_os_str().is_empty()))
		.or_else(|| user.filter(|path| path.is_file()))
}
